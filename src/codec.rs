// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Block codec seam and the LZ4 implementation
//!
//! A codec context is created once per session direction and carries the
//! dictionary continuation state from block to block. It never stores
//! pointers: the history is a set of index ranges into the session's ring,
//! which the session passes back in on every call.

use std::ops::Range;

use lz4_flex::block as lz4;

use crate::error::CodecError;
use crate::history::{Dictionary, History};

/// lz4_flex reads the dictionary four bytes at a time
const MIN_DICTIONARY_LEN: usize = 4;

/// Compression half of a dictionary-chained block codec
pub trait BlockCompressor {
    /// Worst-case compressed size for `len` bytes of input
    fn max_compressed_len(&self, len: usize) -> usize;

    /// Compress `ring[block]` into `dst` and return the compressed length
    ///
    /// Earlier blocks still present in `ring` may be referenced as
    /// dictionary. `dst` must hold at least `max_compressed_len(block.len())`
    /// bytes.
    fn compress(
        &mut self,
        ring: &[u8],
        block: Range<usize>,
        dst: &mut [u8],
    ) -> Result<usize, CodecError>;
}

/// Decompression half of a dictionary-chained block codec
pub trait BlockDecompressor {
    /// Largest payload a valid block of `len` bytes can have
    fn max_compressed_len(&self, len: usize) -> usize;

    /// Decompress `src` into `ring[block]` and return the decoded length
    ///
    /// The slot is exactly the length recorded by the encoder; output that
    /// would run past it is a codec failure, output that stops short is
    /// reported through the returned length.
    fn decompress(
        &mut self,
        src: &[u8],
        ring: &mut [u8],
        block: Range<usize>,
    ) -> Result<usize, CodecError>;
}

/// LZ4 block compressor with ring-buffer dictionary continuation
#[derive(Debug, Default)]
pub struct Lz4Compressor {
    history: History,
    joined: Vec<u8>,
}

impl Lz4Compressor {
    pub fn new() -> Self {
        Lz4Compressor {
            history: History::new(),
            joined: Vec::new(),
        }
    }
}

impl BlockCompressor for Lz4Compressor {
    fn max_compressed_len(&self, len: usize) -> usize {
        lz4::get_maximum_output_size(len)
    }

    fn compress(
        &mut self,
        ring: &[u8],
        block: Range<usize>,
        dst: &mut [u8],
    ) -> Result<usize, CodecError> {
        let input = &ring[block.clone()];
        let dictionary = match self.history.dictionary_for(&block) {
            d if d.len() < MIN_DICTIONARY_LEN => Dictionary::Empty,
            d => d,
        };
        let n = match dictionary {
            Dictionary::Empty => lz4::compress_into(input, dst),
            Dictionary::Contiguous(dict) => {
                lz4::compress_into_with_dict(input, dst, &ring[dict])
            }
            Dictionary::Split { external, prefix } => {
                join(&mut self.joined, ring, external, prefix);
                lz4::compress_into_with_dict(input, dst, &self.joined)
            }
        }
        .map_err(|e| CodecError::new(format!("lz4 compress: {}", e)))?;

        self.history.commit(block);
        Ok(n)
    }
}

/// LZ4 block decompressor with ring-buffer dictionary continuation
#[derive(Debug, Default)]
pub struct Lz4Decompressor {
    history: History,
    joined: Vec<u8>,
}

impl Lz4Decompressor {
    pub fn new() -> Self {
        Lz4Decompressor {
            history: History::new(),
            joined: Vec::new(),
        }
    }
}

impl BlockDecompressor for Lz4Decompressor {
    fn max_compressed_len(&self, len: usize) -> usize {
        lz4::get_maximum_output_size(len)
    }

    fn decompress(
        &mut self,
        src: &[u8],
        ring: &mut [u8],
        block: Range<usize>,
    ) -> Result<usize, CodecError> {
        let n = match self.history.dictionary_for(&block) {
            Dictionary::Empty => lz4::decompress_into(src, &mut ring[block.clone()]),
            Dictionary::Contiguous(dict) => {
                let (dict, out) = split_disjoint(ring, dict, block.clone());
                lz4::decompress_into_with_dict(src, out, dict)
            }
            Dictionary::Split { external, prefix } => {
                join(&mut self.joined, ring, external, prefix);
                let out = &mut ring[block.clone()];
                lz4::decompress_into_with_dict(src, out, &self.joined)
            }
        }
        .map_err(|e| CodecError::new(format!("lz4 decompress: {}", e)))?;

        self.history.commit(block);
        Ok(n)
    }
}

/// Copy a split dictionary into one contiguous buffer, oldest bytes first
fn join(buf: &mut Vec<u8>, ring: &[u8], external: Range<usize>, prefix: Range<usize>) {
    buf.clear();
    buf.extend_from_slice(&ring[external]);
    buf.extend_from_slice(&ring[prefix]);
}

/// Borrow the dictionary region and the output slot of the ring at once
///
/// The dictionary never overlaps the slot; it lies entirely before or
/// entirely after it.
fn split_disjoint(
    ring: &mut [u8],
    dict: Range<usize>,
    slot: Range<usize>,
) -> (&[u8], &mut [u8]) {
    if dict.end <= slot.start {
        let (head, rest) = ring.split_at_mut(slot.start);
        (&head[dict], &mut rest[..slot.len()])
    } else {
        debug_assert!(dict.start >= slot.end);
        let (head, rest) = ring.split_at_mut(slot.end);
        let offset = slot.end;
        (
            &rest[dict.start - offset..dict.end - offset],
            &mut head[slot.start..],
        )
    }
}

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Encode session: ring placement, compression and framing

use std::io::{self, Write};

use crate::codec::{BlockCompressor, Lz4Compressor};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::frame::FrameWriter;
use crate::ring::RingWindow;
use crate::stats::{SessionStats, SessionSummary};

/// Encoder compresses a sequence of blocks into a framed stream
///
/// Each block is copied into the ring window and compressed with the bytes
/// of earlier blocks as dictionary. Blocks can be submitted one at a time
/// with [`Encoder::write_block`], or as a plain byte stream through
/// [`std::io::Write`], in which case bytes are grouped into blocks of
/// `max_block_size`.
///
/// Bytes written through `Write` are framed when a block fills up, on
/// `flush`, or by [`Encoder::finish`]. Dropping the encoder without either
/// discards a partially filled block.
///
/// # Example
///
/// ```
/// use ringlz::{Decoder, Encoder};
///
/// let mut encoder = Encoder::new(Vec::new()).unwrap();
/// encoder.write_block(b"first block, first block").unwrap();
/// encoder.write_block(b"second block, first block").unwrap();
/// let (stream, summary) = encoder.finish().unwrap();
/// assert_eq!(summary.blocks, 2);
///
/// let mut decoder = Decoder::new(&stream[..]).unwrap();
/// assert_eq!(decoder.next_block().unwrap(), Some(&b"first block, first block"[..]));
/// assert_eq!(decoder.next_block().unwrap(), Some(&b"second block, first block"[..]));
/// assert_eq!(decoder.next_block().unwrap(), None);
/// ```
pub struct Encoder<W: Write, C: BlockCompressor = Lz4Compressor> {
    frames: FrameWriter<W>,
    ring: RingWindow,
    codec: C,
    scratch: Vec<u8>,
    bound: usize,
    pending: Vec<u8>,
    stats: SessionStats,
    failed: bool,
}

impl<W: Write> Encoder<W> {
    /// Create an LZ4 encoder with the default configuration
    pub fn new(writer: W) -> Result<Self> {
        Self::with_config(writer, StreamConfig::default())
    }

    /// Create an LZ4 encoder with a specific configuration
    pub fn with_config(writer: W, config: StreamConfig) -> Result<Self> {
        Self::with_codec(writer, config, Lz4Compressor::new())
    }
}

impl<W: Write, C: BlockCompressor> Encoder<W, C> {
    /// Create an encoder around an arbitrary block compressor
    pub fn with_codec(writer: W, config: StreamConfig, codec: C) -> Result<Self> {
        let ring = RingWindow::new(&config)?;
        let bound = codec.max_compressed_len(config.max_block_size());

        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(bound)
            .map_err(|_| Error::Allocation {
                what: "compression buffer",
                requested: bound,
            })?;
        scratch.resize(bound, 0);

        Ok(Encoder {
            frames: FrameWriter::new(writer),
            ring,
            codec,
            scratch,
            bound,
            pending: Vec::new(),
            stats: SessionStats::new(),
            failed: false,
        })
    }

    /// Compress one block and append its record to the stream
    ///
    /// Blocks longer than the configured maximum are rejected without
    /// touching the session. Any other failure aborts the session.
    pub fn write_block(&mut self, block: &[u8]) -> Result<()> {
        if self.failed {
            return Err(Error::SessionAborted);
        }
        if block.len() > self.ring.max_block_size() {
            return Err(Error::BlockTooLarge {
                len: block.len(),
                max: self.ring.max_block_size(),
            });
        }

        let result = self.encode_block(block);
        if let Err(ref e) = result {
            self.failed = true;
            tracing::warn!(
                block = self.stats.next_block(),
                error = %e,
                "aborting encode session"
            );
        }
        result
    }

    fn encode_block(&mut self, block: &[u8]) -> Result<()> {
        let index = self.stats.next_block();
        let slot = self.ring.place(block.len())?;
        self.ring.as_mut_slice()[slot.clone()].copy_from_slice(block);

        let n = self
            .codec
            .compress(self.ring.as_slice(), slot.clone(), &mut self.scratch)
            .map_err(|source| Error::Codec {
                block: index,
                source,
            })?;
        if n > self.bound {
            return Err(Error::OutputBound {
                block: index,
                size: n,
                bound: self.bound,
            });
        }

        self.frames.emit(&self.scratch[..n], block.len())?;
        self.stats.record(block, n);

        tracing::debug!(
            block = index,
            offset = slot.start,
            original = block.len(),
            compressed = n,
            "encoded block"
        );
        Ok(())
    }

    /// Frame any buffered bytes as a block
    fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let pending = std::mem::take(&mut self.pending);
        let result = self.write_block(&pending);
        self.pending = pending;
        self.pending.clear();
        result
    }

    /// Frame buffered bytes, flush the sink and return it with the totals
    pub fn finish(mut self) -> Result<(W, SessionSummary)> {
        self.flush_pending()?;
        if self.failed {
            return Err(Error::SessionAborted);
        }
        self.frames.flush()?;

        let summary = self.summary();
        tracing::debug!(
            blocks = summary.blocks,
            plaintext = summary.plaintext_bytes,
            framed = summary.frame_bytes,
            "encode session finished"
        );
        Ok((self.frames.into_inner(), summary))
    }

    /// Totals for the blocks framed so far
    pub fn summary(&self) -> SessionSummary {
        self.stats.summary(self.frames.bytes_written(), self.ring.wraps())
    }

    /// Index the next block will be framed under
    pub fn block_index(&self) -> u64 {
        self.stats.next_block()
    }

    /// Largest block this encoder accepts
    pub fn max_block_size(&self) -> usize {
        self.ring.max_block_size()
    }

    /// Get a reference to the underlying writer
    pub fn get_ref(&self) -> &W {
        self.frames.get_ref()
    }

    /// Get a mutable reference to the underlying writer
    ///
    /// Writing to it directly corrupts the stream.
    pub fn get_mut(&mut self) -> &mut W {
        self.frames.get_mut()
    }
}

impl<W: Write, C: BlockCompressor> Write for Encoder<W, C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.failed {
            return Err(Error::SessionAborted.into());
        }

        let max = self.ring.max_block_size();
        let mut written = 0;

        while written < buf.len() {
            let space = max - self.pending.len();
            if space == 0 {
                self.flush_pending()?;
                continue;
            }

            let take = space.min(buf.len() - written);
            self.pending.extend_from_slice(&buf[written..written + take]);
            written += take;
        }

        if self.pending.len() == max {
            self.flush_pending()?;
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.frames.flush()
    }
}

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! # Ring-buffer LZ4 block streams
//!
//! This library compresses a long logical byte stream as a sequence of
//! independently framed LZ4 blocks. Every block may reference the plaintext
//! of earlier blocks as dictionary, without that history ever being sent
//! again: encoder and decoder each keep the recent plaintext in a ring buffer
//! of fixed capacity, and place every block at the same ring offset.
//!
//! It provides:
//! - Bounded-memory dictionary continuity across any number of blocks
//! - A minimal self-describing record format (`u32` LE compressed size,
//!   `u32` LE original size, payload)
//! - Block-level and `std::io` streaming interfaces
//! - Per-session totals with a CRC-32 of the plaintext
//!
//! ## Example
//!
//! ```rust
//! use ringlz::{decode_blocks, encode_blocks, StreamConfig};
//!
//! let pattern = b"The quick brown fox jumps over the lazy dog. ".repeat(50);
//! let blocks = vec![pattern.clone(); 5];
//!
//! let config = StreamConfig::default();
//! let stream = encode_blocks(&blocks, &config).expect("encoding failed");
//! let decoded = decode_blocks(&stream, &config).expect("decoding failed");
//! assert_eq!(decoded, blocks);
//! ```

mod codec;
mod config;
mod constants;
mod decoder;
mod encoder;
mod error;
mod frame;
mod history;
mod ring;
mod stats;

pub use codec::{BlockCompressor, BlockDecompressor, Lz4Compressor, Lz4Decompressor};
pub use config::StreamConfig;
pub use constants::{
    DEFAULT_MAX_BLOCK_SIZE, DEFAULT_RING_CAPACITY, FRAME_HEADER_SIZE, MAX_BLOCK_SIZE,
    MIN_BLOCK_SIZE, WINDOW_SIZE,
};
pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{CodecError, Error, ErrorKind, Result};
pub use frame::{FrameHeader, FrameReader, FrameRecord, FrameWriter};
pub use ring::RingWindow;
pub use stats::SessionSummary;

/// Encode `blocks` into a framed stream held in memory
pub fn encode_blocks<B: AsRef<[u8]>>(blocks: &[B], config: &StreamConfig) -> Result<Vec<u8>> {
    let mut encoder = Encoder::with_config(Vec::new(), *config)?;
    for block in blocks {
        encoder.write_block(block.as_ref())?;
    }
    let (stream, _) = encoder.finish()?;
    Ok(stream)
}

/// Decode every block of an in-memory framed stream
pub fn decode_blocks(stream: &[u8], config: &StreamConfig) -> Result<Vec<Vec<u8>>> {
    let mut decoder = Decoder::with_config(stream, *config)?;
    let mut blocks = Vec::new();
    while let Some(block) = decoder.next_block()? {
        blocks.push(block.to_vec());
    }
    Ok(blocks)
}

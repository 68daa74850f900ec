// Copyright 2024 Karpeles Lab Inc.
// Per-session accounting

use crc32fast::Hasher;

/// Totals for a finished or in-progress session
///
/// An encoder and a decoder that processed the same stream report equal
/// `blocks`, `plaintext_bytes`, `payload_bytes`, `frame_bytes` and
/// `plaintext_crc32`, which lets a transfer be verified out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    /// Blocks processed
    pub blocks: u64,
    /// Uncompressed bytes processed
    pub plaintext_bytes: u64,
    /// Compressed payload bytes, headers excluded
    pub payload_bytes: u64,
    /// Bytes of framed stream, headers included
    pub frame_bytes: u64,
    /// Times the ring cursor returned to zero
    pub ring_wraps: u64,
    /// CRC-32 (IEEE) of all plaintext, in block order
    pub plaintext_crc32: u32,
}

impl SessionSummary {
    /// Framed size relative to plaintext size
    pub fn compression_ratio(&self) -> f64 {
        if self.plaintext_bytes == 0 {
            return 0.0;
        }
        self.frame_bytes as f64 / self.plaintext_bytes as f64
    }
}

#[derive(Clone, Default)]
pub(crate) struct SessionStats {
    blocks: u64,
    plaintext_bytes: u64,
    payload_bytes: u64,
    hasher: Hasher,
}

impl SessionStats {
    pub(crate) fn new() -> Self {
        SessionStats::default()
    }

    pub(crate) fn record(&mut self, plaintext: &[u8], payload_len: usize) {
        self.blocks += 1;
        self.plaintext_bytes += plaintext.len() as u64;
        self.payload_bytes += payload_len as u64;
        self.hasher.update(plaintext);
    }

    /// Index the next block will get
    pub(crate) fn next_block(&self) -> u64 {
        self.blocks
    }

    pub(crate) fn summary(&self, frame_bytes: u64, ring_wraps: u64) -> SessionSummary {
        SessionSummary {
            blocks: self.blocks,
            plaintext_bytes: self.plaintext_bytes,
            payload_bytes: self.payload_bytes,
            frame_bytes,
            ring_wraps,
            plaintext_crc32: self.hasher.clone().finalize(),
        }
    }
}

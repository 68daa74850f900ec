// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Session configuration shared by encoder and decoder

use crate::constants::*;
use crate::error::{Error, Result};

/// Block and ring sizing for a session
///
/// Encoder and decoder must be built from equal configurations: the ring
/// placement of every block depends on both values, and the decoder can only
/// resolve dictionary references if its ring advances exactly like the
/// encoder's did.
///
/// # Example
///
/// ```
/// use ringlz::StreamConfig;
///
/// let config = StreamConfig::new(16 * 1024)
///     .unwrap()
///     .with_ring_capacity(64 * 1024)
///     .unwrap();
/// assert_eq!(config.max_block_size(), 16 * 1024);
/// assert_eq!(config.ring_capacity(), 64 * 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    max_block_size: usize,
    ring_capacity: usize,
}

impl StreamConfig {
    /// Create a configuration for a given maximum block size
    ///
    /// The ring capacity defaults to 128KB of history (or one block, if
    /// larger) plus one block of wraparound margin.
    pub fn new(max_block_size: usize) -> Result<Self> {
        let history = max_block_size.max(128 << 10);
        let config = StreamConfig {
            max_block_size,
            ring_capacity: history.saturating_add(max_block_size),
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace the ring capacity
    ///
    /// The capacity must hold at least two maximum-size blocks.
    pub fn with_ring_capacity(mut self, ring_capacity: usize) -> Result<Self> {
        self.ring_capacity = ring_capacity;
        self.validate()?;
        Ok(self)
    }

    /// Check the invariants the ring placement relies on
    pub fn validate(&self) -> Result<()> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&self.max_block_size) {
            return Err(Error::InvalidConfig(format!(
                "max block size {} outside {}..={}",
                self.max_block_size, MIN_BLOCK_SIZE, MAX_BLOCK_SIZE
            )));
        }

        let min_ring = self
            .max_block_size
            .checked_mul(2)
            .ok_or_else(|| Error::InvalidConfig("max block size overflows".into()))?;
        if self.ring_capacity < min_ring {
            return Err(Error::InvalidConfig(format!(
                "ring capacity {} must be at least twice the max block size ({})",
                self.ring_capacity, min_ring
            )));
        }

        Ok(())
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn ring_capacity(&self) -> usize {
        self.ring_capacity
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        StreamConfig {
            max_block_size: DEFAULT_MAX_BLOCK_SIZE,
            ring_capacity: DEFAULT_RING_CAPACITY,
        }
    }
}

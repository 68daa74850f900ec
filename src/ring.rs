// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Ring buffer that stores recent plaintext as the compression dictionary
//!
//! Each block is placed contiguously so the codec can reference earlier bytes
//! by index. Placement depends only on the sequence of block lengths, so an
//! encoder and a decoder fed the same lengths walk through identical offsets.

use std::ops::Range;

use crate::config::StreamConfig;
use crate::error::{Error, Result};

/// Fixed-capacity plaintext window for one direction of a session
pub struct RingWindow {
    buf: Box<[u8]>,
    max_block_size: usize,
    offset: usize,
    placed: u64,
    wraps: u64,
}

impl RingWindow {
    /// Allocate a window sized by `config`
    pub fn new(config: &StreamConfig) -> Result<Self> {
        config.validate()?;
        let capacity = config.ring_capacity();

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| Error::Allocation {
                what: "ring window",
                requested: capacity,
            })?;
        buf.resize(capacity, 0);

        Ok(RingWindow {
            buf: buf.into_boxed_slice(),
            max_block_size: config.max_block_size(),
            offset: 0,
            placed: 0,
            wraps: 0,
        })
    }

    /// Reserve the slot for the next block of `len` bytes
    ///
    /// The block goes at the current cursor. The cursor then advances by
    /// `len` and returns to zero once fewer than `max_block_size` bytes
    /// remain before the end of storage, so no block ever straddles the end.
    pub fn place(&mut self, len: usize) -> Result<Range<usize>> {
        if len > self.max_block_size {
            return Err(Error::BlockTooLarge {
                len,
                max: self.max_block_size,
            });
        }

        let start = self.offset;
        self.offset += len;
        if self.offset >= self.buf.len() - self.max_block_size {
            self.offset = 0;
            self.wraps += 1;
            tracing::trace!(
                block_start = start,
                block_len = len,
                "ring cursor wrapped to start"
            );
        }
        self.placed += len as u64;

        debug_assert!(start + len <= self.buf.len());
        Ok(start..start + len)
    }

    /// Offset the next block will be placed at
    pub fn cursor(&self) -> usize {
        self.offset
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Total plaintext bytes placed since creation
    pub fn bytes_placed(&self) -> u64 {
        self.placed
    }

    /// Number of times the cursor returned to zero
    pub fn wraps(&self) -> u64 {
        self.wraps
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(max_block: usize, capacity: usize) -> RingWindow {
        let config = StreamConfig::new(max_block)
            .unwrap()
            .with_ring_capacity(capacity)
            .unwrap();
        RingWindow::new(&config).unwrap()
    }

    #[test]
    fn test_sequential_placement() {
        let mut ring = RingWindow::new(&StreamConfig::default()).unwrap();
        for i in 0..5 {
            let slot = ring.place(2250).unwrap();
            assert_eq!(slot, i * 2250..(i + 1) * 2250);
        }
        assert_eq!(ring.cursor(), 5 * 2250);
        assert_eq!(ring.wraps(), 0);
        assert_eq!(ring.bytes_placed(), 5 * 2250);
    }

    #[test]
    fn test_wraps_when_margin_reached() {
        // capacity 4096, margin 1024: cursor resets once it reaches 3072
        let mut ring = window(1024, 4096);
        assert_eq!(ring.place(1000).unwrap(), 0..1000);
        assert_eq!(ring.place(1000).unwrap(), 1000..2000);
        assert_eq!(ring.place(1000).unwrap(), 2000..3000);
        assert_eq!(ring.cursor(), 3000);
        assert_eq!(ring.place(100).unwrap(), 3000..3100);
        assert_eq!(ring.cursor(), 0);
        assert_eq!(ring.wraps(), 1);
        assert_eq!(ring.place(1024).unwrap(), 0..1024);
    }

    #[test]
    fn test_full_blocks_alternate() {
        let mut ring = window(1024, 3072);
        let starts: Vec<usize> = (0..6).map(|_| ring.place(1024).unwrap().start).collect();
        assert_eq!(starts, vec![0, 1024, 0, 1024, 0, 1024]);
    }

    #[test]
    fn test_never_straddles_end() {
        let mut ring = window(1000, 2500);
        let lens = [999, 1, 1000, 7, 500, 1000, 1000, 3, 998, 1000];
        for _ in 0..50 {
            for &len in &lens {
                let slot = ring.place(len).unwrap();
                assert!(slot.end <= ring.capacity());
                assert!(ring.cursor() < ring.capacity() - ring.max_block_size());
            }
        }
    }

    #[test]
    fn test_rejects_oversized_block() {
        let mut ring = window(1024, 4096);
        ring.place(10).unwrap();
        let err = ring.place(1025).unwrap_err();
        assert!(matches!(err, Error::BlockTooLarge { len: 1025, max: 1024 }));
        // a rejected block does not move the cursor
        assert_eq!(ring.cursor(), 10);
    }

    #[test]
    fn test_independent_windows_are_congruent() {
        let mut enc = window(512, 1500);
        let mut dec = window(512, 1500);
        for len in (0..200).map(|i| (i * 37) % 513) {
            assert_eq!(enc.place(len).unwrap(), dec.place(len).unwrap());
        }
        assert_eq!(enc.wraps(), dec.wraps());
    }

    #[test]
    fn test_default_window_does_not_wrap_for_small_blocks() {
        let mut ring = RingWindow::new(&StreamConfig::default()).unwrap();
        for _ in 0..5 {
            ring.place(2250).unwrap();
        }
        assert_eq!(ring.wraps(), 0);
    }
}

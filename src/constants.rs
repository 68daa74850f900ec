// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Default maximum plaintext block size (64KB)
pub const DEFAULT_MAX_BLOCK_SIZE: usize = 64 << 10;

/// Default ring capacity: 128KB of history plus one block of margin
pub const DEFAULT_RING_CAPACITY: usize = (128 << 10) + DEFAULT_MAX_BLOCK_SIZE;

/// Smallest configurable block size
pub const MIN_BLOCK_SIZE: usize = 16;

/// Largest configurable block size (4MB)
pub const MAX_BLOCK_SIZE: usize = 4 << 20;

/// Furthest back an LZ4 match may reference (64KB)
pub const WINDOW_SIZE: usize = 64 << 10;

/// Frame header: compressed size (u32 LE) + original size (u32 LE)
pub const FRAME_HEADER_SIZE: usize = 8;

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Decode session: record reading, ring placement and decompression

use std::io::{self, Read};
use std::ops::Range;

use crate::codec::{BlockDecompressor, Lz4Decompressor};
use crate::config::StreamConfig;
use crate::error::{Error, Result};
use crate::frame::FrameReader;
use crate::ring::RingWindow;
use crate::stats::{SessionStats, SessionSummary};

/// Decoder reconstructs blocks from a framed stream
///
/// The decoder must use the same [`StreamConfig`] as the encoder that
/// produced the stream. Each record is decompressed straight into its ring
/// slot, so the returned blocks borrow from the ring and stay valid until the
/// next call.
///
/// The decoder also implements [`std::io::Read`], yielding the concatenated
/// plaintext of all blocks.
///
/// # Example
///
/// ```
/// use ringlz::{Decoder, Encoder};
/// use std::io::{Read, Write};
///
/// let mut encoder = Encoder::new(Vec::new()).unwrap();
/// encoder.write_all(b"Hello, ring buffer!").unwrap();
/// let (stream, _) = encoder.finish().unwrap();
///
/// let mut decoder = Decoder::new(&stream[..]).unwrap();
/// let mut out = Vec::new();
/// decoder.read_to_end(&mut out).unwrap();
/// assert_eq!(out, b"Hello, ring buffer!");
/// ```
pub struct Decoder<R: Read, D: BlockDecompressor = Lz4Decompressor> {
    frames: FrameReader<R>,
    ring: RingWindow,
    codec: D,
    payload: Vec<u8>,
    current: Range<usize>,
    pos: usize,
    stats: SessionStats,
    failed: bool,
    finished: bool,
}

impl<R: Read> Decoder<R> {
    /// Create an LZ4 decoder with the default configuration
    pub fn new(reader: R) -> Result<Self> {
        Self::with_config(reader, StreamConfig::default())
    }

    /// Create an LZ4 decoder with a specific configuration
    pub fn with_config(reader: R, config: StreamConfig) -> Result<Self> {
        Self::with_codec(reader, config, Lz4Decompressor::new())
    }
}

impl<R: Read, D: BlockDecompressor> Decoder<R, D> {
    /// Create a decoder around an arbitrary block decompressor
    pub fn with_codec(reader: R, config: StreamConfig, codec: D) -> Result<Self> {
        let ring = RingWindow::new(&config)?;
        let max_payload = codec.max_compressed_len(config.max_block_size());

        Ok(Decoder {
            frames: FrameReader::with_limits(reader, config.max_block_size(), max_payload),
            ring,
            codec,
            payload: Vec::new(),
            current: 0..0,
            pos: 0,
            stats: SessionStats::new(),
            failed: false,
            finished: false,
        })
    }

    /// Decode the next block
    ///
    /// Returns `None` once the stream ends cleanly at a record boundary. Any
    /// error aborts the session.
    pub fn next_block(&mut self) -> Result<Option<&[u8]>> {
        if self.failed {
            return Err(Error::SessionAborted);
        }
        if self.finished {
            return Ok(None);
        }

        match self.decode_block() {
            Ok(Some(slot)) => {
                self.current = slot.clone();
                self.pos = slot.end;
                Ok(Some(&self.ring.as_slice()[slot]))
            }
            Ok(None) => {
                self.finished = true;
                tracing::debug!(
                    blocks = self.stats.next_block(),
                    framed = self.frames.bytes_read(),
                    "end of stream"
                );
                Ok(None)
            }
            Err(e) => {
                self.failed = true;
                tracing::warn!(
                    block = self.stats.next_block(),
                    error = %e,
                    "aborting decode session"
                );
                Err(e)
            }
        }
    }

    fn decode_block(&mut self) -> Result<Option<Range<usize>>> {
        let index = self.stats.next_block();
        let header = match self.frames.read_header()? {
            Some(header) => header,
            None => return Ok(None),
        };
        self.frames.read_payload(&header, &mut self.payload)?;

        let expected = header.original_size as usize;
        let slot = self.ring.place(expected)?;
        let n = self
            .codec
            .decompress(&self.payload, self.ring.as_mut_slice(), slot.clone())
            .map_err(|source| Error::Codec {
                block: index,
                source,
            })?;
        if n != expected {
            return Err(Error::IntegrityMismatch {
                block: index,
                expected,
                actual: n,
            });
        }

        self.stats
            .record(&self.ring.as_slice()[slot.clone()], self.payload.len());
        tracing::debug!(
            block = index,
            offset = slot.start,
            compressed = self.payload.len(),
            original = expected,
            "decoded block"
        );
        Ok(Some(slot))
    }

    /// Totals for the blocks decoded so far
    pub fn summary(&self) -> SessionSummary {
        self.stats.summary(self.frames.bytes_read(), self.ring.wraps())
    }

    /// Index the next decoded block will get
    pub fn block_index(&self) -> u64 {
        self.stats.next_block()
    }

    /// Get a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        self.frames.get_ref()
    }

    /// Consume the decoder and return the underlying reader
    pub fn into_inner(self) -> R {
        self.frames.into_inner()
    }
}

impl<R: Read, D: BlockDecompressor> Read for Decoder<R, D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.pos >= self.current.end {
            if self.next_block()?.is_none() {
                return Ok(0);
            }
            self.pos = self.current.start;
        }

        let available = &self.ring.as_slice()[self.pos..self.current.end];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameWriter;
    use crate::{Encoder, ErrorKind};

    const PATTERN: &[u8] = b"The quick brown fox jumps over the lazy dog. ";

    fn encode(blocks: &[Vec<u8>], config: StreamConfig) -> Vec<u8> {
        let mut encoder = Encoder::with_config(Vec::new(), config).unwrap();
        for block in blocks {
            encoder.write_block(block).unwrap();
        }
        encoder.finish().unwrap().0
    }

    #[test]
    fn test_blocks_come_back_in_order() {
        let blocks: Vec<Vec<u8>> = (1..=4).map(|i| PATTERN.repeat(i * 10)).collect();
        let stream = encode(&blocks, StreamConfig::default());

        let mut decoder = Decoder::new(&stream[..]).unwrap();
        for block in &blocks {
            assert_eq!(decoder.next_block().unwrap(), Some(&block[..]));
        }
        assert_eq!(decoder.next_block().unwrap(), None);
        assert_eq!(decoder.next_block().unwrap(), None);
        assert_eq!(decoder.summary().blocks, 4);
    }

    #[test]
    fn test_summaries_match_encoder() {
        let blocks: Vec<Vec<u8>> = (0..30).map(|i| PATTERN.repeat(5 + i % 7)).collect();
        let config = StreamConfig::new(512).unwrap().with_ring_capacity(1200).unwrap();

        let mut encoder = Encoder::with_config(Vec::new(), config).unwrap();
        for block in &blocks {
            encoder.write_block(block).unwrap();
        }
        let (stream, enc_summary) = encoder.finish().unwrap();
        assert!(enc_summary.ring_wraps > 0);

        let mut decoder = Decoder::with_config(&stream[..], config).unwrap();
        while decoder.next_block().unwrap().is_some() {}
        assert_eq!(decoder.summary(), enc_summary);
    }

    #[test]
    fn test_short_output_is_integrity_mismatch() {
        // a valid LZ4 block for "abc" whose record claims four bytes
        let mut stream = Vec::new();
        FrameWriter::new(&mut stream)
            .emit(&[0x30, b'a', b'b', b'c'], 4)
            .unwrap();

        let mut decoder = Decoder::new(&stream[..]).unwrap();
        let err = decoder.next_block().unwrap_err();
        assert!(matches!(
            err,
            Error::IntegrityMismatch {
                block: 0,
                expected: 4,
                actual: 3
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Integrity);
        let again = decoder.next_block().unwrap_err();
        assert!(matches!(again, Error::SessionAborted));
        assert_eq!(again.kind(), ErrorKind::Aborted);
    }

    #[test]
    fn test_corrupt_payload_is_codec_failure() {
        // match offset 0x0100 with nothing before it
        let mut stream = Vec::new();
        FrameWriter::new(&mut stream)
            .emit(&[0x04, 0x00, 0x01, 0x10, b'x'], 64)
            .unwrap();

        let mut decoder = Decoder::new(&stream[..]).unwrap();
        let err = decoder.next_block().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Codec);
        assert_eq!(err.block(), Some(0));
    }

    #[test]
    fn test_oversized_record_rejected_before_allocation() {
        let mut stream = Vec::new();
        stream.extend_from_slice(&16u32.to_le_bytes());
        stream.extend_from_slice(&(1u32 << 20).to_le_bytes());
        stream.extend_from_slice(&[0u8; 16]);

        let mut decoder = Decoder::new(&stream[..]).unwrap();
        let err = decoder.next_block().unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { block: 0, .. }));
        assert_eq!(err.kind(), ErrorKind::Framing);
    }

    #[test]
    fn test_read_spans_blocks() {
        let config = StreamConfig::new(100).unwrap();
        let mut encoder = Encoder::with_config(Vec::new(), config).unwrap();
        let data = PATTERN.repeat(11);
        std::io::Write::write_all(&mut encoder, &data).unwrap();
        let (stream, summary) = encoder.finish().unwrap();
        assert_eq!(summary.blocks, 5);

        let mut decoder = Decoder::with_config(&stream[..], config).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 7];
        loop {
            let n = decoder.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data);
    }
}

// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Length-prefixed block records
//!
//! Every record is laid out as:
//!
//! ```text
//! u32 LE  compressed size
//! u32 LE  original size
//! [u8]    compressed payload (exactly `compressed size` bytes)
//! ```
//!
//! Records follow each other with no stream header, version tag, checksum or
//! block count. A stream ends cleanly only where a new record would begin.

use std::io::{self, Read, Write};

use crate::constants::FRAME_HEADER_SIZE;
use crate::error::{Error, Result};

/// Size fields that precede every payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub compressed_size: u32,
    pub original_size: u32,
}

impl FrameHeader {
    pub fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        let mut out = [0u8; FRAME_HEADER_SIZE];
        out[..4].copy_from_slice(&self.compressed_size.to_le_bytes());
        out[4..].copy_from_slice(&self.original_size.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; FRAME_HEADER_SIZE]) -> Self {
        FrameHeader {
            compressed_size: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            original_size: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

/// One complete record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    pub original_size: u32,
    pub payload: Vec<u8>,
}

impl FrameRecord {
    pub fn compressed_size(&self) -> usize {
        self.payload.len()
    }
}

/// FrameWriter appends records to a byte sink
pub struct FrameWriter<W: Write> {
    writer: W,
    records: u64,
    bytes: u64,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        FrameWriter {
            writer,
            records: 0,
            bytes: 0,
        }
    }

    /// Append one record for `payload`, produced from `original_len` bytes
    ///
    /// On failure the sink holds an unknown prefix of the record and the
    /// stream cannot be resumed.
    pub fn emit(&mut self, payload: &[u8], original_len: usize) -> Result<()> {
        let block = self.records;
        let header = FrameHeader {
            compressed_size: size_field(payload.len(), block, "compressed size")?,
            original_size: size_field(original_len, block, "original size")?,
        };

        self.writer
            .write_all(&header.to_bytes())
            .and_then(|()| self.writer.write_all(payload))
            .map_err(|source| Error::Write { block, source })?;

        self.records += 1;
        self.bytes += (FRAME_HEADER_SIZE + payload.len()) as u64;
        Ok(())
    }

    /// Number of records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes written so far, headers included
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn size_field(len: usize, block: u64, field: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| Error::MalformedRecord {
        block,
        reason: format!("{} {} does not fit in 32 bits", field, len),
    })
}

/// FrameReader pulls records, in order, from a byte source
///
/// Records are validated against size limits before any payload buffer is
/// allocated, so a corrupt length field cannot trigger a huge allocation.
pub struct FrameReader<R: Read> {
    reader: R,
    max_original: usize,
    max_compressed: usize,
    records: u64,
    bytes: u64,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    /// Create a reader that accepts any size representable in the header
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, u32::MAX as usize, u32::MAX as usize)
    }

    /// Create a reader that rejects records larger than the given limits
    pub fn with_limits(reader: R, max_original: usize, max_compressed: usize) -> Self {
        FrameReader {
            reader,
            max_original,
            max_compressed,
            records: 0,
            bytes: 0,
            done: false,
        }
    }

    /// Read the next record header
    ///
    /// Returns `None` when the source is exhausted exactly at a record
    /// boundary.
    pub fn read_header(&mut self) -> Result<Option<FrameHeader>> {
        let block = self.records;
        let mut buf = [0u8; FRAME_HEADER_SIZE];
        let n = fill(&mut self.reader, &mut buf).map_err(|source| Error::Read { block, source })?;

        match n {
            0 => return Ok(None),
            1..=3 => {
                return Err(Error::TruncatedRecord {
                    block,
                    field: "compressed size",
                })
            }
            4..=7 => {
                return Err(Error::TruncatedRecord {
                    block,
                    field: "original size",
                })
            }
            _ => {}
        }

        let header = FrameHeader::from_bytes(buf);
        if header.original_size as usize > self.max_original {
            return Err(Error::MalformedRecord {
                block,
                reason: format!(
                    "original size {} exceeds limit {}",
                    header.original_size, self.max_original
                ),
            });
        }
        if header.compressed_size as usize > self.max_compressed {
            return Err(Error::MalformedRecord {
                block,
                reason: format!(
                    "compressed size {} exceeds limit {}",
                    header.compressed_size, self.max_compressed
                ),
            });
        }

        self.bytes += FRAME_HEADER_SIZE as u64;
        Ok(Some(header))
    }

    /// Read the payload announced by `header` into `payload`
    pub fn read_payload(&mut self, header: &FrameHeader, payload: &mut Vec<u8>) -> Result<()> {
        let block = self.records;
        let len = header.compressed_size as usize;

        // grow with the bytes actually present, not with the declared size
        payload.clear();
        let n = (&mut self.reader)
            .take(len as u64)
            .read_to_end(payload)
            .map_err(|source| Error::Read { block, source })?;
        if n < len {
            return Err(Error::TruncatedRecord {
                block,
                field: "payload",
            });
        }

        self.records += 1;
        self.bytes += len as u64;
        Ok(())
    }

    /// Read the next full record, or `None` at a clean end of stream
    pub fn next_record(&mut self) -> Result<Option<FrameRecord>> {
        let header = match self.read_header()? {
            Some(h) => h,
            None => return Ok(None),
        };
        let mut payload = Vec::new();
        self.read_payload(&header, &mut payload)?;
        Ok(Some(FrameRecord {
            original_size: header.original_size,
            payload,
        }))
    }

    /// Number of complete records read so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Bytes consumed so far
    pub fn bytes_read(&self) -> u64 {
        self.bytes
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<FrameRecord>;

    /// Yields records until the end of the stream or the first error
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.next_record().transpose();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

/// Read until `buf` is full or the source reports end of data
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

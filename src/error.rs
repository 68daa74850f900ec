// Copyright 2024 Karpeles Lab Inc.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::io;

use thiserror::Error;

/// Result type for ring stream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by a block codec
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

impl CodecError {
    pub fn new(msg: impl Into<String>) -> Self {
        CodecError(msg.into())
    }
}

/// Broad category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Allocation or I/O setup failed; the session never started
    Resource,
    /// The codec rejected a block
    Codec,
    /// A record could not be read or written
    Framing,
    /// A block decoded to a different length than its record declares
    Integrity,
    /// The caller supplied an invalid configuration or block
    Config,
    /// The session already failed; the first error carries the cause
    Aborted,
}

/// Error types for ring stream sessions
#[derive(Debug, Error)]
pub enum Error {
    /// The configuration is inconsistent
    #[error("ringlz: invalid configuration: {0}")]
    InvalidConfig(String),

    /// A block is larger than the configured maximum block size
    #[error("ringlz: block of {len} bytes exceeds maximum block size {max}")]
    BlockTooLarge { len: usize, max: usize },

    /// A buffer could not be allocated
    #[error("ringlz: failed to allocate {requested} bytes for {what}")]
    Allocation { what: &'static str, requested: usize },

    /// The codec failed on a block
    #[error("ringlz: block {block}: codec failure: {source}")]
    Codec {
        block: u64,
        #[source]
        source: CodecError,
    },

    /// The compressed block does not fit the configured output bound
    #[error("ringlz: block {block}: compressed size {size} exceeds output bound {bound}")]
    OutputBound { block: u64, size: usize, bound: usize },

    /// The stream ended in the middle of a record
    #[error("ringlz: block {block}: truncated record, missing {field}")]
    TruncatedRecord { block: u64, field: &'static str },

    /// A record declares sizes the reader refuses to accept
    #[error("ringlz: block {block}: malformed record: {reason}")]
    MalformedRecord { block: u64, reason: String },

    /// Reading a record from the source failed
    #[error("ringlz: block {block}: read failed: {source}")]
    Read {
        block: u64,
        #[source]
        source: io::Error,
    },

    /// Writing a record to the sink failed
    #[error("ringlz: block {block}: write failed: {source}")]
    Write {
        block: u64,
        #[source]
        source: io::Error,
    },

    /// The decoded length disagrees with the record
    #[error("ringlz: block {block}: decoded {actual} bytes, record declares {expected}")]
    IntegrityMismatch {
        block: u64,
        expected: usize,
        actual: usize,
    },

    /// A previous fatal error already ended this session
    #[error("ringlz: session aborted after an earlier failure")]
    SessionAborted,

    /// Underlying I/O error outside of record processing
    #[error("ringlz: I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Allocation { .. } | Error::Io(_) => ErrorKind::Resource,
            Error::Codec { .. } => ErrorKind::Codec,
            Error::TruncatedRecord { .. }
            | Error::MalformedRecord { .. }
            | Error::Read { .. }
            | Error::Write { .. } => ErrorKind::Framing,
            Error::SessionAborted => ErrorKind::Aborted,
            Error::IntegrityMismatch { .. } => ErrorKind::Integrity,
            Error::InvalidConfig(_) | Error::BlockTooLarge { .. } | Error::OutputBound { .. } => {
                ErrorKind::Config
            }
        }
    }

    /// Index of the block that failed, when the error is block scoped
    pub fn block(&self) -> Option<u64> {
        match self {
            Error::Codec { block, .. }
            | Error::OutputBound { block, .. }
            | Error::TruncatedRecord { block, .. }
            | Error::MalformedRecord { block, .. }
            | Error::Read { block, .. }
            | Error::Write { block, .. }
            | Error::IntegrityMismatch { block, .. } => Some(*block),
            _ => None,
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(e) => e,
            Error::Read { source, .. } | Error::Write { source, .. } => source,
            Error::TruncatedRecord { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

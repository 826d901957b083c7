use std::fmt;

use cookie_factory::GenError;
use nom::error::{ErrorKind, FromExternalError, ParseError};
use thiserror::Error;

/// Errors raised while building blocks or writing a capture file
#[derive(Debug, Error)]
pub enum PcapNGWriteError {
    /// A size or other argument is out of range
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input record lacks a field required to build a packet block
    #[error("invalid record: {0}")]
    InvalidRecord(&'static str),

    /// A blob carrying the radio metadata signature is too short to decode
    #[error("malformed radio metadata: {len} bytes, expected at least 48")]
    MalformedMetadata { len: usize },

    /// The writer has already been finalized
    #[error("capture writer is not open")]
    NotOpen,

    /// `finalize` was called more than once
    #[error("capture writer is already closed")]
    AlreadyClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization failed: {0:?}")]
    Serialize(GenError),
}

impl From<GenError> for PcapNGWriteError {
    fn from(e: GenError) -> Self {
        match e {
            GenError::IoError(e) => PcapNGWriteError::Io(e),
            e => PcapNGWriteError::Serialize(e),
        }
    }
}

/// Result type for writer operations
pub type Result<T> = std::result::Result<T, PcapNGWriteError>;

/// Errors raised by the read-back parsers
#[derive(Debug, PartialEq)]
pub enum PcapNGParseError<I> {
    /// The byte-order magic of the section header is not the little-endian one
    HeaderNotRecognized,
    /// The block type code does not match the expected block
    UnexpectedBlockType(u32),
    /// The trailing block length differs from the leading one
    BlockLengthMismatch { head: u32, tail: u32 },

    NomError(I, ErrorKind),
}

impl<I> ParseError<I> for PcapNGParseError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        PcapNGParseError::NomError(input, kind)
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<I, E> FromExternalError<I, E> for PcapNGParseError<I> {
    fn from_external_error(input: I, kind: ErrorKind, _e: E) -> Self {
        PcapNGParseError::NomError(input, kind)
    }
}

impl<I> fmt::Display for PcapNGParseError<I> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PcapNGParseError::HeaderNotRecognized => write!(f, "header not recognized"),
            PcapNGParseError::UnexpectedBlockType(t) => {
                write!(f, "unexpected block type 0x{:08x}", t)
            }
            PcapNGParseError::BlockLengthMismatch { head, tail } => {
                write!(f, "block length mismatch ({} != {})", head, tail)
            }
            PcapNGParseError::NomError(_, kind) => write!(f, "parse error: {:?}", kind),
        }
    }
}

impl<I: fmt::Debug> std::error::Error for PcapNGParseError<I> {}

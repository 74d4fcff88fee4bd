//! Error types for the unflate library.

use std::fmt;

/// Result type alias for unflate operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decompressing a stream.
///
/// Every variant is fatal to the [`Inflater`](crate::Inflater) that
/// reported it: later `decompress` calls return the same error again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Encoding name not recognized when parsing a [`Format`](crate::Format).
    InvalidEncoding(String),
    /// Malformed zlib/gzip header or stored-block framing.
    BadHeader(&'static str),
    /// Compression method other than DEFLATE (CM != 8) in a wrapper header.
    UnsupportedMethod(u8),
    /// Stream feature the decoder does not support (preset dictionary).
    Unsupported(&'static str),
    /// Reserved block type (BTYPE = 3).
    InvalidBlockType,
    /// Code lengths that do not describe a usable prefix code.
    InvalidHuffman,
    /// Distance reaching past the produced output, or a reserved
    /// length/distance code (286, 287, 30, 31).
    InvalidDistance,
    /// Trailer checksum or length field does not match the output.
    ChecksumMismatch {
        /// Value stored in the stream trailer.
        expected: u32,
        /// Value computed from the decompressed output.
        actual: u32,
    },
    /// Input supplied after the final block and trailer were consumed.
    StreamClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidEncoding(name) => {
                write!(f, "Unknown encoding {name:?}: expected raw, zlib, or gzip")
            }
            Error::BadHeader(what) => {
                write!(f, "Malformed stream: {what}")
            }
            Error::UnsupportedMethod(cm) => {
                write!(f, "Unsupported compression method {cm}: only DEFLATE (8)")
            }
            Error::Unsupported(what) => {
                write!(f, "Unsupported stream feature: {what}")
            }
            Error::InvalidBlockType => {
                write!(f, "Reserved block type 3")
            }
            Error::InvalidHuffman => {
                write!(f, "Invalid Huffman code lengths")
            }
            Error::InvalidDistance => {
                write!(f, "Back-reference distance outside the produced output")
            }
            Error::ChecksumMismatch { expected, actual } => {
                write!(
                    f,
                    "Checksum mismatch: stream says {expected:08X}, output gives {actual:08X}"
                )
            }
            Error::StreamClosed => {
                write!(f, "Input past the end of the compressed stream")
            }
        }
    }
}

impl std::error::Error for Error {}

//! # unflate
//!
//! A streaming decompressor for DEFLATE (RFC 1951), zlib (RFC 1950), and
//! gzip (RFC 1952) with hand-implemented Huffman decoding, bit-level I/O,
//! and checksums.
//!
//! ## Features
//!
//! - **Zero runtime dependencies**
//! - **Chunked input**: feed the compressed stream in pieces of any size,
//!   down to one byte, with no alignment requirements
//! - **Explicit suspension**: end-of-input mid-symbol is ordinary state,
//!   resumed exactly on the next call
//! - **Wrapper validation**: zlib and gzip headers and trailers are
//!   checked (Adler-32, CRC-32, ISIZE) and their metadata discarded
//!
//! ## Example
//!
//! ```rust
//! use unflate::{Format, Inflater};
//!
//! // Raw DEFLATE stream: one stored block holding "hi".
//! let compressed = [0x01, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i'];
//!
//! let mut inflater = Inflater::new(Format::Raw);
//! let output = inflater.decompress(&compressed).unwrap();
//! assert_eq!(output, b"hi");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod checksum;
pub mod error;
pub mod inflate;

pub use error::{Error, Result};
pub use inflate::{Format, Inflater};

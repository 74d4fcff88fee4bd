//! Fuzz target for streaming inflate.
//!
//! Feeds arbitrary bytes through an inflater in arbitrary chunk sizes and
//! checks that it never panics and that errors are stable once reported.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use unflate::{Format, Inflater};

/// Structured input for inflate fuzzing.
#[derive(Arbitrary, Debug)]
struct InflateInput {
    /// Which wrapper to expect (mod 3).
    format: u8,
    /// Chunk size for the feed loop (clamped to 1..=257).
    chunk: u16,
    /// Compressed-looking data.
    data: Vec<u8>,
}

fuzz_target!(|input: InflateInput| {
    if input.data.len() > 1024 * 1024 {
        return;
    }

    let format = match input.format % 3 {
        0 => Format::Raw,
        1 => Format::Zlib,
        _ => Format::Gzip,
    };
    let chunk = (input.chunk as usize % 257) + 1;

    let mut inflater = Inflater::new(format);
    let mut first_error = None;
    for piece in input.data.chunks(chunk) {
        match inflater.decompress(piece) {
            Ok(_) => {}
            Err(err) => {
                first_error = Some(err);
                break;
            }
        }
    }

    // Once dead, always dead, with the same error.
    if let Some(err) = first_error {
        assert_eq!(inflater.decompress(&[0]), Err(err));
    }
});

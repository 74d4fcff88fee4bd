//! DEFLATE block decoding: stored, fixed-Huffman, and dynamic-Huffman.
//!
//! The decoders here are written as resumable state machines. Progress
//! that must survive an input shortfall lives in [`Stage`] (and its
//! [`Preamble`]/[`BodyStep`] payloads); everything else is re-derived from
//! the bit cursor when the next chunk arrives.

use super::bit_reader::BitReader;
use super::huffman::Huffman;
use super::window::History;
use super::{Flow, Interrupt};
use crate::error::Error;

/// Length code base values (codes 257-285).
const LENGTH_BASE: [u16; 29] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258,
];

/// Extra bits for length codes.
const LENGTH_EXTRA: [u8; 29] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Distance code base values (codes 0-29).
const DISTANCE_BASE: [u16; 30] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits for distance codes.
const DISTANCE_EXTRA: [u8; 30] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Order of code length codes in the dynamic-Huffman preamble.
const CODE_LENGTH_ORDER: [usize; 19] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// The literal/length and distance tables a block body decodes with.
#[derive(Debug)]
pub(crate) struct Tables {
    lit: Huffman,
    dist: Huffman,
}

impl Tables {
    /// The fixed tables of RFC 1951 §3.2.6.
    pub(crate) fn fixed() -> Result<Self, Error> {
        let mut lengths = [0u8; 288];
        lengths[..144].fill(8);
        lengths[144..256].fill(9);
        lengths[256..280].fill(7);
        lengths[280..].fill(8);
        let lit = Huffman::from_lengths(&lengths)?;
        // All 32 distance codes use 5 bits.
        let dist = Huffman::from_lengths(&[5u8; 32])?;
        Ok(Self { lit, dist })
    }
}

/// Where block decoding was suspended.
///
/// Each variant carries exactly what resumption needs; the bit cursor
/// itself is persisted separately by the inflater. The invariant: with
/// the stage restored and the cursor at its committed position, re-running
/// the decoder is indistinguishable from never having stopped.
#[derive(Debug)]
pub(crate) enum Stage {
    /// The next bits are a new block's BFINAL + BTYPE header.
    BlockHeader,
    /// Header said stored; the LEN/NLEN words have not been consumed yet.
    StoredHeader,
    /// Mid-copy of a stored block's payload.
    Stored {
        /// Bytes of payload not yet copied.
        remaining: u16,
    },
    /// Mid-parse of a dynamic block's table preamble.
    Preamble(Box<Preamble>),
    /// Decoding the literal/length body of a fixed or dynamic block.
    Body {
        tables: Box<Tables>,
        step: BodyStep,
    },
}

/// Position inside one literal/length/distance decode cycle.
///
/// Each field hop is one atomic read; the partially resolved pair rides
/// along so a suspension between the length and its distance (or between
/// a symbol and its extra bits) loses nothing.
#[derive(Debug, Clone, Copy)]
pub(crate) enum BodyStep {
    /// At a literal/length symbol boundary.
    Symbol,
    /// Length code seen, its extra bits still unread.
    LengthExtra { code: u16 },
    /// Length resolved, distance symbol still unread.
    Distance { length: u16 },
    /// Distance code seen, its extra bits still unread.
    DistanceExtra { length: u16, code: u16 },
}

/// Progress through the dynamic-Huffman preamble (RFC 1951 §3.2.7).
#[derive(Debug)]
pub(crate) struct Preamble {
    /// Literal/length codes to read (HLIT + 257), 0 until counts arrive.
    lit_count: usize,
    /// Distance codes to read (HDIST + 1).
    dist_count: usize,
    /// Code-length-code lengths to read (HCLEN + 4).
    cl_count: usize,
    step: PreambleStep,
    /// The 19 code-length-code lengths, indexed by symbol.
    cl_lengths: [u8; 19],
    /// How many of the 3-bit entries have been read.
    cl_read: usize,
    /// Table built from `cl_lengths`; empty until `ClLengths` completes.
    cl_table: Huffman,
    /// Combined literal/length + distance code lengths.
    lengths: Vec<u8>,
    /// How many entries of `lengths` are filled.
    filled: usize,
}

#[derive(Debug, Clone, Copy)]
enum PreambleStep {
    /// The HLIT/HDIST/HCLEN counts (one 14-bit field).
    Counts,
    /// The HCLEN 3-bit code-length-code lengths.
    ClLengths,
    /// Decoding length symbols through the code-length table.
    Lengths,
    /// A 16/17/18 symbol was consumed; its repeat count is still unread.
    Repeat { value: u8, extra: u8, base: u8 },
}

impl Preamble {
    pub(crate) fn new() -> Self {
        Self {
            lit_count: 0,
            dist_count: 0,
            cl_count: 0,
            step: PreambleStep::Counts,
            cl_lengths: [0; 19],
            cl_read: 0,
            cl_table: Huffman::empty(),
            lengths: Vec::new(),
            filled: 0,
        }
    }

    /// Drive the preamble forward; returns the block's decoding tables.
    pub(crate) fn run(&mut self, reader: &mut BitReader<'_>) -> Flow<Box<Tables>> {
        loop {
            match self.step {
                PreambleStep::Counts => {
                    let counts = reader.read_bits(14)?;
                    self.lit_count = (counts & 0x1F) as usize + 257;
                    self.dist_count = ((counts >> 5) & 0x1F) as usize + 1;
                    self.cl_count = (counts >> 10) as usize + 4;
                    // HLIT values 30 and 31 name codes past 286.
                    if self.lit_count > 286 {
                        return Err(Interrupt::Fatal(Error::InvalidHuffman));
                    }
                    self.lengths = vec![0u8; self.lit_count + self.dist_count];
                    self.step = PreambleStep::ClLengths;
                }
                PreambleStep::ClLengths => {
                    while self.cl_read < self.cl_count {
                        let len = reader.read_bits(3)?;
                        self.cl_lengths[CODE_LENGTH_ORDER[self.cl_read]] = len as u8;
                        self.cl_read += 1;
                    }
                    self.cl_table = Huffman::from_lengths(&self.cl_lengths)?;
                    self.step = PreambleStep::Lengths;
                }
                PreambleStep::Lengths => {
                    if self.filled == self.lengths.len() {
                        let lit = Huffman::from_lengths(&self.lengths[..self.lit_count])?;
                        let dist = Huffman::from_lengths(&self.lengths[self.lit_count..])?;
                        return Ok(Box::new(Tables { lit, dist }));
                    }
                    let symbol = self.cl_table.decode(reader)?;
                    match symbol {
                        0..=15 => {
                            self.lengths[self.filled] = symbol as u8;
                            self.filled += 1;
                        }
                        16 => {
                            if self.filled == 0 {
                                // Nothing to repeat yet.
                                return Err(Interrupt::Fatal(Error::InvalidHuffman));
                            }
                            let prev = self.lengths[self.filled - 1];
                            self.step = PreambleStep::Repeat {
                                value: prev,
                                extra: 2,
                                base: 3,
                            };
                        }
                        17 => {
                            self.step = PreambleStep::Repeat {
                                value: 0,
                                extra: 3,
                                base: 3,
                            };
                        }
                        18 => {
                            self.step = PreambleStep::Repeat {
                                value: 0,
                                extra: 7,
                                base: 11,
                            };
                        }
                        _ => return Err(Interrupt::Fatal(Error::InvalidHuffman)),
                    }
                }
                PreambleStep::Repeat { value, extra, base } => {
                    let count = base as usize + reader.read_bits(extra)? as usize;
                    if self.filled + count > self.lengths.len() {
                        return Err(Interrupt::Fatal(Error::InvalidHuffman));
                    }
                    for _ in 0..count {
                        self.lengths[self.filled] = value;
                        self.filled += 1;
                    }
                    self.step = PreambleStep::Lengths;
                }
            }
        }
    }
}

/// Read the LEN/NLEN words of a stored block, including the byte-boundary
/// alignment, as one atomic operation.
pub(crate) fn read_stored_len(reader: &mut BitReader<'_>) -> Flow<u16> {
    reader.atomic(|reader| {
        reader.align();
        let len = reader.read_bits(16)?;
        let nlen = reader.read_bits(16)?;
        if nlen != !len {
            return Err(Interrupt::Fatal(Error::BadHeader(
                "stored block NLEN does not complement LEN",
            )));
        }
        Ok(len)
    })
}

/// Decode the literal/length body of a block until its end-of-block
/// symbol, emitting into `history`.
pub(crate) fn run_body(
    history: &mut History,
    tables: &Tables,
    step: &mut BodyStep,
    reader: &mut BitReader<'_>,
) -> Flow<()> {
    loop {
        match *step {
            BodyStep::Symbol => {
                let symbol = tables.lit.decode(reader)?;
                match symbol {
                    0..=255 => history.push(symbol as u8),
                    256 => return Ok(()),
                    257..=285 => *step = BodyStep::LengthExtra { code: symbol },
                    // 286 and 287 exist in the fixed table but name nothing.
                    _ => return Err(Interrupt::Fatal(Error::InvalidDistance)),
                }
            }
            BodyStep::LengthExtra { code } => {
                let idx = (code - 257) as usize;
                let extra = reader.read_bits(LENGTH_EXTRA[idx])?;
                *step = BodyStep::Distance {
                    length: LENGTH_BASE[idx] + extra,
                };
            }
            BodyStep::Distance { length } => {
                let code = tables.dist.decode(reader)?;
                if code >= 30 {
                    return Err(Interrupt::Fatal(Error::InvalidDistance));
                }
                *step = BodyStep::DistanceExtra { length, code };
            }
            BodyStep::DistanceExtra { length, code } => {
                let idx = code as usize;
                let extra = reader.read_bits(DISTANCE_EXTRA[idx])?;
                let distance = DISTANCE_BASE[idx] as usize + extra as usize;
                history.copy_match(length as usize, distance)?;
                *step = BodyStep::Symbol;
            }
        }
    }
}

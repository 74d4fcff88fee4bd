//! Streaming DEFLATE decompression (RFC 1951) with optional zlib
//! (RFC 1950) or gzip (RFC 1952) wrapping.
//!
//! The entry point is [`Inflater`]: feed it the compressed stream in
//! chunks of any size - down to a single byte - and each
//! [`decompress`](Inflater::decompress) call returns the output bytes
//! that chunk unlocked. Suspension is explicit state, not a coroutine:
//! when input runs out mid-operation the decoder records where it stopped
//! (the block `Stage`) and which bit of the first pending byte comes next,
//! then re-enters from that record on the following call. Feeding a
//! stream split at any byte boundary produces bit-identical output to
//! feeding it whole.

use crate::checksum::{Adler32, Crc32};
use crate::error::{Error, Result};

mod bit_reader;
mod block;
mod huffman;
mod window;
mod wrapper;

use bit_reader::BitReader;
use block::{BodyStep, Preamble, Stage, Tables};
use window::History;

/// Internal control flow: a suspension or a fatal stream error.
///
/// `More` is the end-of-input signal of the bit reader and wrapper
/// parsers. It never escapes [`Inflater::decompress`]; the driver turns
/// it into a normal (possibly empty) return value.
#[derive(Debug)]
pub(crate) enum Interrupt {
    /// Input exhausted mid-operation; resume when more bytes arrive.
    More,
    /// The stream is invalid; the inflater is dead.
    Fatal(Error),
}

impl From<Error> for Interrupt {
    fn from(err: Error) -> Self {
        Interrupt::Fatal(err)
    }
}

pub(crate) type Flow<T> = std::result::Result<T, Interrupt>;

/// Stream envelope expected around the DEFLATE payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Bare DEFLATE bitstream: no header, no trailer.
    Raw,
    /// zlib wrapper: 2-byte header, big-endian Adler-32 trailer.
    Zlib,
    /// gzip wrapper: variable header, CRC-32 + ISIZE trailer.
    Gzip,
}

impl std::str::FromStr for Format {
    type Err = Error;

    /// Parse an encoding name. Accepts `raw`/`deflate`, `zlib`, and
    /// `gzip`, ASCII case-insensitively.
    fn from_str(name: &str) -> Result<Self> {
        if name.eq_ignore_ascii_case("raw") || name.eq_ignore_ascii_case("deflate") {
            Ok(Format::Raw)
        } else if name.eq_ignore_ascii_case("zlib") {
            Ok(Format::Zlib)
        } else if name.eq_ignore_ascii_case("gzip") {
            Ok(Format::Gzip)
        } else {
            Err(Error::InvalidEncoding(name.to_string()))
        }
    }
}

/// Which part of the stream comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Wrapper header (a no-op for [`Format::Raw`]).
    Header,
    /// DEFLATE block sequence.
    Blocks,
    /// Wrapper trailer after the final block.
    Trailer,
    /// Stream fully consumed and validated.
    Done,
}

/// Incremental decompressor for one DEFLATE/zlib/gzip stream.
///
/// ```
/// use unflate::{Format, Inflater};
///
/// // A stored block holding "hello".
/// let stream = [
///     0x01, 0x05, 0x00, 0xFA, 0xFF, b'h', b'e', b'l', b'l', b'o',
/// ];
///
/// let mut inflater = Inflater::new(Format::Raw);
/// let mut output = Vec::new();
/// for byte in stream {
///     output.extend(inflater.decompress(&[byte]).unwrap());
/// }
/// assert_eq!(output, b"hello");
/// assert!(inflater.is_finished());
/// ```
#[derive(Debug)]
pub struct Inflater {
    format: Format,
    phase: Phase,
    /// Input received but not yet consumed past a safe resumption point.
    pending: Vec<u8>,
    /// Bits already consumed within `pending[0]`.
    bit_cursor: u8,
    window: History,
    stage: Stage,
    /// BFINAL of the block currently being decoded.
    bfinal: bool,
    adler: Adler32,
    crc: Crc32,
    /// Output bytes already folded into the trailer checksum.
    hashed: usize,
    /// First fatal error; replayed by every later call.
    failed: Option<Error>,
}

impl Inflater {
    /// Create an inflater for a stream in the given format.
    pub fn new(format: Format) -> Self {
        Self {
            format,
            phase: Phase::Header,
            pending: Vec::new(),
            bit_cursor: 0,
            window: History::new(),
            stage: Stage::BlockHeader,
            bfinal: false,
            adler: Adler32::new(),
            crc: Crc32::new(),
            hashed: 0,
            failed: None,
        }
    }

    /// Feed one chunk of compressed input and collect whatever output it
    /// unlocks.
    ///
    /// Returns an empty vector when the chunk only advanced internal
    /// state. Splitting the stream differently never changes the
    /// concatenated output: `decompress(a)` then `decompress(b)` emits
    /// exactly what `decompress(a ++ b)` would.
    ///
    /// Errors are fatal: the first error is latched and returned by every
    /// subsequent call. Input arriving after the stream completed fails
    /// with [`Error::StreamClosed`].
    pub fn decompress(&mut self, chunk: &[u8]) -> Result<Vec<u8>> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        self.pending.extend_from_slice(chunk);
        let mark = self.window.len();
        match self.run() {
            Ok(()) | Err(Interrupt::More) => Ok(self.window.since(mark).to_vec()),
            Err(Interrupt::Fatal(err)) => {
                self.failed = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Whether the final block and trailer have been fully consumed.
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Total decompressed bytes produced so far.
    pub fn total_out(&self) -> u64 {
        self.window.len() as u64
    }

    /// Drive the stream as far as the pending input allows.
    fn run(&mut self) -> Flow<()> {
        loop {
            match self.phase {
                Phase::Header => self.read_header()?,
                Phase::Blocks => self.decode_blocks()?,
                Phase::Trailer => self.read_trailer()?,
                Phase::Done => {
                    if !self.pending.is_empty() {
                        return Err(Interrupt::Fatal(Error::StreamClosed));
                    }
                    return Ok(());
                }
            }
        }
    }

    fn read_header(&mut self) -> Flow<()> {
        let consumed = match self.format {
            Format::Raw => 0,
            Format::Zlib => wrapper::read_zlib_header(&self.pending)?,
            Format::Gzip => wrapper::read_gzip_header(&self.pending)?,
        };
        self.pending.drain(..consumed);
        self.phase = Phase::Blocks;
        Ok(())
    }

    /// Run the block state machine over the pending bytes, then persist
    /// the cursor: fully consumed bytes are released, and the bit offset
    /// into the first remaining byte is carried to the next call.
    fn decode_blocks(&mut self) -> Flow<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut reader = BitReader::resume(&pending, self.bit_cursor);
        let outcome = self.step_blocks(&mut reader);
        let consumed = reader.byte_position();
        self.bit_cursor = reader.bit_position();
        drop(reader);
        self.pending = pending;
        self.pending.drain(..consumed);
        outcome
    }

    /// Decode blocks until the final one completes (Ok), input runs dry
    /// (More), or the stream turns out invalid (Fatal).
    ///
    /// Suspension discipline: whenever a sub-decoder reports More, the
    /// reader has been rewound to the start of the interrupted atomic
    /// operation and `self.stage` describes everything consumed before
    /// it. Storing the stage back before propagating keeps the pair
    /// consistent.
    fn step_blocks(&mut self, reader: &mut BitReader<'_>) -> Flow<()> {
        loop {
            match std::mem::replace(&mut self.stage, Stage::BlockHeader) {
                Stage::BlockHeader => {
                    // BFINAL and BTYPE as one atomic 3-bit field.
                    let header = reader.read_bits(3)?;
                    self.bfinal = header & 1 == 1;
                    match header >> 1 {
                        0 => self.stage = Stage::StoredHeader,
                        1 => {
                            self.stage = Stage::Body {
                                tables: Box::new(Tables::fixed()?),
                                step: BodyStep::Symbol,
                            }
                        }
                        2 => self.stage = Stage::Preamble(Box::new(Preamble::new())),
                        _ => return Err(Interrupt::Fatal(Error::InvalidBlockType)),
                    }
                }
                Stage::StoredHeader => match block::read_stored_len(reader) {
                    Ok(len) => self.stage = Stage::Stored { remaining: len },
                    Err(interrupt) => {
                        self.stage = Stage::StoredHeader;
                        return Err(interrupt);
                    }
                },
                Stage::Stored { remaining } => {
                    let taken = reader.take_aligned(remaining as usize);
                    self.window.extend(taken);
                    let remaining = remaining - taken.len() as u16;
                    if remaining > 0 {
                        self.stage = Stage::Stored { remaining };
                        return Err(Interrupt::More);
                    }
                    if self.finish_block() {
                        return Ok(());
                    }
                }
                Stage::Preamble(mut preamble) => match preamble.run(reader) {
                    Ok(tables) => {
                        self.stage = Stage::Body {
                            tables,
                            step: BodyStep::Symbol,
                        }
                    }
                    Err(interrupt) => {
                        self.stage = Stage::Preamble(preamble);
                        return Err(interrupt);
                    }
                },
                Stage::Body { tables, mut step } => {
                    match block::run_body(&mut self.window, &tables, &mut step, reader) {
                        Ok(()) => {
                            if self.finish_block() {
                                return Ok(());
                            }
                        }
                        Err(interrupt) => {
                            self.stage = Stage::Body { tables, step };
                            return Err(interrupt);
                        }
                    }
                }
            }
        }
    }

    /// Close out a block; true means it was the final one and the phase
    /// has moved on to the trailer.
    fn finish_block(&mut self) -> bool {
        self.stage = Stage::BlockHeader;
        if self.bfinal {
            self.phase = Phase::Trailer;
            true
        } else {
            false
        }
    }

    fn read_trailer(&mut self) -> Flow<()> {
        // Bits left over in the final block's last byte are padding.
        if self.bit_cursor != 0 {
            self.pending.drain(..1);
            self.bit_cursor = 0;
        }
        self.fold_checksums();
        let consumed = match self.format {
            Format::Raw => 0,
            Format::Zlib => wrapper::read_zlib_trailer(&self.pending, self.adler.value())?,
            Format::Gzip => {
                wrapper::read_gzip_trailer(&self.pending, self.crc.value(), self.total_out())?
            }
        };
        self.pending.drain(..consumed);
        self.phase = Phase::Done;
        Ok(())
    }

    /// Fold freshly emitted output into whichever checksum the trailer
    /// will ask for.
    fn fold_checksums(&mut self) {
        let fresh = self.window.since(self.hashed);
        match self.format {
            Format::Raw => {}
            Format::Zlib => self.adler.update(fresh),
            Format::Gzip => self.crc.update(fresh),
        }
        self.hashed = self.window.len();
    }
}

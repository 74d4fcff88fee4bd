//! Canonical Huffman decoding tables (RFC 1951 §3.2.2).

use super::bit_reader::BitReader;
use super::{Flow, Interrupt};
use crate::error::Error;

/// Maximum code length for DEFLATE Huffman codes.
const MAX_BITS: usize = 15;

/// Decoding table for one canonical Huffman code.
///
/// Codes are kept as (length, value) pairs implicitly: `counts[len]` is
/// the number of codes of each length and `symbols` lists symbols ordered
/// by (length, symbol). Together with the canonical first-code recurrence
/// this distinguishes a 3-bit `101` from a 4-bit `0101` - leading zeros
/// are significant and never collapsed away.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Huffman {
    counts: [u16; MAX_BITS + 1],
    symbols: Vec<u16>,
}

impl Huffman {
    /// Table with no codes. Decoding from it always fails.
    pub(crate) fn empty() -> Self {
        Self {
            counts: [0; MAX_BITS + 1],
            symbols: Vec::new(),
        }
    }

    /// Build a decoding table from per-symbol code lengths.
    ///
    /// Fails with [`Error::InvalidHuffman`] when the lengths over- or
    /// under-subscribe the code space. Two shapes are allowed through:
    /// the all-zero vector (an empty table, §3.2.7's "no codes" case for
    /// distances) and a single symbol with a one-bit code.
    pub(crate) fn from_lengths(lengths: &[u8]) -> Result<Self, Error> {
        let mut counts = [0u16; MAX_BITS + 1];
        for &len in lengths {
            debug_assert!(len as usize <= MAX_BITS);
            if len > 0 {
                counts[len as usize] += 1;
            }
        }
        let total: u16 = counts.iter().sum();
        if total == 0 {
            return Ok(Self::empty());
        }

        // Walk the code space: `left` is how many codes remain unassigned
        // after each length. Negative means over-subscribed; positive at
        // the end means incomplete.
        let mut left: i32 = 1;
        for &count in counts.iter().skip(1) {
            left <<= 1;
            left -= count as i32;
            if left < 0 {
                return Err(Error::InvalidHuffman);
            }
        }
        if left > 0 && !(total == 1 && counts[1] == 1) {
            return Err(Error::InvalidHuffman);
        }

        // Symbols sorted by code length, then by symbol value - the
        // canonical assignment order.
        let mut offsets = [0u16; MAX_BITS + 1];
        for len in 1..MAX_BITS {
            offsets[len + 1] = offsets[len] + counts[len];
        }
        let mut symbols = vec![0u16; total as usize];
        for (symbol, &len) in lengths.iter().enumerate() {
            if len > 0 {
                symbols[offsets[len as usize] as usize] = symbol as u16;
                offsets[len as usize] += 1;
            }
        }

        Ok(Self { counts, symbols })
    }

    /// Decode one symbol, reading bits LSB-first from the stream but
    /// accumulating the code MSB-first (newest bit appended on the right).
    ///
    /// The whole symbol is one atomic operation: if input runs out
    /// mid-code, the cursor rewinds to the first bit of the symbol.
    pub(crate) fn decode(&self, reader: &mut BitReader<'_>) -> Flow<u16> {
        reader.atomic(|reader| {
            let mut code = 0usize;
            let mut first = 0usize;
            let mut index = 0usize;
            for len in 1..=MAX_BITS {
                code |= reader.read_bit()? as usize;
                let count = self.counts[len] as usize;
                // Canonical codes of this length occupy [first, first + count).
                if code < first + count {
                    return Ok(self.symbols[index + (code - first)]);
                }
                index += count;
                first = (first + count) << 1;
                code <<= 1;
            }
            Err(Interrupt::Fatal(Error::InvalidHuffman))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(table: &Huffman, data: &[u8], n: usize) -> Vec<u16> {
        let mut reader = BitReader::resume(data, 0);
        (0..n).map(|_| table.decode(&mut reader).unwrap()).collect()
    }

    #[test]
    fn test_complete_code_decodes() {
        // Lengths 2,2,2,2: canonical codes 00,01,10,11.
        let table = Huffman::from_lengths(&[2, 2, 2, 2]).unwrap();
        // Stream bits (LSB-first per byte): 00 01 10 11 -> byte 0b11011000...
        // bit order in byte: b0=0,b1=0,b2=0,b3=1,b4=1,b5=0,b6=1,b7=1
        let data = [0b1101_1000];
        assert_eq!(decode_all(&table, &data, 4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_leading_zeros_are_significant() {
        // Lengths: sym0=1, sym1=2, sym2=3, sym3=3.
        // Canonical: 0, 10, 110, 111.
        let table = Huffman::from_lengths(&[1, 2, 3, 3]).unwrap();
        // Codes MSB-first on the wire: sym3 = 111, sym0 = 0, sym2 = 110.
        // Bit sequence: 1,1,1, 0, 1,1,0 -> byte b0..b6 = 1110110.
        let data = [0b0011_0111];
        assert_eq!(decode_all(&table, &data, 3), vec![3, 0, 2]);
    }

    #[test]
    fn test_uneven_lengths() {
        // Lengths 3,3,3,3,3,2,4,4 (RFC 1951 §3.2.2 worked example).
        let lengths = [3u8, 3, 3, 3, 3, 2, 4, 4];
        let table = Huffman::from_lengths(&lengths).unwrap();
        // Canonical codes: F=00, A=010, B=011, C=100, D=101, E=110,
        // G=1110, H=1111.
        // Decode G then A: bits 1,1,1,0,0,1,0.
        let data = [0b0100_0111];
        assert_eq!(decode_all(&table, &data, 2), vec![6, 0]);
    }

    #[test]
    fn test_single_symbol_length_one_is_valid() {
        let table = Huffman::from_lengths(&[0, 1, 0]).unwrap();
        let data = [0b0000_0000];
        assert_eq!(decode_all(&table, &data, 1), vec![1]);
    }

    #[test]
    fn test_oversubscribed_rejected() {
        assert_eq!(
            Huffman::from_lengths(&[1, 1, 1]),
            Err(Error::InvalidHuffman)
        );
    }

    #[test]
    fn test_undersubscribed_rejected() {
        // Two 3-bit codes leave most of the space unassigned.
        assert_eq!(
            Huffman::from_lengths(&[3, 3, 0, 0]),
            Err(Error::InvalidHuffman)
        );
        // A lone symbol needs a one-bit code to qualify for the allowance.
        assert_eq!(Huffman::from_lengths(&[0, 2]), Err(Error::InvalidHuffman));
    }

    #[test]
    fn test_all_zero_builds_empty_table() {
        let table = Huffman::from_lengths(&[0, 0, 0]).unwrap();
        let data = [0xFF, 0xFF];
        let mut reader = BitReader::resume(&data, 0);
        assert!(matches!(
            table.decode(&mut reader),
            Err(Interrupt::Fatal(Error::InvalidHuffman))
        ));
    }

    #[test]
    fn test_decode_suspends_mid_symbol_without_consuming() {
        // Codes starting with a 1 bit are 3 bits long; 2 bits remain.
        let table = Huffman::from_lengths(&[2, 2, 3, 3, 3, 3]).unwrap();
        let data = [0b0100_0111];
        let mut reader = BitReader::resume(&data, 0);
        reader.read_bits(6).unwrap();
        // The symbol needs a third bit: suspends and rewinds.
        assert!(matches!(table.decode(&mut reader), Err(Interrupt::More)));
        assert_eq!(reader.byte_position(), 0);
        assert_eq!(reader.bit_position(), 6);
    }

    #[test]
    fn test_fixed_literal_shape() {
        let mut lengths = [0u8; 288];
        lengths[..144].fill(8);
        lengths[144..256].fill(9);
        lengths[256..280].fill(7);
        lengths[280..].fill(8);
        let table = Huffman::from_lengths(&lengths).unwrap();
        assert_eq!(table.symbols.len(), 288);

        // 'h' (0x68) has the 8-bit code 0x98; end-of-block (256) has the
        // 7-bit code 0000000.
        // Wire bits for 'h': code MSB-first 1,0,0,1,1,0,0,0.
        let data = [0b0001_1001, 0b0000_0000];
        let mut reader = BitReader::resume(&data, 0);
        assert_eq!(table.decode(&mut reader).unwrap(), 104);
        assert_eq!(table.decode(&mut reader).unwrap(), 256);
    }
}

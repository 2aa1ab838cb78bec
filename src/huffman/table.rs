//! # Huffman Code Table
//!
//! Fixed 257-symbol code used by flight controllers to compress blackbox
//! dataflash reads, and the (length, code) lookup built from it.
//!
//! The lookup is a flat array holding one row per code length: row `len`
//! starts at `2^len - 2` and has `2^len` slots, 8190 slots in total for
//! lengths 1..=12. It is built at compile time for the default code list.
//!
//! A code value wider than its declared length can never be produced by a
//! `len`-bit accumulator, so such entries are left out of the lookup. The
//! default list has many of those, and its end marker (twelve zero bits) is
//! shadowed by the 2-bit code for `0x00`; decoding is still exactly a
//! (length, code) match over the list.

use crate::error::MspError;

/// Longest code length in bits
pub const HUFFMAN_MAX_CODE_LEN: usize = 12;

/// Number of entries in the default code list (256 bytes + end marker)
pub const HUFFMAN_CODE_COUNT: usize = 257;

/// Total lookup slots for lengths 1..=12
const SLOT_COUNT: usize = (1 << (HUFFMAN_MAX_CODE_LEN + 1)) - 2;

/// Slot value for unassigned (length, code) pairs
const NO_MATCH: u16 = u16::MAX;

/// Slot value for the end-of-stream marker
const END_OF_STREAM: u16 = 0x100;

/// Decoded symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Output byte
    Byte(u8),
    /// Block ends here, even if fewer bytes than requested were produced
    EndOfStream,
}

/// One entry of a code list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    /// Symbol this code decodes to
    pub symbol: Symbol,
    /// Code length in bits (1..=12)
    pub len: u8,
    /// Code value, right-aligned
    pub code: u16,
}

const fn byte(value: u8, len: u8, code: u16) -> HuffmanCode {
    HuffmanCode {
        symbol: Symbol::Byte(value),
        len,
        code,
    }
}

/// Default blackbox code list
#[rustfmt::skip]
pub const DEFAULT_CODES: [HuffmanCode; HUFFMAN_CODE_COUNT] = [
    byte(0x00, 2, 0x0000), byte(0x01, 2, 0x0001), byte(0x02, 3, 0x0004),
    byte(0x03, 3, 0x0005), byte(0x04, 3, 0x0006), byte(0x50, 3, 0x0007),
    byte(0x05, 4, 0x0010), byte(0x06, 4, 0x0011), byte(0x07, 4, 0x0012),
    byte(0x08, 4, 0x0013), byte(0x09, 4, 0x0014), byte(0x0A, 4, 0x0015),
    byte(0x0B, 4, 0x0016), byte(0x0C, 4, 0x0017), byte(0x0D, 4, 0x0018),
    byte(0x0E, 4, 0x0019), byte(0x0F, 4, 0x001A), byte(0x10, 4, 0x001B),
    byte(0x11, 4, 0x001C), byte(0x12, 4, 0x001D), byte(0x13, 4, 0x001E),
    byte(0x14, 4, 0x001F), byte(0x15, 5, 0x0040), byte(0x16, 5, 0x0041),
    byte(0x17, 5, 0x0042), byte(0x18, 5, 0x0043), byte(0x19, 5, 0x0044),
    byte(0x1A, 5, 0x0045), byte(0x1B, 5, 0x0046), byte(0x1C, 5, 0x0047),
    byte(0x1D, 5, 0x0048), byte(0x1E, 5, 0x0049), byte(0x1F, 5, 0x004A),
    byte(0x20, 5, 0x004B), byte(0x21, 5, 0x004C), byte(0x22, 5, 0x004D),
    byte(0x23, 5, 0x004E), byte(0x24, 5, 0x004F), byte(0x25, 5, 0x0050),
    byte(0x26, 5, 0x0051), byte(0x27, 5, 0x0052), byte(0x28, 5, 0x0053),
    byte(0x29, 5, 0x0054), byte(0x2A, 5, 0x0055), byte(0x2B, 5, 0x0056),
    byte(0x2C, 5, 0x0057), byte(0x2D, 5, 0x0058), byte(0x2E, 5, 0x0059),
    byte(0x2F, 5, 0x005A), byte(0x30, 5, 0x005B), byte(0x31, 5, 0x005C),
    byte(0x32, 5, 0x005D), byte(0x33, 5, 0x005E), byte(0x34, 5, 0x005F),
    byte(0x35, 6, 0x00C0), byte(0x36, 6, 0x00C1), byte(0x37, 6, 0x00C2),
    byte(0x38, 6, 0x00C3), byte(0x39, 6, 0x00C4), byte(0x3A, 6, 0x00C5),
    byte(0x3B, 6, 0x00C6), byte(0x3C, 6, 0x00C7), byte(0x3D, 6, 0x00C8),
    byte(0x3E, 6, 0x00C9), byte(0x3F, 6, 0x00CA), byte(0x40, 6, 0x00CB),
    byte(0x41, 6, 0x00CC), byte(0x42, 6, 0x00CD), byte(0x43, 6, 0x00CE),
    byte(0x44, 6, 0x00CF), byte(0x45, 6, 0x00D0), byte(0x46, 6, 0x00D1),
    byte(0x47, 6, 0x00D2), byte(0x48, 6, 0x00D3), byte(0x49, 6, 0x00D4),
    byte(0x4A, 6, 0x00D5), byte(0x4B, 6, 0x00D6), byte(0x4C, 6, 0x00D7),
    byte(0x4D, 6, 0x00D8), byte(0x4E, 6, 0x00D9), byte(0x4F, 6, 0x00DA),
    byte(0x51, 6, 0x00DB), byte(0x52, 6, 0x00DC), byte(0x53, 6, 0x00DD),
    byte(0x54, 6, 0x00DE), byte(0x55, 6, 0x00DF), byte(0x56, 7, 0x01C0),
    byte(0x57, 7, 0x01C1), byte(0x58, 7, 0x01C2), byte(0x59, 7, 0x01C3),
    byte(0x5A, 7, 0x01C4), byte(0x5B, 7, 0x01C5), byte(0x5C, 7, 0x01C6),
    byte(0x5D, 7, 0x01C7), byte(0x5E, 7, 0x01C8), byte(0x5F, 7, 0x01C9),
    byte(0x60, 7, 0x01CA), byte(0x61, 7, 0x01CB), byte(0x62, 7, 0x01CC),
    byte(0x63, 7, 0x01CD), byte(0x64, 7, 0x01CE), byte(0x65, 7, 0x01CF),
    byte(0x66, 7, 0x01D0), byte(0x67, 7, 0x01D1), byte(0x68, 7, 0x01D2),
    byte(0x69, 7, 0x01D3), byte(0x6A, 7, 0x01D4), byte(0x6B, 7, 0x01D5),
    byte(0x6C, 7, 0x01D6), byte(0x6D, 7, 0x01D7), byte(0x6E, 7, 0x01D8),
    byte(0x6F, 7, 0x01D9), byte(0x70, 7, 0x01DA), byte(0x71, 7, 0x01DB),
    byte(0x72, 7, 0x01DC), byte(0x73, 7, 0x01DD), byte(0x74, 7, 0x01DE),
    byte(0x75, 7, 0x01DF), byte(0x76, 8, 0x03C0), byte(0x77, 8, 0x03C1),
    byte(0x78, 8, 0x03C2), byte(0x79, 8, 0x03C3), byte(0x7A, 8, 0x03C4),
    byte(0x7B, 8, 0x03C5), byte(0x7C, 8, 0x03C6), byte(0x7D, 8, 0x03C7),
    byte(0x7E, 8, 0x03C8), byte(0x7F, 8, 0x03C9), byte(0x80, 8, 0x03CA),
    byte(0x81, 8, 0x03CB), byte(0x82, 8, 0x03CC), byte(0x83, 8, 0x03CD),
    byte(0x84, 8, 0x03CE), byte(0x85, 8, 0x03CF), byte(0x86, 8, 0x03D0),
    byte(0x87, 8, 0x03D1), byte(0x88, 8, 0x03D2), byte(0x89, 8, 0x03D3),
    byte(0x8A, 8, 0x03D4), byte(0x8B, 8, 0x03D5), byte(0x8C, 8, 0x03D6),
    byte(0x8D, 8, 0x03D7), byte(0x8E, 8, 0x03D8), byte(0x8F, 8, 0x03D9),
    byte(0x90, 8, 0x03DA), byte(0x91, 8, 0x03DB), byte(0x92, 8, 0x03DC),
    byte(0x93, 8, 0x03DD), byte(0x94, 8, 0x03DE), byte(0x95, 8, 0x03DF),
    byte(0x96, 9, 0x07C0), byte(0x97, 9, 0x07C1), byte(0x98, 9, 0x07C2),
    byte(0x99, 9, 0x07C3), byte(0x9A, 9, 0x07C4), byte(0x9B, 9, 0x07C5),
    byte(0x9C, 9, 0x07C6), byte(0x9D, 9, 0x07C7), byte(0x9E, 9, 0x07C8),
    byte(0x9F, 9, 0x07C9), byte(0xA0, 9, 0x07CA), byte(0xA1, 9, 0x07CB),
    byte(0xA2, 9, 0x07CC), byte(0xA3, 9, 0x07CD), byte(0xA4, 9, 0x07CE),
    byte(0xA5, 9, 0x07CF), byte(0xA6, 9, 0x07D0), byte(0xA7, 9, 0x07D1),
    byte(0xA8, 9, 0x07D2), byte(0xA9, 9, 0x07D3), byte(0xAA, 9, 0x07D4),
    byte(0xAB, 9, 0x07D5), byte(0xAC, 9, 0x07D6), byte(0xAD, 9, 0x07D7),
    byte(0xAE, 9, 0x07D8), byte(0xAF, 9, 0x07D9), byte(0xB0, 9, 0x07DA),
    byte(0xB1, 9, 0x07DB), byte(0xB2, 9, 0x07DC), byte(0xB3, 9, 0x07DD),
    byte(0xB4, 9, 0x07DE), byte(0xB5, 9, 0x07DF), byte(0xB6, 10, 0x0FC0),
    byte(0xB7, 10, 0x0FC1), byte(0xB8, 10, 0x0FC2), byte(0xB9, 10, 0x0FC3),
    byte(0xBA, 10, 0x0FC4), byte(0xBB, 10, 0x0FC5), byte(0xBC, 10, 0x0FC6),
    byte(0xBD, 10, 0x0FC7), byte(0xBE, 10, 0x0FC8), byte(0xBF, 10, 0x0FC9),
    byte(0xC0, 10, 0x0FCA), byte(0xC1, 10, 0x0FCB), byte(0xC2, 10, 0x0FCC),
    byte(0xC3, 10, 0x0FCD), byte(0xC4, 10, 0x0FCE), byte(0xC5, 10, 0x0FCF),
    byte(0xC6, 10, 0x0FD0), byte(0xC7, 10, 0x0FD1), byte(0xC8, 10, 0x0FD2),
    byte(0xC9, 10, 0x0FD3), byte(0xCA, 10, 0x0FD4), byte(0xCB, 10, 0x0FD5),
    byte(0xCC, 10, 0x0FD6), byte(0xCD, 10, 0x0FD7), byte(0xCE, 10, 0x0FD8),
    byte(0xCF, 10, 0x0FD9), byte(0xD0, 10, 0x0FDA), byte(0xD1, 10, 0x0FDB),
    byte(0xD2, 10, 0x0FDC), byte(0xD3, 10, 0x0FDD), byte(0xD4, 10, 0x0FDE),
    byte(0xD5, 10, 0x0FDF), byte(0xD6, 11, 0x1FC0), byte(0xD7, 11, 0x1FC1),
    byte(0xD8, 11, 0x1FC2), byte(0xD9, 11, 0x1FC3), byte(0xDA, 11, 0x1FC4),
    byte(0xDB, 11, 0x1FC5), byte(0xDC, 11, 0x1FC6), byte(0xDD, 11, 0x1FC7),
    byte(0xDE, 11, 0x1FC8), byte(0xDF, 11, 0x1FC9), byte(0xE0, 11, 0x1FCA),
    byte(0xE1, 11, 0x1FCB), byte(0xE2, 11, 0x1FCC), byte(0xE3, 11, 0x1FCD),
    byte(0xE4, 11, 0x1FCE), byte(0xE5, 11, 0x1FCF), byte(0xE6, 11, 0x1FD0),
    byte(0xE7, 11, 0x1FD1), byte(0xE8, 11, 0x1FD2), byte(0xE9, 11, 0x1FD3),
    byte(0xEA, 11, 0x1FD4), byte(0xEB, 11, 0x1FD5), byte(0xEC, 11, 0x1FD6),
    byte(0xED, 11, 0x1FD7), byte(0xEE, 11, 0x1FD8), byte(0xEF, 11, 0x1FD9),
    byte(0xF0, 11, 0x1FDA), byte(0xF1, 11, 0x1FDB), byte(0xF2, 11, 0x1FDC),
    byte(0xF3, 11, 0x1FDD), byte(0xF4, 11, 0x1FDE), byte(0xF5, 11, 0x1FDF),
    byte(0xF6, 12, 0x3FC0), byte(0xF7, 12, 0x3FC1), byte(0xF8, 12, 0x3FC2),
    byte(0xF9, 12, 0x3FC3), byte(0xFA, 12, 0x3FC4), byte(0xFB, 12, 0x3FC5),
    byte(0xFC, 12, 0x3FC6), byte(0xFD, 12, 0x3FC7), byte(0xFE, 12, 0x3FC8),
    byte(0xFF, 12, 0x3FC9),
    HuffmanCode { symbol: Symbol::EndOfStream, len: 12, code: 0x0000 },
];

static DEFAULT_TABLE: HuffmanTable = match HuffmanTable::build(&DEFAULT_CODES) {
    Ok(table) => table,
    Err(_) => panic!("default Huffman code list is invalid"),
};

/// Rejected code list entry, usable from const context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBuildError {
    /// Position of the entry in the code list
    pub index: usize,
    /// What is wrong with it
    pub reason: &'static str,
}

impl From<TableBuildError> for MspError {
    fn from(e: TableBuildError) -> Self {
        MspError::InvalidHuffmanTable {
            index: e.index,
            reason: e.reason,
        }
    }
}

/// (length, code) -> symbol lookup
///
/// Immutable once built; the default table lives in a `static` and can be
/// shared freely between threads.
#[derive(Clone)]
pub struct HuffmanTable {
    slots: [u16; SLOT_COUNT],
}

impl std::fmt::Debug for HuffmanTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let assigned = self.slots.iter().filter(|&&slot| slot != NO_MATCH).count();
        f.debug_struct("HuffmanTable")
            .field("assigned", &assigned)
            .finish_non_exhaustive()
    }
}

impl HuffmanTable {
    /// The table built from [`DEFAULT_CODES`]
    pub fn default_table() -> &'static HuffmanTable {
        &DEFAULT_TABLE
    }

    /// Build a table from a custom code list
    ///
    /// # Arguments
    ///
    /// * `codes` - Code list; entries whose code is wider than their length are ignored
    ///
    /// # Errors
    ///
    /// Returns error if a length is outside 1..=12 or two entries share a
    /// (length, code) pair
    ///
    /// # Examples
    ///
    /// ```
    /// use msp_codec::huffman::table::{HuffmanCode, HuffmanTable, Symbol};
    ///
    /// let table = HuffmanTable::from_codes(&[
    ///     HuffmanCode { symbol: Symbol::Byte(b'a'), len: 1, code: 0 },
    ///     HuffmanCode { symbol: Symbol::EndOfStream, len: 1, code: 1 },
    /// ]).unwrap();
    ///
    /// assert_eq!(table.lookup(1, 1), Some(Symbol::EndOfStream));
    /// ```
    pub fn from_codes(codes: &[HuffmanCode]) -> crate::error::Result<Self> {
        Ok(Self::build(codes)?)
    }

    const fn build(codes: &[HuffmanCode]) -> Result<Self, TableBuildError> {
        let mut slots = [NO_MATCH; SLOT_COUNT];
        let mut i = 0;

        while i < codes.len() {
            let entry = codes[i];
            let len = entry.len as usize;

            if len == 0 || len > HUFFMAN_MAX_CODE_LEN {
                return Err(TableBuildError {
                    index: i,
                    reason: "code length must be between 1 and 12 bits",
                });
            }

            if (entry.code as usize) < (1 << len) {
                let slot = row_start(len) + entry.code as usize;
                if slots[slot] != NO_MATCH {
                    return Err(TableBuildError {
                        index: i,
                        reason: "duplicate (length, code) pair",
                    });
                }

                slots[slot] = match entry.symbol {
                    Symbol::Byte(value) => value as u16,
                    Symbol::EndOfStream => END_OF_STREAM,
                };
            }

            i += 1;
        }

        Ok(Self { slots })
    }

    /// Look up the symbol for a `len`-bit code
    ///
    /// Returns `None` when no entry matches, including for lengths outside
    /// 1..=12 and codes wider than `len` bits.
    #[inline]
    pub fn lookup(&self, len: usize, code: u16) -> Option<Symbol> {
        if len == 0 || len > HUFFMAN_MAX_CODE_LEN || (code as usize) >= (1 << len) {
            return None;
        }

        match self.slots[row_start(len) + code as usize] {
            NO_MATCH => None,
            END_OF_STREAM => Some(Symbol::EndOfStream),
            value => Some(Symbol::Byte(value as u8)),
        }
    }
}

/// First slot of the row for `len`-bit codes
const fn row_start(len: usize) -> usize {
    (1 << len) - 2
}

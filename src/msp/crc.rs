//! # MSP Checksums
//!
//! The two checksum algorithms used to validate MSP frames.
//!
//! - **v1**: XOR of size + code + payload
//! - **v2**: CRC-8-DVB-S2 over flag + code + size + payload
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1), MSB-first
//!
//! This is the same CRC-8 that CRSF frames carry; the lookup table matches
//! the CRSF one byte for byte.

/// CRC-8-DVB-S2 polynomial
const CRC8_POLY: u8 = 0xD5;

/// Remainder table indexed by `crc ^ byte`
const CRC8_TABLE: [u8; 256] = crc8_table();

/// Shift one byte through the polynomial, MSB first
const fn crc8_remainder(byte: u8) -> u8 {
    let mut crc = byte;
    let mut bit = 0;
    while bit < 8 {
        crc = if crc & 0x80 != 0 {
            (crc << 1) ^ CRC8_POLY
        } else {
            crc << 1
        };
        bit += 1;
    }
    crc
}

const fn crc8_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut index = 0;
    while index < table.len() {
        table[index] = crc8_remainder(index as u8);
        index += 1;
    }
    table
}

/// XOR checksum used by MSP v1 frames
///
/// # Arguments
///
/// * `data` - Bytes covered by the checksum (size + code + payload)
///
/// # Returns
///
/// * `u8` - XOR of every input byte, `0` for empty input
///
/// # Examples
///
/// ```
/// use msp_codec::msp::crc::xor_checksum;
///
/// // MSP_API_VERSION request: size = 0, code = 1
/// assert_eq!(xor_checksum(&[0x00, 0x01]), 0x01);
/// ```
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// Calculate CRC8-DVB-S2 checksum starting from zero
///
/// # Examples
///
/// ```
/// use msp_codec::msp::crc::crc8_dvb_s2;
///
/// assert_eq!(crc8_dvb_s2(&[0x01]), 0xD5);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    crc8_dvb_s2_with_initial(data, 0)
}

/// Calculate CRC8-DVB-S2 checksum continuing from a previous value
///
/// Chaining `crc8_dvb_s2_with_initial(b, crc8_dvb_s2(a))` equals
/// `crc8_dvb_s2(a ++ b)`, which lets the v2 decoder checksum the header and
/// payload without concatenating them.
///
/// # Arguments
///
/// * `data` - Bytes to feed into the CRC
/// * `initial` - CRC value to start from
///
/// # Returns
///
/// * `u8` - Updated CRC8 checksum
pub fn crc8_dvb_s2_with_initial(data: &[u8], initial: u8) -> u8 {
    let mut crc = initial;

    for &byte in data {
        crc = CRC8_TABLE[(crc ^ byte) as usize];
    }

    crc
}

/// Calculate CRC8-DVB-S2 checksum using direct algorithm (slow, for verification)
#[cfg(test)]
fn crc8_dvb_s2_slow(data: &[u8]) -> u8 {
    let mut crc: u8 = 0;

    for &byte in data {
        crc ^= byte;

        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC8_POLY;
            } else {
                crc <<= 1;
            }
        }
    }

    crc
}

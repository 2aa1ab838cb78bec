//! # MSP Frame Encoder
//!
//! Builds v1 and v2 frames ready to be written to the link.

use super::crc::{crc8_dvb_s2, xor_checksum};
use super::protocol::*;
use crate::error::{MspError, Result};

/// Encode an MSP v1 frame
///
/// # Arguments
///
/// * `direction` - Direction marker (`<` for requests)
/// * `code` - 8-bit message code
/// * `payload` - Payload data (max 255 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - `$M` + dir + size + code + payload + XOR checksum
///
/// # Errors
///
/// Returns error if the payload does not fit in the one-byte size field
///
/// # Examples
///
/// ```
/// use msp_codec::msp::encoder::encode_v1;
/// use msp_codec::msp::protocol::Direction;
///
/// let frame = encode_v1(Direction::ToFc, 1, &[]).unwrap();
/// assert_eq!(frame, b"$M<\x00\x01\x01");
/// ```
pub fn encode_v1(direction: Direction, code: u8, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MSP_V1_MAX_PAYLOAD_SIZE {
        return Err(MspError::Protocol(format!(
            "v1 payload size {} exceeds maximum {}",
            payload.len(),
            MSP_V1_MAX_PAYLOAD_SIZE
        )));
    }

    let size = payload.len() as u8;

    // Checksum covers size + code + payload
    let checksum = xor_checksum(&[size, code]) ^ xor_checksum(payload);

    let mut frame = Vec::with_capacity(3 + 2 + payload.len() + 1);
    frame.extend_from_slice(&[MSP_PREAMBLE, MSP_V1_MARKER, direction.as_byte()]);
    frame.push(size);
    frame.push(code);
    frame.extend_from_slice(payload);
    frame.push(checksum);

    Ok(frame)
}

/// Encode an MSP v2 frame
///
/// # Arguments
///
/// * `direction` - Direction marker (`<` for requests)
/// * `flag` - Flag byte (0 for ordinary traffic)
/// * `code` - 16-bit message code
/// * `payload` - Payload data (max 65535 bytes)
///
/// # Returns
///
/// * `Result<Vec<u8>>` - `$X` + dir + flag + code LE + size LE + payload + CRC8
///
/// # Errors
///
/// Returns error if the payload does not fit in the two-byte size field
pub fn encode_v2(direction: Direction, flag: u8, code: u16, payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MSP_V2_MAX_PAYLOAD_SIZE {
        return Err(MspError::Protocol(format!(
            "v2 payload size {} exceeds maximum {}",
            payload.len(),
            MSP_V2_MAX_PAYLOAD_SIZE
        )));
    }

    let [code_lo, code_hi] = code.to_le_bytes();
    let [size_lo, size_hi] = (payload.len() as u16).to_le_bytes();
    let header = [flag, code_lo, code_hi, size_lo, size_hi];

    let mut frame = Vec::with_capacity(3 + MSP_V2_HEADER_SIZE + payload.len() + 1);
    frame.extend_from_slice(&[MSP_PREAMBLE, MSP_V2_MARKER, direction.as_byte()]);
    frame.extend_from_slice(&header);
    frame.extend_from_slice(payload);

    // CRC covers header + payload, i.e. everything after the direction byte
    let crc = crc8_dvb_s2(&frame[3..]);
    frame.push(crc);

    Ok(frame)
}

impl MspFrame {
    /// Encode this frame back into wire bytes (v2 frames use flag 0)
    ///
    /// # Errors
    ///
    /// Returns error if the code or payload do not fit the frame's version
    pub fn encode(&self) -> Result<Vec<u8>> {
        match self.version {
            Version::V1 => {
                let code = u8::try_from(self.code).map_err(|_| {
                    MspError::Protocol(format!("v1 code {} does not fit in one byte", self.code))
                })?;
                encode_v1(self.direction, code, &self.payload)
            }
            Version::V2 => encode_v2(self.direction, 0, self.code, &self.payload),
        }
    }
}

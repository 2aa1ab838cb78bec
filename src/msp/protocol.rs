//! # MSP Protocol Constants and Types
//!
//! Core wire definitions shared by the encoder and the frame decoder.
//!
//! ```text
//! v1: '$' 'M' dir size(1) code(1)            payload[size] xor(1)
//! v2: '$' 'X' dir flag(1) code(2 LE) size(2 LE) payload[size] crc8(1)
//! ```

/// Every frame starts with this byte
pub const MSP_PREAMBLE: u8 = b'$';

/// Version marker for v1 frames
pub const MSP_V1_MARKER: u8 = b'M';

/// Version marker for v2 frames
pub const MSP_V2_MARKER: u8 = b'X';

/// Request towards the flight controller
pub const MSP_DIRECTION_TO_FC: u8 = b'<';

/// Response from the flight controller
pub const MSP_DIRECTION_FROM_FC: u8 = b'>';

/// Error response (unsupported code)
pub const MSP_DIRECTION_ERROR: u8 = b'!';

/// Largest payload a v1 size byte can describe
pub const MSP_V1_MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Largest payload a v2 size field can describe
pub const MSP_V2_MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Bytes in the v2 header covered by the CRC: flag, code lo/hi, size lo/hi
pub const MSP_V2_HEADER_SIZE: usize = 5;

/// Framing format, chosen by the byte following the preamble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// `$M`: 8-bit code and size, XOR checksum
    V1,
    /// `$X`: 16-bit code and size, CRC8-DVB-S2
    V2,
}

impl Version {
    /// Parse the version marker byte
    pub fn from_marker(byte: u8) -> Option<Self> {
        match byte {
            MSP_V1_MARKER => Some(Self::V1),
            MSP_V2_MARKER => Some(Self::V2),
            _ => None,
        }
    }

    /// Marker byte written after the preamble
    pub fn marker(self) -> u8 {
        match self {
            Self::V1 => MSP_V1_MARKER,
            Self::V2 => MSP_V2_MARKER,
        }
    }

    /// Numeric version (1 or 2)
    pub fn number(self) -> u8 {
        match self {
            Self::V1 => 1,
            Self::V2 => 2,
        }
    }
}

/// Frame direction marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `<`
    ToFc,
    /// `>`
    FromFc,
    /// `!`
    Error,
}

impl Direction {
    /// Parse the direction byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            MSP_DIRECTION_TO_FC => Some(Self::ToFc),
            MSP_DIRECTION_FROM_FC => Some(Self::FromFc),
            MSP_DIRECTION_ERROR => Some(Self::Error),
            _ => None,
        }
    }

    /// Byte as it appears on the wire
    pub fn as_byte(self) -> u8 {
        match self {
            Self::ToFc => MSP_DIRECTION_TO_FC,
            Self::FromFc => MSP_DIRECTION_FROM_FC,
            Self::Error => MSP_DIRECTION_ERROR,
        }
    }
}

/// A complete, checksum-valid MSP frame
///
/// Decoded frames own a copy of their payload; the decoder's internal
/// buffer is reused for the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MspFrame {
    /// Framing format the frame arrived in
    pub version: Version,

    /// Direction marker
    pub direction: Direction,

    /// Message code (always < 256 for v1)
    pub code: u16,

    /// Payload data
    pub payload: Vec<u8>,
}

impl MspFrame {
    /// Create a new frame
    pub fn new(version: Version, direction: Direction, code: u16, payload: Vec<u8>) -> Self {
        Self {
            version,
            direction,
            code,
            payload,
        }
    }

    /// Flatten into `(version, direction, code, payload)` using wire values
    ///
    /// # Examples
    ///
    /// ```
    /// use msp_codec::msp::protocol::{Direction, MspFrame, Version};
    ///
    /// let frame = MspFrame::new(Version::V1, Direction::FromFc, 2, b"BTFL".to_vec());
    /// assert_eq!(frame.into_parts(), (1, b'>', 2, b"BTFL".to_vec()));
    /// ```
    pub fn into_parts(self) -> (u8, u8, u16, Vec<u8>) {
        (
            self.version.number(),
            self.direction.as_byte(),
            self.code,
            self.payload,
        )
    }
}

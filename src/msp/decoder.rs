//! # MSP Frame Decoder
//!
//! Incremental, byte-at-a-time frame synchronizer for v1 and v2 frames.
//!
//! The decoder keeps its parse state between calls, so a frame may be split
//! across any number of [`FrameDecoder::decode`] calls. Frames with a bad
//! checksum and bytes that break the preamble are dropped silently; install a
//! [`FrameObserver`] to see them.
//!
//! ```text
//! Idle -> Preamble -> Direction -+-> V1Size -> V1Code -> V1Payload* -> V1Checksum
//!                                +-> V2Header(x5) -> V2Payload* -> V2Checksum
//! ```

use tracing::{debug, trace, warn};

use super::crc::{crc8_dvb_s2, crc8_dvb_s2_with_initial};
use super::protocol::*;
use crate::config::DecoderConfig;
use crate::error::{MspError, Result};

/// Why an in-progress frame was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The trailing checksum byte did not match the frame contents
    ChecksumMismatch {
        /// Framing format of the dropped frame
        version: Version,
        /// Message code of the dropped frame
        code: u16,
        /// Checksum computed over the received bytes
        expected: u8,
        /// Checksum byte found on the wire
        received: u8,
    },

    /// Byte after `$` was neither `M` nor `X`
    BadVersionMarker(u8),

    /// Byte after the version marker was not `<`, `>` or `!`
    BadDirection(u8),
}

/// Hook for diagnostics on dropped frames
#[cfg_attr(test, mockall::automock)]
pub trait FrameObserver: Send {
    /// Called once for every frame dropped on a bad checksum or broken sync
    fn on_rejected(&mut self, rejection: &Rejection);
}

/// Running counters for one decoder instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Bytes fed into the decoder
    pub bytes_processed: u64,
    /// Checksum-valid frames emitted
    pub frames_decoded: u64,
    /// Frames dropped on checksum mismatch
    pub checksum_failures: u64,
    /// Resets caused by a bad version or direction byte
    pub sync_failures: u64,
    /// Frames aborted because their payload could not be stored
    pub oversized_frames: u64,
}

/// Position in the frame automaton; each variant carries only what it needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Preamble,
    Direction {
        version: Version,
    },
    V1Size {
        direction: Direction,
    },
    V1Code {
        direction: Direction,
        size: usize,
        checksum: u8,
    },
    V1Payload {
        direction: Direction,
        code: u8,
        size: usize,
        checksum: u8,
    },
    V1Checksum {
        direction: Direction,
        code: u8,
        checksum: u8,
    },
    V2Header {
        direction: Direction,
        header: [u8; MSP_V2_HEADER_SIZE],
        filled: usize,
    },
    V2Payload {
        direction: Direction,
        header: [u8; MSP_V2_HEADER_SIZE],
        code: u16,
        size: usize,
    },
    V2Checksum {
        direction: Direction,
        header: [u8; MSP_V2_HEADER_SIZE],
        code: u16,
    },
}

/// Stateful MSP frame decoder
///
/// One instance per byte stream. The payload buffer is reused across frames
/// and only ever grows; its length is the number of payload bytes received
/// for the frame in progress.
///
/// # Examples
///
/// ```
/// use msp_codec::msp::decoder::FrameDecoder;
/// use msp_codec::msp::encoder::encode_v1;
/// use msp_codec::msp::protocol::Direction;
///
/// let raw = encode_v1(Direction::FromFc, 2, b"BTFL").unwrap();
/// let mut decoder = FrameDecoder::new();
///
/// // Split the frame across two calls
/// assert!(decoder.decode(&raw[..4]).unwrap().is_empty());
/// let frames = decoder.decode(&raw[4..]).unwrap();
///
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].code, 2);
/// assert_eq!(frames[0].payload, b"BTFL");
/// ```
pub struct FrameDecoder {
    state: State,
    payload: Vec<u8>,
    max_payload_len: usize,
    log_rejections: bool,
    observer: Option<Box<dyn FrameObserver>>,
    stats: DecoderStats,
}

impl std::fmt::Debug for FrameDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDecoder")
            .field("state", &self.state)
            .field("payload_capacity", &self.payload.capacity())
            .field("max_payload_len", &self.max_payload_len)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder with the default limits
    pub fn new() -> Self {
        Self::with_config(&DecoderConfig::default())
    }

    /// Create a decoder from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Payload limits and rejection logging
    pub fn with_config(config: &DecoderConfig) -> Self {
        Self {
            state: State::Idle,
            payload: Vec::with_capacity(config.initial_payload_capacity.min(config.max_payload_len)),
            max_payload_len: config.max_payload_len,
            log_rejections: config.log_rejections,
            observer: None,
            stats: DecoderStats::default(),
        }
    }

    /// Install a hook that sees checksum and sync rejections
    pub fn set_observer(&mut self, observer: Box<dyn FrameObserver>) {
        self.observer = Some(observer);
    }

    /// Remove the rejection hook, returning it
    pub fn take_observer(&mut self) -> Option<Box<dyn FrameObserver>> {
        self.observer.take()
    }

    /// Counters accumulated since construction
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// True when no frame is in progress
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Current payload buffer capacity in bytes
    pub fn payload_capacity(&self) -> usize {
        self.payload.capacity()
    }

    /// Drop any partially received frame and wait for the next `$`
    pub fn reset(&mut self) {
        self.state = State::Idle;
        self.payload.clear();
    }

    /// Decode a chunk of raw bytes
    ///
    /// # Arguments
    ///
    /// * `data` - Next bytes from the stream, any length
    ///
    /// # Returns
    ///
    /// * `Result<Vec<MspFrame>>` - Frames completed by this chunk, in stream order
    ///
    /// # Errors
    ///
    /// Returns [`MspError::ResourceExhausted`] if a frame declares a payload the
    /// decoder cannot store. That frame is aborted and scanning resumes at the
    /// next byte, but the frames completed by this chunk are lost with the
    /// error; use [`FrameDecoder::decode_into`] to keep them.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<MspFrame>> {
        let mut frames = Vec::new();
        self.decode_into(data, &mut frames)?;
        Ok(frames)
    }

    /// Decode a chunk of raw bytes, appending completed frames to `frames`
    ///
    /// An oversized frame only aborts itself: the decoder resets to idle and
    /// keeps scanning, so every valid frame in the chunk ends up in `frames`.
    ///
    /// # Errors
    ///
    /// Returns the first [`MspError::ResourceExhausted`] hit in the chunk,
    /// after the whole chunk has been consumed
    pub fn decode_into(&mut self, data: &[u8], frames: &mut Vec<MspFrame>) -> Result<()> {
        let mut first_error = None;

        for &byte in data {
            if let Err(e) = self.step(byte, frames) {
                self.stats.oversized_frames += 1;
                self.reset();
                first_error.get_or_insert(e);
            }
        }

        self.stats.bytes_processed += data.len() as u64;
        first_error.map_or(Ok(()), Err)
    }

    /// Advance the automaton by one byte
    fn step(&mut self, byte: u8, frames: &mut Vec<MspFrame>) -> Result<()> {
        // Any early return leaves the decoder idle
        let state = std::mem::replace(&mut self.state, State::Idle);

        self.state = match state {
            State::Idle => {
                if byte == MSP_PREAMBLE {
                    State::Preamble
                } else {
                    State::Idle
                }
            }

            State::Preamble => match Version::from_marker(byte) {
                Some(version) => State::Direction { version },
                None => {
                    self.stats.sync_failures += 1;
                    self.reject(Rejection::BadVersionMarker(byte));
                    State::Idle
                }
            },

            State::Direction { version } => match (Direction::from_byte(byte), version) {
                (Some(direction), Version::V1) => State::V1Size { direction },
                (Some(direction), Version::V2) => State::V2Header {
                    direction,
                    header: [0; MSP_V2_HEADER_SIZE],
                    filled: 0,
                },
                (None, _) => {
                    self.stats.sync_failures += 1;
                    self.reject(Rejection::BadDirection(byte));
                    State::Idle
                }
            },

            // --- v1 ---
            State::V1Size { direction } => {
                let size = byte as usize;
                self.prepare_payload(size)?;
                State::V1Code {
                    direction,
                    size,
                    checksum: byte,
                }
            }

            State::V1Code {
                direction,
                size,
                checksum,
            } => {
                let checksum = checksum ^ byte;
                if size == 0 {
                    State::V1Checksum {
                        direction,
                        code: byte,
                        checksum,
                    }
                } else {
                    State::V1Payload {
                        direction,
                        code: byte,
                        size,
                        checksum,
                    }
                }
            }

            State::V1Payload {
                direction,
                code,
                size,
                checksum,
            } => {
                self.payload.push(byte);
                let checksum = checksum ^ byte;
                if self.payload.len() == size {
                    State::V1Checksum {
                        direction,
                        code,
                        checksum,
                    }
                } else {
                    State::V1Payload {
                        direction,
                        code,
                        size,
                        checksum,
                    }
                }
            }

            State::V1Checksum {
                direction,
                code,
                checksum,
            } => {
                self.finish(Version::V1, direction, code as u16, checksum, byte, frames);
                State::Idle
            }

            // --- v2 ---
            State::V2Header {
                direction,
                mut header,
                filled,
            } => {
                header[filled] = byte;
                let filled = filled + 1;

                if filled < MSP_V2_HEADER_SIZE {
                    State::V2Header {
                        direction,
                        header,
                        filled,
                    }
                } else {
                    let code = u16::from_le_bytes([header[1], header[2]]);
                    let size = u16::from_le_bytes([header[3], header[4]]) as usize;
                    self.prepare_payload(size)?;

                    if size == 0 {
                        State::V2Checksum {
                            direction,
                            header,
                            code,
                        }
                    } else {
                        State::V2Payload {
                            direction,
                            header,
                            code,
                            size,
                        }
                    }
                }
            }

            State::V2Payload {
                direction,
                header,
                code,
                size,
            } => {
                self.payload.push(byte);
                if self.payload.len() == size {
                    State::V2Checksum {
                        direction,
                        header,
                        code,
                    }
                } else {
                    State::V2Payload {
                        direction,
                        header,
                        code,
                        size,
                    }
                }
            }

            State::V2Checksum {
                direction,
                header,
                code,
            } => {
                let expected = crc8_dvb_s2_with_initial(&self.payload, crc8_dvb_s2(&header));
                self.finish(Version::V2, direction, code, expected, byte, frames);
                State::Idle
            }
        };

        Ok(())
    }

    /// Start a new payload of `size` bytes, growing the buffer if needed
    ///
    /// Growth is fallible: the buffer is never written past what was
    /// successfully reserved.
    fn prepare_payload(&mut self, size: usize) -> Result<()> {
        self.payload.clear();

        if size > self.max_payload_len {
            warn!(
                "Declared payload of {} bytes exceeds limit of {} bytes",
                size, self.max_payload_len
            );
            return Err(MspError::ResourceExhausted {
                requested: size,
                limit: self.max_payload_len,
            });
        }

        if size > self.payload.capacity() {
            self.payload.try_reserve_exact(size).map_err(|e| {
                warn!("Failed to grow payload buffer to {} bytes: {}", size, e);
                MspError::ResourceExhausted {
                    requested: size,
                    limit: self.max_payload_len,
                }
            })?;
            debug!("Payload buffer grown to {} bytes", self.payload.capacity());
        }

        Ok(())
    }

    /// Emit the frame if the checksum matches, otherwise report the drop
    fn finish(
        &mut self,
        version: Version,
        direction: Direction,
        code: u16,
        expected: u8,
        received: u8,
        frames: &mut Vec<MspFrame>,
    ) {
        if expected == received {
            trace!(
                "Decoded {:?} frame code={} payload_len={}",
                version,
                code,
                self.payload.len()
            );
            self.stats.frames_decoded += 1;
            frames.push(MspFrame::new(version, direction, code, self.payload.clone()));
        } else {
            self.stats.checksum_failures += 1;
            self.reject(Rejection::ChecksumMismatch {
                version,
                code,
                expected,
                received,
            });
        }

        self.payload.clear();
    }

    fn reject(&mut self, rejection: Rejection) {
        if self.log_rejections {
            debug!("Dropped MSP frame: {:?}", rejection);
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.on_rejected(&rejection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::msp::crc::xor_checksum;
    use crate::msp::encoder::{encode_v1, encode_v2};
    use std::sync::{Arc, Mutex};

    fn v1_response(code: u8, payload: &[u8]) -> Vec<u8> {
        encode_v1(Direction::FromFc, code, payload).unwrap()
    }

    fn v2_response(code: u16, payload: &[u8]) -> Vec<u8> {
        encode_v2(Direction::FromFc, 0, code, payload).unwrap()
    }

    #[test]
    fn test_decode_v1_empty_payload() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&v1_response(1, &[])).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].version, Version::V1);
        assert_eq!(frames[0].direction, Direction::FromFc);
        assert_eq!(frames[0].code, 1);
        assert!(frames[0].payload.is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decode_v1_hand_built_request() {
        // $M< + size + code + payload + xor(size, code, payload)
        let payload = [0x03, 0x01, 0x05];
        let mut raw = b"$M<".to_vec();
        raw.extend_from_slice(&[3, 108]);
        raw.extend_from_slice(&payload);
        raw.push(xor_checksum(&[3, 108, 0x03, 0x01, 0x05]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].clone().into_parts(), (1, b'<', 108, payload.to_vec()));
    }

    #[test]
    fn test_decode_v1_with_payload() {
        let payload = [0x03, 0x01, 0x05, 0x42, 0x54, 0x46, 0x4C];
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&v1_response(2, &payload)).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, payload);
    }

    #[test]
    fn test_decode_v1_bad_checksum_dropped() {
        let mut raw = v1_response(1, &[]);
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert!(frames.is_empty());
        assert!(decoder.is_idle());
        assert_eq!(decoder.stats().checksum_failures, 1);
    }

    #[test]
    fn test_decode_v1_byte_by_byte() {
        let raw = v1_response(3, &[0x01, 0x02, 0x03]);
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();

        for &byte in &raw {
            frames.extend(decoder.decode(&[byte]).unwrap());
        }

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, vec![0x01, 0x02, 0x03]);
    }

    #[test]
    fn test_decode_v2_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&v2_response(2, b"BTFL")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].clone().into_parts(), (2, b'>', 2, b"BTFL".to_vec()));
    }

    #[test]
    fn test_decode_v2_request_direction() {
        let raw = encode_v2(Direction::ToFc, 0, 0x1F03, &[0xAA]).unwrap();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].clone().into_parts(), (2, b'<', 0x1F03, vec![0xAA]));
    }

    #[test]
    fn test_decode_v2_empty_payload() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&v2_response(0x0100, &[])).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 0x0100);
        assert!(frames[0].payload.is_empty());
    }

    #[test]
    fn test_decode_v2_bad_crc_dropped() {
        let mut raw = v2_response(1, &[0x01]);
        let last = raw.len() - 1;
        raw[last] ^= 0xAA;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(&raw).unwrap().is_empty());
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decode_v2_nonzero_flag_covered_by_crc() {
        let raw = encode_v2(Direction::FromFc, 0x01, 7, &[0x10, 0x20]).unwrap();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();
        assert_eq!(frames.len(), 1);

        let mut corrupted = raw.clone();
        corrupted[3] = 0x00; // flag byte
        assert!(decoder.decode(&corrupted).unwrap().is_empty());
    }

    #[test]
    fn test_decode_v2_large_payload() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(256 * 64).collect();
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&v2_response(0x1234, &payload)).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 0x1234);
        assert_eq!(frames[0].payload, payload);
        assert!(decoder.payload_capacity() >= payload.len());
    }

    #[test]
    fn test_fragmentation_invariance() {
        let raw = v2_response(0x3003, &[9, 8, 7, 6, 5, 4, 3, 2, 1]);

        let mut whole = FrameDecoder::new();
        let expected = whole.decode(&raw).unwrap();

        for split in 1..raw.len() {
            let mut decoder = FrameDecoder::new();
            let mut frames = decoder.decode(&raw[..split]).unwrap();
            frames.extend(decoder.decode(&raw[split..]).unwrap());
            assert_eq!(frames, expected, "split at {}", split);
        }
    }

    #[test]
    fn test_multiple_frames_in_order() {
        let mut raw = v1_response(1, &[0x01, 0x02]);
        raw.extend(v2_response(0x0200, b"BTFL"));
        raw.extend(v1_response(3, &[]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        let codes: Vec<u16> = frames.iter().map(|f| f.code).collect();
        assert_eq!(codes, vec![1, 0x0200, 3]);
        assert_eq!(decoder.stats().frames_decoded, 3);
    }

    #[test]
    fn test_noise_before_frame() {
        let mut raw = vec![0x00, 0xFF, 0x12, 0x34, b'M', b'<'];
        raw.extend(v1_response(5, &[0xAB]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 5);
        assert_eq!(frames[0].payload, vec![0xAB]);
    }

    #[test]
    fn test_bad_version_marker_resets() {
        let mut raw = b"$Q".to_vec();
        raw.extend(v1_response(4, &[]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(decoder.stats().sync_failures, 1);
    }

    #[test]
    fn test_bad_direction_resets() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.decode(b"$M?").unwrap().is_empty());
        assert!(decoder.is_idle());
        assert_eq!(decoder.stats().sync_failures, 1);
    }

    #[test]
    fn test_corrupted_frame_followed_by_valid_frame() {
        let mut bad = v1_response(1, &[0x10, 0x20]);
        let last = bad.len() - 1;
        bad[last] ^= 0x01;

        let mut raw = bad;
        raw.extend(v1_response(2, &[0x30]));

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 2);
    }

    #[test]
    fn test_partial_frame_left_pending() {
        let raw = v1_response(6, &[1, 2, 3, 4]);
        let mut decoder = FrameDecoder::new();

        assert!(decoder.decode(&raw[..7]).unwrap().is_empty());
        assert!(!decoder.is_idle());

        decoder.reset();
        assert!(decoder.is_idle());
        assert!(decoder.decode(&raw[7..]).unwrap().is_empty());
    }

    #[test]
    fn test_payload_over_limit_is_resource_exhaustion() {
        let config = DecoderConfig {
            max_payload_len: 16,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);

        let result = decoder.decode(&v2_response(1, &[0u8; 17]));
        assert!(matches!(
            result,
            Err(MspError::ResourceExhausted {
                requested: 17,
                limit: 16
            })
        ));
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_decoder_recovers_after_resource_exhaustion() {
        let config = DecoderConfig {
            max_payload_len: 4,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);

        assert!(decoder.decode(&v1_response(1, &[0u8; 5])).is_err());

        let frames = decoder.decode(&v1_response(2, &[1, 2, 3, 4])).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_decode_into_keeps_frames_before_error() {
        let config = DecoderConfig {
            max_payload_len: 8,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);

        let mut raw = v1_response(1, &[0xAA]);
        raw.extend(v1_response(2, &[0u8; 9]));

        let mut frames = Vec::new();
        let result = decoder.decode_into(&raw, &mut frames);

        assert!(result.is_err());
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].code, 1);
    }

    #[test]
    fn test_oversized_header_does_not_hide_later_frames() {
        let config = DecoderConfig {
            max_payload_len: 1024,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);

        // Line noise that parses as a v2 header declaring 65535 bytes
        let mut raw = b"$X>\x00\x01\x00\xff\xff".to_vec();
        raw.extend(v1_response(3, &[7, 8]));
        raw.extend(v2_response(0x1001, &[9]));

        let mut frames = Vec::new();
        let result = decoder.decode_into(&raw, &mut frames);

        assert!(matches!(
            result,
            Err(MspError::ResourceExhausted {
                requested: 65_535,
                limit: 1024
            })
        ));
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].code, 3);
        assert_eq!(frames[0].payload, vec![7, 8]);
        assert_eq!(frames[1].code, 0x1001);
        assert!(decoder.is_idle());

        let stats = decoder.stats();
        assert_eq!(stats.oversized_frames, 1);
        assert_eq!(stats.frames_decoded, 2);
        assert_eq!(stats.bytes_processed, raw.len() as u64);
    }

    #[test]
    fn test_first_resource_error_is_reported() {
        let config = DecoderConfig {
            max_payload_len: 4,
            ..DecoderConfig::default()
        };
        let mut decoder = FrameDecoder::with_config(&config);

        let mut raw = v1_response(1, &[0u8; 5]);
        raw.extend(v1_response(2, &[0u8; 6]));

        let mut frames = Vec::new();
        let result = decoder.decode_into(&raw, &mut frames);

        assert!(matches!(
            result,
            Err(MspError::ResourceExhausted { requested: 5, .. })
        ));
        assert!(frames.is_empty());
        assert_eq!(decoder.stats().oversized_frames, 2);
    }

    #[test]
    fn test_payload_capacity_never_shrinks() {
        let mut decoder = FrameDecoder::new();
        decoder.decode(&v2_response(1, &[0u8; 1000])).unwrap();
        let grown = decoder.payload_capacity();
        assert!(grown >= 1000);

        decoder.decode(&v1_response(2, &[1])).unwrap();
        assert_eq!(decoder.payload_capacity(), grown);
    }

    #[test]
    fn test_observer_sees_checksum_mismatch() {
        let mut observer = MockFrameObserver::new();
        observer
            .expect_on_rejected()
            .withf(|r| {
                matches!(
                    r,
                    Rejection::ChecksumMismatch {
                        version: Version::V1,
                        code: 9,
                        ..
                    }
                )
            })
            .times(1)
            .return_const(());

        let mut raw = v1_response(9, &[1, 2]);
        let last = raw.len() - 1;
        raw[last] ^= 0x55;

        let mut decoder = FrameDecoder::new();
        decoder.set_observer(Box::new(observer));
        assert!(decoder.decode(&raw).unwrap().is_empty());
    }

    #[test]
    fn test_observer_not_called_for_valid_frames() {
        let mut observer = MockFrameObserver::new();
        observer.expect_on_rejected().times(0);

        let mut decoder = FrameDecoder::new();
        decoder.set_observer(Box::new(observer));
        assert_eq!(decoder.decode(&v2_response(1, b"ok")).unwrap().len(), 1);
    }

    #[test]
    fn test_observer_sees_sync_failures() {
        struct Recorder(Arc<Mutex<Vec<Rejection>>>);

        impl FrameObserver for Recorder {
            fn on_rejected(&mut self, rejection: &Rejection) {
                self.0.lock().unwrap().push(*rejection);
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut decoder = FrameDecoder::new();
        decoder.set_observer(Box::new(Recorder(seen.clone())));

        decoder.decode(b"$Z$X?").unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Rejection::BadVersionMarker(b'Z'), Rejection::BadDirection(b'?')]
        );
        assert!(decoder.take_observer().is_some());
    }

    #[test]
    fn test_decode_error_direction_max_v1() {
        let payload: Vec<u8> = (0..=254).collect();
        let raw = encode_v1(Direction::Error, 0xFE, &payload).unwrap();
        assert_eq!(raw[2], b'!');
        assert_eq!(raw[3], 255);

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&raw).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].version, Version::V1);
        assert_eq!(frames[0].direction, Direction::Error);
        assert_eq!(frames[0].code, 0xFE);
        assert_eq!(frames[0].payload, payload);
        assert!(decoder.is_idle());
    }

    #[test]
    fn test_stats_count_bytes() {
        let raw = v1_response(1, &[1, 2, 3]);
        let mut decoder = FrameDecoder::new();
        decoder.decode(&raw).unwrap();
        decoder.decode(&[0x00, 0x01]).unwrap();

        assert_eq!(decoder.stats().bytes_processed, raw.len() as u64 + 2);
    }
}

//! # Telemetry Module
//!
//! Writes decoded frames as JSON Lines, one record per frame.

use std::io::Write;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::msp::protocol::MspFrame;

/// Serializable view of one decoded frame
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FrameRecord {
    /// RFC 3339 time the record was produced
    pub timestamp: String,
    /// Framing format, `1` or `2`
    pub version: u8,
    /// Direction marker as a character (`<`, `>` or `!`)
    pub direction: char,
    /// Message code; v1 codes fit in the low byte
    pub code: u16,
    /// Payload length in bytes
    pub payload_len: usize,
    /// Payload as lowercase hex
    pub payload: String,
}

impl FrameRecord {
    /// Build a record stamped with the current time
    pub fn from_frame(frame: &MspFrame) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: frame.version.number(),
            direction: char::from(frame.direction.as_byte()),
            code: frame.code,
            payload_len: frame.payload.len(),
            payload: hex::encode(&frame.payload),
        }
    }
}

/// JSON Lines sink
#[derive(Debug)]
pub struct JsonlWriter<W: Write> {
    inner: W,
    records: u64,
}

impl<W: Write> JsonlWriter<W> {
    /// Wrap `inner`; nothing is written until the first frame
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    /// Append one frame as a JSON line
    ///
    /// # Errors
    ///
    /// Returns error if writing to the underlying sink fails
    pub fn write_frame(&mut self, frame: &MspFrame) -> Result<()> {
        let record = FrameRecord::from_frame(frame);
        serde_json::to_writer(&mut self.inner, &record).map_err(std::io::Error::from)?;
        self.inner.write_all(b"\n")?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and return the underlying sink
    pub fn into_inner(mut self) -> Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

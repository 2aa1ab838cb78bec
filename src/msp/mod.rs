//! # MSP Protocol Module
//!
//! Implementation of the MultiWii Serial Protocol framing used by
//! Betaflight-family flight controllers.
//!
//! This module handles:
//! - v1 (`$M`) and v2 (`$X`) frame encoding
//! - Incremental frame synchronization across fragmented reads
//! - XOR and CRC8-DVB-S2 checksum calculation

pub mod protocol;
pub mod encoder;
pub mod decoder;
pub mod crc;

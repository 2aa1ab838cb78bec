//! # MSP Codec Library
//!
//! Wire codec for the MultiWii Serial Protocol spoken by Betaflight-family
//! flight controllers, plus the Huffman decoder for compressed blackbox
//! dataflash reads.
//!
//! This library provides checksums, v1/v2 frame encoding, an incremental
//! frame decoder for fragmented byte streams, and the fixed-table Huffman
//! decoder. Where the bytes come from and what each message code means is
//! left to the caller.

pub mod config;
pub mod error;
pub mod msp;
pub mod huffman;
pub mod capture;
pub mod telemetry;

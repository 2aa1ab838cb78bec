//! # Huffman Module
//!
//! Decompression of Huffman-coded blackbox dataflash blocks.
//!
//! This module handles:
//! - The fixed 257-symbol code list and its (length, code) lookup
//! - MSB-first bit decoding with early end-of-stream termination

pub mod table;
pub mod decoder;

pub use decoder::{huffman_decode, HuffmanDecoder};
pub use table::{HuffmanCode, HuffmanTable, Symbol};

//! # Error Types
//!
//! Custom error types for MSP Codec using `thiserror`.
//!
//! Checksum mismatches and lost sync are not errors: the frame decoder
//! drops those frames and keeps scanning.

use thiserror::Error;

/// Main error type for MSP Codec
#[derive(Debug, Error)]
pub enum MspError {
    /// Frame cannot be represented on the wire
    #[error("MSP protocol error: {0}")]
    Protocol(String),

    /// A buffer could not grow to the size a frame or block asked for
    #[error("Resource exhausted: {requested} bytes requested, limit is {limit}")]
    ResourceExhausted {
        /// Bytes the input asked for
        requested: usize,
        /// Largest allocation the caller allows
        limit: usize,
    },

    /// Caller passed an argument outside the accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Custom Huffman code list is unusable
    #[error("Invalid Huffman table entry {index}: {reason}")]
    InvalidHuffmanTable {
        /// Position of the offending entry in the code list
        index: usize,
        /// What is wrong with it
        reason: &'static str,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for MSP Codec
pub type Result<T> = std::result::Result<T, MspError>;

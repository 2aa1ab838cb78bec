//! # Huffman Bit Decoder
//!
//! Expands a compressed blackbox block back into bytes.

use tracing::trace;

use super::table::{HuffmanTable, Symbol, HUFFMAN_MAX_CODE_LEN};
use crate::error::{MspError, Result};

/// Default ceiling on the requested output length (a dataflash block's
/// character count is a 16-bit field)
pub const DEFAULT_MAX_OUTPUT_LEN: usize = u16::MAX as usize;

/// Decoder bound to a code table and an output-length limit
#[derive(Debug, Clone, Copy)]
pub struct HuffmanDecoder<'t> {
    table: &'t HuffmanTable,
    max_output_len: usize,
}

impl Default for HuffmanDecoder<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl HuffmanDecoder<'static> {
    /// Decoder over the default code table
    pub fn new() -> Self {
        Self::with_table(HuffmanTable::default_table())
    }
}

impl<'t> HuffmanDecoder<'t> {
    /// Decoder over a custom code table
    pub fn with_table(table: &'t HuffmanTable) -> Self {
        Self {
            table,
            max_output_len: DEFAULT_MAX_OUTPUT_LEN,
        }
    }

    /// Change the largest output length callers may request
    pub fn with_max_output_len(mut self, max_output_len: usize) -> Self {
        self.max_output_len = max_output_len;
        self
    }

    /// Decode up to `output_len` bytes from `input`
    ///
    /// Bits are read MSB-first. After each bit the accumulated code is looked
    /// up at its current length; a byte match is emitted and the accumulator
    /// cleared, no match keeps accumulating, and the end marker stops
    /// decoding. Running out of input or hitting the end marker before
    /// `output_len` bytes is normal for the last block of a log.
    ///
    /// # Arguments
    ///
    /// * `input` - Compressed bitstream
    /// * `output_len` - Number of bytes the block claims to contain
    ///
    /// # Returns
    ///
    /// * `Result<Vec<u8>>` - At most `output_len` decoded bytes
    ///
    /// # Errors
    ///
    /// Returns error if `output_len` exceeds the configured maximum, or if
    /// the output buffer cannot be allocated
    pub fn decode(&self, input: &[u8], output_len: usize) -> Result<Vec<u8>> {
        if output_len > self.max_output_len {
            return Err(MspError::InvalidArgument(format!(
                "requested output length {} exceeds maximum {}",
                output_len, self.max_output_len
            )));
        }

        // Every symbol costs at least one bit
        let bound = output_len.min(input.len().saturating_mul(8));
        let mut output = Vec::new();
        output
            .try_reserve_exact(bound)
            .map_err(|_| MspError::ResourceExhausted {
                requested: bound,
                limit: self.max_output_len,
            })?;

        let mut code: u16 = 0;
        let mut code_len: usize = 0;

        'bits: for &byte in input {
            for shift in (0..8).rev() {
                if output.len() >= output_len {
                    break 'bits;
                }

                code = (code << 1) | u16::from((byte >> shift) & 1);
                code_len += 1;

                if code_len > HUFFMAN_MAX_CODE_LEN {
                    continue;
                }

                match self.table.lookup(code_len, code) {
                    None => {}
                    Some(Symbol::EndOfStream) => {
                        trace!("End of stream after {} of {} bytes", output.len(), output_len);
                        break 'bits;
                    }
                    Some(Symbol::Byte(value)) => {
                        output.push(value);
                        code = 0;
                        code_len = 0;
                    }
                }
            }
        }

        Ok(output)
    }
}

/// Decode with the default table and limit
///
/// # Examples
///
/// ```
/// use msp_codec::huffman::huffman_decode;
///
/// // 0x00 -> 00, 0x01 -> 01, padded with zeros
/// assert_eq!(huffman_decode(&[0b0001_0000], 2).unwrap(), vec![0x00, 0x01]);
/// ```
pub fn huffman_decode(input: &[u8], output_len: usize) -> Result<Vec<u8>> {
    HuffmanDecoder::new().decode(input, output_len)
}

//! # Capture Module
//!
//! Pumps a raw byte source (serial port, recorded capture, socket) through a
//! [`FrameDecoder`] in bounded chunks.
//!
//! Reads may split frames at any byte; the decoder carries the partial frame
//! over to the next chunk.

use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info, warn};

use crate::error::{MspError, Result};
use crate::msp::decoder::FrameDecoder;
use crate::msp::protocol::MspFrame;

/// Read `reader` to EOF, handing every decoded frame to `on_frame`
///
/// # Arguments
///
/// * `reader` - Byte source
/// * `decoder` - Decoder for this stream; it keeps any trailing partial frame
/// * `chunk_size` - Maximum bytes per read
/// * `on_frame` - Called for each frame in stream order
///
/// # Returns
///
/// * `Result<u64>` - Total bytes read
///
/// # Errors
///
/// Returns error if reading fails. Frames whose declared payload the decoder
/// cannot store are logged and skipped; the stream keeps going.
pub async fn decode_reader<R, F>(
    reader: &mut R,
    decoder: &mut FrameDecoder,
    chunk_size: usize,
    mut on_frame: F,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    F: FnMut(MspFrame),
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut frames = Vec::new();
    let mut total: u64 = 0;

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        total += n as u64;

        let result = decoder.decode_into(&buf[..n], &mut frames);
        frames.drain(..).for_each(&mut on_frame);

        match result {
            Ok(()) => {}
            Err(MspError::ResourceExhausted { requested, limit }) => {
                warn!(
                    "Skipped frame declaring {} payload bytes (limit {})",
                    requested, limit
                );
            }
            Err(e) => return Err(e),
        }
    }

    if !decoder.is_idle() {
        debug!("Stream ended inside a frame; partial frame kept by decoder");
    }

    let stats = decoder.stats();
    info!(
        "Read {} bytes: {} frames, {} checksum failures, {} sync failures, {} oversized",
        total,
        stats.frames_decoded,
        stats.checksum_failures,
        stats.sync_failures,
        stats.oversized_frames
    );

    Ok(total)
}

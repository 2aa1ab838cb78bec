//! # MSP Codec
//!
//! Command-line front end for the MSP codec library.
//!
//! ```text
//! msp-codec frames  <capture-file> [config.toml]
//! msp-codec inflate <block-file> <output-length> [config.toml]
//! ```
//!
//! `frames` decodes a raw byte capture of an MSP link and prints one JSON
//! line per frame. `inflate` Huffman-decodes a compressed blackbox block and
//! writes the raw bytes to stdout.

use std::io::Write;

use anyhow::{bail, Context, Result};
use tracing::info;

use msp_codec::capture::decode_reader;
use msp_codec::config::Config;
use msp_codec::huffman::HuffmanDecoder;
use msp_codec::msp::decoder::FrameDecoder;
use msp_codec::telemetry::JsonlWriter;

const USAGE: &str = "usage:\n  msp-codec frames <capture-file> [config.toml]\n  msp-codec inflate <block-file> <output-length> [config.toml]";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout carries data, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("MSP Codec v{} starting...", env!("CARGO_PKG_VERSION"));

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.first().map(String::as_str) {
        Some("frames") => {
            let capture = args.get(1).context(USAGE)?;
            let config = load_config(args.get(2))?;
            run_frames(capture, &config).await
        }
        Some("inflate") => {
            let block = args.get(1).context(USAGE)?;
            let output_len: usize = args
                .get(2)
                .context(USAGE)?
                .parse()
                .context("output-length must be a non-negative integer")?;
            let config = load_config(args.get(3))?;
            run_inflate(block, output_len, &config).await
        }
        _ => bail!(USAGE),
    }
}

fn load_config(path: Option<&String>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(path).with_context(|| format!("loading {}", path))?;
            info!("Loaded configuration from {}", path);
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

/// Decode every frame in a capture file and print it as JSON Lines
async fn run_frames(path: &str, config: &Config) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("opening {}", path))?;

    let mut decoder = FrameDecoder::with_config(&config.decoder);
    let mut writer = JsonlWriter::new(std::io::stdout().lock());
    let mut write_error = None;

    let total = decode_reader(&mut file, &mut decoder, config.capture.read_chunk_size, |frame| {
        if write_error.is_none() {
            if let Err(e) = writer.write_frame(&frame) {
                write_error = Some(e);
            }
        }
    })
    .await?;

    if let Some(e) = write_error {
        return Err(e.into());
    }

    info!("Wrote {} frames from {} bytes", writer.records(), total);
    drop(writer.into_inner()?);
    Ok(())
}

/// Huffman-decode a compressed block and write the bytes to stdout
async fn run_inflate(path: &str, output_len: usize, config: &Config) -> Result<()> {
    let input = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path))?;

    let decoder = HuffmanDecoder::new().with_max_output_len(config.huffman.max_output_len);
    let output = decoder.decode(&input, output_len)?;

    if output.len() < output_len {
        info!(
            "Block ended after {} of {} requested bytes",
            output.len(),
            output_len
        );
    }

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

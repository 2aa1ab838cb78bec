//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{MspError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub huffman: HuffmanConfig,

    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Frame decoder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DecoderConfig {
    /// Largest payload a frame may declare before decoding fails
    #[serde(default = "default_max_payload_len")]
    pub max_payload_len: usize,

    #[serde(default = "default_initial_payload_capacity")]
    pub initial_payload_capacity: usize,

    /// Log dropped frames at debug level
    #[serde(default = "default_log_rejections")]
    pub log_rejections: bool,
}

/// Huffman decoder configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HuffmanConfig {
    #[serde(default = "default_max_output_len")]
    pub max_output_len: usize,
}

/// Capture reader configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
}

// Default value functions
fn default_max_payload_len() -> usize { 65_535 }
fn default_initial_payload_capacity() -> usize { 256 }
fn default_log_rejections() -> bool { true }

fn default_max_output_len() -> usize { 65_535 }

fn default_read_chunk_size() -> usize { 4096 }

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_payload_len: default_max_payload_len(),
            initial_payload_capacity: default_initial_payload_capacity(),
            log_rejections: default_log_rejections(),
        }
    }
}

impl Default for HuffmanConfig {
    fn default() -> Self {
        Self {
            max_output_len: default_max_output_len(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            read_chunk_size: default_read_chunk_size(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use msp_codec::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        // v2 sizes are 16-bit, a larger limit would never be reached
        if self.decoder.max_payload_len == 0 || self.decoder.max_payload_len > 65_535 {
            return Err(MspError::Config(toml::de::Error::custom(
                "max_payload_len must be between 1 and 65535",
            )));
        }

        if self.decoder.initial_payload_capacity > self.decoder.max_payload_len {
            return Err(MspError::Config(toml::de::Error::custom(
                "initial_payload_capacity must not exceed max_payload_len",
            )));
        }

        if self.huffman.max_output_len == 0 {
            return Err(MspError::Config(toml::de::Error::custom(
                "max_output_len must be greater than 0",
            )));
        }

        if self.capture.read_chunk_size == 0 || self.capture.read_chunk_size > 1_048_576 {
            return Err(MspError::Config(toml::de::Error::custom(
                "read_chunk_size must be between 1 and 1048576",
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.decoder.max_payload_len, 65_535);
        assert_eq!(config.decoder.initial_payload_capacity, 256);
        assert!(config.decoder.log_rejections);
        assert_eq!(config.huffman.max_output_len, 65_535);
        assert_eq!(config.capture.read_chunk_size, 4096);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.capture.read_chunk_size, 4096);
    }

    #[test]
    fn test_partial_section() {
        let config = Config::from_toml(
            r#"
[decoder]
max_payload_len = 1024
"#,
        )
        .unwrap();

        assert_eq!(config.decoder.max_payload_len, 1024);
        assert_eq!(config.decoder.initial_payload_capacity, 256);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[decoder]
max_payload_len = 4096
log_rejections = false

[huffman]
max_output_len = 2048

[capture]
read_chunk_size = 512
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.decoder.max_payload_len, 4096);
        assert!(!config.decoder.log_rejections);
        assert_eq!(config.huffman.max_output_len, 2048);
        assert_eq!(config.capture.read_chunk_size, 512);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/msp-codec.toml");
        assert!(matches!(result, Err(MspError::Io(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_toml("[decoder\nmax_payload_len = 1");
        assert!(matches!(result, Err(MspError::Config(_))));
    }

    #[test]
    fn test_max_payload_len_zero() {
        let mut config = Config::default();
        config.decoder.max_payload_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_payload_len_too_high() {
        let mut config = Config::default();
        config.decoder.max_payload_len = 65_536;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_capacity_over_limit() {
        let mut config = Config::default();
        config.decoder.max_payload_len = 128;
        assert!(config.validate().is_err());

        config.decoder.initial_payload_capacity = 128;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_output_len_zero() {
        let mut config = Config::default();
        config.huffman.max_output_len = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_chunk_size_bounds() {
        let mut config = Config::default();
        config.capture.read_chunk_size = 0;
        assert!(config.validate().is_err());

        config.capture.read_chunk_size = 1_048_577;
        assert!(config.validate().is_err());

        config.capture.read_chunk_size = 1;
        assert!(config.validate().is_ok());
    }
}

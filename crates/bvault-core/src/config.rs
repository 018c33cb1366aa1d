use serde::{Deserialize, Serialize};

use crate::error::{BvaultError, BvaultResult};
use crate::types::CompressionLevel;

/// Default PBKDF2-HMAC-SHA256 iteration count
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

/// Upper bound on PBKDF2 iterations accepted from config or a stored artifact
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Default split threshold: 5 MiB
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 5 * 1024 * 1024;

/// Top-level configuration (loaded from bvault.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BvaultConfig {
    pub crypto: CryptoConfig,
    pub compression: CompressionConfig,
    pub split: SplitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2 iterations (default: 100000). Artifacts sealed with a different
    /// count record it, so changing this does not break old backups.
    pub pbkdf2_iterations: u32,
    /// Length of generated passwords (default: 32)
    pub password_length: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// fast, balanced, or maximum (default: balanced)
    pub level: CompressionLevel,
    /// Use the run-length encoder even when a stream compressor is available
    pub force_fallback: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Payloads longer than this many characters are split
    pub max_chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        Self {
            pbkdf2_iterations: DEFAULT_PBKDF2_ITERATIONS,
            password_length: 32,
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl BvaultConfig {
    /// Parse a TOML document and reject values the pipeline cannot run with.
    pub fn from_toml_str(content: &str) -> BvaultResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| BvaultError::Config(format!("parsing: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BvaultResult<()> {
        if self.crypto.pbkdf2_iterations == 0 {
            return Err(BvaultError::Config(
                "crypto.pbkdf2_iterations must be non-zero".into(),
            ));
        }
        if self.crypto.pbkdf2_iterations > MAX_PBKDF2_ITERATIONS {
            return Err(BvaultError::Config(format!(
                "crypto.pbkdf2_iterations must be at most {MAX_PBKDF2_ITERATIONS}"
            )));
        }
        if self.crypto.password_length == 0 {
            return Err(BvaultError::Config(
                "crypto.password_length must be non-zero".into(),
            ));
        }
        if self.split.max_chunk_size == 0 {
            return Err(BvaultError::Config(
                "split.max_chunk_size must be non-zero".into(),
            ));
        }
        match self.logging.format.as_str() {
            "json" | "text" => Ok(()),
            other => Err(BvaultError::Config(format!(
                "logging.format must be json or text, got '{other}'"
            ))),
        }
    }

    pub fn to_toml_string(&self) -> BvaultResult<String> {
        toml::to_string_pretty(self).map_err(|e| BvaultError::Config(format!("rendering: {e}")))
    }
}

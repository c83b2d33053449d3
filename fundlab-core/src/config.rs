//! Runtime configuration.
//!
//! Stored as an optional TOML file. Every key has a default, so an empty
//! file (or no file at all) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading or validating a config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Complete fundlab configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FundlabConfig {
    pub provider: ProviderConfig,
}

/// Settings for the Yahoo Finance fundamentals provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    /// Scheme and host of the API, without a trailing slash.
    pub base_url: String,
    /// HTTP request timeout. A timed-out request fails that ticker.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// How many years of reported history to request.
    pub lookback_years: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query2.finance.yahoo.com".into(),
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into(),
            lookback_years: 5,
        }
    }
}

impl FundlabConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.provider;
        if p.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".into()));
        }
        if p.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout_secs must be positive".into(),
            ));
        }
        if p.lookback_years == 0 {
            return Err(ConfigError::Invalid(
                "provider.lookback_years must be positive".into(),
            ));
        }
        Ok(())
    }
}

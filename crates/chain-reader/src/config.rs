use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentLevel;

use crate::error::{ReaderError, ReaderResult};
use crate::types::parse_commitment;

/// Reader configuration loaded from a TOML file
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ReaderConfig {
    /// RPC endpoint URL
    pub rpc_url: String,

    /// Commitment used for every read: processed, confirmed or finalized
    pub commitment: String,

    /// Upper bound for a single RPC call in milliseconds
    pub request_timeout_ms: u64,

    /// Polling settings for `watch`
    #[serde(default)]
    pub poller: PollerConfig,
}

/// Source poller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PollerConfig {
    /// Delay between fetches in milliseconds
    pub poll_interval_ms: u64,

    /// Upper bound for a single fetch in milliseconds
    pub fetch_timeout_ms: u64,

    /// Number of updates buffered for a slow consumer
    pub buffer_capacity: usize,
}

impl ReaderConfig {
    pub fn localnet() -> Self {
        Self::with_url("http://localhost:8899")
    }

    pub fn devnet() -> Self {
        Self::with_url("https://api.devnet.solana.com")
    }

    pub fn mainnet() -> Self {
        Self::with_url("https://api.mainnet-beta.solana.com")
    }

    fn with_url(url: &str) -> Self {
        Self {
            rpc_url: url.to_string(),
            commitment: "confirmed".to_string(),
            request_timeout_ms: 10_000,
            poller: PollerConfig::default(),
        }
    }

    pub fn with_rpc_url(mut self, url: String) -> Self {
        self.rpc_url = url;
        self
    }

    pub fn with_commitment(mut self, commitment: String) -> Self {
        self.commitment = commitment;
        self
    }

    /// Load configuration from TOML file
    pub fn load(path: impl AsRef<Path>) -> ReaderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ReaderError::Io(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let config: ReaderConfig = toml::from_str(&content).map_err(|e| {
            ReaderError::Serialization(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> ReaderResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| ReaderError::Serialization(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, content).map_err(|e| {
            ReaderError::Io(format!("Failed to write config file {}: {}", path.display(), e))
        })?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ReaderResult<()> {
        if !(self.rpc_url.starts_with("http://") || self.rpc_url.starts_with("https://")) {
            return Err(ReaderError::InvalidConfig(format!(
                "rpc_url must be an http(s) URL, got '{}'",
                self.rpc_url
            )));
        }

        parse_commitment(&self.commitment)?;

        if self.request_timeout_ms == 0 {
            return Err(ReaderError::InvalidConfig(
                "request_timeout_ms must be greater than 0".to_string(),
            ));
        }

        self.poller.validate()
    }

    pub fn commitment_level(&self) -> ReaderResult<CommitmentLevel> {
        parse_commitment(&self.commitment)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl PollerConfig {
    /// Validate poller configuration
    pub fn validate(&self) -> ReaderResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(ReaderError::InvalidConfig(
                "poll_interval_ms must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_ms == 0 {
            return Err(ReaderError::InvalidConfig(
                "fetch_timeout_ms must be greater than 0".to_string(),
            ));
        }

        if self.fetch_timeout_ms > self.poll_interval_ms {
            return Err(ReaderError::InvalidConfig(format!(
                "fetch_timeout_ms ({}) must not exceed poll_interval_ms ({})",
                self.fetch_timeout_ms, self.poll_interval_ms
            )));
        }

        if self.buffer_capacity == 0 {
            return Err(ReaderError::InvalidConfig(
                "buffer_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::localnet()
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            fetch_timeout_ms: 1_000,
            buffer_capacity: 16,
        }
    }
}

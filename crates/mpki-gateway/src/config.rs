//! Gateway configuration.

use mpki_client::{MpkiClient, RateLimitConfig};
use mpki_core::{MpkiError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection and engine settings for one managed-PKI account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Provider API key (sent as `x-api-key`)
    #[serde(default)]
    pub api_key: String,

    /// Provider base URL, e.g. `https://one.digicert.com`
    #[serde(default)]
    pub base_url: String,

    /// Directory holding the JSON enrollment templates
    #[serde(default)]
    pub template_dir: PathBuf,

    /// Certificates per search page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Capacity of the synchronization record buffer
    #[serde(default = "default_sync_buffer")]
    pub sync_buffer: usize,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Optional client-side request rate limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests_per_second: Option<u32>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: String::new(),
            template_dir: PathBuf::new(),
            page_size: default_page_size(),
            sync_buffer: default_sync_buffer(),
            timeout_secs: default_timeout(),
            requests_per_second: None,
        }
    }
}

impl GatewayConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content).map_err(|e| MpkiError::Config(e.to_string()))
        } else {
            Ok(Self::default())
        }
    }

    /// Write config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| MpkiError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check every setting, reporting all problems at once.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.api_key.trim().is_empty() {
            errors.push("API Key is required.".to_string());
        }

        if self.base_url.trim().is_empty() {
            errors.push("Base URL is required.".to_string());
        } else if !self.base_url.starts_with("https://") {
            errors.push("The Base URL needs https://".to_string());
        }

        if self.template_dir.as_os_str().is_empty() {
            errors.push("Template directory is required.".to_string());
        }

        if self.page_size == 0 {
            errors.push("Page size must be greater than zero.".to_string());
        }

        if self.sync_buffer == 0 {
            errors.push("Sync buffer must be greater than zero.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MpkiError::Validation(errors))
        }
    }

    /// Build the REST client these settings describe
    pub fn client(&self) -> Result<MpkiClient> {
        let mut builder = MpkiClient::builder(self.base_url.as_str(), self.api_key.as_str())
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(rps) = self.requests_per_second {
            builder = builder.rate_limit(RateLimitConfig::new().requests_per_second(rps).burst_size(rps));
        }
        builder.build()
    }
}

const fn default_page_size() -> u32 {
    50
}

const fn default_sync_buffer() -> usize {
    100
}

const fn default_timeout() -> u64 {
    30
}

//! Configuration management.
//!
//! The CLI reads the same TOML document the gateway library understands;
//! this module only decides where it lives and how single keys are edited.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use mpki_gateway::GatewayConfig;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API key
pub const API_KEY_ENV: &str = "MPKI_API_KEY";

/// Keys accepted by `mpki config set`
pub const SETTABLE_KEYS: &[&str] = &[
    "api_key",
    "base_url",
    "template_dir",
    "page_size",
    "sync_buffer",
    "timeout_secs",
    "requests_per_second",
];

/// Get the default config file path.
pub fn default_path() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("com", "mpki", "mpki")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    Ok(dirs.config_dir().join("config.toml"))
}

/// Explicit path if given, else the platform default.
pub fn resolve_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    explicit.map_or_else(default_path, Ok)
}

/// Load configuration from file, then apply the API key override.
pub fn load(path: &Path, api_key: Option<String>) -> Result<GatewayConfig> {
    let mut config = GatewayConfig::load(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(key) = api_key.filter(|k| !k.trim().is_empty()) {
        config.api_key = key;
    }

    Ok(config)
}

/// Set one key from its string form.
pub fn set(config: &mut GatewayConfig, key: &str, value: &str) -> Result<()> {
    match key {
        "api_key" => config.api_key = value.to_string(),
        "base_url" => config.base_url = value.trim_end_matches('/').to_string(),
        "template_dir" => config.template_dir = PathBuf::from(value),
        "page_size" => config.page_size = parse_number(key, value)?,
        "sync_buffer" => config.sync_buffer = parse_number(key, value)?,
        "timeout_secs" => config.timeout_secs = parse_number(key, value)?,
        "requests_per_second" => {
            config.requests_per_second = match value {
                "" | "none" | "off" => None,
                _ => Some(parse_number(key, value)?),
            };
        }
        _ => anyhow::bail!(
            "Unknown config key: {key}\n\n\
             Available keys:\n  {}",
            SETTABLE_KEYS.join("\n  ")
        ),
    }
    Ok(())
}

fn parse_number<N>(key: &str, value: &str) -> Result<N>
where
    N: std::str::FromStr,
    N::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse()
        .with_context(|| format!("{key} must be a number, got {value:?}"))
}

//! Command implementations.

pub mod config;
pub mod enroll;
pub mod get;
pub mod params;
pub mod products;
pub mod profiles;
pub mod renew;
pub mod revoke;
pub mod sync;

use anyhow::Context as _;
use mpki_client::MpkiClient;
use mpki_gateway::{Gateway, GatewayConfig};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Loaded configuration, API key override applied
    pub config: GatewayConfig,

    /// Where the configuration was read from
    pub config_path: PathBuf,

    /// Output format
    pub output_format: OutputFormat,

    /// Verbose output
    pub verbose: bool,
}

impl Context {
    /// Build a gateway from the configuration, validating it first.
    pub fn gateway(&self) -> anyhow::Result<Gateway<MpkiClient>> {
        Gateway::from_config(&self.config).map_err(|e| self.config_hint(e))
    }

    /// Build a bare REST client from the configuration.
    pub fn client(&self) -> anyhow::Result<MpkiClient> {
        Gateway::<MpkiClient>::validate_connection(&self.config)
            .map_err(|e| self.config_hint(e))?;
        self.config
            .client()
            .context("Failed to create provider client")
    }

    fn config_hint(&self, err: mpki_gateway::MpkiError) -> anyhow::Error {
        anyhow::anyhow!(
            "{err}\n\n\
             Configure the gateway with:\n  \
             mpki config set api_key <KEY>      (or MPKI_API_KEY)\n  \
             mpki config set base_url https://<provider host>\n  \
             mpki config set template_dir <DIR>\n\n\
             Config file: {}",
            self.config_path.display()
        )
    }
}

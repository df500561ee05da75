//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Operator CLI for the managed-PKI gateway
///
/// Enroll, renew, revoke and synchronize certificates against a managed-PKI
/// provider using JSON enrollment templates.
#[derive(Parser, Debug)]
#[command(name = "mpki")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(short, long, env = "MPKI_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Provider API key (or set MPKI_API_KEY env var)
    #[arg(short = 'k', long, env = "MPKI_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Increase verbosity (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List certificate profiles known to the provider
    Profiles(ProfilesArgs),

    /// List products registered by the enrollment templates
    Products,

    /// List enrollment parameters referenced by the templates
    Params,

    /// Submit a new enrollment from a CSR
    Enroll(EnrollArgs),

    /// Renew an existing certificate from a CSR
    Renew(RenewArgs),

    /// Revoke a certificate
    Revoke(RevokeArgs),

    /// Look up a single certificate
    Get(GetArgs),

    /// Synchronize every certificate of every product
    Sync(SyncArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Profiles command
// ============================================================================

#[derive(Args, Debug)]
pub struct ProfilesArgs {
    /// Print only profile ids
    #[arg(long)]
    pub ids_only: bool,
}

// ============================================================================
// Enroll / renew commands
// ============================================================================

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// CSR file, PEM or bare base64 ("-" reads stdin)
    #[arg(long, value_name = "FILE")]
    pub csr: PathBuf,

    /// Product (profile) id selecting the template
    #[arg(short, long)]
    pub product: String,

    /// DNS names for the SAN extension
    #[arg(long, value_delimiter = ',')]
    pub dns: Vec<String>,

    /// User principal name for the SAN extension
    #[arg(long)]
    pub upn: Vec<String>,

    /// IP address for the SAN extension
    #[arg(long)]
    pub ip: Vec<String>,

    /// Email address (rfc822 name) for the SAN extension
    #[arg(long)]
    pub email: Vec<String>,

    /// Enrollment parameter as NAME=VALUE (repeatable)
    #[arg(long = "param", value_name = "NAME=VALUE", value_parser = parse_key_val)]
    pub params: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct EnrollArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

#[derive(Args, Debug)]
pub struct RenewArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Serial number of the certificate being renewed
    #[arg(long)]
    pub prior_serial: String,
}

// ============================================================================
// Revoke command
// ============================================================================

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Certificate serial number (hex)
    pub serial: String,

    /// Reason code: 1 key compromised, 3 affiliation changed,
    /// 4 superseded, 5 cessation of operation
    #[arg(short, long, default_value_t = 4)]
    pub reason: u32,
}

// ============================================================================
// Get command
// ============================================================================

#[derive(Args, Debug)]
pub struct GetArgs {
    /// Request id (certificate serial number)
    pub request_id: String,

    /// Print the certificate body too
    #[arg(long)]
    pub show_cert: bool,
}

// ============================================================================
// Sync command
// ============================================================================

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Request an incremental pass (not supported by the provider)
    #[arg(long)]
    pub incremental: bool,

    /// Time of the previous synchronization (RFC 3339)
    #[arg(long, value_name = "TIMESTAMP")]
    pub since: Option<chrono::DateTime<chrono::Utc>>,

    /// Override the configured page size
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Stop after this many records
    #[arg(long)]
    pub limit: Option<u64>,
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,

    /// Check the configuration and template directory
    Validate,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {s:?}"))?;
    if name.trim().is_empty() {
        return Err(format!("parameter name is empty in {s:?}"));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

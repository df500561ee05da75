//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use anyhow::Result;
use args::{Cli, Commands};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::output::OutputFormat;

/// Run the CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config_path = crate::config::resolve_path(cli.config)?;
    let config = crate::config::load(&config_path, cli.api_key)?;

    let ctx = commands::Context {
        config,
        config_path,
        output_format: cli.output.unwrap_or(OutputFormat::Pretty),
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Profiles(args) => commands::profiles::execute(ctx, args).await,
        Commands::Products => commands::products::execute(ctx).await,
        Commands::Params => commands::params::execute(ctx).await,
        Commands::Enroll(args) => commands::enroll::execute(ctx, args).await,
        Commands::Renew(args) => commands::renew::execute(ctx, args).await,
        Commands::Revoke(args) => commands::revoke::execute(ctx, args).await,
        Commands::Get(args) => commands::get::execute(ctx, args).await,
        Commands::Sync(args) => commands::sync::execute(ctx, args).await,
        Commands::Config(args) => commands::config::execute(ctx, args).await,
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mpki=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

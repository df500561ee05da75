//! `mpki config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;
use mpki_client::MpkiClient;
use mpki_gateway::{Gateway, GatewayConfig, MpkiError, TemplateCatalog};

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::output::{mask_secret, OutputFormat};

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(&ctx, &key, &value),
        ConfigCommands::Path => {
            println!("{}", ctx.config_path.display());
            Ok(())
        }
        ConfigCommands::Validate => validate_config(&ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => {
            let mut masked = config.clone();
            if !masked.api_key.is_empty() {
                masked.api_key = mask_secret(&masked.api_key);
            }
            println!("{}", serde_json::to_string_pretty(&masked)?);
        }
        _ => {
            println!("{}", "Current Configuration:".bold());
            println!();

            let api_display = if config.api_key.is_empty() {
                "(not set)".dimmed().to_string()
            } else {
                mask_secret(&config.api_key)
            };
            println!("  {} {}", "api_key:".bold(), api_display);
            println!("  {} {}", "base_url:".bold(), or_unset(&config.base_url));
            println!(
                "  {} {}",
                "template_dir:".bold(),
                or_unset(&config.template_dir.display().to_string())
            );
            println!("  {} {}", "page_size:".bold(), config.page_size);
            println!("  {} {}", "sync_buffer:".bold(), config.sync_buffer);
            println!("  {} {}s", "timeout_secs:".bold(), config.timeout_secs);
            println!(
                "  {} {}",
                "requests_per_second:".bold(),
                config
                    .requests_per_second
                    .map_or_else(|| "(unlimited)".dimmed().to_string(), |r| r.to_string())
            );
            println!();
            println!("{}", ctx.config_path.display().to_string().dimmed());
        }
    }

    Ok(())
}

fn set_config(ctx: &Context, key: &str, value: &str) -> Result<()> {
    // Re-read the file so an MPKI_API_KEY override is never persisted
    let mut config = GatewayConfig::load(&ctx.config_path)?;
    crate::config::set(&mut config, key, value)?;
    config.save(&ctx.config_path)?;

    if key == "api_key" {
        println!("{} API key set.", "Success:".green().bold());
    } else {
        println!("{} {} set to {}.", "Success:".green().bold(), key, value.cyan());
    }

    Ok(())
}

fn validate_config(ctx: &Context) -> Result<()> {
    match Gateway::<MpkiClient>::validate_connection(&ctx.config) {
        Ok(()) => {}
        Err(MpkiError::Validation(errors)) => {
            println!("{}", "Configuration is invalid:".red().bold());
            for error in &errors {
                println!("  - {error}");
            }
            anyhow::bail!("{} configuration problem(s)", errors.len());
        }
        Err(e) => return Err(e.into()),
    }

    let catalog = TemplateCatalog::discover(&ctx.config.template_dir)?;
    let params = catalog.enrollment_params();

    match ctx.output_format {
        OutputFormat::Json => {
            let body = serde_json::json!({
                "valid": true,
                "products": catalog.product_ids(),
                "parameters": params,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        _ => {
            println!("{} Configuration is valid.", "Success:".green().bold());
            println!(
                "  {} {} template(s), {} parameter(s)",
                "templates:".bold(),
                catalog.len(),
                params.len()
            );
            if catalog.is_empty() {
                println!(
                    "  {} no templates registered in {}",
                    "Warning:".yellow().bold(),
                    ctx.config.template_dir.display()
                );
            }
        }
    }

    Ok(())
}

fn or_unset(value: &str) -> String {
    if value.is_empty() {
        "(not set)".dimmed().to_string()
    } else {
        value.to_string()
    }
}

//! `mpki enroll` - Submit a new enrollment from a CSR.

use anyhow::{Context as _, Result};
use colored::Colorize;
use mpki_core::{EnrollmentProductInfo, EnrollmentResult, EnrollmentType};
use mpki_gateway::SanMap;
use std::io::Read;
use std::path::Path;

use super::Context;
use crate::cli::args::{EnrollArgs, RequestArgs};
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: EnrollArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let csr = read_csr(&args.request.csr).await?;
    let product = product_info(&args.request);

    let result = gateway
        .enroll_with_type(EnrollmentType::New, &csr, &san_map(&args.request), &product)
        .await?;

    print_result(&ctx, &result)
}

/// Read CSR text from a file, or stdin for `-`.
pub(super) async fn read_csr(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read CSR from stdin")?;
        return Ok(text);
    }

    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read CSR from {}", path.display()))
}

/// SAN values keyed by the category names the builder understands.
pub(super) fn san_map(args: &RequestArgs) -> SanMap {
    [
        ("dnsname", &args.dns),
        ("upn", &args.upn),
        ("ipaddress", &args.ip),
        ("rfc822name", &args.email),
    ]
    .into_iter()
    .filter(|(_, values)| !values.is_empty())
    .map(|(category, values)| (category.to_string(), values.clone()))
    .collect()
}

pub(super) fn product_info(args: &RequestArgs) -> EnrollmentProductInfo {
    args.params
        .iter()
        .fold(EnrollmentProductInfo::new(&args.product), |info, (name, value)| {
            info.param(name, value)
        })
}

pub(super) fn print_result(ctx: &Context, result: &EnrollmentResult) -> Result<()> {
    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["status", "request_id", "message"])?;
            writer.write_record([
                result.status.to_string().as_str(),
                result.request_id.as_deref().unwrap_or_default(),
                result.message.as_str(),
            ])?;
            writer.flush()?;
        }
        OutputFormat::Pretty => {
            if result.is_failed() {
                println!("{} {}", "Failed:".red().bold(), result.message);
            } else {
                println!("{} {}", "Success:".green().bold(), result.message);
                println!("  {} {}", "status:".bold(), result.status);
                if let Some(id) = &result.request_id {
                    println!("  {} {}", "request id:".bold(), id.cyan());
                }
                match &result.certificate {
                    Some(cert) => println!("\n{cert}"),
                    None if ctx.verbose => {
                        println!("  {}", "certificate not yet available".dimmed());
                    }
                    None => {}
                }
            }
        }
    }

    if result.is_failed() {
        anyhow::bail!("enrollment did not succeed");
    }

    Ok(())
}

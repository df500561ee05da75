//! `mpki revoke` - Revoke a certificate.

use anyhow::Result;
use colored::Colorize;
use mpki_core::RequestDisposition;
use serde_json::json;

use super::Context;
use crate::cli::args::RevokeArgs;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: RevokeArgs) -> Result<()> {
    let gateway = ctx.gateway()?;
    let disposition = gateway.revoke(&args.serial, args.reason).await?;

    match ctx.output_format {
        OutputFormat::Json => {
            let body = json!({
                "serial": args.serial,
                "reason": args.reason,
                "disposition": disposition,
                "code": disposition.code(),
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
        }
        OutputFormat::Csv => {
            println!("serial,reason,disposition,code");
            println!(
                "{},{},{:?},{}",
                args.serial,
                args.reason,
                disposition,
                disposition.code()
            );
        }
        OutputFormat::Pretty => match disposition {
            RequestDisposition::Revoked => {
                println!(
                    "{} Certificate {} revoked.",
                    "Success:".green().bold(),
                    args.serial.cyan()
                );
            }
            _ => {
                println!(
                    "{} The provider did not revoke {} (run with -v for details).",
                    "Failed:".red().bold(),
                    args.serial
                );
            }
        },
    }

    if disposition != RequestDisposition::Revoked {
        anyhow::bail!("revocation failed");
    }

    Ok(())
}

//! `mpki get` - Look up a single certificate.

use anyhow::Result;
use colored::Colorize;
use mpki_core::CertificateStatus;

use super::Context;
use crate::cli::args::GetArgs;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: GetArgs) -> Result<()> {
    let gateway = ctx.gateway()?;

    let Some(record) = gateway.get_single_record(&args.request_id).await? else {
        anyhow::bail!("a request id is required");
    };

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["request_id", "status", "code"])?;
            writer.write_record([
                record.request_id.as_str(),
                record.status.to_string().as_str(),
                record.status.code().to_string().as_str(),
            ])?;
            writer.flush()?;
        }
        OutputFormat::Pretty => {
            let status = match record.status {
                CertificateStatus::Generated => record.status.to_string().green(),
                CertificateStatus::InProcess => record.status.to_string().yellow(),
                CertificateStatus::Revoked | CertificateStatus::Failed => {
                    record.status.to_string().red()
                }
            };
            println!("{} {}", "Request:".bold(), record.request_id.cyan());
            println!("{} {} ({})", "Status:".bold(), status, record.status.code());

            match (&record.certificate, args.show_cert) {
                (Some(cert), true) => println!("\n{cert}"),
                (Some(_), false) => {
                    println!("{}", "Tip: add --show-cert to print the certificate".dimmed());
                }
                (None, _) => println!("{}", "No certificate returned.".dimmed()),
            }
        }
    }

    Ok(())
}

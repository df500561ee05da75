//! `mpki params` - List enrollment parameters referenced by the templates.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context) -> Result<()> {
    let gateway = ctx.gateway()?;
    let params = gateway.template_parameters();

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["name", "kind"])?;
            for (name, kind) in &params {
                writer.write_record([name.as_str(), kind_name(*kind)])?;
            }
            writer.flush()?;
        }
        OutputFormat::Pretty => {
            println!("{}", "Enrollment parameters:".bold());
            if params.is_empty() {
                println!("  {}", "(none)".dimmed());
            }
            for (name, kind) in &params {
                println!("  {:<30} {}", name.cyan(), kind_name(*kind));
            }
        }
    }

    Ok(())
}

const fn kind_name(kind: mpki_gateway::ParamKind) -> &'static str {
    match kind {
        mpki_gateway::ParamKind::String => "string",
        mpki_gateway::ParamKind::Number => "number",
    }
}

//! `mpki profiles` - List certificate profiles known to the provider.

use anyhow::Result;
use colored::Colorize;
use mpki_core::CertificateProfile;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::ProfilesArgs;
use crate::output::{truncate, OutputFormat};

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "SAN")]
    san: String,
}

impl From<&CertificateProfile> for ProfileRow {
    fn from(profile: &CertificateProfile) -> Self {
        Self {
            id: profile.id.clone(),
            name: truncate(profile.name.as_deref().unwrap_or_default(), 40),
            status: profile.status.clone().unwrap_or_default(),
            subject: attribute_types(profile.subject_attributes()),
            san: attribute_types(profile.san_attributes()),
        }
    }
}

pub async fn execute(ctx: Context, args: ProfilesArgs) -> Result<()> {
    let client = ctx.client()?;
    let profiles = client.profiles().list().await?;

    if args.ids_only {
        for profile in &profiles {
            println!("{}", profile.id);
        }
        return Ok(());
    }

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&profiles)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer.write_record(["id", "name", "status", "subject", "san"])?;
            for row in profiles.iter().map(ProfileRow::from) {
                writer.write_record([&row.id, &row.name, &row.status, &row.subject, &row.san])?;
            }
            writer.flush()?;
        }
        OutputFormat::Pretty => {
            println!(
                "{} {}",
                "Profiles:".bold(),
                profiles.len().to_string().cyan()
            );
            if profiles.is_empty() {
                return Ok(());
            }
            println!();
            let rows: Vec<ProfileRow> = profiles.iter().map(ProfileRow::from).collect();
            println!("{}", Table::new(&rows).with(Style::rounded()));
        }
    }

    Ok(())
}

fn attribute_types(attributes: &[mpki_core::ProfileAttribute]) -> String {
    attributes
        .iter()
        .map(|a| a.attribute_type.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

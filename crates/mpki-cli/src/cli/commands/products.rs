//! `mpki products` - List products registered by the enrollment templates.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use super::Context;
use crate::output::OutputFormat;

#[derive(Serialize)]
struct Product {
    id: String,
    template: String,
}

pub async fn execute(ctx: Context) -> Result<()> {
    let gateway = ctx.gateway()?;
    let catalog = gateway.catalog();

    let products = catalog
        .product_ids()
        .into_iter()
        .map(|id| {
            let template = catalog
                .template_path(&id)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            Product { id, template }
        })
        .collect::<Vec<_>>();

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&products)?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            for product in &products {
                writer.serialize(product)?;
            }
            writer.flush()?;
        }
        OutputFormat::Pretty => {
            if products.is_empty() {
                println!(
                    "{} no templates found in {}",
                    "Warning:".yellow().bold(),
                    ctx.config.template_dir.display()
                );
                return Ok(());
            }
            println!("{}", "Products:".bold());
            for product in &products {
                println!("  {}  {}", product.id.cyan(), product.template.dimmed());
            }
        }
    }

    Ok(())
}

//! `mpki sync` - Synchronize every certificate of every product.
//!
//! Records stream through a bounded channel sized by `sync_buffer` and are
//! printed as they arrive. Ctrl-C cancels the pass; records already printed
//! stay valid.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use mpki_core::SyncRecord;
use mpki_gateway::SyncSummary;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Context;
use crate::cli::args::SyncArgs;
use crate::output::{truncate, OutputFormat};

#[derive(Serialize)]
struct SyncRow<'a> {
    request_id: &'a str,
    product_id: &'a str,
    status: String,
    status_code: i32,
    revocation_reason: Option<u32>,
    certificate_base64: &'a str,
}

impl<'a> From<&'a SyncRecord> for SyncRow<'a> {
    fn from(record: &'a SyncRecord) -> Self {
        Self {
            request_id: &record.request_id,
            product_id: &record.product_id,
            status: record.status.to_string(),
            status_code: record.status.code(),
            revocation_reason: record.revocation_reason,
            certificate_base64: &record.certificate_base64,
        }
    }
}

pub async fn execute(ctx: Context, args: SyncArgs) -> Result<()> {
    let mut gateway = ctx.gateway()?;
    if let Some(page_size) = args.page_size {
        gateway = gateway.with_page_size(page_size.max(1));
    }

    let (tx, rx) = mpsc::channel(ctx.config.sync_buffer.max(1));
    let cancel = CancellationToken::new();

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling synchronization");
            interrupt.cancel();
        }
    });

    let producer_cancel = cancel.clone();
    let full_sync = !args.incremental;
    let since = args.since;
    let producer = async move {
        let summary = gateway
            .synchronize(&tx, since, full_sync, &producer_cancel)
            .await;
        drop(tx);
        summary
    };

    let consumer = consume(&ctx, ReceiverStream::new(rx), args.limit, &cancel);

    let (summary, printed) = tokio::join!(producer, consumer);
    let summary = summary?;
    let printed = printed?;

    info!(printed, emitted = summary.emitted, "synchronization finished");
    print_summary(&ctx, &summary);

    Ok(())
}

async fn consume(
    ctx: &Context,
    mut records: ReceiverStream<SyncRecord>,
    limit: Option<u64>,
    cancel: &CancellationToken,
) -> Result<u64> {
    let progress = (ctx.output_format == OutputFormat::Pretty).then(spinner);
    let mut csv_writer = (ctx.output_format == OutputFormat::Csv)
        .then(|| csv::Writer::from_writer(std::io::stdout()));
    let mut printed = 0u64;

    while let Some(record) = records.next().await {
        match ctx.output_format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(&SyncRow::from(&record))?);
            }
            OutputFormat::Csv => {
                if let Some(writer) = csv_writer.as_mut() {
                    writer.serialize(SyncRow::from(&record))?;
                }
            }
            OutputFormat::Pretty => {
                if let Some(pb) = &progress {
                    pb.println(pretty_line(&record));
                    pb.set_message(format!("{} records", printed + 1));
                }
            }
        }

        printed += 1;
        if limit.is_some_and(|max| printed >= max) {
            cancel.cancel();
            break;
        }
    }

    if let Some(writer) = csv_writer.as_mut() {
        writer.flush()?;
    }
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    Ok(printed)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} syncing {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

fn pretty_line(record: &SyncRecord) -> String {
    let reason = record
        .revocation_reason
        .map(|r| format!(" reason {r}"))
        .unwrap_or_default();
    format!(
        "{}  {:<12} {}{}",
        truncate(&record.request_id, 40).cyan(),
        record.status.to_string(),
        record.product_id.dimmed(),
        reason
    )
}

fn print_summary(ctx: &Context, summary: &SyncSummary) {
    match ctx.output_format {
        OutputFormat::Json | OutputFormat::Csv => {
            if let Ok(body) = serde_json::to_string(summary) {
                eprintln!("{body}");
            }
        }
        OutputFormat::Pretty => {
            println!();
            println!("{}", "Synchronization summary:".bold());
            println!("  {} {}", "products:".bold(), summary.profiles);
            println!("  {} {}", "pages:".bold(), summary.pages);
            println!("  {} {}", "emitted:".bold(), summary.emitted.to_string().green());
            if summary.skipped > 0 {
                println!("  {} {}", "skipped:".bold(), summary.skipped.to_string().yellow());
            }
            if summary.cancelled {
                println!("  {}", "cancelled before completion".yellow());
            }
        }
    }
}

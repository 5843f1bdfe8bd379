mod trigger;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use airdata_bucket::S3BucketStore;
use airdata_core::{
    prepare_export, run_export, AwairClient, AwairConfig, ExportConfig, ExportOptions, Publisher,
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Hourly Awair air-data export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Export the hour before the trigger time to object storage
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
struct ExportArgs {
    /// Trigger timestamp (RFC 3339); defaults to now
    #[arg(long, conflicts_with = "event")]
    time: Option<DateTime<Utc>>,
    /// Scheduler event JSON with a `time` field; `-` reads stdin
    #[arg(long)]
    event: Option<PathBuf>,
    /// Write the CSV to stdout instead of uploading it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Export(args) => handle_export(args).await,
    }
}

async fn handle_export(args: ExportArgs) -> Result<()> {
    dotenvy::dotenv().ok();

    let trigger = trigger::resolve(args.time, args.event.as_deref(), Utc::now)?;
    info!(%trigger, dry_run = args.dry_run, "export triggered");

    if args.dry_run {
        // Only the Awair side is needed; BUCKET and S3 settings may be absent.
        let awair = AwairConfig::from_env().context("invalid Awair configuration")?;
        let source = AwairClient::new(awair).context("failed to build Awair client")?;

        let prepared = prepare_export(&source, trigger, ExportOptions::default()).await?;
        std::io::stdout()
            .write_all(&prepared.payload)
            .context("failed to write CSV to stdout")?;
        info!(window = %prepared.window, rows = prepared.rows, "dry run complete; nothing uploaded");
        return Ok(());
    }

    let config = ExportConfig::from_env().context("invalid export configuration")?;
    let source = AwairClient::new(config.awair).context("failed to build Awair client")?;
    let store = S3BucketStore::new(config.storage)
        .await
        .context("failed to configure object store")?;
    let publisher = Publisher::new(Arc::new(store));

    let summary = run_export(
        &source,
        &publisher,
        trigger,
        ExportOptions {
            fail_on_empty: config.fail_on_empty,
        },
    )
    .await?;

    println!("{summary}");
    Ok(())
}

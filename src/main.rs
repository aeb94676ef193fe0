use std::path::PathBuf;

use chrono::Local;
use clap::Parser;
use oai_ocr::{
    info_time, process::process_catalog, Config, Result, DEFAULT_ENDPOINT, METADATA_PREFIX,
    OUTPUT_DIR, WORKER_COUNT,
};
use tracing::info;

/// Download the OCR text of every record in an OAI-PMH collection.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// OAI-PMH endpoint to harvest.
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Restrict the harvest to an OAI-PMH set.
    #[arg(long)]
    set: Option<String>,

    /// Directory the `{date}/{page}.txt` files are written to.
    #[arg(long, default_value = OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Number of records fetched concurrently.
    #[arg(long, default_value_t = WORKER_COUNT)]
    workers: usize,

    /// More logging (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config {
        endpoint: args.endpoint,
        metadata_prefix: METADATA_PREFIX.to_string(),
        set: args.set,
        output_dir: args.output_dir,
        workers: args.workers,
    };

    let start_time = Local::now();
    info!("Scraping data...");
    let summary = process_catalog(&config).await?;
    info!(
        records = summary.records,
        skipped = summary.skipped,
        pages = summary.pages_written,
        "Data scraped successfully."
    );
    info_time!(start_time, "Full program time:");

    Ok(())
}

// barcode-sort - batch filing of barcoded specimen photographs

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use specimen_sorter::barcode::RqrrScanner;
use specimen_sorter::pipeline::run_batch;

#[derive(Parser)]
#[command(
    name = "barcode-sort",
    version,
    about = "Read sample barcodes from photographs and file them by identifier"
)]
struct Args {
    /// Output directory (creates subdirectories under here)
    #[arg(short = 'o', long = "output-dir")]
    output_dir: PathBuf,

    /// Number of worker threads
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: usize,

    /// Input images
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if args.output_dir.is_dir() {
        warn!("output directory '{}' exists", args.output_dir.display());
    }

    let summary = run_batch(&args.inputs, &args.output_dir, args.threads, &RqrrScanner)
        .context("batch processing failed")?;
    info!(
        "done: {} rows written, {} unreadable images",
        summary.rows, summary.unreadable
    );
    Ok(())
}

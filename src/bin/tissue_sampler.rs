// tissue-sampler - interactive camera-driven sample capture

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use specimen_sorter::barcode::RqrrScanner;
use specimen_sorter::capture::SubprocessCapture;
use specimen_sorter::prompt::ConsolePrompt;
use specimen_sorter::session::Capturer;
use specimen_sorter::viewer::SubprocessViewer;

#[derive(Parser)]
#[command(
    name = "tissue-sampler",
    version,
    about = "Interactive barcoded sample capture with plate/well bookkeeping"
)]
struct Args {
    /// Output directory (sample table and per-sample image directories)
    #[arg(short = 'd', long = "output-dir")]
    output_dir: PathBuf,

    /// Camera capture command; must write one JPEG to stdout per invocation
    #[arg(long, default_value = SubprocessCapture::DEFAULT_COMMAND)]
    capture_command: String,

    /// Seconds to wait for the capture command before offering to kill it
    #[arg(long, default_value_t = 20)]
    capture_timeout: u64,

    /// Image viewer command; receives the path of the frame to show
    #[arg(long, default_value = SubprocessViewer::DEFAULT_COMMAND)]
    viewer_command: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let capture = SubprocessCapture::new(
        &args.capture_command,
        Duration::from_secs(args.capture_timeout),
    )
    .context("invalid capture command")?;
    let prompt = ConsolePrompt::new().context("failed to open console prompt")?;
    let viewer = SubprocessViewer::new(&args.viewer_command).context("invalid viewer command")?;

    let mut capturer = Capturer::resume(&args.output_dir, capture, prompt, RqrrScanner, viewer)
        .context("failed to open capture session")?;
    capturer.run().context("capture session failed")?;
    Ok(())
}

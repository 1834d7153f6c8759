mod cli;
mod engine;
mod logging;
mod model;
mod orchestrator;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();

    logging::init(args.verbose, args.log_file.as_deref(), !is_non_tui)?;
    tracing::debug!(base_url = %args.base_url, "starting resume-match");

    cli::run(args).await?;

    // Explicitly exit with code 0 on success, especially for non-TUI modes
    if is_non_tui {
        std::process::exit(0);
    }
    Ok(())
}

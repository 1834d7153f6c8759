use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), level_for(verbose)))
    })
}

/// Install the global tracing subscriber.
///
/// Logs go to `log_file` when given. Otherwise they go to stderr, except in the
/// interactive UI where stderr would draw over the alternate screen.
pub fn init(verbose: u8, log_file: Option<&Path>, interactive: bool) -> Result<()> {
    let res = if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init()
    } else if interactive {
        return Ok(());
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter(verbose))
            .with_writer(std::io::stderr)
            .try_init()
    };
    res.map_err(|e| anyhow::anyhow!("init logging: {e}"))
}

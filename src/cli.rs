use crate::engine::{self, ClientConfig, ScoringClient};
use crate::model::MatchReport;
use crate::orchestrator::{self, ControllerSettings, RequestFailure, Workflow, WorkflowError};
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "resume-match",
    version,
    about = "Match resumes against a job description with optional TUI"
)]
pub struct Cli {
    /// Resume files to upload (at most 5)
    pub files: Vec<PathBuf>,

    /// Base URL of the scoring service
    #[arg(long, env = "RESUME_MATCH_BASE_URL", default_value = "http://localhost:5000")]
    pub base_url: String,

    /// Job description text
    #[arg(long, conflicts_with = "job_file")]
    pub job: Option<String>,

    /// Read the job description from a file
    #[arg(long)]
    pub job_file: Option<PathBuf>,

    /// Use LLM scoring (requires --api-key)
    #[arg(long)]
    pub enhanced: bool,

    /// API key forwarded to the service in enhanced mode
    #[arg(long, env = "RESUME_MATCH_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print JSON result and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// After matching, download the top resumes as an archive (non-TUI modes)
    #[arg(long)]
    pub download_top: bool,

    /// Directory for the downloaded archive (defaults to the download directory)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Export results as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn is_interactive(&self) -> bool {
        !self.json && !self.text && cfg!(feature = "tui")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(crate::storage::default_output_dir)
    }

    /// Job text from `--job` or `--job-file`; empty when neither is given.
    pub fn job_text(&self) -> Result<String> {
        if let Some(job) = self.job.as_ref() {
            return Ok(job.clone());
        }
        match self.job_file.as_deref() {
            Some(p) => {
                std::fs::read_to_string(p).with_context(|| format!("read job file {}", p.display()))
            }
            None => Ok(String::new()),
        }
    }
}

pub fn build_client_config(args: &Cli) -> ClientConfig {
    ClientConfig {
        base_url: args.base_url.clone(),
        user_agent: format!("resume-match-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub(crate) fn build_controller_settings(args: &Cli) -> ControllerSettings {
    ControllerSettings {
        base_url: args.base_url.clone(),
        output_dir: args.output_dir(),
        export_json: args.export_json.clone(),
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.download_top && args.is_interactive() {
        return Err(anyhow::anyhow!(
            "--download-top is only used with --json or --text; press Ctrl-D in the TUI instead."
        ));
    }

    if args.is_interactive() {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
    }

    run_once(args).await
}

/// Load, submit, and optionally download once, then print the outcome.
async fn run_once(args: Cli) -> Result<()> {
    let client = ScoringClient::new(&build_client_config(&args))?;
    let (out_tx, out_handle) = spawn_output_writer();

    let res = run_once_with(&args, &client, &out_tx).await;

    // Flush queued output before reporting any error.
    drop(out_tx);
    let _ = out_handle.await;
    res
}

async fn run_once_with(
    args: &Cli,
    client: &ScoringClient,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    let mut wf = Workflow::new();
    wf.check_selection_size(args.files.len())?;
    let files = engine::load_candidate_files(&args.files).await?;
    wf.select_files(files)?;
    for f in wf.files().iter().filter(|f| !f.is_pdf()) {
        tracing::warn!(file = %f.name, "not a PDF; the server will skip it");
    }
    wf.set_job(args.job_text()?);
    wf.set_enhanced(args.enhanced);
    wf.set_credential(args.api_key.clone().unwrap_or_default());

    let _ = out_tx.send(OutputLine::Stderr(format!(
        "Analyzing {} resume(s) via {}…",
        wf.files().len(),
        client.base_url()
    )));
    wf.submit(client).await.map_err(|e| match e {
        RequestFailure::Invalid(e) => anyhow::Error::new(e),
        RequestFailure::Service(e) => {
            tracing::error!(error = %e, "match request failed");
            anyhow::Error::new(e).context("match request failed")
        }
    })?;

    // Results are reported even when the download step fails.
    let mut download_err = None;
    let mut archive_path = None;
    if args.download_top {
        match download(args, client, &mut wf).await {
            Ok(path) => archive_path = Some(path),
            Err(DownloadFailure::NothingToDownload(e)) => {
                let _ = out_tx.send(OutputLine::Stderr(format!("Skipping download: {e}")));
            }
            Err(DownloadFailure::Failed(e)) => download_err = Some(e),
        }
    }

    let report = orchestrator::build_report(&args.base_url, &wf, archive_path);
    if let Some(msg) = orchestrator::export_report(args.export_json.as_deref(), &report) {
        let _ = out_tx.send(OutputLine::Stderr(msg));
    }
    print_report(args, &report, out_tx)?;

    match download_err {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

enum DownloadFailure {
    /// No selected resume reached the score threshold.
    NothingToDownload(WorkflowError),
    Failed(anyhow::Error),
}

async fn download(
    args: &Cli,
    client: &ScoringClient,
    wf: &mut Workflow,
) -> Result<PathBuf, DownloadFailure> {
    let archive = wf.download_top(client).await.map_err(|e| match e {
        RequestFailure::Invalid(e @ WorkflowError::NoTopMatches { .. }) => {
            DownloadFailure::NothingToDownload(e)
        }
        RequestFailure::Invalid(e) => DownloadFailure::Failed(anyhow::Error::new(e)),
        RequestFailure::Service(e) => {
            tracing::error!(error = %e, "download failed");
            DownloadFailure::Failed(anyhow::Error::new(e).context("download failed"))
        }
    })?;
    orchestrator::store_archive(&args.output_dir(), &archive)
        .map_err(|e| DownloadFailure::Failed(anyhow::Error::msg(e)))
}

fn print_report(
    args: &Cli,
    report: &MatchReport,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
) -> Result<()> {
    if args.json {
        let out = serde_json::to_string_pretty(report)?;
        let _ = out_tx.send(OutputLine::Stdout(out));
        return Ok(());
    }
    for line in crate::text_summary::build_text_summary(report).lines {
        let _ = out_tx.send(OutputLine::Stdout(line));
    }
    Ok(())
}

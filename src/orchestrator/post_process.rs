//! Post-request processing utilities.
//!
//! Turns finished workflow state into a report, writes exports, and stores downloaded
//! archives.

use super::workflow::Workflow;
use crate::model::MatchReport;
use crate::storage;
use std::path::{Path, PathBuf};

/// Snapshot the current results into a serializable report.
pub(crate) fn build_report(
    base_url: &str,
    wf: &Workflow,
    archive_path: Option<PathBuf>,
) -> MatchReport {
    MatchReport {
        timestamp_utc: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_else(|_| "now".into()),
        base_url: base_url.to_string(),
        mode: wf.mode(),
        files: wf.files().iter().map(|f| f.name.clone()).collect(),
        results: wf.results().to_vec(),
        less_score: wf.less_score().to_vec(),
        archive_path,
    }
}

/// Write the report to `export_path` when one is configured, returning a status line.
pub(crate) fn export_report(export_path: Option<&Path>, report: &MatchReport) -> Option<String> {
    let path = export_path?;
    Some(match storage::export_json(path, report) {
        Ok(()) => format!("Exported JSON: {}", path.display()),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "export failed");
            format!("Export JSON failed: {e:#}")
        }
    })
}

/// Store a downloaded archive, returning its path or a user-facing failure message.
pub(crate) fn store_archive(output_dir: &Path, archive: &[u8]) -> Result<PathBuf, String> {
    storage::save_archive(output_dir, archive).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), "saving archive failed");
        format!("Download failed: {e:#}")
    })
}

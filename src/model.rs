use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of resumes accepted in a single selection.
pub const MAX_FILES: usize = 5;

/// Results at or above this score are eligible for the top-matches archive.
pub const TOP_SCORE_THRESHOLD: f64 = 0.5;

/// File name used when saving the downloaded archive.
pub const ARCHIVE_FILE_NAME: &str = "top_candidates.zip";

/// A resume selected by the user. `name` is the join key against server results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub name: String,
    pub content: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn is_pdf(&self) -> bool {
        self.name.to_ascii_lowercase().ends_with(".pdf")
    }
}

/// Scoring pathway. Each mode maps to its own endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Standard,
    Enhanced,
}

impl MatchMode {
    pub fn from_enhanced(enhanced: bool) -> Self {
        if enhanced {
            MatchMode::Enhanced
        } else {
            MatchMode::Standard
        }
    }

    pub fn endpoint_path(self) -> &'static str {
        match self {
            MatchMode::Standard => "/api/match",
            MatchMode::Enhanced => "/api/match_llm",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "candidateName", default)]
    pub candidate_name: String,
    pub filename: String,
    #[serde(default)]
    pub score: f64,
}

/// Parsed body of a match response. Both lists are always present here even when
/// the server omitted them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchResponse {
    pub results: Vec<MatchResult>,
    #[serde(rename = "lessScore")]
    pub less_score: Vec<MatchResult>,
}

impl MatchResponse {
    /// Build a response from an arbitrary JSON payload. Missing or non-array fields
    /// become empty lists and entries that do not look like a result are skipped.
    pub fn from_json(value: &serde_json::Value) -> Self {
        Self {
            results: result_list(value.get("results")),
            less_score: result_list(value.get("lessScore")),
        }
    }
}

fn result_list(field: Option<&serde_json::Value>) -> Vec<MatchResult> {
    match field.and_then(|v| v.as_array()) {
        Some(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<MatchResult>(item.clone()).ok())
            .collect(),
        None => Vec::new(),
    }
}

/// Request configuration derived from the workflow at submit time.
#[derive(Clone)]
pub struct MatchRequest {
    pub files: Vec<CandidateFile>,
    pub job: String,
    pub mode: MatchMode,
    pub credential: Option<String>,
}

impl std::fmt::Debug for MatchRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.files.iter().map(|c| c.name.as_str()).collect();
        f.debug_struct("MatchRequest")
            .field("files", &names)
            .field("job_len", &self.job.len())
            .field("mode", &self.mode)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub files: Vec<CandidateFile>,
}

/// Workflow lifecycle. `Submitting` wins when both requests are in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Submitting,
    ResultsReady,
    Downloading,
}

/// Read-only copy of the workflow for presentation layers.
#[derive(Debug, Clone, Default)]
pub struct WorkflowSnapshot {
    pub phase: Phase,
    pub file_names: Vec<String>,
    pub enhanced: bool,
    pub has_credential: bool,
    pub submitting: bool,
    pub downloading: bool,
    pub results: Vec<MatchResult>,
    pub less_score: Vec<MatchResult>,
    pub download_candidates: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(Box<WorkflowSnapshot>),
    /// A user-facing warning; the workflow stays interactive.
    Alert(String),
    Info(InfoEvent),
    ArchiveSaved { path: PathBuf },
}

/// Structured info events consumed by UI/CLI layers.
#[derive(Debug, Clone)]
pub enum InfoEvent {
    Message(String),
    Submitting { files: usize, mode: MatchMode },
    Downloading { files: usize },
    AlreadyBusy(&'static str),
    NonPdfSelected(String),
}

impl InfoEvent {
    /// Render a human-readable message for UI/CLI layers.
    pub fn to_message(&self) -> String {
        match self {
            InfoEvent::Message(msg) => msg.clone(),
            InfoEvent::Submitting { files, mode } => match mode {
                MatchMode::Standard => format!("Analyzing {} resume(s)…", files),
                MatchMode::Enhanced => format!("Analyzing {} resume(s) with LLM scoring…", files),
            },
            InfoEvent::Downloading { files } => format!("Downloading {} top resume(s)…", files),
            InfoEvent::AlreadyBusy(what) => format!("{} already in progress", what),
            InfoEvent::NonPdfSelected(name) => {
                format!("{} is not a PDF; the server will skip it", name)
            }
        }
    }
}

/// Serialized form of a finished match, used by `--json` and `--export-json`.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub timestamp_utc: String,
    pub base_url: String,
    pub mode: MatchMode,
    pub files: Vec<String>,
    pub results: Vec<MatchResult>,
    #[serde(rename = "lessScore")]
    pub less_score: Vec<MatchResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_both_result_lists() {
        let body = json!({
            "results": [{"candidateName": "Ada", "filename": "a.pdf", "score": 0.91}],
            "lessScore": [{"candidateName": "Bob", "filename": "b.pdf", "score": 0.2}]
        });
        let parsed = MatchResponse::from_json(&body);
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].candidate_name, "Ada");
        assert_eq!(parsed.less_score[0].filename, "b.pdf");
    }

    #[test]
    fn missing_or_non_array_fields_become_empty() {
        let body = json!({ "results": "oops" });
        let parsed = MatchResponse::from_json(&body);
        assert!(parsed.results.is_empty());
        assert!(parsed.less_score.is_empty());

        let parsed = MatchResponse::from_json(&json!(null));
        assert_eq!(parsed, MatchResponse::default());
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let body = json!({
            "results": [
                {"candidateName": "Ada", "filename": "a.pdf", "score": 0.7},
                {"filename": 3},
                {"filename": "c.pdf", "score": 0.6},
                {"candidateName": "Dee", "filename": "d.pdf", "score": "high"}
            ]
        });
        let parsed = MatchResponse::from_json(&body);
        let names: Vec<_> = parsed.results.iter().map(|r| r.filename.as_str()).collect();
        assert_eq!(names, ["a.pdf", "c.pdf"]);
    }

    #[test]
    fn entry_without_score_is_listed_with_zero() {
        let body = json!({
            "lessScore": [{"candidateName": "Eve", "filename": "e.pdf"}]
        });
        let parsed = MatchResponse::from_json(&body);
        assert_eq!(parsed.less_score.len(), 1);
        assert_eq!(parsed.less_score[0].candidate_name, "Eve");
        assert_eq!(parsed.less_score[0].score, 0.0);
    }

    #[test]
    fn request_debug_hides_credential() {
        let req = MatchRequest {
            files: vec![CandidateFile::new("a.pdf", "x")],
            job: "Senior backend engineer".into(),
            mode: MatchMode::Enhanced,
            credential: Some("sk-test".into()),
        };
        let dbg = format!("{req:?}");
        assert!(!dbg.contains("sk-test"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn endpoints_are_distinct_per_mode() {
        assert_eq!(MatchMode::from_enhanced(false).endpoint_path(), "/api/match");
        assert_eq!(MatchMode::from_enhanced(true).endpoint_path(), "/api/match_llm");
    }
}

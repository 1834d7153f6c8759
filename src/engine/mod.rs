mod files;
mod scoring;

pub use files::load_candidate_files;
pub use scoring::{ClientConfig, ScoringClient};

use crate::model::{DownloadRequest, MatchRequest, MatchResponse};
use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("request to scoring service failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scoring service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid response from scoring service: {0}")]
    Decode(String),
    #[error("request task failed: {0}")]
    Task(String),
}

/// Remote side of the workflow: one call per request/response cycle.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Score the request's resumes against its job description.
    async fn match_resumes(&self, req: &MatchRequest) -> Result<MatchResponse, ServiceError>;

    /// Fetch an archive containing the given resumes.
    async fn download_top(&self, req: &DownloadRequest) -> Result<Bytes, ServiceError>;
}

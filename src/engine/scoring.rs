use super::{ScoringService, ServiceError};
use crate::model::{CandidateFile, DownloadRequest, MatchRequest, MatchResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Url;

/// Multipart field shared by every uploaded resume.
const FILES_FIELD: &str = "resumes";
const JOB_FIELD: &str = "job";
const CREDENTIAL_FIELD: &str = "api_key";
const DOWNLOAD_PATH: &str = "/api/download-top";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub user_agent: String,
}

/// `reqwest`-backed client for the scoring service.
#[derive(Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
}

impl ScoringClient {
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        let base_url = cfg.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).with_context(|| format!("invalid base URL: {}", cfg.base_url))?;

        // No request timeout: a request runs until it completes or fails.
        let http = reqwest::Client::builder()
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build http client")?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post(&self, path: &str, form: Form) -> Result<reqwest::Response, ServiceError> {
        let resp = self.http.post(self.url(path)).multipart(form).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }
        Ok(resp)
    }
}

fn file_part(file: &CandidateFile) -> Result<Part, ServiceError> {
    let part = Part::bytes(file.content.to_vec()).file_name(file.name.clone());
    if file.is_pdf() {
        return Ok(part.mime_str("application/pdf")?);
    }
    Ok(part)
}

fn files_form(files: &[CandidateFile]) -> Result<Form, ServiceError> {
    let mut form = Form::new();
    for f in files {
        form = form.part(FILES_FIELD, file_part(f)?);
    }
    Ok(form)
}

/// Build the multipart body of a match request. The credential is only attached
/// for enhanced requests.
pub(crate) fn match_form(req: &MatchRequest) -> Result<Form, ServiceError> {
    let mut form = files_form(&req.files)?.text(JOB_FIELD, req.job.clone());
    if req.mode == crate::model::MatchMode::Enhanced {
        if let Some(credential) = req.credential.as_ref() {
            form = form.text(CREDENTIAL_FIELD, credential.clone());
        }
    }
    Ok(form)
}

#[async_trait]
impl ScoringService for ScoringClient {
    async fn match_resumes(&self, req: &MatchRequest) -> Result<MatchResponse, ServiceError> {
        let path = req.mode.endpoint_path();
        tracing::debug!(?req, path, "sending match request");

        let resp = self.post(path, match_form(req)?).await?;
        let value: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        tracing::debug!(payload = %value, "match response");

        Ok(MatchResponse::from_json(&value))
    }

    async fn download_top(&self, req: &DownloadRequest) -> Result<Bytes, ServiceError> {
        tracing::debug!(files = req.files.len(), "sending download request");
        let resp = self.post(DOWNLOAD_PATH, files_form(&req.files)?).await?;
        Ok(resp.bytes().await?)
    }
}

//! Submission workflow state.
//!
//! `Workflow` owns everything the form shows: the selected resumes, the job text, the
//! enhanced-mode toggle and credential, both busy flags and both result lists. Each
//! request cycle is split into a `begin_*` transition (validation, flag set, request
//! built) and a `finish_*` transition (flag cleared, state updated), so callers that
//! run the request elsewhere can still apply its completion serially.

use crate::engine::{ScoringService, ServiceError};
use crate::model::{
    CandidateFile, DownloadRequest, MatchMode, MatchRequest, MatchResponse, MatchResult, Phase,
    WorkflowSnapshot, MAX_FILES, TOP_SCORE_THRESHOLD,
};
use bytes::Bytes;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum WorkflowError {
    #[error("You can only upload up to {max} resumes ({count} selected).")]
    TooManyFiles { count: usize, max: usize },
    #[error("Please upload at least one resume and enter job description.")]
    MissingInput,
    #[error("Please enter your OpenAI API key.")]
    MissingCredential,
    #[error("No resumes scored at or above {threshold} among the selected files.")]
    NoTopMatches { threshold: f64 },
    #[error("{0} already in progress.")]
    Busy(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum RequestFailure {
    #[error(transparent)]
    Invalid(#[from] WorkflowError),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Default)]
pub struct Workflow {
    files: Vec<CandidateFile>,
    job: String,
    enhanced: bool,
    credential: String,
    submitting: bool,
    downloading: bool,
    results: Vec<MatchResult>,
    less_score: Vec<MatchResult>,
    has_results: bool,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject a selection of `count` files before anything is read. Clears the
    /// current selection when the cap is exceeded.
    pub fn check_selection_size(&mut self, count: usize) -> Result<(), WorkflowError> {
        if count > MAX_FILES {
            self.files.clear();
            return Err(WorkflowError::TooManyFiles {
                count,
                max: MAX_FILES,
            });
        }
        Ok(())
    }

    /// Replace the selection. More than `MAX_FILES` files clears it instead.
    pub fn select_files(&mut self, files: Vec<CandidateFile>) -> Result<(), WorkflowError> {
        self.check_selection_size(files.len())?;
        self.files = files;
        Ok(())
    }

    pub fn clear_files(&mut self) {
        self.files.clear();
    }

    pub fn set_job(&mut self, job: impl Into<String>) {
        self.job = job.into();
    }

    pub fn set_enhanced(&mut self, enhanced: bool) {
        self.enhanced = enhanced;
    }

    pub fn set_credential(&mut self, credential: impl Into<String>) {
        self.credential = credential.into();
    }

    pub fn files(&self) -> &[CandidateFile] {
        &self.files
    }

    pub fn results(&self) -> &[MatchResult] {
        &self.results
    }

    pub fn less_score(&self) -> &[MatchResult] {
        &self.less_score
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn is_downloading(&self) -> bool {
        self.downloading
    }

    pub fn mode(&self) -> MatchMode {
        MatchMode::from_enhanced(self.enhanced)
    }

    pub fn phase(&self) -> Phase {
        if self.submitting {
            Phase::Submitting
        } else if self.downloading {
            Phase::Downloading
        } else if self.has_results {
            Phase::ResultsReady
        } else {
            Phase::Idle
        }
    }

    /// Check the submit preconditions and, if they hold, enter `Submitting`.
    pub fn begin_submit(&mut self) -> Result<MatchRequest, WorkflowError> {
        if self.submitting {
            return Err(WorkflowError::Busy("Analysis"));
        }
        if self.files.len() > MAX_FILES {
            return Err(WorkflowError::TooManyFiles {
                count: self.files.len(),
                max: MAX_FILES,
            });
        }
        if self.files.is_empty() || self.job.is_empty() {
            return Err(WorkflowError::MissingInput);
        }
        let mode = self.mode();
        if mode == MatchMode::Enhanced && self.credential.is_empty() {
            return Err(WorkflowError::MissingCredential);
        }

        self.submitting = true;
        Ok(MatchRequest {
            files: self.files.clone(),
            job: self.job.clone(),
            mode,
            credential: (mode == MatchMode::Enhanced).then(|| self.credential.clone()),
        })
    }

    /// Leave `Submitting`. A successful response replaces both lists; a failure
    /// leaves them untouched.
    pub fn finish_submit(
        &mut self,
        outcome: Result<MatchResponse, ServiceError>,
    ) -> Result<(), ServiceError> {
        self.submitting = false;
        let resp = outcome?;
        self.results = resp.results;
        self.less_score = resp.less_score;
        self.has_results = true;
        Ok(())
    }

    /// Selected files whose name matches a high-score result at or above the threshold.
    pub fn download_candidates(&self) -> Vec<CandidateFile> {
        let top: Vec<&str> = self
            .results
            .iter()
            .filter(|r| r.score >= TOP_SCORE_THRESHOLD)
            .map(|r| r.filename.as_str())
            .collect();
        self.files
            .iter()
            .filter(|f| top.contains(&f.name.as_str()))
            .cloned()
            .collect()
    }

    pub fn begin_download(&mut self) -> Result<DownloadRequest, WorkflowError> {
        if self.downloading {
            return Err(WorkflowError::Busy("Download"));
        }
        let files = self.download_candidates();
        if files.is_empty() {
            return Err(WorkflowError::NoTopMatches {
                threshold: TOP_SCORE_THRESHOLD,
            });
        }
        self.downloading = true;
        Ok(DownloadRequest { files })
    }

    pub fn finish_download(
        &mut self,
        outcome: Result<Bytes, ServiceError>,
    ) -> Result<Bytes, ServiceError> {
        self.downloading = false;
        outcome
    }

    /// Run one match cycle against `service`.
    pub async fn submit<S>(&mut self, service: &S) -> Result<(), RequestFailure>
    where
        S: ScoringService + ?Sized,
    {
        let req = self.begin_submit()?;
        let outcome = service.match_resumes(&req).await;
        Ok(self.finish_submit(outcome)?)
    }

    /// Run one download cycle against `service`, returning the archive bytes.
    pub async fn download_top<S>(&mut self, service: &S) -> Result<Bytes, RequestFailure>
    where
        S: ScoringService + ?Sized,
    {
        let req = self.begin_download()?;
        let outcome = service.download_top(&req).await;
        Ok(self.finish_download(outcome)?)
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            phase: self.phase(),
            file_names: self.files.iter().map(|f| f.name.clone()).collect(),
            enhanced: self.enhanced,
            has_credential: !self.credential.is_empty(),
            submitting: self.is_submitting(),
            downloading: self.is_downloading(),
            results: self.results.clone(),
            less_score: self.less_score.clone(),
            download_candidates: self
                .download_candidates()
                .into_iter()
                .map(|f| f.name)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn file(name: &str) -> CandidateFile {
        CandidateFile::new(name, format!("%PDF {name}"))
    }

    fn result(name: &str, score: f64) -> MatchResult {
        MatchResult {
            candidate_name: name.trim_end_matches(".pdf").to_string(),
            filename: name.to_string(),
            score,
        }
    }

    /// Records every call and answers with canned outcomes.
    #[derive(Default)]
    struct FakeService {
        match_calls: Mutex<Vec<MatchRequest>>,
        download_calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
        response: MatchResponse,
    }

    #[async_trait]
    impl ScoringService for FakeService {
        async fn match_resumes(&self, req: &MatchRequest) -> Result<MatchResponse, ServiceError> {
            self.match_calls.lock().unwrap().push(req.clone());
            if self.fail {
                return Err(ServiceError::Decode("boom".into()));
            }
            Ok(self.response.clone())
        }

        async fn download_top(&self, req: &DownloadRequest) -> Result<Bytes, ServiceError> {
            self.download_calls
                .lock()
                .unwrap()
                .push(req.files.iter().map(|f| f.name.clone()).collect());
            if self.fail {
                return Err(ServiceError::Decode("boom".into()));
            }
            Ok(Bytes::from_static(b"PK"))
        }
    }

    fn ready_workflow() -> Workflow {
        let mut wf = Workflow::new();
        wf.select_files(vec![file("a.pdf"), file("b.pdf")]).unwrap();
        wf.set_job("Senior backend engineer");
        wf
    }

    #[test]
    fn oversized_selection_is_rejected_and_clears_previous() {
        let mut wf = Workflow::new();
        wf.select_files(vec![file("a.pdf")]).unwrap();

        let six: Vec<_> = (0..6).map(|i| file(&format!("{i}.pdf"))).collect();
        let err = wf.select_files(six).unwrap_err();
        assert_eq!(err, WorkflowError::TooManyFiles { count: 6, max: 5 });
        assert!(wf.files().is_empty());
    }

    #[test]
    fn selection_of_five_replaces_previous() {
        let mut wf = Workflow::new();
        wf.select_files(vec![file("old.pdf")]).unwrap();
        let five: Vec<_> = (0..5).map(|i| file(&format!("{i}.pdf"))).collect();
        wf.select_files(five).unwrap();
        assert_eq!(wf.files().len(), 5);
        assert!(wf.files().iter().all(|f| f.name != "old.pdf"));
    }

    #[tokio::test]
    async fn missing_files_or_job_sends_nothing() {
        let service = FakeService::default();

        let mut wf = Workflow::new();
        wf.set_job("Engineer");
        let err = wf.submit(&service).await.unwrap_err();
        assert!(matches!(
            err,
            RequestFailure::Invalid(WorkflowError::MissingInput)
        ));

        let mut wf = Workflow::new();
        wf.select_files(vec![file("a.pdf")]).unwrap();
        let err = wf.submit(&service).await.unwrap_err();
        assert!(matches!(
            err,
            RequestFailure::Invalid(WorkflowError::MissingInput)
        ));

        assert!(service.match_calls.lock().unwrap().is_empty());
        assert!(!wf.is_submitting());
    }

    #[tokio::test]
    async fn enhanced_without_credential_sends_nothing() {
        let service = FakeService::default();
        let mut wf = ready_workflow();
        wf.set_enhanced(true);

        let err = wf.submit(&service).await.unwrap_err();
        assert!(matches!(
            err,
            RequestFailure::Invalid(WorkflowError::MissingCredential)
        ));
        assert!(service.match_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mode_is_taken_from_toggle_at_submit_time() {
        let service = FakeService::default();
        let mut wf = ready_workflow();
        wf.set_credential("sk-test");

        wf.submit(&service).await.unwrap();
        wf.set_enhanced(true);
        wf.submit(&service).await.unwrap();

        let calls = service.match_calls.lock().unwrap();
        assert_eq!(calls[0].mode, MatchMode::Standard);
        assert_eq!(calls[0].credential, None);
        assert_eq!(calls[1].mode, MatchMode::Enhanced);
        assert_eq!(calls[1].credential.as_deref(), Some("sk-test"));
        assert_eq!(calls[1].job, "Senior backend engineer");
        assert_eq!(calls[1].files.len(), 2);
    }

    #[tokio::test]
    async fn successful_response_replaces_both_lists() {
        let service = FakeService {
            response: MatchResponse {
                results: vec![result("a.pdf", 0.9)],
                less_score: Vec::new(),
            },
            ..Default::default()
        };
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("old.pdf", 0.7)],
            less_score: vec![result("older.pdf", 0.1)],
        }))
        .unwrap();

        wf.submit(&service).await.unwrap();
        assert_eq!(wf.results(), &[result("a.pdf", 0.9)]);
        assert!(wf.less_score().is_empty());
        assert_eq!(wf.phase(), Phase::ResultsReady);
    }

    #[test]
    fn busy_flag_spans_exactly_the_request_and_failure_keeps_results() {
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.9)],
            less_score: Vec::new(),
        }))
        .unwrap();

        assert!(!wf.is_submitting());
        let _req = wf.begin_submit().unwrap();
        assert!(wf.is_submitting());
        assert_eq!(wf.phase(), Phase::Submitting);
        assert!(matches!(
            wf.begin_submit(),
            Err(WorkflowError::Busy("Analysis"))
        ));

        let res = wf.finish_submit(Err(ServiceError::Decode("boom".into())));
        assert!(res.is_err());
        assert!(!wf.is_submitting());
        assert_eq!(wf.results(), &[result("a.pdf", 0.9)]);
    }

    #[tokio::test]
    async fn failed_submit_from_idle_returns_to_idle() {
        let service = FakeService {
            fail: true,
            ..Default::default()
        };
        let mut wf = ready_workflow();
        let err = wf.submit(&service).await.unwrap_err();
        assert!(matches!(err, RequestFailure::Service(_)));
        assert!(!wf.is_submitting());
        assert_eq!(wf.phase(), Phase::Idle);
        assert!(wf.results().is_empty());
    }

    #[test]
    fn download_set_joins_selected_files_on_top_results() {
        let mut wf = Workflow::new();
        wf.select_files(vec![file("a.pdf"), file("b.pdf"), file("c.pdf")])
            .unwrap();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.9), result("b.pdf", 0.3)],
            less_score: Vec::new(),
        }))
        .unwrap();

        let names: Vec<_> = wf
            .download_candidates()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["a.pdf"]);
    }

    #[test]
    fn threshold_is_inclusive_and_names_match_exactly() {
        let mut wf = Workflow::new();
        wf.select_files(vec![file("a.pdf"), file("A.pdf")]).unwrap();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.5), result("missing.pdf", 0.99)],
            less_score: Vec::new(),
        }))
        .unwrap();

        let names: Vec<_> = wf
            .download_candidates()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, ["a.pdf"]);
    }

    #[tokio::test]
    async fn download_sends_only_matched_files() {
        let service = FakeService::default();
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("b.pdf", 0.75)],
            less_score: vec![result("a.pdf", 0.2)],
        }))
        .unwrap();

        let archive = wf.download_top(&service).await.unwrap();
        assert_eq!(&archive[..], b"PK");
        assert!(!wf.is_downloading());
        assert_eq!(
            *service.download_calls.lock().unwrap(),
            vec![vec!["b.pdf".to_string()]]
        );
        assert_eq!(wf.phase(), Phase::ResultsReady);
    }

    #[test]
    fn phase_tracks_download_and_returns_to_results() {
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.8)],
            less_score: Vec::new(),
        }))
        .unwrap();

        let _req = wf.begin_download().unwrap();
        assert_eq!(wf.phase(), Phase::Downloading);
        assert!(wf.finish_download(Err(ServiceError::Decode("boom".into()))).is_err());
        assert_eq!(wf.phase(), Phase::ResultsReady);
        assert_eq!(wf.results(), &[result("a.pdf", 0.8)]);
    }

    #[test]
    fn oversized_count_is_rejected_before_loading() {
        let mut wf = ready_workflow();
        assert!(wf.check_selection_size(MAX_FILES).is_ok());
        assert!(!wf.files().is_empty());
        assert_eq!(
            wf.check_selection_size(MAX_FILES + 1),
            Err(WorkflowError::TooManyFiles {
                count: MAX_FILES + 1,
                max: MAX_FILES
            })
        );
        assert!(wf.files().is_empty());
    }

    #[tokio::test]
    async fn download_without_top_matches_sends_nothing() {
        let service = FakeService::default();
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse::default())).unwrap();

        let err = wf.download_top(&service).await.unwrap_err();
        assert!(matches!(
            err,
            RequestFailure::Invalid(WorkflowError::NoTopMatches { .. })
        ));
        assert!(service.download_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_download_clears_flag_and_keeps_results() {
        let service = FakeService {
            fail: true,
            ..Default::default()
        };
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.8)],
            less_score: Vec::new(),
        }))
        .unwrap();

        let err = wf.download_top(&service).await.unwrap_err();
        assert!(matches!(err, RequestFailure::Service(_)));
        assert!(!wf.is_downloading());
        assert_eq!(wf.results().len(), 1);
    }

    #[test]
    fn download_and_submit_flags_are_independent() {
        let mut wf = ready_workflow();
        wf.finish_submit(Ok(MatchResponse {
            results: vec![result("a.pdf", 0.8)],
            less_score: Vec::new(),
        }))
        .unwrap();

        wf.begin_download().unwrap();
        wf.begin_submit().unwrap();
        assert!(wf.is_downloading() && wf.is_submitting());

        wf.finish_download(Ok(Bytes::new())).unwrap();
        assert!(!wf.is_downloading());
        assert!(wf.is_submitting());
    }

    #[test]
    fn snapshot_reflects_state_without_credential() {
        let mut wf = ready_workflow();
        wf.set_enhanced(true);
        wf.set_credential("sk-test");
        let snap = wf.snapshot();
        assert_eq!(snap.file_names, ["a.pdf", "b.pdf"]);
        assert!(snap.enhanced);
        assert!(snap.has_credential);
        assert_eq!(snap.phase, Phase::Idle);
        assert!(!format!("{snap:?}").contains("sk-test"));
    }
}

//! Workflow controller.
//!
//! Owns the `Workflow`, turns UI commands into transitions, and runs requests as
//! spawned tasks whose completions are applied back on this loop.

use super::post_process;
use super::workflow::{Workflow, WorkflowError};
use crate::engine::{self, ScoringService, ServiceError};
use crate::model::{InfoEvent, MatchResponse, WorkflowEvent};
use anyhow::Result;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SelectFiles(Vec<PathBuf>),
    SetJob(String),
    SetEnhanced(bool),
    SetCredential(String),
    Submit,
    Download,
    Quit,
}

#[derive(Debug, Clone)]
pub(crate) struct ControllerSettings {
    pub base_url: String,
    pub output_dir: PathBuf,
    pub export_json: Option<PathBuf>,
}

type Pending<T> = Option<JoinHandle<Result<T, ServiceError>>>;

fn joined<T>(
    res: Result<Result<T, ServiceError>, tokio::task::JoinError>,
) -> Result<T, ServiceError> {
    res.unwrap_or_else(|e| Err(ServiceError::Task(e.to_string())))
}

fn alert(event_tx: &UnboundedSender<WorkflowEvent>, msg: String) {
    tracing::warn!("{msg}");
    let _ = event_tx.send(WorkflowEvent::Alert(msg));
}

fn publish(event_tx: &UnboundedSender<WorkflowEvent>, wf: &Workflow) {
    let _ = event_tx.send(WorkflowEvent::StateChanged(Box::new(wf.snapshot())));
}

fn info(event_tx: &UnboundedSender<WorkflowEvent>, ev: InfoEvent) {
    tracing::info!("{}", ev.to_message());
    let _ = event_tx.send(WorkflowEvent::Info(ev));
}

async fn select_files(
    wf: &mut Workflow,
    paths: &[PathBuf],
    event_tx: &UnboundedSender<WorkflowEvent>,
) {
    if let Err(e) = wf.check_selection_size(paths.len()) {
        alert(event_tx, e.to_string());
        return;
    }
    let files = match engine::load_candidate_files(paths).await {
        Ok(files) => files,
        Err(e) => {
            wf.clear_files();
            alert(event_tx, format!("Could not read selection: {e:#}"));
            return;
        }
    };
    let non_pdf: Vec<String> = files
        .iter()
        .filter(|f| !f.is_pdf())
        .map(|f| f.name.clone())
        .collect();
    if let Err(e) = wf.select_files(files) {
        alert(event_tx, e.to_string());
        return;
    }
    for name in non_pdf {
        info(event_tx, InfoEvent::NonPdfSelected(name));
    }
}

/// Drive the workflow from UI commands until `Quit` (or the command channel closes)
/// and no request is left in flight.
pub(crate) async fn run_controller(
    service: Arc<dyn ScoringService>,
    settings: ControllerSettings,
    event_tx: UnboundedSender<WorkflowEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut wf = Workflow::new();
    let mut submit_task: Pending<MatchResponse> = None;
    let mut download_task: Pending<Bytes> = None;
    let mut quit_pending = false;

    publish(&event_tx, &wf);

    loop {
        if quit_pending && submit_task.is_none() && download_task.is_none() {
            break;
        }

        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::SelectFiles(paths)) => {
                        select_files(&mut wf, &paths, &event_tx).await;
                    }
                    Some(UiCommand::SetJob(job)) => wf.set_job(job),
                    Some(UiCommand::SetEnhanced(on)) => wf.set_enhanced(on),
                    Some(UiCommand::SetCredential(c)) => wf.set_credential(c),
                    Some(UiCommand::Submit) => match wf.begin_submit() {
                        Ok(req) => {
                            info(&event_tx, InfoEvent::Submitting { files: req.files.len(), mode: req.mode });
                            let svc = service.clone();
                            submit_task = Some(tokio::spawn(async move { svc.match_resumes(&req).await }));
                        }
                        Err(WorkflowError::Busy(what)) => info(&event_tx, InfoEvent::AlreadyBusy(what)),
                        Err(e) => alert(&event_tx, e.to_string()),
                    },
                    Some(UiCommand::Download) => match wf.begin_download() {
                        Ok(req) => {
                            info(&event_tx, InfoEvent::Downloading { files: req.files.len() });
                            let svc = service.clone();
                            download_task = Some(tokio::spawn(async move { svc.download_top(&req).await }));
                        }
                        Err(WorkflowError::Busy(what)) => info(&event_tx, InfoEvent::AlreadyBusy(what)),
                        Err(e) => alert(&event_tx, e.to_string()),
                    },
                    Some(UiCommand::Quit) | None => {
                        // In-flight requests cannot be cancelled; wait for them to settle.
                        quit_pending = true;
                    }
                }
                publish(&event_tx, &wf);
            }
            done = async {
                match submit_task.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                submit_task = None;
                match wf.finish_submit(joined(done)) {
                    Ok(()) => {
                        let report = post_process::build_report(&settings.base_url, &wf, None);
                        if let Some(msg) = post_process::export_report(settings.export_json.as_deref(), &report) {
                            info(&event_tx, InfoEvent::Message(msg));
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "match request failed");
                        alert(&event_tx, format!("Error uploading. Make sure the scoring service is running. ({e})"));
                    }
                }
                publish(&event_tx, &wf);
            }
            done = async {
                match download_task.as_mut() {
                    Some(h) => h.await,
                    None => futures::future::pending().await,
                }
            } => {
                download_task = None;
                match wf.finish_download(joined(done)) {
                    Ok(archive) => match post_process::store_archive(&settings.output_dir, &archive) {
                        Ok(path) => {
                            tracing::info!(path = %path.display(), "archive saved");
                            let _ = event_tx.send(WorkflowEvent::ArchiveSaved { path });
                        }
                        Err(msg) => alert(&event_tx, msg),
                    },
                    Err(e) => {
                        tracing::error!(error = %e, "download failed");
                        alert(&event_tx, format!("Download failed: {e}"));
                    }
                }
                publish(&event_tx, &wf);
            }
        }
    }

    Ok(())
}

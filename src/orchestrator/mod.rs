//! Application-level orchestration utilities.
//!
//! This module owns the submission workflow state machine, the controller loop that
//! drives it from UI commands, and post-request processing such as archive saving and
//! exports. UI/CLI layers call into this module to keep responsibilities separated.

mod controller;
mod post_process;
mod workflow;

pub(crate) use controller::{run_controller, ControllerSettings, UiCommand};
pub(crate) use post_process::{build_report, export_report, store_archive};
pub(crate) use workflow::{RequestFailure, Workflow, WorkflowError};

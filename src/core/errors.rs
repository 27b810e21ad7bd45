/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::limits::*;
use super::types::{ProcessId, ResultCode};
use crate::process::ProcessState;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Re-export VfsError from vfs module
pub use crate::vfs::VfsError;

/// Tracker operation result
#[must_use = "tracker operations can fail and must be handled"]
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Applet tracker errors with serialization support
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum TrackerError {
    #[error("Invalid tracker state: {0}")]
    #[diagnostic(
        code(tracker::invalid_state),
        help("The console issued a request out of order, or an internal invariant was violated.")
    )]
    InvalidState(String),

    #[error("No created process to attach")]
    #[diagnostic(
        code(tracker::no_process),
        help("Pop a queued process before attaching a host process to it.")
    )]
    NoProcess,

    #[error("Process {0} not found")]
    #[diagnostic(
        code(tracker::unknown_process),
        help("The record was released once nothing held it any more.")
    )]
    UnknownProcess(ProcessId),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    #[diagnostic(
        code(tracker::invalid_transition),
        help("Process states only advance: Pending -> Started -> Attached -> Exited.")
    )]
    InvalidTransition { from: ProcessState, to: ProcessState },

    #[error("Kernel request failed: {0}")]
    #[diagnostic(code(tracker::kernel))]
    Kernel(String),

    #[error("Filesystem error: {0}")]
    #[diagnostic(code(tracker::vfs))]
    Vfs(#[from] VfsError),

    #[error("Tracker service is not running")]
    #[diagnostic(
        code(tracker::service_stopped),
        help("The tracker task was shut down; requests can no longer be served.")
    )]
    ServiceStopped,
}

impl TrackerError {
    /// Wire-level result code reported to IPC clients
    pub fn result_code(&self) -> ResultCode {
        let description = match self {
            TrackerError::InvalidState(_) => ERR_APPLET_TRACKER_INVALID_STATE,
            TrackerError::NoProcess => ERR_APPLET_TRACKER_NO_PROCESS,
            TrackerError::UnknownProcess(_) => ERR_UNKNOWN_PROCESS,
            TrackerError::InvalidTransition { .. } => ERR_INVALID_TRANSITION,
            TrackerError::Kernel(_) => ERR_KERNEL,
            TrackerError::Vfs(_) => ERR_FILESYSTEM,
            TrackerError::ServiceStopped => ERR_SERVICE_STOPPED,
        };
        ResultCode::new(MONITOR_RESULT_MODULE, description)
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        TrackerError::InvalidState(reason.into())
    }
}

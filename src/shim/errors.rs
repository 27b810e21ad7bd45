/*!
 * Shim Errors
 * Failures reported back to the running process over IPC
 */

use crate::core::errors::TrackerError;
use crate::core::limits::*;
use crate::core::types::ResultCode;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[must_use = "shim requests can fail and must be answered"]
pub type ShimResult<T> = Result<T, ShimError>;

#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum ShimError {
    #[error("Process has no kernel handle")]
    #[diagnostic(code(shim::no_handle))]
    NoHandle,

    #[error("Buffer too small: need {needed} entries, got {provided}")]
    #[diagnostic(
        code(shim::buffer_too_small),
        help("Query GetLoaderConfigEntryCount first and size the buffer to match.")
    )]
    BufferTooSmall { needed: usize, provided: usize },

    #[error("Index {0} out of range")]
    #[diagnostic(code(shim::out_of_range))]
    OutOfRange(u32),

    #[error("String is not NUL-terminated UTF-8")]
    #[diagnostic(code(shim::invalid_string))]
    InvalidString,

    #[error("Path or argument string too long")]
    #[diagnostic(code(shim::too_long))]
    PathTooLong,

    #[error("Process is not running")]
    #[diagnostic(
        code(shim::not_running),
        help("A shim only serves the attached process the tracker is monitoring.")
    )]
    NotRunning,

    #[error(transparent)]
    #[diagnostic(transparent)]
    Tracker(#[from] TrackerError),
}

impl ShimError {
    pub fn result_code(&self) -> ResultCode {
        let description = match self {
            ShimError::NoHandle => ERR_SHIM_NO_HANDLE,
            ShimError::BufferTooSmall { .. } => ERR_SHIM_BUFFER_TOO_SMALL,
            ShimError::OutOfRange(_) => ERR_SHIM_OUT_OF_RANGE,
            ShimError::InvalidString => ERR_SHIM_INVALID_STRING,
            ShimError::PathTooLong => ERR_SHIM_TOO_LONG,
            ShimError::NotRunning => ERR_SHIM_NOT_RUNNING,
            ShimError::Tracker(e) => return e.result_code(),
        };
        ResultCode::new(MONITOR_RESULT_MODULE, description)
    }
}

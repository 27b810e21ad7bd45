/*!
 * Process Types
 * Common types for process lifecycle tracking
 */

use crate::core::types::ProcessId;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a monitored process
///
/// Ordered: a process only ever moves to a later variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    /// Synthesized internally; never went through a launch request
    Pending,
    /// Launch requested externally, waiting for the console
    Started,
    /// Bound to a live kernel process
    Attached,
    /// Gone, either observed exiting or abandoned before attach
    Exited,
}

impl ProcessState {
    /// Whether moving from `self` to `to` advances the lifecycle
    #[inline]
    pub fn can_transition_to(self, to: ProcessState) -> bool {
        to > self
    }

    #[inline]
    pub fn is_exited(self) -> bool {
        self == ProcessState::Exited
    }
}

/// How a process record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchOrigin {
    /// Requested from outside the monitor
    Requested,
    /// Fallback shell synthesized when nothing else was queued
    Fallback,
    /// Chained from an exiting process's next-load request
    NextLoad,
}

/// State-change notification for a process record
///
/// Pushed onto the tracker's event queue and delivered to the monitor only if
/// the monitor is still bound to `process` when the event is drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub process: ProcessId,
    pub state: ProcessState,
}

/// Next binary requested by a running process, consumed once it exits
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NextLoad {
    pub path: String,
    pub argv: String,
}

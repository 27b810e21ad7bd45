/*!
 * Process Monitor
 * Binding to the single process whose state changes the tracker reacts to
 */

use super::types::StateChange;
use crate::core::types::ProcessId;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessMonitor {
    process: Option<ProcessId>,
}

impl ProcessMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn process(&self) -> Option<ProcessId> {
        self.process
    }

    #[inline]
    pub fn is_bound_to(&self, id: ProcessId) -> bool {
        self.process == Some(id)
    }

    /// Whether a notification is for the current binding
    ///
    /// Events queued for an earlier binding are filtered out here, so a
    /// rebind can never be followed by a callback for the old process.
    #[inline]
    pub fn accepts(&self, change: &StateChange) -> bool {
        self.is_bound_to(change.process)
    }

    /// Replace the binding, returning the previous one
    pub(crate) fn reattach(&mut self, process: Option<ProcessId>) -> Option<ProcessId> {
        std::mem::replace(&mut self.process, process)
    }
}

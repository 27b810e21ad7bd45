/*!
 * Monitored Process
 * Kernel handle plus lifecycle state for one process
 */

use super::handle::KernelProcess;
use super::types::ProcessState;
use crate::core::errors::{TrackerError, TrackerResult};
use crate::core::types::{Address, Pid, ResultCode};
use log::debug;
use std::fmt;

pub struct MonitoredProcess {
    handle: Option<Box<dyn KernelProcess>>,
    state: ProcessState,
    pid: Option<Pid>,
    result: ResultCode,
    target_entry: Address,
}

impl MonitoredProcess {
    pub fn new(initial: ProcessState) -> Self {
        Self {
            handle: None,
            state: initial,
            pid: None,
            result: ResultCode::SUCCESS,
            target_entry: 0,
        }
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Kernel PID, cached at attach time
    #[inline]
    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    #[inline]
    pub fn result(&self) -> ResultCode {
        self.result
    }

    pub fn set_result(&mut self, result: ResultCode) {
        self.result = result;
    }

    #[inline]
    pub fn target_entry(&self) -> Address {
        self.target_entry
    }

    pub fn set_target_entry(&mut self, entry: Address) {
        self.target_entry = entry;
    }

    pub fn handle(&self) -> Option<&dyn KernelProcess> {
        self.handle.as_deref()
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// Advance the lifecycle state
    ///
    /// Returns `Ok(false)` when already in `to`; moving backwards is an error.
    pub(crate) fn transition(&mut self, to: ProcessState) -> TrackerResult<bool> {
        if self.state == to {
            return Ok(false);
        }
        if !self.state.can_transition_to(to) {
            return Err(TrackerError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!("Process {:?}: {:?} -> {:?}", self.pid, self.state, to);
        self.state = to;
        Ok(true)
    }

    /// Bind a live kernel process and advance to `Attached`
    pub(crate) fn attach(&mut self, handle: Box<dyn KernelProcess>) -> TrackerResult<()> {
        if self.handle.is_some() {
            return Err(TrackerError::invalid_state("process already has a kernel handle"));
        }
        if !self.state.can_transition_to(ProcessState::Attached) {
            return Err(TrackerError::InvalidTransition {
                from: self.state,
                to: ProcessState::Attached,
            });
        }
        self.pid = Some(handle.pid());
        self.handle = Some(handle);
        self.transition(ProcessState::Attached)?;
        Ok(())
    }

    /// Ask the kernel to end the process, if one is attached
    ///
    /// Does not move the record to `Exited`; that is observed separately.
    pub fn terminate(&self) -> TrackerResult<()> {
        match (&self.handle, self.state) {
            (Some(handle), state) if !state.is_exited() => {
                debug!("Terminating kernel process {}", handle.pid());
                handle.terminate()
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for MonitoredProcess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoredProcess")
            .field("state", &self.state)
            .field("pid", &self.pid)
            .field("result", &self.result)
            .field("target_entry", &format_args!("0x{:x}", self.target_entry))
            .field("attached", &self.handle.is_some())
            .finish()
    }
}

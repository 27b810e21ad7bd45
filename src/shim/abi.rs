/*!
 * Homebrew ABI Shim
 *
 * Per-process service a launched homebrew binary talks to: it fetches its
 * own process handle and loader config, reads the entry point it was loaded
 * at, reports an exit code and can ask for another binary to be launched
 * once it exits.
 *
 * A shim is opened for the process the tracker is currently monitoring and
 * holds that record until `close`.
 */

use super::errors::{ShimError, ShimResult};
use super::loader_config::{AppletType, LoaderConfigEntry};
use crate::core::errors::TrackerError;
use crate::core::limits::MAX_ARGV_LEN;
use crate::core::types::{Address, Handle, ProcessId, ResultCode};
use crate::process::{AppletProcess, ProcessState};
use crate::tracker::AppletTracker;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct HbAbiShim {
    process: ProcessId,
    entries: Vec<LoaderConfigEntry>,
    handles: Vec<Handle>,
}

impl HbAbiShim {
    /// Open a shim for the attached process the tracker is monitoring
    pub fn open(tracker: &mut AppletTracker, id: ProcessId) -> ShimResult<Self> {
        if tracker.monitored_process() != Some(id) {
            warn!(process = %id, "shim requested for a process that isn't monitored");
            return Err(ShimError::NotRunning);
        }

        let process = tracker.process(id).ok_or(ShimError::NotRunning)?;
        if process.state() != ProcessState::Attached {
            return Err(ShimError::NotRunning);
        }
        let handle = process.handle().ok_or(ShimError::NoHandle)?.handle();

        let handles = vec![handle];
        let entries = vec![
            LoaderConfigEntry::process_handle(0),
            LoaderConfigEntry::applet_type(AppletType::LibraryApplet),
            LoaderConfigEntry::last_load_result(process.result()),
            LoaderConfigEntry::end_of_list(),
        ];

        tracker.hold(id)?;
        info!(process = %id, handle, "opened ABI shim");
        Ok(Self {
            process: id,
            entries,
            handles,
        })
    }

    pub fn process_id(&self) -> ProcessId {
        self.process
    }

    fn process<'a>(&self, tracker: &'a AppletTracker) -> ShimResult<&'a AppletProcess> {
        Ok(tracker.processes().lookup(self.process)?)
    }

    fn process_mut<'a>(&self, tracker: &'a mut AppletTracker) -> ShimResult<&'a mut AppletProcess> {
        tracker
            .process_mut(self.process)
            .ok_or(ShimError::Tracker(TrackerError::UnknownProcess(self.process)))
    }

    pub fn get_process_handle(&self, tracker: &AppletTracker) -> ShimResult<Handle> {
        let process = self.process(tracker)?;
        if process.state().is_exited() {
            return Err(ShimError::NotRunning);
        }
        process
            .handle()
            .map(|handle| handle.handle())
            .ok_or(ShimError::NoHandle)
    }

    pub fn get_loader_config_entry_count(&self) -> u32 {
        self.entries.len() as u32
    }

    /// Copy the entries into `out`, returning how many were written
    pub fn get_loader_config_entries(&self, out: &mut [LoaderConfigEntry]) -> ShimResult<usize> {
        let needed = self.entries.len();
        if out.len() < needed {
            return Err(ShimError::BufferTooSmall {
                needed,
                provided: out.len(),
            });
        }
        out[..needed].copy_from_slice(&self.entries);
        Ok(needed)
    }

    /// Handle referenced by a `ProcessHandle` entry
    pub fn get_loader_config_handle(&self, index: u32) -> ShimResult<Handle> {
        self.handles
            .get(index as usize)
            .copied()
            .ok_or(ShimError::OutOfRange(index))
    }

    /// Ask for another binary once this process exits
    ///
    /// Both buffers hold NUL-terminated strings. An empty path cancels an
    /// earlier request.
    pub fn set_next_load_path(
        &self,
        tracker: &mut AppletTracker,
        path: &[u8],
        argv: &[u8],
    ) -> ShimResult<()> {
        let path = c_string(path)?;
        let argv = c_string(argv)?;
        if path.len() > tracker.config().max_path_len || argv.len() > MAX_ARGV_LEN {
            return Err(ShimError::PathTooLong);
        }

        debug!(process = %self.process, path, argv, "next load requested");
        self.process_mut(tracker)?.set_next_load(path, argv);
        Ok(())
    }

    pub fn get_target_entry_point(&self, tracker: &AppletTracker) -> ShimResult<Address> {
        Ok(self.process(tracker)?.target_entry())
    }

    pub fn set_exit_code(&self, tracker: &mut AppletTracker, code: u32) -> ShimResult<()> {
        debug!(process = %self.process, code, "exit code reported");
        self.process_mut(tracker)?
            .set_result(ResultCode::from_raw(code));
        Ok(())
    }

    /// Release the shim's hold on the process
    pub fn close(self, tracker: &mut AppletTracker) {
        debug!(process = %self.process, "closing ABI shim");
        tracker.release_hold(self.process);
    }
}

impl AppletTracker {
    pub fn open_shim(&mut self, id: ProcessId) -> ShimResult<HbAbiShim> {
        HbAbiShim::open(self, id)
    }
}

/// Contents of a NUL-terminated buffer
fn c_string(buffer: &[u8]) -> ShimResult<&str> {
    let end = buffer
        .iter()
        .position(|&b| b == 0)
        .ok_or(ShimError::InvalidString)?;
    std::str::from_utf8(&buffer[..end]).map_err(|_| ShimError::InvalidString)
}

/*!
 * Applet Process
 *
 * A monitored process that is launched through the console's applet model.
 * Carries what the loader needs once the console creates the process (code
 * sources and argv), plus the next-load request the running program may leave
 * behind for when it exits.
 */

use super::handle::KernelProcess;
use super::monitored::MonitoredProcess;
use super::types::{LaunchOrigin, NextLoad, ProcessState};
use crate::core::errors::TrackerResult;
use crate::core::types::{Address, Pid, ResultCode};
use crate::vfs::OpenFile;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Executable image appended to a process before launch
#[derive(Debug, Clone)]
pub enum CodeSource {
    /// Opened when the loader reads it
    Path(PathBuf),
    /// Already open
    File(Arc<dyn OpenFile>),
}

impl CodeSource {
    pub fn path(&self) -> &Path {
        match self {
            CodeSource::Path(path) => path,
            CodeSource::File(file) => file.path(),
        }
    }
}

#[derive(Debug)]
pub struct AppletProcess {
    base: MonitoredProcess,
    origin: LaunchOrigin,
    code: Vec<CodeSource>,
    argv: String,
    next_load: Option<NextLoad>,
    prepared: bool,
    cancelled: bool,
}

impl AppletProcess {
    /// Process waiting for an external launch request
    pub fn new() -> Self {
        Self::with_origin(LaunchOrigin::Requested)
    }

    /// Fallback shell around a lazily opened image
    pub fn fallback_shell(image: impl Into<PathBuf>, argv: impl Into<String>) -> Self {
        Self::with_origin(LaunchOrigin::Fallback)
            .with_code(CodeSource::Path(image.into()))
            .with_argv(argv)
    }

    /// Process chained from another program's next-load request
    pub fn next_load(file: Arc<dyn OpenFile>, argv: impl Into<String>) -> Self {
        Self::with_origin(LaunchOrigin::NextLoad)
            .with_code(CodeSource::File(file))
            .with_argv(argv)
    }

    fn with_origin(origin: LaunchOrigin) -> Self {
        Self {
            base: MonitoredProcess::new(ProcessState::Pending),
            origin,
            code: Vec::new(),
            argv: String::new(),
            next_load: None,
            prepared: false,
            cancelled: false,
        }
    }

    #[must_use]
    pub fn with_code(mut self, source: CodeSource) -> Self {
        self.append_code(source);
        self
    }

    #[must_use]
    pub fn with_argv(mut self, argv: impl Into<String>) -> Self {
        self.argv = argv.into();
        self
    }

    pub fn append_code(&mut self, source: CodeSource) {
        self.code.push(source);
    }

    pub fn code(&self) -> &[CodeSource] {
        &self.code
    }

    pub fn argv(&self) -> &str {
        &self.argv
    }

    pub fn origin(&self) -> LaunchOrigin {
        self.origin
    }

    pub fn monitored(&self) -> &MonitoredProcess {
        &self.base
    }

    #[inline]
    pub fn state(&self) -> ProcessState {
        self.base.state()
    }

    #[inline]
    pub fn pid(&self) -> Option<Pid> {
        self.base.pid()
    }

    #[inline]
    pub fn result(&self) -> ResultCode {
        self.base.result()
    }

    pub fn set_result(&mut self, result: ResultCode) {
        self.base.set_result(result);
    }

    #[inline]
    pub fn target_entry(&self) -> Address {
        self.base.target_entry()
    }

    pub fn set_target_entry(&mut self, entry: Address) {
        self.base.set_target_entry(entry);
    }

    pub fn handle(&self) -> Option<&dyn KernelProcess> {
        self.base.handle()
    }

    pub fn next_load_request(&self) -> Option<&NextLoad> {
        self.next_load.as_ref()
    }

    /// Record the binary to queue once this process exits
    ///
    /// An empty path withdraws any earlier request.
    pub fn set_next_load(&mut self, path: impl Into<String>, argv: impl Into<String>) {
        let path = path.into();
        if path.is_empty() {
            self.next_load = None;
        } else {
            self.next_load = Some(NextLoad {
                path,
                argv: argv.into(),
            });
        }
    }

    pub(crate) fn take_next_load(&mut self) -> Option<NextLoad> {
        self.next_load.take()
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Get ready to be handed to the console
    ///
    /// Fails for good once the process has been cancelled.
    pub fn prepare_for_launch(&mut self) -> bool {
        if self.cancelled || self.state().is_exited() {
            return false;
        }
        self.prepared = true;
        true
    }

    /// Make the process go away by whatever means fit its state
    ///
    /// Before attach this cancels the launch; once attached it asks the kernel
    /// to terminate.
    pub fn kill(&mut self) -> TrackerResult<()> {
        match self.state() {
            ProcessState::Pending | ProcessState::Started => {
                debug!("Cancelling {:?} process before attach", self.origin);
                self.cancelled = true;
                Ok(())
            }
            ProcessState::Attached => self.base.terminate(),
            ProcessState::Exited => Ok(()),
        }
    }

    pub fn terminate(&self) -> TrackerResult<()> {
        self.base.terminate()
    }

    /// Bind the live process the console created for this record
    ///
    /// A process cancelled after being handed out is terminated right away.
    pub(crate) fn attach(&mut self, handle: Box<dyn KernelProcess>) -> TrackerResult<()> {
        self.base.attach(handle)?;
        if self.cancelled {
            info!("Cancelled process {:?} was attached; terminating", self.pid());
            if let Err(e) = self.base.terminate() {
                warn!("Failed to terminate cancelled process {:?}: {}", self.pid(), e);
            }
        }
        Ok(())
    }

    pub(crate) fn transition(&mut self, to: ProcessState) -> TrackerResult<bool> {
        self.base.transition(to)
    }
}

impl Default for AppletProcess {
    fn default() -> Self {
        Self::new()
    }
}

/*!
 * Applet Tracker
 *
 * Decides when the console is told a new process is ready to launch.
 *
 * # Lifecycle
 *
 * ```text
 * queue_launch ──► queued ──pop_queued_process──► created ──attach_host_process──► monitor
 *                                  │ (nothing queued)                                 │
 *                                  └──► fallback shell                      exit ─────┘
 *                                                                   (hbmenu cleanup, next load)
 * ```
 *
 * At most one process sits in `created` at a time, and a new launch is only
 * signaled once the monitored process has exited.
 *
 * # State changes
 *
 * Process state changes are queued as `StateChange` events and drained after
 * the mutation that produced them, so a callback never runs in the middle of
 * another operation. The monitor drops events for processes it is no longer
 * bound to.
 */

use super::event::ProcessQueuedEvent;
use crate::core::config::MonitorConfig;
use crate::core::errors::{TrackerError, TrackerResult};
use crate::core::types::{Pid, ProcessId};
use crate::monitoring::OperationSpan;
use crate::process::{
    AppletProcess, KernelProcess, ProcessMonitor, ProcessState, ProcessTable, StateChange,
};
use crate::vfs::{translate_sdmc_path, FileSystem, LocalFS};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct AppletTracker {
    config: MonitorConfig,
    filesystem: Arc<dyn FileSystem>,
    processes: ProcessTable,
    has_control_process: bool,
    queued: VecDeque<ProcessId>,
    created: VecDeque<ProcessId>,
    hbmenu: Option<ProcessId>,
    monitor: ProcessMonitor,
    process_queued_event: ProcessQueuedEvent,
    pending: VecDeque<StateChange>,
    dispatching: bool,
}

/// Builder for AppletTracker
pub struct AppletTrackerBuilder {
    config: Option<MonitorConfig>,
    filesystem: Option<Arc<dyn FileSystem>>,
    event: Option<ProcessQueuedEvent>,
}

impl AppletTrackerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            filesystem: None,
            event: None,
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Source of executable images; defaults to a `LocalFS` at `config.fs_root`
    pub fn with_filesystem(mut self, filesystem: Arc<dyn FileSystem>) -> Self {
        self.filesystem = Some(filesystem);
        self
    }

    /// Share an existing event instead of creating a fresh one
    pub fn with_event(mut self, event: ProcessQueuedEvent) -> Self {
        self.event = Some(event);
        self
    }

    pub fn build(self) -> AppletTracker {
        let config = self.config.unwrap_or_default();
        let filesystem = self
            .filesystem
            .unwrap_or_else(|| Arc::new(LocalFS::new(config.fs_root.clone())));

        info!(
            filesystem = filesystem.name(),
            hbmenu = %config.hbmenu_path.display(),
            "building AppletTracker"
        );

        AppletTracker {
            config,
            filesystem,
            processes: ProcessTable::new(),
            has_control_process: false,
            queued: VecDeque::new(),
            created: VecDeque::new(),
            hbmenu: None,
            monitor: ProcessMonitor::new(),
            process_queued_event: self.event.unwrap_or_default(),
            pending: VecDeque::new(),
            dispatching: false,
        }
    }
}

impl Default for AppletTrackerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppletTracker {
    pub fn builder() -> AppletTrackerBuilder {
        AppletTrackerBuilder::new()
    }

    pub fn new(config: MonitorConfig, filesystem: Arc<dyn FileSystem>) -> Self {
        Self::builder()
            .with_config(config)
            .with_filesystem(filesystem)
            .build()
    }

    fn span(&self, operation: &'static str) -> OperationSpan {
        OperationSpan::new(operation, self.config.slow_operation_threshold)
    }

    // =========================================================================
    // Console handshake
    // =========================================================================

    pub fn has_control_process(&self) -> bool {
        self.has_control_process
    }

    pub fn attach_control_process(&mut self) -> TrackerResult<()> {
        let span = self.span("attach_control_process");
        let _entered = span.enter();

        if self.has_control_process {
            warn!("control process attached twice");
            return Err(TrackerError::invalid_state("control process already attached"));
        }
        // lets the fallback shell launch even with nothing queued
        self.process_queued_event.signal();
        self.has_control_process = true;
        info!("control process attached");
        Ok(())
    }

    /// Drop the control process and abandon everything it would have launched
    ///
    /// Does not signal readiness.
    pub fn release_control_process(&mut self) -> TrackerResult<()> {
        let span = self.span("release_control_process");
        let _entered = span.enter();

        if !self.has_control_process {
            warn!("control process released while not attached");
            return Err(TrackerError::invalid_state("no control process attached"));
        }

        info!(
            created = self.created.len(),
            "lost control applet; invalidating created processes"
        );
        let abandoned: Vec<ProcessId> = self.created.iter().copied().collect();
        for id in abandoned {
            if let Err(e) = self.set_state(id, ProcessState::Exited) {
                warn!(process = %id, error = %e, "failed to invalidate created process");
            }
        }

        if let Some(id) = self.hbmenu {
            if let Some(Err(e)) = self.processes.get(id).map(|hbmenu| hbmenu.terminate()) {
                warn!(process = %id, error = %e, "failed to terminate hbmenu");
            }
            if let Err(e) = self.set_state(id, ProcessState::Exited) {
                warn!(process = %id, error = %e, "failed to mark hbmenu exited");
            }
        }

        for id in self.created.drain(..) {
            self.processes.release(id);
        }
        self.clear_hbmenu();
        self.has_control_process = false;
        Ok(())
    }

    /// True when nothing is waiting to be attached and the monitored process,
    /// if any, has exited
    pub fn ready_to_launch(&self) -> bool {
        self.created.is_empty()
            && match self.monitor.process() {
                None => true,
                Some(id) => self
                    .processes
                    .get(id)
                    .map_or(true, |process| process.state().is_exited()),
            }
    }

    /// Hand the next process to the console
    ///
    /// Cancelled entries are skipped. With nothing queued the fallback shell
    /// is synthesized instead.
    pub fn pop_queued_process(&mut self) -> TrackerResult<ProcessId> {
        let span = self.span("pop_queued_process");
        let _entered = span.enter();

        if !self.created.is_empty() {
            return Err(TrackerError::invalid_state(
                "a created process has not been attached yet",
            ));
        }

        while let Some(id) = self.queued.pop_front() {
            self.created.push_back(id);
            if self.processes.lookup_mut(id)?.prepare_for_launch() {
                info!(process = %id, "handing queued process to console");
                return Ok(id);
            }

            debug!(process = %id, "skipping cancelled process");
            self.created.pop_back();
            self.set_state(id, ProcessState::Exited)?;
            self.processes.release(id);
        }

        if let Some(id) = self.hbmenu {
            return Err(TrackerError::InvalidState(format!(
                "fallback shell {} is still running",
                id
            )));
        }

        info!("launching hbmenu");
        let hbmenu = self.create_hbmenu();
        let id = self.processes.insert(hbmenu);
        self.processes.retain(id)?;
        self.hbmenu = Some(id);
        self.created.push_back(id);

        if !self.processes.lookup_mut(id)?.prepare_for_launch() {
            return Err(TrackerError::invalid_state(
                "fallback shell could not be prepared for launch",
            ));
        }
        Ok(id)
    }

    /// Bind the live process the console just created to the head of `created`
    pub fn attach_host_process(&mut self, handle: Box<dyn KernelProcess>) -> TrackerResult<ProcessId> {
        let span = self.span("attach_host_process");
        let _entered = span.enter();

        let pid = handle.pid();
        info!(pid, "attaching new host process");
        let Some(&id) = self.created.front() else {
            warn!(pid, "no processes created");
            return Err(TrackerError::NoProcess);
        };

        self.processes.lookup_mut(id)?.attach(handle)?;
        self.created.pop_front();
        self.notify(id, ProcessState::Attached);

        self.rebind_monitor(id)?;
        // the monitor now holds what `created` held
        self.processes.release(id);
        info!(process = %id, pid, "attached");

        if self.ready_to_launch() {
            self.process_queued_event.signal();
        }
        Ok(id)
    }

    // =========================================================================
    // Queueing
    // =========================================================================

    /// Queue a process, preempting a running fallback shell
    pub fn queue_launch(&mut self, process: AppletProcess) -> ProcessId {
        if let Some(id) = self.hbmenu {
            if let Some(hbmenu) = self.processes.get_mut(id) {
                // exit out of hbmenu before launching
                if let Err(e) = hbmenu.kill() {
                    warn!(process = %id, error = %e, "failed to kill hbmenu");
                }
            }
        }

        let id = self.processes.insert(process);
        self.queued.push_back(id);
        debug!(process = %id, queued = self.queued.len(), "queued launch");

        if self.ready_to_launch() {
            self.process_queued_event.signal();
        }
        id
    }

    /// Queue a process an external client asked to launch
    pub fn request_launch(&mut self, mut process: AppletProcess) -> TrackerResult<ProcessId> {
        let span = self.span("request_launch");
        let _entered = span.enter();

        process.transition(ProcessState::Started)?;
        Ok(self.queue_launch(process))
    }

    /// Fallback shell record; starts out `Pending` since nobody requested it
    pub fn create_hbmenu(&self) -> AppletProcess {
        AppletProcess::fallback_shell(
            self.config.hbmenu_path.clone(),
            self.config.hbmenu_argv.clone(),
        )
    }

    /// Queue the binary at a homebrew `sdmc:/` path
    ///
    /// Best effort: a path that can't be opened is logged and nothing is queued.
    pub fn hbl_load(&mut self, path: &str, argv: &str) -> Option<ProcessId> {
        let local = match translate_sdmc_path(path, self.config.max_path_len) {
            Ok(local) => local,
            Err(e) => {
                warn!(path, error = %e, "rejected next load path");
                return None;
            }
        };

        let file = match self.filesystem.open(&local) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %local.display(), error = %e, "failed to open next load target");
                return None;
            }
        };

        info!(path = %local.display(), "prepared next load process; queueing");
        Some(self.queue_launch(AppletProcess::next_load(file, argv)))
    }

    // =========================================================================
    // State changes
    // =========================================================================

    /// Report a lifecycle change observed for a process (typically its exit)
    ///
    /// A process that exits before the console attached it is dropped from
    /// `queued` or `created`.
    pub fn change_state(&mut self, id: ProcessId, state: ProcessState) -> TrackerResult<()> {
        let span = self.span("change_state");
        let _entered = span.enter();
        self.set_state(id, state)?;
        if state.is_exited() {
            self.forget_unlaunched(id);
        }
        Ok(())
    }

    fn forget_unlaunched(&mut self, id: ProcessId) {
        if let Some(index) = self.queued.iter().position(|&queued| queued == id) {
            self.queued.remove(index);
            self.processes.release(id);
            debug!(process = %id, "dropped exited process from queue");
        }

        if let Some(index) = self.created.iter().position(|&created| created == id) {
            self.created.remove(index);
            self.processes.release(id);
            debug!(process = %id, "dropped exited process before attach");
            if self.ready_to_launch() {
                self.process_queued_event.signal();
            }
        }
    }

    fn set_state(&mut self, id: ProcessId, state: ProcessState) -> TrackerResult<()> {
        if self.processes.lookup_mut(id)?.transition(state)? {
            self.notify(id, state);
        }
        Ok(())
    }

    fn notify(&mut self, process: ProcessId, state: ProcessState) {
        self.pending.push_back(StateChange { process, state });
        self.dispatch_pending();
    }

    fn dispatch_pending(&mut self) {
        // changes made from inside a callback wait for the outer loop
        if self.dispatching {
            return;
        }
        self.dispatching = true;
        while let Some(change) = self.pending.pop_front() {
            if self.monitor.accepts(&change) {
                self.state_changed(change);
            } else if change.state.is_exited() && self.hbmenu == Some(change.process) {
                debug!(process = %change.process, "unmonitored hbmenu exited");
                self.clear_hbmenu();
            }
        }
        self.dispatching = false;
    }

    /// Monitor callback for the bound process
    fn state_changed(&mut self, change: StateChange) {
        debug!(process = %change.process, state = ?change.state, "monitored process changed state");

        // checked before the unbind below
        if self.ready_to_launch() {
            self.process_queued_event.signal();
        }
        if !change.state.is_exited() {
            return;
        }

        if self.hbmenu == Some(change.process) {
            info!("hbmenu exited");
            self.clear_hbmenu();
        }

        let next = self
            .processes
            .get_mut(change.process)
            .and_then(|process| process.take_next_load());
        if let Some(next) = next {
            info!(path = %next.path, argv = %next.argv, "application requested next load");
            self.hbl_load(&next.path, &next.argv);
        }

        // exited applets can hold on to a lot of memory; let go promptly
        self.unbind_monitor();
    }

    fn rebind_monitor(&mut self, id: ProcessId) -> TrackerResult<()> {
        self.processes.retain(id)?;
        if let Some(old) = self.monitor.reattach(Some(id)) {
            self.processes.release(old);
        }
        Ok(())
    }

    fn unbind_monitor(&mut self) {
        if let Some(old) = self.monitor.reattach(None) {
            self.processes.release(old);
        }
    }

    fn clear_hbmenu(&mut self) {
        if let Some(id) = self.hbmenu.take() {
            self.processes.release(id);
        }
    }

    // =========================================================================
    // Holds and accessors
    // =========================================================================

    /// Keep a process record alive outside the tracker's own structures
    pub fn hold(&mut self, id: ProcessId) -> TrackerResult<()> {
        self.processes.retain(id)
    }

    pub fn release_hold(&mut self, id: ProcessId) {
        self.processes.release(id);
    }

    pub fn process(&self, id: ProcessId) -> Option<&AppletProcess> {
        self.processes.get(id)
    }

    pub fn process_mut(&mut self, id: ProcessId) -> Option<&mut AppletProcess> {
        self.processes.get_mut(id)
    }

    /// Record bound to a kernel PID, if any
    pub fn find_by_pid(&self, pid: Pid) -> Option<ProcessId> {
        self.processes
            .iter()
            .find(|(_, process)| process.pid() == Some(pid))
            .map(|(id, _)| id)
    }

    pub fn processes(&self) -> &ProcessTable {
        &self.processes
    }

    pub fn queued(&self) -> impl ExactSizeIterator<Item = ProcessId> + '_ {
        self.queued.iter().copied()
    }

    pub fn created(&self) -> impl ExactSizeIterator<Item = ProcessId> + '_ {
        self.created.iter().copied()
    }

    pub fn hbmenu(&self) -> Option<ProcessId> {
        self.hbmenu
    }

    pub fn monitored_process(&self) -> Option<ProcessId> {
        self.monitor.process()
    }

    /// Shared handle to the readiness event
    pub fn process_queued_event(&self) -> ProcessQueuedEvent {
        self.process_queued_event.clone()
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }
}

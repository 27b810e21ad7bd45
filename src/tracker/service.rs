/*!
 * Tracker Service
 *
 * Runs the tracker on a single tokio task and feeds it requests over a
 * channel, so concurrent IPC sessions never touch it at the same time.
 * Every request carries a oneshot responder.
 */

use super::applet_tracker::AppletTracker;
use super::debug::TrackerSnapshot;
use super::event::ProcessQueuedEvent;
use crate::core::errors::{TrackerError, TrackerResult};
use crate::core::types::{Address, Handle, ProcessId};
use crate::process::{AppletProcess, KernelProcess, ProcessState};
use crate::shim::{HbAbiShim, LoaderConfigEntry, ShimError, ShimResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

type Job = Box<dyn FnOnce(&mut AppletTracker) + Send>;

/// Control messages for the tracker task
pub enum TrackerCommand {
    /// Run a closure against the tracker
    Call(Job),
    /// Stop the task and hand the tracker back
    Shutdown,
}

impl std::fmt::Debug for TrackerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackerCommand::Call(_) => f.write_str("Call"),
            TrackerCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Owner of the tracker task
pub struct TrackerService {
    handle: TrackerHandle,
    task: Option<tokio::task::JoinHandle<AppletTracker>>,
}

impl TrackerService {
    /// Move the tracker onto its own task; must be called within a tokio runtime
    pub fn spawn(tracker: AppletTracker) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let event = tracker.process_queued_event();

        let task = tokio::spawn(run_tracker_loop(tracker, command_rx));
        info!("tracker service spawned");

        Self {
            handle: TrackerHandle { command_tx, event },
            task: Some(task),
        }
    }

    pub fn handle(&self) -> TrackerHandle {
        self.handle.clone()
    }

    /// Stop the task once queued requests are served, returning the tracker
    pub async fn shutdown(mut self) -> Option<AppletTracker> {
        let _ = self.handle.command_tx.send(TrackerCommand::Shutdown);

        let task = self.task.take()?;
        match task.await {
            Ok(tracker) => {
                info!("tracker service shutdown complete");
                Some(tracker)
            }
            Err(e) => {
                warn!(error = %e, "tracker service shutdown error");
                None
            }
        }
    }
}

impl Drop for TrackerService {
    fn drop(&mut self) {
        if self.task.is_some() {
            let _ = self.handle.command_tx.send(TrackerCommand::Shutdown);
        }
    }
}

async fn run_tracker_loop(
    mut tracker: AppletTracker,
    mut command_rx: mpsc::UnboundedReceiver<TrackerCommand>,
) -> AppletTracker {
    while let Some(command) = command_rx.recv().await {
        match command {
            TrackerCommand::Call(job) => job(&mut tracker),
            TrackerCommand::Shutdown => {
                info!("tracker service shutting down");
                break;
            }
        }
    }
    tracker
}

/// Cloneable client of the tracker task
#[derive(Clone)]
pub struct TrackerHandle {
    command_tx: mpsc::UnboundedSender<TrackerCommand>,
    event: ProcessQueuedEvent,
}

impl TrackerHandle {
    /// Run `f` on the tracker task and wait for its result
    pub async fn call<F, R>(&self, f: F) -> TrackerResult<R>
    where
        F: FnOnce(&mut AppletTracker) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |tracker| {
            let _ = tx.send(f(tracker));
        });
        self.command_tx
            .send(TrackerCommand::Call(job))
            .map_err(|_| TrackerError::ServiceStopped)?;
        rx.await.map_err(|_| TrackerError::ServiceStopped)
    }

    async fn call_flat<F, T>(&self, f: F) -> TrackerResult<T>
    where
        F: FnOnce(&mut AppletTracker) -> TrackerResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.call(f).await?
    }

    /// Readiness event shared with the tracker; waiting needs no round trip
    pub fn process_queued_event(&self) -> &ProcessQueuedEvent {
        &self.event
    }

    pub fn is_running(&self) -> bool {
        !self.command_tx.is_closed()
    }

    /// Ask the task to stop after the requests already queued
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(TrackerCommand::Shutdown);
    }

    pub async fn has_control_process(&self) -> TrackerResult<bool> {
        self.call(|tracker| tracker.has_control_process()).await
    }

    pub async fn attach_control_process(&self) -> TrackerResult<()> {
        self.call_flat(|tracker| tracker.attach_control_process()).await
    }

    pub async fn release_control_process(&self) -> TrackerResult<()> {
        self.call_flat(|tracker| tracker.release_control_process()).await
    }

    pub async fn ready_to_launch(&self) -> TrackerResult<bool> {
        self.call(|tracker| tracker.ready_to_launch()).await
    }

    pub async fn pop_queued_process(&self) -> TrackerResult<ProcessId> {
        self.call_flat(|tracker| tracker.pop_queued_process()).await
    }

    pub async fn attach_host_process(
        &self,
        handle: Box<dyn KernelProcess>,
    ) -> TrackerResult<ProcessId> {
        self.call_flat(move |tracker| tracker.attach_host_process(handle))
            .await
    }

    pub async fn queue_launch(&self, process: AppletProcess) -> TrackerResult<ProcessId> {
        self.call(move |tracker| tracker.queue_launch(process)).await
    }

    pub async fn request_launch(&self, process: AppletProcess) -> TrackerResult<ProcessId> {
        self.call_flat(move |tracker| tracker.request_launch(process))
            .await
    }

    pub async fn hbl_load(&self, path: String, argv: String) -> TrackerResult<Option<ProcessId>> {
        self.call(move |tracker| tracker.hbl_load(&path, &argv)).await
    }

    pub async fn change_state(&self, id: ProcessId, state: ProcessState) -> TrackerResult<()> {
        self.call_flat(move |tracker| tracker.change_state(id, state))
            .await
    }

    pub async fn kill(&self, id: ProcessId) -> TrackerResult<()> {
        self.call_flat(move |tracker| {
            tracker
                .process_mut(id)
                .ok_or(TrackerError::UnknownProcess(id))?
                .kill()
        })
        .await
    }

    pub async fn debug_info(&self) -> TrackerResult<TrackerSnapshot> {
        self.call(|tracker| tracker.debug_info()).await
    }

    pub async fn open_shim(&self, id: ProcessId) -> ShimResult<RemoteShim> {
        let shim = self.call(move |tracker| tracker.open_shim(id)).await??;
        Ok(RemoteShim {
            shim: Arc::new(shim),
            tracker: self.clone(),
            closed: false,
        })
    }
}

/// ABI shim whose requests run on the tracker task
///
/// Dropping it without `close` still gives its hold back to the tracker.
pub struct RemoteShim {
    shim: Arc<HbAbiShim>,
    tracker: TrackerHandle,
    closed: bool,
}

impl RemoteShim {
    pub fn process_id(&self) -> ProcessId {
        self.shim.process_id()
    }

    async fn call<F, R>(&self, f: F) -> ShimResult<R>
    where
        F: FnOnce(&HbAbiShim, &mut AppletTracker) -> ShimResult<R> + Send + 'static,
        R: Send + 'static,
    {
        let shim = Arc::clone(&self.shim);
        self.tracker.call(move |tracker| f(&shim, tracker)).await?
    }

    pub async fn get_process_handle(&self) -> ShimResult<Handle> {
        self.call(|shim, tracker| shim.get_process_handle(tracker))
            .await
    }

    pub fn get_loader_config_entry_count(&self) -> u32 {
        self.shim.get_loader_config_entry_count()
    }

    pub fn get_loader_config_entries(&self, out: &mut [LoaderConfigEntry]) -> ShimResult<usize> {
        self.shim.get_loader_config_entries(out)
    }

    pub fn get_loader_config_handle(&self, index: u32) -> ShimResult<Handle> {
        self.shim.get_loader_config_handle(index)
    }

    pub async fn set_next_load_path(&self, path: Vec<u8>, argv: Vec<u8>) -> ShimResult<()> {
        self.call(move |shim, tracker| shim.set_next_load_path(tracker, &path, &argv))
            .await
    }

    pub async fn get_target_entry_point(&self) -> ShimResult<Address> {
        self.call(|shim, tracker| shim.get_target_entry_point(tracker))
            .await
    }

    pub async fn set_exit_code(&self, code: u32) -> ShimResult<()> {
        self.call(move |shim, tracker| shim.set_exit_code(tracker, code))
            .await
    }

    pub async fn close(mut self) -> ShimResult<()> {
        self.closed = true;
        let process = self.shim.process_id();
        self.tracker
            .call(move |tracker| {
                debug!(process = %process, "closing ABI shim");
                tracker.release_hold(process);
            })
            .await
            .map_err(ShimError::from)
    }
}

impl Drop for RemoteShim {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let process = self.shim.process_id();
        debug!(process = %process, "ABI shim dropped without close");
        let job: Job = Box::new(move |tracker| tracker.release_hold(process));
        if self.tracker.command_tx.send(TrackerCommand::Call(job)).is_err() {
            warn!(process = %process, "tracker stopped; shim hold not released");
        }
    }
}

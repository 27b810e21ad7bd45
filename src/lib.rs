/*!
 * Applet Monitor Library
 *
 * Launch sequencing for homebrew processes hosted inside console applets:
 * queueing, the fallback shell, exit monitoring with chained loads, and the
 * ABI shim a running process talks to.
 */

pub mod core;
pub mod monitoring;
pub mod process;
pub mod shim;
pub mod tracker;
pub mod vfs;

// Re-exports
pub use crate::core::{
    MonitorConfig, Pid, ProcessId, ResultCode, TrackerError, TrackerResult,
};
pub use monitoring::{init_tracing, OperationSpan};
pub use process::{AppletProcess, KernelProcess, ProcessState};
pub use shim::{HbAbiShim, ShimError, ShimResult};
pub use tracker::{
    AppletTracker, ProcessQueuedEvent, TrackerHandle, TrackerService, TrackerSnapshot,
};
pub use vfs::{FileSystem, LocalFS, MemFS, VfsError};

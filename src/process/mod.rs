/*!
 * Process Module
 * Process records, their lifecycle, and the monitor that observes them
 */

pub mod applet;
pub mod handle;
pub mod monitor;
pub mod monitored;
pub mod table;
pub mod types;


// Re-export for convenience
pub use applet::{AppletProcess, CodeSource};
pub use handle::KernelProcess;
pub use monitor::ProcessMonitor;
pub use monitored::MonitoredProcess;
pub use table::ProcessTable;
pub use types::{LaunchOrigin, NextLoad, ProcessState, StateChange};

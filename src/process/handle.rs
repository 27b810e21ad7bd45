/*!
 * Kernel Process Handle
 * Boundary to the kernel's process primitives
 */

use crate::core::errors::TrackerResult;
use crate::core::types::{Handle, Pid};

/// Live kernel process bound to a process record
///
/// Owned exclusively by the record it is attached to; closing happens when
/// the record is released.
pub trait KernelProcess: Send + Sync {
    /// Kernel process ID
    fn pid(&self) -> Pid;

    /// Handle value the running process can be given a copy of
    fn handle(&self) -> Handle;

    /// Ask the kernel to end the process
    ///
    /// Exit is reported later through the normal state-change path.
    fn terminate(&self) -> TrackerResult<()>;
}

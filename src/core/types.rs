/*!
 * Core Types
 * Common types used across the monitor
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kernel process ID
pub type Pid = u64;

/// Kernel handle value as seen by the running process
pub type Handle = u32;

/// Address in the target process
pub type Address = u64;

/// Stable identifier of a process record in the tracker's arena
///
/// Monotonic and never reused, so a stale id can't alias a newer record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(u64);

impl ProcessId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Horizon-style result code: 9-bit module, 13-bit description
///
/// Zero means success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(u32);

impl ResultCode {
    pub const SUCCESS: ResultCode = ResultCode(0);

    pub const fn new(module: u32, description: u32) -> Self {
        Self((module & 0x1FF) | ((description & 0x1FFF) << 9))
    }

    pub const fn from_raw(code: u32) -> Self {
        Self(code)
    }

    pub const fn code(self) -> u32 {
        self.0
    }

    pub const fn module(self) -> u32 {
        self.0 & 0x1FF
    }

    pub const fn description(self) -> u32 {
        (self.0 >> 9) & 0x1FFF
    }

    pub const fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

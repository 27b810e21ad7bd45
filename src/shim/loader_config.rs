/*!
 * Loader Config
 *
 * Entries of the homebrew loader ABI handed to a launched process. Each
 * entry is a key, flags and two 64-bit values; keys use the ABI numbering.
 */

use crate::core::types::ResultCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum LoaderConfigKey {
    EndOfList = 0,
    AppletType = 7,
    ProcessHandle = 10,
    LastLoadResult = 11,
}

/// Applet type reported to the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u64)]
pub enum AppletType {
    Application = 0,
    SystemApplet = 1,
    LibraryApplet = 2,
    OverlayApplet = 3,
    SystemApplication = 4,
}

/// Entry is required by the process
pub const FLAG_MANDATORY: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfigEntry {
    pub key: LoaderConfigKey,
    pub flags: u32,
    pub values: [u64; 2],
}

impl LoaderConfigEntry {
    pub const fn end_of_list() -> Self {
        Self {
            key: LoaderConfigKey::EndOfList,
            flags: 0,
            values: [0; 2],
        }
    }

    pub const fn applet_type(applet_type: AppletType) -> Self {
        Self {
            key: LoaderConfigKey::AppletType,
            flags: 0,
            values: [applet_type as u64, 0],
        }
    }

    /// `index` refers into the shim's handle table
    pub const fn process_handle(index: u32) -> Self {
        Self {
            key: LoaderConfigKey::ProcessHandle,
            flags: 0,
            values: [index as u64, 0],
        }
    }

    pub const fn last_load_result(result: ResultCode) -> Self {
        Self {
            key: LoaderConfigKey::LastLoadResult,
            flags: 0,
            values: [result.code() as u64, 0],
        }
    }

    pub fn is_mandatory(&self) -> bool {
        self.flags & FLAG_MANDATORY != 0
    }
}

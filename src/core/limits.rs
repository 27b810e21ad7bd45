/*!
 * Limits and Constants
 *
 * Centralized location for paths, limits and result-code numbering.
 * Organized by domain for maintainability and discoverability.
 */

use std::time::Duration;

// =============================================================================
// PATHS
// =============================================================================

/// Prefix used by homebrew applications for the SD card
pub const SDMC_PREFIX: &str = "sdmc:/";

/// Local mount point the SD card is visible under
pub const SD_MOUNT: &str = "/sd/";

/// Default local path of the fallback shell image
pub const DEFAULT_HBMENU_PATH: &str = "/sd/hbmenu.nro";

/// Argument string handed to the fallback shell
pub const DEFAULT_HBMENU_ARGV: &str = "sdmc:/hbmenu.nro";

/// Default host directory backing the device filesystem
pub const DEFAULT_FS_ROOT: &str = "/tmp/applet-monitor";

/// Longest translated next-load path accepted (0x300 bytes)
/// Matches the fixed-size path buffer of the homebrew loader ABI
pub const MAX_PATH_LEN: usize = 0x300;

/// Longest argv string a running process may hand over (0x1000 bytes)
pub const MAX_ARGV_LEN: usize = 0x1000;

// =============================================================================
// OBSERVABILITY
// =============================================================================

/// Tracker operations slower than this are logged as warnings
pub const SLOW_OPERATION_THRESHOLD: Duration = Duration::from_millis(10);

// =============================================================================
// RESULT CODES
// =============================================================================

/// Result module reported for monitor errors
pub const MONITOR_RESULT_MODULE: u32 = 0xEF;

/// Applet tracker protocol violation
pub const ERR_APPLET_TRACKER_INVALID_STATE: u32 = 21;

/// Host process attached with nothing created
pub const ERR_APPLET_TRACKER_NO_PROCESS: u32 = 22;

/// Process record not present in the arena
pub const ERR_UNKNOWN_PROCESS: u32 = 23;

/// Backward lifecycle transition
pub const ERR_INVALID_TRANSITION: u32 = 24;

/// Kernel rejected a request
pub const ERR_KERNEL: u32 = 25;

/// Filesystem failure
pub const ERR_FILESYSTEM: u32 = 26;

/// Tracker actor no longer accepting requests
pub const ERR_SERVICE_STOPPED: u32 = 27;

/// ABI shim: process has no kernel handle
pub const ERR_SHIM_NO_HANDLE: u32 = 40;

/// ABI shim: output buffer too small
pub const ERR_SHIM_BUFFER_TOO_SMALL: u32 = 41;

/// ABI shim: index out of range
pub const ERR_SHIM_OUT_OF_RANGE: u32 = 42;

/// ABI shim: string not NUL-terminated UTF-8
pub const ERR_SHIM_INVALID_STRING: u32 = 43;

/// ABI shim: path or argv exceeds its limit
pub const ERR_SHIM_TOO_LONG: u32 = 44;

/// ABI shim: bound process is no longer running
pub const ERR_SHIM_NOT_RUNNING: u32 = 45;

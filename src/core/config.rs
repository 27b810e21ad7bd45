/*!
 * Monitor Configuration
 *
 * Defaults come from `core::limits`; `from_env` overlays environment variables:
 * - APPLET_MONITOR_FS_ROOT: host directory backing the device filesystem
 * - APPLET_MONITOR_HBMENU_PATH: local path of the fallback shell image
 * - APPLET_MONITOR_HBMENU_ARGV: argument string for the fallback shell
 */

use super::limits::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_FS_ROOT: &str = "APPLET_MONITOR_FS_ROOT";
pub const ENV_HBMENU_PATH: &str = "APPLET_MONITOR_HBMENU_PATH";
pub const ENV_HBMENU_ARGV: &str = "APPLET_MONITOR_HBMENU_ARGV";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct MonitorConfig {
    pub fs_root: PathBuf,
    pub hbmenu_path: PathBuf,
    pub hbmenu_argv: String,
    pub max_path_len: usize,
    pub slow_operation_threshold: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            fs_root: PathBuf::from(DEFAULT_FS_ROOT),
            hbmenu_path: PathBuf::from(DEFAULT_HBMENU_PATH),
            hbmenu_argv: DEFAULT_HBMENU_ARGV.to_string(),
            max_path_len: MAX_PATH_LEN,
            slow_operation_threshold: SLOW_OPERATION_THRESHOLD,
        }
    }
}

impl MonitorConfig {
    /// Defaults with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(root) = std::env::var(ENV_FS_ROOT) {
            config.fs_root = PathBuf::from(root);
        }
        if let Ok(path) = std::env::var(ENV_HBMENU_PATH) {
            config.hbmenu_path = PathBuf::from(path);
        }
        if let Ok(argv) = std::env::var(ENV_HBMENU_ARGV) {
            config.hbmenu_argv = argv;
        }
        config
    }

    #[must_use]
    pub fn with_fs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.fs_root = root.into();
        self
    }

    #[must_use]
    pub fn with_hbmenu(mut self, path: impl Into<PathBuf>, argv: impl Into<String>) -> Self {
        self.hbmenu_path = path.into();
        self.hbmenu_argv = argv.into();
        self
    }

    #[must_use]
    pub fn with_max_path_len(mut self, len: usize) -> Self {
        self.max_path_len = len;
        self
    }

    #[must_use]
    pub fn with_slow_operation_threshold(mut self, threshold: Duration) -> Self {
        self.slow_operation_threshold = threshold;
        self
    }
}

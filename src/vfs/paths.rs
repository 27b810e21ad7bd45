/*!
 * Device Paths
 * Translation from the homebrew `sdmc:/` scheme to local paths
 */

use std::path::PathBuf;

use super::types::{VfsError, VfsResult};
use crate::core::limits::{SDMC_PREFIX, SD_MOUNT};

/// Translate a path requested by a running application into the local scheme
///
/// `sdmc:/switch/app.nro` becomes `/sd/switch/app.nro`; anything without the
/// prefix is treated as already relative to the SD card and lands under `/sd/`
/// too. Results longer than `max_len` bytes are rejected instead of truncated.
pub fn translate_sdmc_path(path: &str, max_len: usize) -> VfsResult<PathBuf> {
    let relative = path.strip_prefix(SDMC_PREFIX).unwrap_or(path);
    let translated = format!("{}{}", SD_MOUNT, relative);

    if translated.len() > max_len {
        return Err(VfsError::InvalidPath(format!(
            "{} bytes exceeds limit of {}",
            translated.len(),
            max_len
        )));
    }

    Ok(PathBuf::from(translated))
}

/*!
 * VFS Traits
 * Filesystem abstraction used to source executable images
 */

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::types::*;

/// Filesystem the monitor opens executable images from
///
/// Paths use the device's local scheme (`/sd/...`). Implementations decide
/// where that scheme lands on the host.
pub trait FileSystem: Send + Sync {
    /// Open a file for reading
    fn open(&self, path: &Path) -> VfsResult<Arc<dyn OpenFile>>;

    /// Check if a file exists
    fn exists(&self, path: &Path) -> bool;

    /// Get filesystem name/type
    fn name(&self) -> &str;
}

/// Open, read-only file handle
///
/// Shared between the process record that will load it and any diagnostics
/// that inspect it. Closed when the last reference drops.
pub trait OpenFile: Send + Sync + fmt::Debug {
    /// Local path the file was opened from
    fn path(&self) -> &Path;

    /// File size in bytes
    fn size(&self) -> VfsResult<u64>;

    /// Read up to `buf.len()` bytes starting at `offset`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> VfsResult<usize>;

    /// Read the whole file
    fn read_all(&self) -> VfsResult<Vec<u8>> {
        let size = self.size()?;
        let mut data = vec![0u8; size as usize];
        let mut filled = 0;
        while filled < data.len() {
            let n = self.read_at(filled as u64, &mut data[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        data.truncate(filled);
        Ok(data)
    }
}

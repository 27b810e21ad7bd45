/*!
 * In-Memory Filesystem Backend
 * Volatile filesystem for testing and embedding
 */

use ahash::RandomState;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::traits::{FileSystem, OpenFile};
use super::types::*;

/// In-memory filesystem implementation
///
/// Files are immutable byte blobs; handles stay valid after the path is removed.
#[derive(Debug, Clone, Default)]
pub struct MemFS {
    files: Arc<RwLock<HashMap<PathBuf, Arc<[u8]>, RandomState>>>,
}

impl MemFS {
    /// Create new in-memory filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a file
    pub fn insert(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) {
        let data: Vec<u8> = data.into();
        self.files
            .write()
            .insert(normalize(path.as_ref()), Arc::from(data));
    }

    /// Remove a file, returning whether it existed
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(&normalize(path.as_ref())).is_some()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

/// Always-absolute form so `sd/x` and `/sd/x` name the same file
fn normalize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new("/").join(path)
    }
}

impl FileSystem for MemFS {
    fn open(&self, path: &Path) -> VfsResult<Arc<dyn OpenFile>> {
        let key = normalize(path);
        let data = self
            .files
            .read()
            .get(&key)
            .cloned()
            .ok_or_else(|| VfsError::NotFound(format!("open {}", path.display())))?;

        Ok(Arc::new(MemFile { path: key, data }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(&normalize(path))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[derive(Debug)]
pub struct MemFile {
    path: PathBuf,
    data: Arc<[u8]>,
}

impl OpenFile for MemFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> VfsResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        let start = usize::try_from(offset)
            .unwrap_or(usize::MAX)
            .min(self.data.len());
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }
}

/*!
 * Local Filesystem Backend
 * Wraps std::fs for host filesystem access
 */

use log::debug;
use parking_lot::Mutex;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::traits::{FileSystem, OpenFile};
use super::types::*;

/// Local filesystem implementation using std::fs
///
/// The device's local paths are resolved below `root`, so `/sd/hbmenu.nro`
/// becomes `<root>/sd/hbmenu.nro`.
#[derive(Debug, Clone)]
pub struct LocalFS {
    root: PathBuf,
}

impl LocalFS {
    /// Create new local filesystem rooted at specified path
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve path relative to root with proper normalization
    /// Prevents directory traversal by manual component processing
    fn resolve(&self, path: &Path) -> PathBuf {
        let mut components = Vec::with_capacity(8);

        for component in path.components() {
            match component {
                Component::Normal(name) => components.push(name),
                // `..` never climbs above the root
                Component::ParentDir => {
                    components.pop();
                }
                Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            }
        }

        let mut result = self.root.clone();
        for component in components {
            result.push(component);
        }
        result
    }
}

impl FileSystem for LocalFS {
    fn open(&self, path: &Path) -> VfsResult<Arc<dyn OpenFile>> {
        let full_path = self.resolve(path);
        debug!("Opening {} as {}", path.display(), full_path.display());

        let file = fs::File::open(&full_path)
            .map_err(|e| VfsError::from_io(e, format!("open {}", path.display())))?;
        let metadata = file
            .metadata()
            .map_err(|e| VfsError::from_io(e, format!("stat {}", path.display())))?;
        if metadata.is_dir() {
            return Err(VfsError::IsADirectory(path.display().to_string()));
        }

        Ok(Arc::new(LocalFile {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).is_file()
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Open host file; reads are serialized because they share one cursor
#[derive(Debug)]
pub struct LocalFile {
    path: PathBuf,
    file: Mutex<fs::File>,
}

impl OpenFile for LocalFile {
    fn path(&self) -> &Path {
        &self.path
    }

    fn size(&self) -> VfsResult<u64> {
        let file = self.file.lock();
        file.metadata()
            .map(|md| md.len())
            .map_err(|e| VfsError::from_io(e, format!("stat {}", self.path.display())))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> VfsResult<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| VfsError::from_io(e, format!("seek {}", self.path.display())))?;
        file.read(buf)
            .map_err(|e| VfsError::from_io(e, format!("read {}", self.path.display())))
    }
}

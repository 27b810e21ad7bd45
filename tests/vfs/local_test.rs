/*!
 * LocalFS Tests
 * Host directory backend, including next-load images read from it
 */

use applet_monitor::vfs::{FileSystem, LocalFS, OpenFile, VfsError};
use applet_monitor::{AppletTracker, MonitorConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn device_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("sd/switch")).unwrap();
    fs::write(dir.path().join("sd/switch/app.nro"), b"NRO0 local image").unwrap();
    dir
}

#[test]
fn test_open_and_read() {
    let root = device_root();
    let fs = LocalFS::new(root.path());

    let file = fs.open(Path::new("/sd/switch/app.nro")).unwrap();
    assert_eq!(file.path(), Path::new("/sd/switch/app.nro"));
    assert_eq!(file.size().unwrap(), 16);

    let mut buf = [0u8; 5];
    assert_eq!(file.read_at(5, &mut buf).unwrap(), 5);
    assert_eq!(&buf, b"local");
    assert_eq!(file.read_all().unwrap(), b"NRO0 local image");
}

#[test]
fn test_missing_and_directory() {
    let root = device_root();
    let fs = LocalFS::new(root.path());

    assert!(matches!(
        fs.open(Path::new("/sd/switch/missing.nro")),
        Err(VfsError::NotFound(_))
    ));
    assert!(matches!(
        fs.open(Path::new("/sd/switch")),
        Err(VfsError::IsADirectory(_))
    ));
    assert!(fs.exists(Path::new("/sd/switch/app.nro")));
    assert!(!fs.exists(Path::new("/sd/switch")));
}

#[test]
fn test_traversal_stays_inside_root() {
    let outer = TempDir::new().unwrap();
    fs::write(outer.path().join("secret.nro"), b"outside").unwrap();
    let root = outer.path().join("device");
    fs::create_dir_all(&root).unwrap();

    let fs = LocalFS::new(&root);
    assert!(fs.open(Path::new("/sd/../../secret.nro")).is_err());
    assert!(!fs.exists(Path::new("../secret.nro")));
}

#[test]
fn test_tracker_loads_from_local_root() {
    let root = device_root();
    let config = MonitorConfig::default().with_fs_root(root.path());
    let mut tracker = AppletTracker::builder().with_config(config).build();

    let id = tracker.hbl_load("sdmc:/switch/app.nro", "app").unwrap();
    assert_eq!(tracker.process(id).unwrap().argv(), "app");
    assert!(tracker.hbl_load("sdmc:/switch/other.nro", "").is_none());

    let explicit = AppletTracker::new(
        MonitorConfig::default(),
        Arc::new(LocalFS::new(root.path())),
    );
    assert_eq!(explicit.queued().len(), 0);
}

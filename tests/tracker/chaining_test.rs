/*!
 * Chained Load Tests
 * Next-load requests queued when the monitored process exits
 */

use crate::support::{attach, running_hbmenu, tracker, CountingKernel};
use applet_monitor::process::LaunchOrigin;
use applet_monitor::vfs::OpenFile;
use applet_monitor::{AppletProcess, ProcessState};
use pretty_assertions::assert_eq;

#[test]
fn test_exit_with_next_load_queues_binary() {
    let (mut tracker, fs) = tracker();
    fs.insert("/sd/switch/app.nro", b"NRO0".to_vec());

    let app = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.pop_queued_process().unwrap();
    attach(&mut tracker, 0x60);
    tracker
        .process_mut(app)
        .unwrap()
        .set_next_load("sdmc:/switch/app.nro", "sdmc:/switch/app.nro --flag");

    let event = tracker.process_queued_event();
    event.clear();
    tracker.change_state(app, ProcessState::Exited).unwrap();

    assert!(event.is_signaled());
    assert!(tracker.monitored_process().is_none());
    let queued: Vec<_> = tracker.queued().collect();
    assert_eq!(queued.len(), 1);

    let next = tracker.process(queued[0]).unwrap();
    assert_eq!(next.origin(), LaunchOrigin::NextLoad);
    assert_eq!(next.state(), ProcessState::Pending);
    assert_eq!(next.argv(), "sdmc:/switch/app.nro --flag");
    assert_eq!(next.code()[0].path().to_str(), Some("/sd/switch/app.nro"));
}

#[test]
fn test_next_load_image_is_readable() {
    let (mut tracker, fs) = tracker();
    fs.insert("/sd/switch/app.nro", b"NRO0 payload".to_vec());

    let id = tracker.hbl_load("sdmc:/switch/app.nro", "").unwrap();
    let process = tracker.process(id).unwrap();
    match &process.code()[0] {
        applet_monitor::process::CodeSource::File(file) => {
            assert_eq!(file.read_all().unwrap(), b"NRO0 payload");
            assert_eq!(file.size().unwrap(), 12);
        }
        other => panic!("expected an open file, got {:?}", other),
    }
}

#[test]
fn test_missing_next_load_target_is_swallowed() {
    let (mut tracker, _) = tracker();
    let app = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.pop_queued_process().unwrap();
    attach(&mut tracker, 0x61);
    tracker
        .process_mut(app)
        .unwrap()
        .set_next_load("sdmc:/switch/missing.nro", "");

    tracker.change_state(app, ProcessState::Exited).unwrap();
    assert_eq!(tracker.queued().len(), 0);
    assert!(tracker.monitored_process().is_none());
    assert!(tracker.ready_to_launch());
}

#[test]
fn test_unprefixed_path_is_loaded_from_sd() {
    let (mut tracker, fs) = tracker();
    fs.insert("/sd/switch/tool.nro", b"NRO0".to_vec());
    assert!(tracker.hbl_load("switch/tool.nro", "").is_some());
    assert!(tracker.hbl_load("sdmc:/switch/tool.nro", "").is_some());
    assert_eq!(tracker.queued().len(), 2);
}

#[test]
fn test_overlong_path_is_rejected() {
    let (mut tracker, fs) = tracker();
    let long = format!("switch/{}.nro", "a".repeat(0x300));
    fs.insert(format!("/sd/{}", long), b"NRO0".to_vec());
    assert!(tracker.hbl_load(&long, "").is_none());
    assert_eq!(tracker.queued().len(), 0);
}

#[test]
fn test_withdrawn_request_loads_nothing() {
    let (mut tracker, fs) = tracker();
    fs.insert("/sd/switch/app.nro", b"NRO0".to_vec());
    let app = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.pop_queued_process().unwrap();
    attach(&mut tracker, 0x62);

    let process = tracker.process_mut(app).unwrap();
    process.set_next_load("sdmc:/switch/app.nro", "");
    process.set_next_load("", "");

    tracker.change_state(app, ProcessState::Exited).unwrap();
    assert_eq!(tracker.queued().len(), 0);
}

#[test]
fn test_hbmenu_chaining_launches_selection() {
    let (mut tracker, fs) = tracker();
    fs.insert("/sd/switch/game.nro", b"NRO0".to_vec());
    let (kernel, _) = CountingKernel::boxed(0x63);
    let hbmenu = running_hbmenu(&mut tracker, kernel);

    tracker
        .process_mut(hbmenu)
        .unwrap()
        .set_next_load("sdmc:/switch/game.nro", "sdmc:/switch/game.nro");
    tracker.change_state(hbmenu, ProcessState::Exited).unwrap();

    assert!(tracker.hbmenu().is_none());
    assert!(tracker.process(hbmenu).is_none());
    let next = tracker.pop_queued_process().unwrap();
    assert_eq!(
        tracker.process(next).unwrap().origin(),
        LaunchOrigin::NextLoad
    );
    assert!(tracker.hbmenu().is_none());
}

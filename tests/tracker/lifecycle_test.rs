/*!
 * Tracker Lifecycle Tests
 * Console handshake, fallback shell, cancellation and control release
 */

use crate::support::{attach, mock_kernel, running_hbmenu, tracker, CountingKernel, MockKernel};
use applet_monitor::process::LaunchOrigin;
use applet_monitor::{AppletProcess, ProcessState, TrackerError};
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;

#[test]
fn test_control_process_handshake() {
    let (mut tracker, _) = tracker();
    let event = tracker.process_queued_event();

    tracker.attach_control_process().unwrap();
    assert!(tracker.has_control_process());
    assert!(event.is_signaled());

    assert!(matches!(
        tracker.attach_control_process(),
        Err(TrackerError::InvalidState(_))
    ));

    tracker.release_control_process().unwrap();
    assert!(!tracker.has_control_process());
    assert!(matches!(
        tracker.release_control_process(),
        Err(TrackerError::InvalidState(_))
    ));
}

#[test]
fn test_attach_without_created_process() {
    let (mut tracker, _) = tracker();
    let (kernel, _) = CountingKernel::boxed(7);
    assert_eq!(
        tracker.attach_host_process(kernel).unwrap_err(),
        TrackerError::NoProcess
    );
    assert_eq!(TrackerError::NoProcess.result_code().description(), 22);
}

#[test]
fn test_fallback_on_empty_queue() {
    let (mut tracker, _) = tracker();
    tracker.attach_control_process().unwrap();

    let hbmenu = tracker.pop_queued_process().unwrap();
    let process = tracker.process(hbmenu).unwrap();
    assert_eq!(process.origin(), LaunchOrigin::Fallback);
    assert_eq!(process.state(), ProcessState::Pending);
    assert_eq!(process.argv(), "sdmc:/hbmenu.nro");
    assert_eq!(process.code()[0].path().to_str(), Some("/sd/hbmenu.nro"));
    assert!(process.is_prepared());

    assert_eq!(tracker.hbmenu(), Some(hbmenu));
    assert_eq!(tracker.created().collect::<Vec<_>>(), vec![hbmenu]);
    assert!(!tracker.ready_to_launch());
}

#[test]
fn test_queued_process_is_popped_in_order() {
    let (mut tracker, _) = tracker();
    let event = tracker.process_queued_event();
    tracker.attach_control_process().unwrap();
    event.clear();

    let first = tracker.request_launch(AppletProcess::new()).unwrap();
    let second = tracker.request_launch(AppletProcess::new()).unwrap();
    assert!(event.consume());

    assert_eq!(tracker.pop_queued_process().unwrap(), first);
    assert!(!tracker.ready_to_launch());
    assert!(matches!(
        tracker.pop_queued_process(),
        Err(TrackerError::InvalidState(_))
    ));

    assert_eq!(attach(&mut tracker, 0x51), first);
    assert_eq!(tracker.monitored_process(), Some(first));
    assert_eq!(tracker.process(first).unwrap().state(), ProcessState::Attached);
    assert!(!event.is_signaled());

    tracker.change_state(first, ProcessState::Exited).unwrap();
    assert!(event.consume());
    assert!(tracker.monitored_process().is_none());
    assert!(tracker.process(first).is_none());

    assert_eq!(tracker.pop_queued_process().unwrap(), second);
    assert!(tracker.hbmenu().is_none());
}

#[test]
fn test_cancelled_process_is_skipped() {
    let (mut tracker, _) = tracker();
    let a = tracker.request_launch(AppletProcess::new()).unwrap();
    let b = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.process_mut(a).unwrap().kill().unwrap();

    assert_eq!(tracker.pop_queued_process().unwrap(), b);
    assert!(tracker.process(a).is_none());
    assert_eq!(tracker.created().collect::<Vec<_>>(), vec![b]);
    assert_eq!(tracker.queued().len(), 0);
}

#[test]
fn test_all_cancelled_falls_back_to_hbmenu() {
    let (mut tracker, _) = tracker();
    let a = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.process_mut(a).unwrap().kill().unwrap();

    let popped = tracker.pop_queued_process().unwrap();
    assert_ne!(popped, a);
    assert_eq!(tracker.hbmenu(), Some(popped));
}

#[test]
fn test_signal_is_idempotent() {
    let (mut tracker, _) = tracker();
    let event = tracker.process_queued_event();
    tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.request_launch(AppletProcess::new()).unwrap();
    assert!(event.is_signaled());
    assert!(event.consume());
    assert!(!event.is_signaled());
}

#[test]
fn test_release_clears_single_created_and_hbmenu() {
    let (mut tracker, _) = tracker();
    let hbmenu = running_hbmenu(&mut tracker, mock_kernel(0x10, 3));
    let event = tracker.process_queued_event();

    // each queued launch preempts hbmenu (first two terminates)
    let app = tracker.request_launch(AppletProcess::new()).unwrap();
    assert_eq!(tracker.pop_queued_process().unwrap(), app);

    // `created` never grows past one entry; a second pop is refused until attach
    let waiting = tracker.request_launch(AppletProcess::new()).unwrap();
    assert!(matches!(
        tracker.pop_queued_process(),
        Err(TrackerError::InvalidState(_))
    ));
    assert_eq!(tracker.created().collect::<Vec<_>>(), vec![app]);
    event.clear();

    // third terminate
    tracker.release_control_process().unwrap();

    assert!(!tracker.has_control_process());
    assert_eq!(tracker.created().len(), 0);
    assert!(tracker.hbmenu().is_none());
    assert!(tracker.process(app).is_none());
    assert_eq!(tracker.process(hbmenu).map(|p| p.state()), None);
    assert!(tracker.monitored_process().is_none());
    assert_eq!(tracker.queued().collect::<Vec<_>>(), vec![waiting]);
    assert_eq!(tracker.processes().len(), 1);
    assert!(!event.is_signaled());
}

#[test]
fn test_release_completes_when_terminate_fails() {
    let (mut tracker, _) = tracker();
    let mut kernel = MockKernel::new();
    kernel.expect_pid().return_const(0x12u64);
    kernel.expect_handle().return_const(0x8012u32);
    kernel
        .expect_terminate()
        .times(1)
        .returning(|| Err(TrackerError::NoProcess));
    running_hbmenu(&mut tracker, Box::new(kernel));

    tracker.release_control_process().unwrap();
    assert!(!tracker.has_control_process());
    assert!(tracker.hbmenu().is_none());
    assert_eq!(tracker.created().len(), 0);
    assert!(tracker.processes().is_empty());
    tracker.attach_control_process().unwrap();
}

#[test]
fn test_release_terminates_attached_hbmenu() {
    let (mut tracker, _) = tracker();
    let (kernel, terminated) = CountingKernel::boxed(0x11);
    let hbmenu = running_hbmenu(&mut tracker, kernel);
    tracker.hold(hbmenu).unwrap();

    tracker.release_control_process().unwrap();
    assert_eq!(terminated.load(Ordering::SeqCst), 1);
    assert!(tracker.hbmenu().is_none());
    assert_eq!(
        tracker.process(hbmenu).map(|p| p.state()),
        Some(ProcessState::Exited)
    );
    tracker.release_hold(hbmenu);
    assert!(tracker.processes().is_empty());
}

#[test]
fn test_release_leaves_queue_alone() {
    let (mut tracker, _) = tracker();
    tracker.attach_control_process().unwrap();
    let queued = tracker.request_launch(AppletProcess::new()).unwrap();

    tracker.release_control_process().unwrap();
    assert_eq!(tracker.queued().collect::<Vec<_>>(), vec![queued]);
    assert_eq!(
        tracker.process(queued).unwrap().state(),
        ProcessState::Started
    );
}

#[test]
fn test_non_exit_change_keeps_monitor() {
    let (mut tracker, _) = tracker();
    let id = tracker.request_launch(AppletProcess::new()).unwrap();
    tracker.pop_queued_process().unwrap();
    attach(&mut tracker, 3);

    tracker.change_state(id, ProcessState::Attached).unwrap();
    assert_eq!(tracker.monitored_process(), Some(id));
    assert!(matches!(
        tracker.change_state(id, ProcessState::Started),
        Err(TrackerError::InvalidTransition { .. })
    ));
}

/*!
 * Tracker Service Tests
 * Full launch cycle driven through the async handle
 */

use crate::support::{mock_kernel, tracker, CountingKernel};
use applet_monitor::{
    AppletProcess, Pid, ProcessId, ProcessState, TrackerError, TrackerHandle, TrackerService,
};
use std::time::Duration;

#[tokio::test]
async fn test_console_cycle_through_handle() {
    let (tracker, fs) = tracker();
    fs.insert("/sd/switch/next.nro", b"NRO0".to_vec());
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();

    handle.attach_control_process().await.unwrap();
    handle.process_queued_event().wait_async().await;
    handle.process_queued_event().clear();

    let hbmenu = handle.pop_queued_process().await.unwrap();
    let (kernel, _) = CountingKernel::boxed(0x30);
    assert_eq!(handle.attach_host_process(kernel).await.unwrap(), hbmenu);

    let shim = handle.open_shim(hbmenu).await.unwrap();
    shim.set_next_load_path(b"sdmc:/switch/next.nro\0".to_vec(), b"\0".to_vec())
        .await
        .unwrap();
    shim.close().await.unwrap();

    handle
        .change_state(hbmenu, ProcessState::Exited)
        .await
        .unwrap();
    tokio::time::timeout(
        Duration::from_secs(1),
        handle.process_queued_event().wait_async(),
    )
    .await
    .unwrap();

    let snapshot = handle.debug_info().await.unwrap();
    assert!(snapshot.hbmenu.is_none());
    assert_eq!(snapshot.queued.len(), 1);

    let tracker = service.shutdown().await.unwrap();
    assert_eq!(tracker.queued().len(), 1);
}

#[tokio::test]
async fn test_concurrent_requests_are_serialized() {
    let (tracker, _) = tracker();
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            handle.request_launch(AppletProcess::new()).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snapshot = handle.debug_info().await.unwrap();
    assert_eq!(snapshot.queued.len(), 16);
    assert!(snapshot.event_signaled);

    let first = handle.pop_queued_process().await.unwrap();
    assert!(matches!(
        handle.pop_queued_process().await,
        Err(TrackerError::InvalidState(_))
    ));
    handle
        .attach_host_process(mock_kernel(0x31, 0))
        .await
        .unwrap();
    assert_eq!(handle.debug_info().await.unwrap().monitored.unwrap().id, first);

    service.shutdown().await;
}

#[tokio::test]
async fn test_kill_through_handle() {
    let (tracker, _) = tracker();
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();

    let id = handle.request_launch(AppletProcess::new()).await.unwrap();
    handle.kill(id).await.unwrap();
    let popped = handle.pop_queued_process().await.unwrap();
    assert_ne!(popped, id);

    service.shutdown().await;
    assert!(matches!(
        handle.kill(id).await,
        Err(TrackerError::ServiceStopped)
    ));
}

#[tokio::test]
async fn test_handle_shutdown_stops_task() {
    let (tracker, _) = tracker();
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();
    handle.shutdown();
    drop(service);

    tokio::time::timeout(Duration::from_secs(1), async {
        while handle.is_running() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    assert!(matches!(
        handle.ready_to_launch().await,
        Err(TrackerError::ServiceStopped)
    ));
}

async fn attached_app(handle: &TrackerHandle, pid: Pid) -> ProcessId {
    let id = handle.request_launch(AppletProcess::new()).await.unwrap();
    assert_eq!(handle.pop_queued_process().await.unwrap(), id);
    let (kernel, _) = CountingKernel::boxed(pid);
    assert_eq!(handle.attach_host_process(kernel).await.unwrap(), id);
    id
}

#[tokio::test]
async fn test_dropped_shim_releases_record() {
    let (tracker, _) = tracker();
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();
    let id = attached_app(&handle, 0x40).await;

    let shim = handle.open_shim(id).await.unwrap();
    shim.set_exit_code(0x2ef).await.unwrap();
    drop(shim);

    handle.change_state(id, ProcessState::Exited).await.unwrap();
    let tracker = service.shutdown().await.unwrap();
    assert!(tracker.process(id).is_none());
    assert!(tracker.processes().is_empty());
}

#[tokio::test]
async fn test_closed_shim_releases_once() {
    let (tracker, _) = tracker();
    let service = TrackerService::spawn(tracker);
    let handle = service.handle();
    let id = attached_app(&handle, 0x41).await;

    handle.call(move |tracker| tracker.hold(id)).await.unwrap().unwrap();
    let shim = handle.open_shim(id).await.unwrap();
    shim.close().await.unwrap();
    handle.change_state(id, ProcessState::Exited).await.unwrap();

    let mut tracker = service.shutdown().await.unwrap();
    assert_eq!(
        tracker.process(id).map(|p| p.state()),
        Some(ProcessState::Exited)
    );
    tracker.release_hold(id);
    assert!(tracker.processes().is_empty());
}

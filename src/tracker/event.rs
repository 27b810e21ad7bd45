/*!
 * Process Queued Event
 *
 * Level-triggered readiness signal the console waits on before popping the
 * next process. Signaling an already signaled event changes nothing; the
 * consumer clears it. Waiting has no timeout.
 */

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use tokio::sync::Notify;

struct EventInner {
    signaled: Mutex<bool>,
    condvar: Condvar,
    notify: Notify,
}

/// Cloneable handle to one shared event
#[derive(Clone)]
pub struct ProcessQueuedEvent {
    inner: Arc<EventInner>,
}

impl ProcessQueuedEvent {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(EventInner {
                signaled: Mutex::new(false),
                condvar: Condvar::new(),
                notify: Notify::new(),
            }),
        }
    }

    pub fn signal(&self) {
        let mut signaled = self.inner.signaled.lock();
        if !*signaled {
            *signaled = true;
            self.inner.condvar.notify_all();
            self.inner.notify.notify_waiters();
        }
    }

    pub fn clear(&self) {
        *self.inner.signaled.lock() = false;
    }

    pub fn is_signaled(&self) -> bool {
        *self.inner.signaled.lock()
    }

    /// Test-and-clear: true if the event was signaled
    pub fn consume(&self) -> bool {
        std::mem::replace(&mut *self.inner.signaled.lock(), false)
    }

    /// Block the calling thread until signaled; leaves the event signaled
    pub fn wait(&self) {
        let mut signaled = self.inner.signaled.lock();
        while !*signaled {
            self.inner.condvar.wait(&mut signaled);
        }
    }

    /// Await the event from async code; leaves the event signaled
    pub async fn wait_async(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // register before checking so a signal in between isn't lost
            notified.as_mut().enable();
            if self.is_signaled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for ProcessQueuedEvent {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProcessQueuedEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessQueuedEvent")
            .field("signaled", &self.is_signaled())
            .finish()
    }
}

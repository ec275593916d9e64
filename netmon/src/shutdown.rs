//! Cooperative shutdown controller.
//!
//! `main.rs` fires it from OS signals; the poll scheduler waits on it between
//! cycles so an in-flight cycle always completes before the loop exits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::sync::Notify;

/// Cooperative shutdown signal shared by the server and the poll scheduler.
#[derive(Clone, Debug, Default)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

impl ShutdownController {
    fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake all waiters.
    pub fn request_shutdown(&self) {
        self.inner.requested.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        // Register before checking the flag so a request in between is not missed.
        let notified = self.inner.notify.notified();
        if self.is_requested() {
            return;
        }
        notified.await;
    }
}

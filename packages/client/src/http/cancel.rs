//! Cancellation handles for in-flight requests
//!
//! Each revalidation owns one [`CancelHandle`]; a superseding request or a
//! cache eviction cancels it, which both signals the transport to abort the
//! underlying call and routes the revalidation's completion into the silent
//! "superseded" branch.

use std::sync::Arc;

use tokio::sync::watch;

/// One-shot cancellation flag shared between an in-flight request, its cache
/// entry and the transport.
///
/// Built on a `watch` channel so [`cancelled`](CancelHandle::cancelled) is
/// race-free: a flag raised between the check and the await is still
/// observed.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Create a handle in the not-cancelled state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Raise the cancellation flag, waking every waiter.
    ///
    /// Idempotent; later calls are no-ops.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// True once [`cancel`](CancelHandle::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the handle is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // wait_for checks the current value first, so a pre-raised flag
        // resolves immediately
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

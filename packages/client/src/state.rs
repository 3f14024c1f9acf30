//! Observable state cells backing the query and mutation handles
//!
//! A [`StateCell`] is the minimal settable, readable value the engines
//! publish into: synchronous read-after-write, plus a subscription stream for
//! any reactive layer that wants change notifications. No framework signal
//! type leaks into the core.

use std::sync::Arc;

use tokio::sync::watch;

/// A settable, readable cell of `T` with synchronous read-after-write
/// visibility.
///
/// Writes are immediately visible to [`get`](StateCell::get); subscribers see
/// every value change through a `watch` receiver.
#[derive(Debug, Clone)]
pub struct StateCell<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T: Clone> StateCell<T> {
    /// Create a cell holding `initial`.
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Read the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the current value, notifying subscribers.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Subscribe to value changes.
    ///
    /// The receiver starts at the current value; use
    /// [`watch::Receiver::changed`] to await updates.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

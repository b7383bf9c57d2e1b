//! Observer subscription and synchronous notification.

use std::fmt;
use std::panic::{
    AssertUnwindSafe,
    catch_unwind,
};
use std::sync::{
    Mutex,
    PoisonError,
};

/// A registered observer callback.
type Listener<T> = Box<dyn Fn(&T) + Send + Sync>;

/// A subscription list with synchronous, in-order delivery.
///
/// Observers run in subscription order on the thread that emits. A
/// panicking observer is isolated: the panic is caught and logged, and
/// delivery continues with the remaining observers.
///
/// Delivery holds the subscription lock, so an observer must not subscribe
/// to the signal it is being notified by.
pub struct Signal<T = ()> {
    /// Observers in subscription order.
    listeners: Mutex<Vec<Listener<T>>>,
}

impl<T> Signal<T> {
    /// Create a signal with no observers.
    #[must_use]
    pub const fn new() -> Self {
        Self { listeners: Mutex::new(Vec::new()) }
    }

    /// Register an observer. Observers cannot be unregistered; drop the
    /// owning entity instead.
    pub fn subscribe<F>(&self, listener: F)
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.push(Box::new(listener));
    }

    /// Notify every observer, in subscription order.
    pub(crate) fn emit(&self, event: &T) {
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for listener in listeners.iter() {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                tracing::warn!("observer panicked, continuing with remaining observers");
            }
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.lock().unwrap_or_else(PoisonError::into_inner).len();
        f.debug_struct("Signal").field("listeners", &count).finish()
    }
}

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use tracing::trace;
use uuid::Uuid;

/// Keep the callback registered after this invocation.
pub const CONTINUE: bool = false;

/// Remove the callback after this invocation.
pub const UNSUBSCRIBE: bool = true;

/// Stay subscribed while `condition` holds.
pub fn continue_if(condition: bool) -> bool {
    if condition { CONTINUE } else { UNSUBSCRIBE }
}

/// Handle to a registered callback, used to unsubscribe it later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(Uuid);

impl Subscription {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// A subscription that was never registered anywhere.
    pub(crate) fn detached() -> Self {
        Self::new()
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

pub(crate) type Callback<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Subscription table shared by both signal flavours.
///
/// The map is only locked around insert/remove/clone. Fan-out always works on
/// a snapshot, so callbacks may (un)subscribe on the same signal while running.
pub(crate) struct Subscribers<T> {
    callbacks: Mutex<HashMap<Subscription, Callback<T>>>,
}

impl<T> Subscribers<T> {
    pub(crate) fn new() -> Self {
        Self {
            callbacks: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Subscription, Callback<T>>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add(&self, callback: Callback<T>) -> Subscription {
        let subscription = Subscription::new();
        self.lock().insert(subscription, callback);
        trace!(%subscription, "subscriber added");
        subscription
    }

    pub(crate) fn remove(&self, subscription: Subscription) {
        if self.lock().remove(&subscription).is_some() {
            trace!(%subscription, "subscriber removed");
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn snapshot(&self) -> Vec<(Subscription, Callback<T>)> {
        self.lock()
            .iter()
            .map(|(subscription, callback)| (*subscription, Arc::clone(callback)))
            .collect()
    }
}

impl<T: Sync> Subscribers<T> {
    /// Runs every callback of the current snapshot on its own thread and returns
    /// once all of them have finished.
    ///
    /// Callbacks may block on each other. A panicking callback is not caught
    /// here; it propagates to the notifier.
    pub(crate) fn fan_out(&self, value: &T) {
        let snapshot = self.snapshot();
        if snapshot.is_empty() {
            return;
        }
        thread::scope(|scope| {
            for (subscription, callback) in &snapshot {
                scope.spawn(move || {
                    if callback(value) {
                        self.remove(*subscription);
                    }
                });
            }
        });
    }
}

use crate::signal::{Subscribers, Subscription};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

/// Signal that remembers its last value and replays it to new subscribers.
pub struct StatefulSignal<T> {
    subscribers: Subscribers<T>,
    current: RwLock<T>,
}

impl<T> StatefulSignal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            subscribers: Subscribers::new(),
            current: RwLock::new(initial),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, T> {
        self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invokes `handler` with the current value, then registers it for future
    /// notifications.
    ///
    /// The value lock is held across the replay and the registration, so no
    /// notification can slip in between. `handler` must not notify this same
    /// signal from the replay call. If the replay returns
    /// [`UNSUBSCRIBE`](crate::UNSUBSCRIBE) the handler is not registered.
    pub fn on<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let current = self.read();
        if handler(&current) {
            drop(current);
            return Subscription::detached();
        }
        let subscription = self.subscribers.add(Arc::new(handler));
        drop(current);
        subscription
    }

    /// Registers `handler` without replaying the current value.
    pub fn on_lazy<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        let _current = self.read();
        self.subscribers.add(Arc::new(handler))
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.remove(subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Clone> StatefulSignal<T> {
    pub fn current_value(&self) -> T {
        self.read().clone()
    }
}

impl<T: Clone + Sync> StatefulSignal<T> {
    /// Computes the next value from the previous one under the write lock, then
    /// delivers it to all subscribers once the lock is released.
    pub fn notify<F>(&self, transform: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = {
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            *current = transform(&*current);
            current.clone()
        };
        self.subscribers.fan_out(&next);
    }
}

impl<T: Default> Default for StatefulSignal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for StatefulSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulSignal")
            .field("current", &*self.read())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

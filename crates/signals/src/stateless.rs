use crate::signal::{Subscribers, Subscription};
use std::fmt;
use std::sync::Arc;

/// Fire-and-forget signal: values are delivered to current subscribers only.
pub struct StatelessSignal<T> {
    subscribers: Subscribers<T>,
}

impl<T> StatelessSignal<T> {
    pub fn new() -> Self {
        Self {
            subscribers: Subscribers::new(),
        }
    }

    /// Registers `handler` for future notifications.
    pub fn on<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.subscribers.add(Arc::new(handler))
    }

    /// Removes a subscription. Unknown or already removed subscriptions are ignored.
    pub fn unsubscribe(&self, subscription: Subscription) {
        self.subscribers.remove(subscription);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T: Sync> StatelessSignal<T> {
    /// Delivers `value` to every subscriber and waits until all of them returned.
    pub fn notify(&self, value: T) {
        self.subscribers.fan_out(&value);
    }
}

impl<T> Default for StatelessSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for StatelessSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatelessSignal")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

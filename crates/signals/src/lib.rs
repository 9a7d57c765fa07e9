//! Thread-safe publish/subscribe signals.
//!
//! Two flavours share the same subscription bookkeeping:
//! - [`StatelessSignal`] fans a value out to whoever is subscribed right now.
//! - [`StatefulSignal`] keeps the last value and replays it to every new subscriber.
//!
//! Subscriber callbacks return a `bool`: [`UNSUBSCRIBE`] removes the callback after
//! the current invocation, [`CONTINUE`] keeps it registered.

mod signal;
mod stateful;
mod stateless;

pub use signal::{CONTINUE, Subscription, UNSUBSCRIBE, continue_if};
pub use stateful::StatefulSignal;
pub use stateless::StatelessSignal;

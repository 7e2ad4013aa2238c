//! # Runtime event subscribers.
//!
//! ```text
//! Service / ActivityManager / Subscription
//!        └── publish(Event) ──► EventBus ──► listener ──► SubscriberSet::emit
//!                                                          ├──► [queue] ─► LogWriter
//!                                                          └──► [queue] ─► custom
//! ```
//!
//! Implement [`Subscribe`] and pass the subscribers to
//! [`ServiceBuilder::subscribers`](crate::ServiceBuilder::subscribers).

mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
mod embedded;

pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;

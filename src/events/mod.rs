//! Runtime events and listener tables.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] runtime event classification and metadata
//! - [`EventBus`] thin wrapper over `tokio::sync::broadcast` for runtime events
//! - [`EventChannel`] named-event listener table behind `Method` and `Subscription`
//!
//! ## Quick reference
//! - **Publishers**: `Service` (routing), `ActivityManager` (activities, idle timer),
//!   `Subscription` pumps, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the subscriber listener spawned by `ServiceBuilder::build`,
//!   plus any receiver obtained from `Service::events()`.

mod bus;
mod channel;
mod event;

pub use bus::EventBus;
pub use channel::{EventChannel, Listener};
pub use event::{Event, EventKind};

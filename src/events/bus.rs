//! # Broadcast hub for runtime events.
//!
//! [`EventBus`] is a thin wrapper around [`tokio::sync::broadcast`] shared by the
//! service, the activity manager and subscription pumps. It is unrelated to the
//! Luna bus the service is attached to: it only carries [`Event`]s for observability.
//!
//! ```text
//! Publishers:                          Consumers:
//!   Service         ──┐
//!   ActivityManager ──┼──► EventBus ──► subscriber listener ──► SubscriberSet
//!   Subscription    ──┘   (broadcast)  └─► EventBus::subscribe() (tests, embedders)
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; events sent with no receivers are dropped.
//! - Capacity is shared by all receivers; slow receivers observe `RecvError::Lagged(n)`.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for runtime events.
///
/// Cheap to clone (internally an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that observes events sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

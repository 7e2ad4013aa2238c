//! # Subscriber trait
//!
//! `Subscribe` is the extension point for observing runtime events (method
//! registration, dispatch, activity table changes, idle timer, exit). Each
//! subscriber is driven by its own worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they block neither the service nor other subscribers.
//! - A full queue drops events for that subscriber only (`SubscriberOverflow`).
//!
//! ## Example
//! ```rust
//! use lunavisor::{Event, EventKind, Subscribe};
//!
//! struct ExitAudit;
//!
//! #[async_trait::async_trait]
//! impl Subscribe for ExitAudit {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ExitRequested {
//!             // record ev.reason
//!         }
//!     }
//!     fn name(&self) -> &'static str { "exit-audit" }
//!     fn queue_capacity(&self) -> usize { 64 }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for runtime event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}

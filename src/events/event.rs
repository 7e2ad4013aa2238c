//! # Runtime events emitted by the service and the activity manager.
//!
//! The [`EventKind`] enum classifies event types across four groups:
//! - **Routing events**: method registration and inbound dispatch
//! - **Subscription events**: outbound persistent calls opening and closing
//! - **Activity events**: activity table changes and the idle timer
//! - **Subscriber events**: overflow/panic inside user subscribers
//!
//! The [`Event`] struct carries optional metadata such as method, category,
//! activity id, call token and a human-readable reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use lunavisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RequestDispatched)
//!     .with_category("/")
//!     .with_method("ping")
//!     .with_token(7);
//!
//! assert_eq!(ev.kind, EventKind::RequestDispatched);
//! assert_eq!(ev.method.as_deref(), Some("ping"));
//! assert_eq!(ev.token, Some(7));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Routing ===
    /// A method was registered on a bus.
    ///
    /// Sets `category`, `method`, `reason` (`public`, `private` or `unified`).
    MethodRegistered,

    /// An inbound request was delivered to a method's `request` listeners.
    ///
    /// Sets `category`, `method`, `token`.
    RequestDispatched,

    /// An inbound cancellation was delivered to a method's `cancel` listeners.
    ///
    /// Sets `category`, `method`, `token`.
    CancelDispatched,

    /// An inbound event named an unregistered route and was dropped.
    ///
    /// Sets `category`, `method`, `token`.
    DispatchMissed,

    /// A `quit` arriving on the public bus was refused.
    ///
    /// Sets `method`, `reason`.
    QuitRejected,

    // === Outbound subscriptions ===
    /// A persistent outbound call was opened.
    ///
    /// Sets `token`, `reason` (target uri).
    SubscriptionOpened,

    /// A persistent outbound call ended (cancelled locally or closed remotely).
    ///
    /// Sets `token`, `reason` (`cancelled` or `remote_closed`).
    SubscriptionClosed,

    // === Activities ===
    /// An activity entered the activity table.
    ///
    /// Sets `activity`, `reason` (variant label).
    ActivityAdded,

    /// An activity left the activity table.
    ///
    /// Sets `activity`.
    ActivityRemoved,

    /// The idle countdown was armed.
    ///
    /// Sets `timeout_ms`.
    IdleTimerStarted,

    /// The idle countdown was disarmed before firing.
    IdleTimerStopped,

    /// The idle countdown elapsed.
    ///
    /// Sets `timeout_ms`, `reason` (`exit` or `log_only`).
    IdleTimeout,

    /// The process is about to exit.
    ///
    /// Sets `reason` (exit reason label).
    ExitRequested,

    // === Subscribers ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets `method` (subscriber name), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets `method` (subscriber name), `reason`.
    SubscriberOverflow,
}

/// Runtime event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Method category (`/`, `/sub`, ...).
    pub category: Option<Arc<str>>,
    /// Method name (or subscriber name for subscriber events).
    pub method: Option<Arc<str>>,
    /// Rendered activity id.
    pub activity: Option<Arc<str>>,
    /// Per-call token.
    pub token: Option<u64>,
    /// Timer duration in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            category: None,
            method: None,
            activity: None,
            token: None,
            timeout_ms: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_category(mut self, category: impl Into<Arc<str>>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[inline]
    pub fn with_method(mut self, method: impl Into<Arc<str>>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[inline]
    pub fn with_activity(mut self, activity: impl Into<Arc<str>>) -> Self {
        self.activity = Some(activity.into());
        self
    }

    #[inline]
    pub fn with_token(mut self, token: u64) -> Self {
        self.token = Some(token);
        self
    }

    /// Attaches a timer duration (stored as milliseconds, saturating).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_method(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_method(subscriber)
            .with_reason(info)
    }

    /// True for events emitted by the subscriber machinery itself.
    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

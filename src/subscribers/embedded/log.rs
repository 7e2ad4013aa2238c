//! # LogWriter: runtime events as `tracing` records
//!
//! Renders each [`Event`] as one `tracing` record under the `lunavisor::events`
//! target. Meant for demos and debugging; install a `tracing` subscriber to see
//! the output.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO lunavisor::events: registered category="/" method="ping" handle="public"
//! INFO lunavisor::events: activity added activity="dummy_0" kind="dummy"
//! INFO lunavisor::events: idle timer started timeout_ms=5000
//! WARN lunavisor::events: idle timeout timeout_ms=5000 action="exit"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

const TARGET: &str = "lunavisor::events";

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let category = e.category.as_deref().unwrap_or("");
        let method = e.method.as_deref().unwrap_or("");
        let activity = e.activity.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::MethodRegistered => {
                info!(target: TARGET, category, method, handle = reason, "registered");
            }
            EventKind::RequestDispatched => {
                debug!(target: TARGET, category, method, token = e.token, "request");
            }
            EventKind::CancelDispatched => {
                debug!(target: TARGET, category, method, token = e.token, "cancel");
            }
            EventKind::DispatchMissed => {
                debug!(target: TARGET, category, method, token = e.token, "no such method");
            }
            EventKind::QuitRejected => {
                warn!(target: TARGET, reason, "public quit rejected");
            }
            EventKind::SubscriptionOpened => {
                debug!(target: TARGET, token = e.token, uri = reason, "subscription opened");
            }
            EventKind::SubscriptionClosed => {
                debug!(target: TARGET, token = e.token, reason, "subscription closed");
            }
            EventKind::ActivityAdded => {
                info!(target: TARGET, activity, kind = reason, "activity added");
            }
            EventKind::ActivityRemoved => {
                info!(target: TARGET, activity, "activity removed");
            }
            EventKind::IdleTimerStarted => {
                info!(target: TARGET, timeout_ms = e.timeout_ms, "idle timer started");
            }
            EventKind::IdleTimerStopped => {
                info!(target: TARGET, "idle timer stopped");
            }
            EventKind::IdleTimeout => {
                warn!(target: TARGET, timeout_ms = e.timeout_ms, action = reason, "idle timeout");
            }
            EventKind::ExitRequested => {
                warn!(target: TARGET, reason, "exit requested");
            }
            EventKind::SubscriberPanicked => {
                warn!(target: TARGET, subscriber = method, info = reason, "subscriber panicked");
            }
            EventKind::SubscriberOverflow => {
                warn!(target: TARGET, subscriber = method, reason, "subscriber overflow");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

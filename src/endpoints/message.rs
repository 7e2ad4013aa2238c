//! # Message: one inbound bus event.
//!
//! A [`Message`] wraps a [`RawMessage`] together with the handle it arrived on
//! and the wiring needed to answer it. It is what `request`/`cancel` listeners
//! of a [`Method`](crate::Method) and `response` listeners of a
//! [`Subscription`](crate::Subscription) receive.
//!
//! Cloning is cheap (one `Arc`).

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::warn;

use crate::activity::ActivityManager;
use crate::core::Service;
use crate::transport::{BusHandle, CallToken, FrameKind, RawMessage, Transport};

struct Inner {
    raw: RawMessage,
    handle: BusHandle,
    transport: Arc<dyn Transport>,
    service: Weak<Service>,
    activity_manager: Arc<ActivityManager>,
}

/// Inbound event handed to listeners.
#[derive(Clone)]
pub struct Message {
    inner: Arc<Inner>,
}

impl Message {
    pub(crate) fn new(raw: RawMessage, handle: BusHandle, service: &Arc<Service>) -> Self {
        Self {
            inner: Arc::new(Inner {
                raw,
                handle,
                transport: Arc::clone(service.transport()),
                service: Arc::downgrade(service),
                activity_manager: Arc::clone(service.activity_manager()),
            }),
        }
    }

    pub fn category(&self) -> &str {
        &self.inner.raw.category
    }

    /// Method name (the target uri for responses to outbound calls).
    pub fn method(&self) -> &str {
        &self.inner.raw.method
    }

    pub fn payload(&self) -> &Value {
        &self.inner.raw.payload
    }

    pub fn sender(&self) -> &str {
        &self.inner.raw.sender
    }

    pub fn token(&self) -> CallToken {
        self.inner.raw.token
    }

    pub fn unique_token(&self) -> &str {
        &self.inner.raw.unique_token
    }

    pub fn kind(&self) -> FrameKind {
        self.inner.raw.kind
    }

    /// Handle the event arrived on; replies go out on the same handle.
    pub fn handle(&self) -> BusHandle {
        self.inner.handle
    }

    /// The raw event as the transport delivered it.
    pub fn raw(&self) -> &RawMessage {
        &self.inner.raw
    }

    /// True when the caller asked for a subscription (`"subscribe": true`).
    pub fn is_subscription(&self) -> bool {
        self.inner.raw.payload.get("subscribe").and_then(Value::as_bool) == Some(true)
    }

    /// The owning service, if it is still alive.
    pub fn service(&self) -> Option<Arc<Service>> {
        self.inner.service.upgrade()
    }

    pub fn activity_manager(&self) -> &Arc<ActivityManager> {
        &self.inner.activity_manager
    }

    /// Sends a response frame to the caller.
    ///
    /// Returns false when the caller's session is gone.
    pub fn respond(&self, payload: Value) -> bool {
        let sent = self
            .inner
            .transport
            .send_response(self.inner.handle, self.inner.raw.token, &payload);
        if !sent {
            warn!(
                category = %self.inner.raw.category,
                method = %self.inner.raw.method,
                token = self.inner.raw.token,
                "response dropped; caller session is gone"
            );
        }
        sent
    }

    /// Ends a subscribing call from our side and stops tracking it.
    pub fn cancel(&self, payload: Value) {
        self.inner
            .transport
            .send_cancel(self.inner.handle, self.inner.raw.token, &payload);
        if let Some(service) = self.inner.service.upgrade() {
            service.forget_subscription(&self.inner.raw.unique_token);
        }
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("handle", &self.inner.handle)
            .field("raw", &self.inner.raw)
            .finish()
    }
}

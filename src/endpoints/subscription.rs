//! # Outbound persistent calls.
//!
//! A [`Subscription`] is returned by [`Service::subscribe`](crate::Service::subscribe).
//! Every response the remote end sends is emitted on its `response` event.
//!
//! ## Delivery
//! ```text
//! transport ──► OutboundCall.responses ──► pump task ──► response listeners
//!                                            │
//!                                            ├─ cancel()      ─► stop, cancel_call, "cancelled"
//!                                            └─ stream ended  ─► stop, "remote_closed"
//! ```
//!
//! ## Rules
//! - The pump starts with the first listener; responses that arrive earlier are buffered
//!   and a remote close goes unnoticed until then.
//! - After `cancel()` no listener runs again.
//! - Closing (either way) drops every listener and untracks the subscription.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::{select, sync::mpsc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Message;
use crate::core::Service;
use crate::events::{Event, EventBus, EventChannel, EventKind};
use crate::transport::{BusHandle, CallToken, OutboundCall, RawMessage, Transport};

/// Events a [`Subscription`] emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SubscriptionEvent {
    Response,
}

/// A persistent outbound call.
pub struct Subscription {
    uri: String,
    args: Value,
    handle: BusHandle,
    token: CallToken,
    channel: EventChannel<SubscriptionEvent, Message>,
    responses: Mutex<Option<mpsc::UnboundedReceiver<RawMessage>>>,
    stop: CancellationToken,
    done: AtomicBool,
    transport: Arc<dyn Transport>,
    service: Weak<Service>,
    events: EventBus,
}

impl Subscription {
    pub(crate) fn open(
        service: &Arc<Service>,
        handle: BusHandle,
        uri: &str,
        args: Value,
        call: OutboundCall,
    ) -> Arc<Self> {
        let sub = Arc::new(Self {
            uri: uri.to_string(),
            args,
            handle,
            token: call.token,
            channel: EventChannel::new(),
            responses: Mutex::new(Some(call.responses)),
            stop: CancellationToken::new(),
            done: AtomicBool::new(false),
            transport: Arc::clone(service.transport()),
            service: Arc::downgrade(service),
            events: service.event_bus().clone(),
        });
        sub.events.publish(
            Event::new(EventKind::SubscriptionOpened)
                .with_token(sub.token)
                .with_reason(sub.uri.as_str()),
        );
        debug!(uri = %sub.uri, token = sub.token, "subscription opened");
        sub
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Arguments the call was issued with.
    pub fn args(&self) -> &Value {
        &self.args
    }

    pub fn token(&self) -> CallToken {
        self.token
    }

    pub fn handle(&self) -> BusHandle {
        self.handle
    }

    /// Adds a `response` listener and starts delivery.
    pub fn on_response<F>(self: &Arc<Self>, listener: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        if self.is_closed() {
            return;
        }
        self.channel.on(SubscriptionEvent::Response, listener);
        self.start_pump();
    }

    /// Stops delivery and cancels the call on the transport. Idempotent.
    pub fn cancel(&self) {
        if !self.mark_done() {
            return;
        }
        self.stop.cancel();
        self.transport.cancel_call(self.handle, self.token);
        self.close("cancelled");
    }

    /// True once cancelled or closed by the remote end.
    pub fn is_closed(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    /// Resolves once the subscription is closed.
    pub async fn closed(&self) {
        self.stop.cancelled().await;
    }

    fn start_pump(self: &Arc<Self>) {
        let Some(mut rx) = self.responses.lock().take() else {
            return;
        };
        let me = Arc::downgrade(self);
        let stop = self.stop.clone();

        tokio::spawn(async move {
            loop {
                let raw = select! {
                    biased;
                    _ = stop.cancelled() => return,
                    raw = rx.recv() => raw,
                };
                let Some(sub) = me.upgrade() else { return };
                match raw {
                    Some(raw) => sub.deliver(raw),
                    None => {
                        if sub.mark_done() {
                            sub.close("remote_closed");
                            sub.stop.cancel();
                        }
                        return;
                    }
                }
            }
        });
    }

    fn deliver(&self, raw: RawMessage) {
        if self.is_closed() {
            return;
        }
        let Some(service) = self.service.upgrade() else {
            return;
        };
        let msg = Message::new(raw, self.handle, &service);
        self.channel.emit(SubscriptionEvent::Response, &msg);
    }

    /// Returns true for the caller that flips the subscription to done.
    fn mark_done(&self) -> bool {
        !self.done.swap(true, Ordering::AcqRel)
    }

    fn close(&self, reason: &'static str) {
        self.channel.clear();
        if let Some(service) = self.service.upgrade() {
            service.forget_outbound(self.token);
        }
        self.events.publish(
            Event::new(EventKind::SubscriptionClosed)
                .with_token(self.token)
                .with_reason(reason),
        );
        debug!(uri = %self.uri, token = self.token, reason, "subscription closed");
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("uri", &self.uri)
            .field("handle", &self.handle)
            .field("token", &self.token)
            .field("closed", &self.is_closed())
            .finish()
    }
}

//! # Bus transport contract.
//!
//! The runtime never talks to the bus directly. Everything goes through the
//! [`Transport`] trait: method registration, outbound calls, response and
//! cancel frames, handle release. Inbound events travel the other way, from the
//! transport into [`Service::dispatch`](crate::Service::dispatch).
//!
//! ```text
//!            register_method / send_call / send_response / send_cancel
//!  Service ─────────────────────────────────────────────────────────► Transport
//!     ▲                                                                   │
//!     └────────────── dispatch(handle, RawMessage) ◄──────────────────────┘
//!                     OutboundCall.responses (per outbound call)
//! ```
//!
//! Activity create/adopt/complete are ordinary outbound calls to the
//! activity-manager endpoint; the transport does not need to know about them.

mod memory;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::BusError;

pub use memory::{CallRecord, MemoryTransport, SentFrame};

/// Per-call token assigned by the transport.
pub type CallToken = u64;

/// Opaque bus handle.
///
/// Exactly one handle model is active per service: [`BusHandle::Unified`] under
/// the ACG security model, or the [`BusHandle::Private`] + [`BusHandle::Public`]
/// pair under the legacy dual-bus model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusHandle {
    Unified,
    Private,
    Public,
}

impl BusHandle {
    /// Stable label for logs/events.
    pub fn label(self) -> &'static str {
        match self {
            BusHandle::Unified => "unified",
            BusHandle::Private => "private",
            BusHandle::Public => "public",
        }
    }
}

/// Kind of an inbound frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameKind {
    /// A call addressed to one of our methods.
    Request,
    /// The caller cancelled a subscribing call it made earlier.
    Cancel,
    /// A response to a call we issued.
    Response,
}

/// One raw event as delivered by the transport.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMessage {
    pub kind: FrameKind,
    pub category: String,
    pub method: String,
    pub payload: Value,
    pub sender: String,
    pub token: CallToken,
    pub unique_token: String,
}

impl RawMessage {
    /// Inbound request frame for `category`/`method`.
    pub fn request(category: impl Into<String>, method: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: FrameKind::Request,
            category: category.into(),
            method: method.into(),
            payload,
            sender: String::new(),
            token: 0,
            unique_token: String::new(),
        }
    }

    /// Inbound cancel frame for `category`/`method`.
    pub fn cancel(category: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Cancel,
            payload: Value::Null,
            ..Self::request(category, method, Value::Null)
        }
    }

    /// Response frame for an outbound call.
    pub fn response(uri: impl Into<String>, token: CallToken, payload: Value) -> Self {
        Self {
            kind: FrameKind::Response,
            unique_token: token.to_string(),
            token,
            ..Self::request(String::new(), uri, payload)
        }
    }

    #[inline]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = sender.into();
        self
    }

    #[inline]
    pub fn with_token(mut self, token: CallToken) -> Self {
        self.token = token;
        self
    }

    #[inline]
    pub fn with_unique_token(mut self, unique: impl Into<String>) -> Self {
        self.unique_token = unique.into();
        self
    }
}

/// A call issued through [`Transport::send_call`].
///
/// The transport pushes every response into `responses` and drops the sender
/// when the remote end finishes (immediately after the single reply for a
/// one-shot call).
pub struct OutboundCall {
    pub token: CallToken,
    pub responses: mpsc::UnboundedReceiver<RawMessage>,
}

/// Bus transport consumed by the runtime.
///
/// ### Implementation requirements
/// - `send_response` returns `false` when the caller's session is gone; it never panics.
/// - `cancel_call` must stop further responses for the token.
/// - Handles are released at most once by the runtime; repeated release must be harmless.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Routes future calls for `(category, method)` on `handle` to the service.
    fn register_method(&self, handle: BusHandle, category: &str, method: &str)
    -> Result<(), BusError>;

    /// Issues an outbound call; `subscribe` keeps the call open for streamed responses.
    async fn send_call(
        &self,
        handle: BusHandle,
        uri: &str,
        payload: Value,
        subscribe: bool,
    ) -> Result<OutboundCall, BusError>;

    /// Sends a response frame for an inbound call.
    fn send_response(&self, handle: BusHandle, token: CallToken, payload: &Value) -> bool;

    /// Sends a cancellation frame for an inbound subscribing call.
    fn send_cancel(&self, handle: BusHandle, token: CallToken, payload: &Value);

    /// Cancels an outbound call we issued.
    fn cancel_call(&self, handle: BusHandle, token: CallToken);

    /// Releases a handle.
    fn release(&self, handle: BusHandle);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_frame_carries_token_as_unique_token() {
        let raw = RawMessage::response("luna://a/b", 42, json!({"ok": true}));
        assert_eq!(raw.kind, FrameKind::Response);
        assert_eq!(raw.token, 42);
        assert_eq!(raw.unique_token, "42");
        assert_eq!(raw.method, "luna://a/b");
    }

    #[test]
    fn cancel_frame_has_null_payload() {
        let raw = RawMessage::cancel("/", "watch").with_unique_token("u1");
        assert_eq!(raw.kind, FrameKind::Cancel);
        assert!(raw.payload.is_null());
        assert_eq!(raw.unique_token, "u1");
    }
}

//! # In-process transport.
//!
//! [`MemoryTransport`] implements [`Transport`] without any IPC. It records
//! everything the runtime sends and lets the embedding code play the remote side:
//! answer outbound calls, close them, or drop a caller's session.
//!
//! Replies can be scripted per URI with [`MemoryTransport::reply_with`]; a
//! scripted one-shot call is closed right after its replies are queued.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{BusHandle, CallToken, OutboundCall, RawMessage, Transport};
use crate::error::BusError;

type Script = Arc<dyn Fn(&Value) -> Vec<Value> + Send + Sync>;

/// A frame the runtime sent towards a caller.
#[derive(Clone, Debug, PartialEq)]
pub struct SentFrame {
    pub handle: BusHandle,
    pub token: CallToken,
    pub payload: Value,
}

/// An outbound call the runtime issued.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    pub handle: BusHandle,
    pub token: CallToken,
    pub uri: String,
    pub payload: Value,
    pub subscribe: bool,
}

#[derive(Default)]
struct State {
    next_token: CallToken,
    registrations: Vec<(BusHandle, String, String)>,
    responses: Vec<SentFrame>,
    cancels: Vec<SentFrame>,
    calls: Vec<CallRecord>,
    open: HashMap<CallToken, (String, mpsc::UnboundedSender<RawMessage>)>,
    cancelled_calls: Vec<CallToken>,
    released: Vec<BusHandle>,
    dead_sessions: HashSet<CallToken>,
    scripts: HashMap<String, Script>,
    failing: HashMap<String, String>,
    refused: HashMap<String, String>,
}

/// Recording transport for tests, demos and local wiring.
#[derive(Default)]
pub struct MemoryTransport {
    state: Mutex<State>,
}

impl MemoryTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answers every call to `uri` with the payloads returned by `script`.
    pub fn reply_with<F>(&self, uri: impl Into<String>, script: F)
    where
        F: Fn(&Value) -> Vec<Value> + Send + Sync + 'static,
    {
        self.state.lock().scripts.insert(uri.into(), Arc::new(script));
    }

    /// Makes every call to `uri` fail with `reason`.
    pub fn fail_calls_to(&self, uri: impl Into<String>, reason: impl Into<String>) {
        self.state.lock().failing.insert(uri.into(), reason.into());
    }

    /// Makes registration of `method` (under any category) fail with `reason`.
    pub fn refuse_method(&self, method: impl Into<String>, reason: impl Into<String>) {
        self.state.lock().refused.insert(method.into(), reason.into());
    }

    /// Pushes a response into an open outbound call. Returns false if the call is closed.
    pub fn push_response(&self, token: CallToken, payload: Value) -> bool {
        let st = self.state.lock();
        match st.open.get(&token) {
            Some((uri, tx)) => tx.send(RawMessage::response(uri.clone(), token, payload)).is_ok(),
            None => false,
        }
    }

    /// Ends an outbound call from the remote side.
    pub fn close_call(&self, token: CallToken) {
        self.state.lock().open.remove(&token);
    }

    /// Marks the caller session behind `token` as gone; later responses fail.
    pub fn drop_session(&self, token: CallToken) {
        self.state.lock().dead_sessions.insert(token);
    }

    pub fn registrations(&self) -> Vec<(BusHandle, String, String)> {
        self.state.lock().registrations.clone()
    }

    pub fn responses(&self) -> Vec<SentFrame> {
        self.state.lock().responses.clone()
    }

    pub fn cancels(&self) -> Vec<SentFrame> {
        self.state.lock().cancels.clone()
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().calls.clone()
    }

    /// Calls issued to `uri`, in order.
    pub fn calls_to(&self, uri: &str) -> Vec<CallRecord> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.uri == uri)
            .cloned()
            .collect()
    }

    pub fn cancelled_calls(&self) -> Vec<CallToken> {
        self.state.lock().cancelled_calls.clone()
    }

    pub fn released(&self) -> Vec<BusHandle> {
        self.state.lock().released.clone()
    }

    /// True while the outbound call is open on the remote side.
    pub fn is_open(&self, token: CallToken) -> bool {
        self.state.lock().open.contains_key(&token)
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn register_method(
        &self,
        handle: BusHandle,
        category: &str,
        method: &str,
    ) -> Result<(), BusError> {
        let mut st = self.state.lock();
        if st.released.contains(&handle) {
            return Err(BusError::HandleClosed {
                handle: handle.label(),
            });
        }
        if let Some(reason) = st.refused.get(method) {
            return Err(BusError::RegistrationRefused {
                category: category.to_string(),
                method: method.to_string(),
                reason: reason.clone(),
            });
        }
        st.registrations
            .push((handle, category.to_string(), method.to_string()));
        Ok(())
    }

    async fn send_call(
        &self,
        handle: BusHandle,
        uri: &str,
        payload: Value,
        subscribe: bool,
    ) -> Result<OutboundCall, BusError> {
        let mut st = self.state.lock();
        if let Some(reason) = st.failing.get(uri) {
            return Err(BusError::CallFailed {
                uri: uri.to_string(),
                reason: reason.clone(),
            });
        }

        st.next_token += 1;
        let token = st.next_token;
        let (tx, rx) = mpsc::unbounded_channel();

        let replies = st.scripts.get(uri).map(|script| script(&payload));
        st.calls.push(CallRecord {
            handle,
            token,
            uri: uri.to_string(),
            payload,
            subscribe,
        });

        match replies {
            Some(replies) => {
                for reply in replies {
                    let _ = tx.send(RawMessage::response(uri, token, reply));
                }
                if subscribe {
                    st.open.insert(token, (uri.to_string(), tx));
                }
            }
            None => {
                st.open.insert(token, (uri.to_string(), tx));
            }
        }

        Ok(OutboundCall {
            token,
            responses: rx,
        })
    }

    fn send_response(&self, handle: BusHandle, token: CallToken, payload: &Value) -> bool {
        let mut st = self.state.lock();
        if st.dead_sessions.contains(&token) || st.released.contains(&handle) {
            return false;
        }
        st.responses.push(SentFrame {
            handle,
            token,
            payload: payload.clone(),
        });
        true
    }

    fn send_cancel(&self, handle: BusHandle, token: CallToken, payload: &Value) {
        self.state.lock().cancels.push(SentFrame {
            handle,
            token,
            payload: payload.clone(),
        });
    }

    fn cancel_call(&self, _handle: BusHandle, token: CallToken) {
        let mut st = self.state.lock();
        st.open.remove(&token);
        st.cancelled_calls.push(token);
    }

    fn release(&self, handle: BusHandle) {
        let mut st = self.state.lock();
        if !st.released.contains(&handle) {
            st.released.push(handle);
        }
    }
}

//! # Registered methods.
//!
//! A [`Method`] is the routing target of inbound calls for one
//! `(category, name)` pair. It exposes two events:
//! - `request`: a call arrived;
//! - `cancel`: the caller ended a subscribing call it made earlier.
//!
//! [`MethodDef`] describes a method before registration.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use lunavisor::MethodDef;
//!
//! let def = MethodDef::new("status/get")
//!     .description(json!({"returns": "current status"}))
//!     .on_request(|msg| {
//!         msg.respond(json!({"returnValue": true}));
//!     });
//! assert_eq!(def.name(), "status/get");
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::Message;
use crate::events::{EventChannel, Listener};

/// Events a [`Method`] emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MethodEvent {
    Request,
    Cancel,
}

/// A method registered on the service.
pub struct Method {
    category: String,
    name: String,
    description: Value,
    channel: EventChannel<MethodEvent, Message>,
}

impl Method {
    pub(crate) fn new(category: String, name: String, description: Value) -> Self {
        Self {
            category,
            name,
            description,
            channel: EventChannel::new(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &Value {
        &self.description
    }

    /// Adds a `request` listener.
    pub fn on_request<F>(&self, listener: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.channel.on(MethodEvent::Request, listener);
    }

    /// Adds a `cancel` listener.
    pub fn on_cancel<F>(&self, listener: F)
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.channel.on(MethodEvent::Cancel, listener);
    }

    pub fn listener_count(&self, event: MethodEvent) -> usize {
        self.channel.listener_count(event)
    }

    pub(crate) fn attach(&self, event: MethodEvent, listener: Listener<Message>) {
        self.channel.on(event, move |msg: &Message| listener(msg));
    }

    pub(crate) fn emit(&self, event: MethodEvent, msg: &Message) -> usize {
        self.channel.emit(event, msg)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("category", &self.category)
            .field("name", &self.name)
            .finish()
    }
}

/// Definition of a method to register.
///
/// The name may carry a category prefix: `"sub/name"` registers `name` under `/sub`.
#[derive(Clone)]
pub struct MethodDef {
    name: String,
    description: Value,
    on_request: Option<Listener<Message>>,
    on_cancel: Option<Listener<Message>>,
}

impl MethodDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Value::Null,
            on_request: None,
            on_cancel: None,
        }
    }

    pub fn description(mut self, description: Value) -> Self {
        self.description = description;
        self
    }

    pub fn on_request<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(listener));
        self
    }

    pub fn on_cancel<F>(mut self, listener: F) -> Self
    where
        F: Fn(&Message) + Send + Sync + 'static,
    {
        self.on_cancel = Some(Arc::new(listener));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(
        self,
    ) -> (String, Value, Option<Listener<Message>>, Option<Listener<Message>>) {
        (self.name, self.description, self.on_request, self.on_cancel)
    }
}

impl From<&str> for MethodDef {
    fn from(name: &str) -> Self {
        MethodDef::new(name)
    }
}

impl From<String> for MethodDef {
    fn from(name: String) -> Self {
        MethodDef::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn def_collects_listeners() {
        let def = MethodDef::new("ping").on_request(|_| {}).on_cancel(|_| {});
        let (name, description, req, cancel) = def.into_parts();
        assert_eq!(name, "ping");
        assert!(description.is_null());
        assert!(req.is_some());
        assert!(cancel.is_some());
    }

    #[test]
    fn listeners_are_counted_per_event() {
        let m = Method::new("/".into(), "ping".into(), Value::Null);
        m.on_request(|_| {});
        m.on_request(|_| {});
        m.attach(MethodEvent::Cancel, Arc::new(|_: &Message| {}));
        assert_eq!(m.listener_count(MethodEvent::Request), 2);
        assert_eq!(m.listener_count(MethodEvent::Cancel), 1);
    }
}

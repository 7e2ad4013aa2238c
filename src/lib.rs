//! # lunavisor
//!
//! **Lunavisor** is a runtime for long-running services attached to a Luna-style
//! message bus.
//!
//! A service registers named methods on one or two logical buses, dispatches
//! inbound requests and cancellations to listeners, issues outbound calls and
//! subscriptions, tracks long-lived activities through an activity manager, and
//! exits automatically once it has had no activity for a configured idle time.
//!
//! ## Architecture
//! ```text
//!                ┌──────────────────────────────────────────────┐
//!  Transport ───►│ Service                                      │
//!  (trait)       │  - MethodTable  category ─► name ─► Method   │
//!   dispatch()   │  - inbound subscribing calls (unique token)  │
//!                │  - outbound Subscriptions (call token)       │
//!                │  - built-ins: info, quit                     │
//!                └──────┬───────────────────────────────┬───────┘
//!                       │ owns                          │ quit
//!                       ▼                               ▼
//!                ┌──────────────────────┐        ┌─────────────┐
//!                │ ActivityManager      │ idle   │ Exit        │
//!                │  - activity table    ├───────►│ (one-shot)  ├──► exit hook
//!                │  - idle timer        │ timeout└─────────────┘
//!                └──────────────────────┘
//!
//!  Service / ActivityManager / Subscription ──► EventBus ──► SubscriberSet ──► Subscribe
//! ```
//!
//! ### Idle exit
//! ```text
//! create(..) ─► add ─► idle timer stopped
//! complete(..) ─► remove ─► table empty? ─► idle timer started
//! idle timer fires ─► exit_on_timeout ? Exit::request(IdleTimeout) : warn, no rearm
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Service**       | Method registration, dispatch, calls, subscriptions.         | [`Service`], [`MethodDef`], [`Message`]     |
//! | **Activities**    | Real, dummy and internal activities; idle exit.              | [`ActivityManager`], [`ActivitySpec`]       |
//! | **Transport**     | Bus contract and an in-process implementation.               | [`Transport`], [`MemoryTransport`]          |
//! | **Subscriber API**| Observe runtime events.                                      | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors with stable labels.                             | [`BusError`], [`ActivityError`], [`ServiceError`] |
//! | **Configuration** | Security model, platform, idle timeout.                      | [`ServiceConfig`], [`ActivityConfig`]       |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use lunavisor::{ExitReason, MemoryTransport, MethodDef, RawMessage, Service, ServiceConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = MemoryTransport::new();
//!     let service = Service::builder("com.example.echo", transport.clone())
//!         .config(ServiceConfig::default())
//!         .on_exit(Arc::new(|reason: ExitReason| println!("exit: {}", reason.as_label())))
//!         .build()?;
//!
//!     service.register(MethodDef::new("echo").on_request(|msg| {
//!         msg.respond(json!({"returnValue": true, "echo": msg.payload().clone()}));
//!     }))?;
//!
//!     // The transport delivers inbound calls through dispatch.
//!     let handle = service.public_handle().expect("dual bus");
//!     service.dispatch(handle, RawMessage::request("/", "echo", json!({"hi": 1})).with_token(1));
//!
//!     assert_eq!(transport.responses()[0].payload["echo"], json!({"hi": 1}));
//!     Ok(())
//! }
//! ```
mod activity;
mod core;
mod endpoints;
mod error;
mod events;
mod subscribers;
mod transport;

// ---- Public re-exports ----

pub use activity::{
    ADOPT_URI, Activity, ActivityHandle, ActivityId, ActivityKind, ActivityManager, ActivitySpec,
    ActivityType, COMPLETE_URI, CREATE_URI, CreateRequest, Priority,
};
pub use core::{
    ActivityConfig, Exit, ExitHook, ExitReason, Platform, SecurityModel, Service, ServiceBuilder,
    ServiceConfig, process_exit_hook,
};
pub use endpoints::{Message, Method, MethodDef, MethodEvent, Subscription, SubscriptionEvent};
pub use error::{ActivityError, BusError, ServiceError};
pub use events::{Event, EventBus, EventChannel, EventKind, Listener};
pub use subscribers::{Subscribe, SubscriberSet};
pub use transport::{
    BusHandle, CallRecord, CallToken, FrameKind, MemoryTransport, OutboundCall, RawMessage,
    SentFrame, Transport,
};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

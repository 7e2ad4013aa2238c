//! Runtime core: the service facade and its lifecycle.
//!
//! The public API from this module is [`Service`] (built with [`ServiceBuilder`]),
//! its configuration and the exit machinery.
//!
//! Internal modules:
//! - [`service`]: registration, dispatch, outbound calls, teardown;
//! - [`builder`]: wires transport, activity manager and subscribers together;
//! - [`registry`]: the `category -> name -> Method` table;
//! - [`builtins`]: the `info` and `quit` methods;
//! - [`exit`]: one-shot exit latch and hooks;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod builtins;
mod config;
mod exit;
mod registry;
mod service;
mod shutdown;

pub use builder::ServiceBuilder;
pub use config::{ActivityConfig, Platform, SecurityModel, ServiceConfig};
pub use exit::{Exit, ExitHook, ExitReason, process_exit_hook};
pub use service::Service;

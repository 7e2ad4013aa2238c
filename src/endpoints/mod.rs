//! Event-emission endpoints: inbound [`Message`]s, registered [`Method`]s and
//! outbound [`Subscription`]s.
//!
//! Both `Method` and `Subscription` are thin wrappers over an
//! [`EventChannel`](crate::events::EventChannel); listeners run synchronously
//! in registration order.

mod message;
mod method;
mod subscription;

pub use message::Message;
pub use method::{Method, MethodDef, MethodEvent};
pub use subscription::{Subscription, SubscriptionEvent};

//! Activity tracking and idle exit.
//!
//! - [`ActivityManager`] owns the activity table and the idle-exit timer.
//! - [`ActivitySpec`] / [`CreateRequest`] describe what to create.
//! - [`ActivityHandle`] / [`ActivityId`] identify what was created.

mod manager;
mod record;
mod spec;
mod timer;

pub use manager::{ADOPT_URI, ActivityManager, COMPLETE_URI, CREATE_URI};
pub use record::{ActivityHandle, ActivityId, ActivityKind};
pub use spec::{Activity, ActivitySpec, ActivityType, CreateRequest, Priority};

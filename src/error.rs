//! Error types used by the service runtime.
//!
//! This module defines three error enums:
//!
//! - [`BusError`]: failures reported by the bus transport.
//! - [`ActivityError`]: failures of activity creation, adoption and completion.
//! - [`ServiceError`]: failures surfaced by the [`Service`](crate::Service) facade.
//!
//! Every type provides `as_label()` for logs/metrics.

use thiserror::Error;

/// # Errors reported by the bus transport.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The handle was released or never opened.
    #[error("bus handle {handle} is closed")]
    HandleClosed {
        /// Handle label (`unified`, `private`, `public`).
        handle: &'static str,
    },

    /// The transport refused to register a method.
    #[error("cannot register {category}/{method}: {reason}")]
    RegistrationRefused {
        /// Category the method was registered under.
        category: String,
        /// Method name.
        method: String,
        /// Transport-provided reason.
        reason: String,
    },

    /// An outbound call could not be sent.
    #[error("call to {uri} failed: {reason}")]
    CallFailed {
        /// Target URI.
        uri: String,
        /// Transport-provided reason.
        reason: String,
    },

    /// The remote end closed the call without a single response.
    #[error("no response from {uri}")]
    NoResponse {
        /// Target URI.
        uri: String,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lunavisor::BusError;
    ///
    /// let err = BusError::NoResponse { uri: "luna://com.example/ping".into() };
    /// assert_eq!(err.as_label(), "bus_no_response");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::HandleClosed { .. } => "bus_handle_closed",
            BusError::RegistrationRefused { .. } => "bus_registration_refused",
            BusError::CallFailed { .. } => "bus_call_failed",
            BusError::NoResponse { .. } => "bus_no_response",
        }
    }
}

/// # Errors produced by the activity manager.
///
/// Creation failures are never retried by the runtime; retry policy belongs to the caller.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActivityError {
    /// The transport failed while talking to the activity-manager endpoint.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The activity-manager endpoint answered with `returnValue: false`.
    #[error("activity manager rejected {operation}: {error_text}")]
    Rejected {
        /// `create`, `adopt` or `complete`.
        operation: &'static str,
        /// Error code from the reply, if any.
        error_code: Option<i64>,
        /// Error text from the reply (empty if absent).
        error_text: String,
    },

    /// The reply to `create` had no usable `activityId`.
    #[error("activity manager reply carried no activityId")]
    MissingActivityId,

    /// The activity manager is not attached to a service and cannot issue calls.
    #[error("activity manager is not attached to a service")]
    Detached,

    /// The activity is not known to this manager.
    #[error("unknown activity {id}")]
    Unknown {
        /// Rendered activity id.
        id: String,
    },

    /// The activity spec could not be encoded as JSON.
    #[error("cannot encode activity spec: {reason}")]
    Encode {
        /// Serializer message.
        reason: String,
    },
}

impl ActivityError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActivityError::Bus(e) => e.as_label(),
            ActivityError::Rejected { .. } => "activity_rejected",
            ActivityError::MissingActivityId => "activity_missing_id",
            ActivityError::Detached => "activity_detached",
            ActivityError::Unknown { .. } => "activity_unknown",
            ActivityError::Encode { .. } => "activity_encode",
        }
    }
}

/// # Errors surfaced by the service facade.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// A transport operation failed.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// The method name is empty or ends with `/`.
    #[error("invalid method name {name:?}")]
    InvalidMethodName {
        /// The rejected name.
        name: String,
    },
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use lunavisor::ServiceError;
    ///
    /// let err = ServiceError::InvalidMethodName { name: String::new() };
    /// assert_eq!(err.as_label(), "service_invalid_method_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Bus(e) => e.as_label(),
            ServiceError::InvalidMethodName { .. } => "service_invalid_method_name",
        }
    }
}

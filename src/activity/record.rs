//! Activity identifiers and table records.

use std::fmt;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::endpoints::Subscription;

/// Activity identifier.
///
/// Real activities carry the integer the activity-manager endpoint returned;
/// placeholder activities carry a locally minted string (`dummy_N` / `internal_N`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityId {
    Real(u64),
    Local(String),
}

impl ActivityId {
    /// Reads the `activityId` field of a payload (integer or string).
    pub fn from_payload(payload: &Value) -> Option<Self> {
        match payload.get("activityId")? {
            Value::Number(n) => n.as_u64().map(ActivityId::Real),
            Value::String(s) => Some(ActivityId::Local(s.clone())),
            _ => None,
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, ActivityId::Real(_))
    }

    /// The id as it appears in bus payloads.
    pub fn to_json(&self) -> Value {
        match self {
            ActivityId::Real(id) => json!(id),
            ActivityId::Local(id) => json!(id),
        }
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityId::Real(id) => write!(f, "{id}"),
            ActivityId::Local(id) => f.write_str(id),
        }
    }
}

impl From<u64> for ActivityId {
    fn from(id: u64) -> Self {
        ActivityId::Real(id)
    }
}

/// Variant of a tracked activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivityKind {
    Real,
    Dummy,
    Internal,
}

impl ActivityKind {
    pub fn as_label(self) -> &'static str {
        match self {
            ActivityKind::Real => "real",
            ActivityKind::Dummy => "dummy",
            ActivityKind::Internal => "internal",
        }
    }
}

/// Entry of the activity table.
pub(crate) enum ActivityRecord {
    Real {
        id: u64,
        name: String,
        subscription: Arc<Subscription>,
    },
    Dummy {
        id: String,
        name: String,
    },
    Internal {
        id: String,
        name: String,
        is_internal: bool,
    },
}

impl ActivityRecord {
    pub(crate) fn id(&self) -> ActivityId {
        match self {
            ActivityRecord::Real { id, .. } => ActivityId::Real(*id),
            ActivityRecord::Dummy { id, .. } | ActivityRecord::Internal { id, .. } => {
                ActivityId::Local(id.clone())
            }
        }
    }

    pub(crate) fn kind(&self) -> ActivityKind {
        match self {
            ActivityRecord::Real { .. } => ActivityKind::Real,
            ActivityRecord::Dummy { .. } => ActivityKind::Dummy,
            ActivityRecord::Internal { .. } => ActivityKind::Internal,
        }
    }

    pub(crate) fn name(&self) -> &str {
        match self {
            ActivityRecord::Real { name, .. }
            | ActivityRecord::Dummy { name, .. }
            | ActivityRecord::Internal { name, .. } => name,
        }
    }

    /// Payload handed back to the creator for placeholder activities.
    pub(crate) fn placeholder_payload(&self) -> Value {
        match self {
            ActivityRecord::Real { id, name, .. } => {
                json!({"activity": {"name": name}, "activityId": id})
            }
            ActivityRecord::Dummy { id, name } => {
                json!({"activity": {"name": name}, "activityId": id, "isDummyActivity": true})
            }
            ActivityRecord::Internal {
                id,
                name,
                is_internal,
            } => {
                json!({"activity": {"name": name}, "activityId": id, "isInternalActivity": is_internal})
            }
        }
    }
}

/// What a successful create or adopt hands back.
#[derive(Clone, Debug, PartialEq)]
pub struct ActivityHandle {
    pub id: ActivityId,
    pub name: String,
    pub kind: ActivityKind,
    /// The create payload (real activities) or the placeholder descriptor, with `activityId` set.
    pub payload: Value,
}

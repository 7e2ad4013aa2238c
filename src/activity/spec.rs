//! # Activity specifications.
//!
//! [`ActivitySpec`] is what the activity-manager endpoint expects for `create`.
//! [`CreateRequest`] is what [`ActivityManager::create`](crate::ActivityManager::create)
//! accepts: either a bare job identifier (placeholder activity) or a full spec.
//!
//! ## Example
//! ```rust
//! use serde_json::json;
//! use lunavisor::{Activity, ActivitySpec, ActivityType, CreateRequest};
//!
//! let spec = ActivitySpec::new(
//!     Activity::new("sync.mail", "periodic mail sync")
//!         .with_type(ActivityType { foreground: Some(true), persist: Some(true), ..Default::default() })
//!         .with_field("trigger", json!({"method": "luna://com.example/ready"})),
//! )
//! .start(true)
//! .replace(true);
//!
//! let value = serde_json::to_value(&spec).unwrap();
//! assert_eq!(value["activity"]["type"]["persist"], json!(true));
//! assert_eq!(value["activity"]["trigger"]["method"], json!("luna://com.example/ready"));
//! assert!(matches!(CreateRequest::from(spec), CreateRequest::Spec(_)));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scheduling priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Highest,
    High,
    Normal,
    Low,
    Lowest,
}

/// Activity type flags. One of `foreground`, `background` or `immediate` (with `priority`) must be set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_initiated: Option<bool>,
    /// Store the activity in the persistent database.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persist: Option<bool>,
    /// Keep the activity when the parent subscription goes away.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explicit: Option<bool>,
    /// Do not expire after completion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous: Option<bool>,
    /// Keep the device powered while running.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_debounce: Option<bool>,
}

/// Activity description. Fields other than `name`, `description` and `type`
/// (trigger, callback, schedule, requirements...) travel untouched in `extra`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ActivityType>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: None,
            extra: Map::new(),
        }
    }

    pub fn with_type(mut self, kind: ActivityType) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Adds an opaque field such as `trigger` or `callback`.
    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}

/// Payload of the activity-manager `create` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivitySpec {
    pub activity: Activity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replace: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<bool>,
    /// Defaults to `true` when sent, which ties the activity to our subscription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribe: Option<bool>,
}

impl ActivitySpec {
    pub fn new(activity: Activity) -> Self {
        Self {
            activity,
            replace: None,
            start: None,
            subscribe: None,
        }
    }

    pub fn replace(mut self, replace: bool) -> Self {
        self.replace = Some(replace);
        self
    }

    pub fn start(mut self, start: bool) -> Self {
        self.start = Some(start);
        self
    }

    pub fn subscribe(mut self, subscribe: bool) -> Self {
        self.subscribe = Some(subscribe);
        self
    }

    /// The JSON sent to the activity-manager `create` endpoint.
    pub(crate) fn to_payload(&self) -> Result<Value, serde_json::Error> {
        let mut payload = serde_json::to_value(self)?;
        if self.subscribe.is_none() {
            if let Value::Object(map) = &mut payload {
                map.insert("subscribe".into(), Value::Bool(true));
            }
        }
        Ok(payload)
    }
}

/// Input of `ActivityManager::create`.
#[derive(Clone, Debug, PartialEq)]
pub enum CreateRequest {
    /// Bare job identifier: a locally tracked placeholder activity.
    Job(String),
    /// Full spec: a real bus-backed activity (unless dummy mode is on).
    Spec(ActivitySpec),
}

impl CreateRequest {
    /// Name of the activity this request would create.
    pub fn name(&self) -> &str {
        match self {
            CreateRequest::Job(job) => job,
            CreateRequest::Spec(spec) => &spec.activity.name,
        }
    }
}

impl From<&str> for CreateRequest {
    fn from(job: &str) -> Self {
        CreateRequest::Job(job.to_string())
    }
}

impl From<String> for CreateRequest {
    fn from(job: String) -> Self {
        CreateRequest::Job(job)
    }
}

impl From<ActivitySpec> for CreateRequest {
    fn from(spec: ActivitySpec) -> Self {
        CreateRequest::Spec(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_defaults_subscribe_to_true() {
        let spec = ActivitySpec::new(Activity::new("a", "")).start(true);
        let payload = spec.to_payload().expect("payload");
        assert_eq!(payload["subscribe"], json!(true));
        assert_eq!(payload["start"], json!(true));
        assert!(payload.get("replace").is_none());
    }

    #[test]
    fn explicit_subscribe_is_kept() {
        let spec = ActivitySpec::new(Activity::new("a", "")).subscribe(false);
        assert_eq!(spec.to_payload().expect("payload")["subscribe"], json!(false));
    }

    #[test]
    fn type_flags_use_camel_case() {
        let kind = ActivityType {
            power_debounce: Some(true),
            user_initiated: Some(false),
            priority: Some(Priority::Low),
            ..Default::default()
        };
        let v = serde_json::to_value(&kind).expect("json");
        assert_eq!(v, json!({"priority": "low", "userInitiated": false, "powerDebounce": true}));
    }

    #[test]
    fn unknown_activity_fields_round_trip_through_extra() {
        let v = json!({
            "name": "fake.activity",
            "description": "do something cool",
            "callback": {"method": "luna://com.example/start"}
        });
        let activity: Activity = serde_json::from_value(v.clone()).expect("activity");
        assert_eq!(activity.extra["callback"]["method"], json!("luna://com.example/start"));
        assert_eq!(serde_json::to_value(&activity).expect("json"), v);
    }

    #[test]
    fn request_names() {
        assert_eq!(CreateRequest::from("job-1").name(), "job-1");
        let spec = ActivitySpec::new(Activity::new("sync", ""));
        assert_eq!(CreateRequest::from(spec).name(), "sync");
    }
}

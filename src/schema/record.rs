//! Analytics event record definition
//!
//! Records arrive as `{"event": "...", "properties": {"user_id": ...}}`.
//! Only `event` and `properties.user_id` are read; every other property is
//! carried along untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::error::PipelineError;

/// Current input record format
pub const RECORD_FORMAT: &str = "analytics.event_log.v1";

/// Opaque user identifier (integer or string)
///
/// Integers order before strings; within a kind the natural order applies.
/// `UInt` only holds values above `i64::MAX`, so integer ids compare
/// numerically across both integer variants. The `From` conversions and
/// deserialization keep to that.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    UInt(u64),
    Str(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Int(id) => write!(f, "{}", id),
            UserId::UInt(id) => write!(f, "{}", id),
            UserId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for UserId {
    fn from(v: i64) -> Self {
        UserId::Int(v)
    }
}

impl From<i32> for UserId {
    fn from(v: i32) -> Self {
        UserId::Int(i64::from(v))
    }
}

impl From<u64> for UserId {
    fn from(v: u64) -> Self {
        i64::try_from(v).map_or(UserId::UInt(v), UserId::Int)
    }
}

impl From<String> for UserId {
    fn from(v: String) -> Self {
        UserId::Str(v)
    }
}

impl From<&str> for UserId {
    fn from(v: &str) -> Self {
        UserId::Str(v.to_string())
    }
}

impl UserId {
    /// Parse a user id typed on the command line: integers first, then strings
    pub fn parse_lossy(s: &str) -> Self {
        if let Ok(id) = s.parse::<i64>() {
            UserId::Int(id)
        } else if let Ok(id) = s.parse::<u64>() {
            UserId::UInt(id)
        } else {
            UserId::Str(s.to_string())
        }
    }
}

/// Anything the grouper can read an event name and user id from
pub trait EventSource {
    fn event_name(&self) -> Option<&str>;
    fn user_id(&self) -> Option<&UserId>;
}

/// Validated event record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_name: String,
    pub user_id: UserId,
}

impl EventRecord {
    pub fn new(event_name: impl Into<String>, user_id: impl Into<UserId>) -> Self {
        EventRecord {
            event_name: event_name.into(),
            user_id: user_id.into(),
        }
    }
}

impl EventSource for EventRecord {
    fn event_name(&self) -> Option<&str> {
        Some(&self.event_name)
    }

    fn user_id(&self) -> Option<&UserId> {
        Some(&self.user_id)
    }
}

/// Record properties; `user_id` plus whatever else the producer attached
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Properties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Event record as it appears on the wire; required fields may be absent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Properties>,
}

impl RawEventRecord {
    /// Validate that both required fields are present
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.required_fields().map(|_| ())
    }

    /// Convert into a validated record; `index` is reported on failure
    pub fn to_record(&self, index: usize) -> Result<EventRecord, PipelineError> {
        let (event, user) = self
            .required_fields()
            .map_err(|e| e.into_pipeline_error(index))?;
        Ok(EventRecord::new(event, user.clone()))
    }

    fn required_fields(&self) -> Result<(&str, &UserId), ValidationError> {
        let event = self.event_name().ok_or(ValidationError::MissingEvent)?;
        let user = self.user_id().ok_or(ValidationError::MissingUserId)?;
        Ok((event, user))
    }
}

impl From<EventRecord> for RawEventRecord {
    fn from(record: EventRecord) -> Self {
        RawEventRecord {
            event: Some(record.event_name),
            properties: Some(Properties {
                user_id: Some(record.user_id),
                extra: Map::new(),
            }),
        }
    }
}

impl EventSource for RawEventRecord {
    fn event_name(&self) -> Option<&str> {
        self.event.as_deref()
    }

    fn user_id(&self) -> Option<&UserId> {
        self.properties.as_ref().and_then(|p| p.user_id.as_ref())
    }
}

/// Validation errors for raw records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing field `event`")]
    MissingEvent,

    #[error("missing field `properties.user_id`")]
    MissingUserId,
}

impl ValidationError {
    /// Name of the missing field, as written in the input
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingEvent => "event",
            ValidationError::MissingUserId => "properties.user_id",
        }
    }

    pub fn into_pipeline_error(self, index: usize) -> PipelineError {
        PipelineError::MalformedRecord {
            index,
            field: self.field(),
        }
    }
}

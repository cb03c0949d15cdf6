//! Span data model, a small OpenTelemetry subset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Role of a span, serialized as its OpenTelemetry integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SpanKind {
    Unspecified,
    Internal,
    Server,
    Client,
    Producer,
    Consumer,
}

impl From<i32> for SpanKind {
    fn from(value: i32) -> Self {
        match value {
            1 => SpanKind::Internal,
            2 => SpanKind::Server,
            3 => SpanKind::Client,
            4 => SpanKind::Producer,
            5 => SpanKind::Consumer,
            _ => SpanKind::Unspecified,
        }
    }
}

impl From<SpanKind> for i32 {
    fn from(value: SpanKind) -> Self {
        match value {
            SpanKind::Unspecified => 0,
            SpanKind::Internal => 1,
            SpanKind::Server => 2,
            SpanKind::Client => 3,
            SpanKind::Producer => 4,
            SpanKind::Consumer => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Status {
    Unset,
    Ok,
    Error,
}

impl From<i32> for Status {
    fn from(value: i32) -> Self {
        match value {
            1 => Status::Ok,
            2 => Status::Error,
            _ => Status::Unset,
        }
    }
}

impl From<Status> for i32 {
    fn from(value: Status) -> Self {
        match value {
            Status::Unset => 0,
            Status::Ok => 1,
            Status::Error => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: String,
    pub name: String,
    pub kind: SpanKind,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub status: Status,
    pub status_code: u32,
    pub attributes: HashMap<String, String>,
}

impl Span {
    pub fn new(trace_id: &str, parent_id: &str, name: &str, kind: SpanKind) -> Self {
        Self {
            trace_id: trace_id.to_string(),
            span_id: crate::traceparent::new_span_id(),
            parent_id: parent_id.to_string(),
            name: name.to_string(),
            kind,
            start_time: Utc::now(),
            end_time: None,
            status: Status::Unset,
            status_code: 0,
            attributes: HashMap::new(),
        }
    }

    /// Stamp the end time.
    pub fn end(&mut self) {
        self.end_time = Some(Utc::now());
    }

    pub fn is_ended(&self) -> bool {
        self.end_time.is_some()
    }

    pub fn set_attribute(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    pub fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_default()
    }
}

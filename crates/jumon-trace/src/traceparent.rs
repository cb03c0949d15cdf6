//! W3C-subset traceparent header: `version-traceID-parentID-flag`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Traceparent {
    pub version: String,
    pub trace_id: String,
    pub parent_id: String,
    pub trace_flag: String,
}

#[derive(Debug, Error)]
#[error("invalid traceparent format: {0}")]
pub struct TraceparentError(String);

impl Traceparent {
    /// Mint a fresh traceparent with a new trace id.
    pub fn new(trace: bool) -> Self {
        Self {
            version: "00".to_string(),
            trace_id: new_trace_id(),
            parent_id: new_span_id(),
            trace_flag: if trace { "01" } else { "00" }.to_string(),
        }
    }

    /// Parse a `00-<32 hex>-<16 hex>-<2 hex>` header value.
    pub fn parse(value: &str) -> Result<Self, TraceparentError> {
        let value = value.trim();
        let parts: Vec<&str> = value.split('-').collect();
        if parts.len() != 4
            || parts[0].len() != 2
            || parts[1].len() != 32
            || parts[2].len() != 16
            || parts[3].len() != 2
        {
            return Err(TraceparentError(value.to_string()));
        }
        Ok(Self {
            version: parts[0].to_string(),
            trace_id: parts[1].to_string(),
            parent_id: parts[2].to_string(),
            trace_flag: parts[3].to_string(),
        })
    }
}

impl std::fmt::Display for Traceparent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}",
            self.version, self.trace_id, self.parent_id, self.trace_flag
        )
    }
}

/// 16 random bytes as 32 hex chars.
pub fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 8 random bytes as 16 hex chars.
pub fn new_span_id() -> String {
    Uuid::new_v4().simple().to_string()[..16].to_string()
}

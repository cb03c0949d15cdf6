//! Span tracer: context threading, span lifecycle, notifications.

use crate::span::{Span, SpanKind, Status};
use crate::traceparent::Traceparent;
use async_nats::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const TRACE_SUBJECT: &str = "trace";
const NOTIFICATION_SUBJECT: &str = "notification";

pub const HEADER_TRACEPARENT: &str = "traceparent";
pub const HEADER_NOTIFY_TO: &str = "notify-to";

/// Immutable correlation state threaded through calls in place of
/// process-global context.
#[derive(Debug, Clone, Default)]
pub struct TraceContext {
    traceparent: Option<String>,
    notify_to: Option<String>,
}

impl TraceContext {
    /// Build a context from incoming request headers.
    pub fn from_headers(headers: Option<&HeaderMap>) -> Self {
        let get = |name: &str| {
            headers
                .and_then(|h| h.get(name))
                .map(|v| v.as_str().to_string())
                .filter(|v| !v.is_empty())
        };
        let ctx = Self {
            traceparent: get(HEADER_TRACEPARENT),
            notify_to: get(HEADER_NOTIFY_TO),
        };
        debug!(traceparent = ?ctx.traceparent, notify_to = ?ctx.notify_to, "new context");
        ctx
    }

    /// Fresh context with a random notify-to id; returns the id too.
    pub fn with_notify() -> (Self, String) {
        let notify_to = crate::traceparent::new_span_id();
        (
            Self {
                traceparent: None,
                notify_to: Some(notify_to.clone()),
            },
            notify_to,
        )
    }

    pub fn traceparent(&self) -> Option<&str> {
        self.traceparent.as_deref()
    }

    pub fn notify_to(&self) -> Option<&str> {
        self.notify_to.as_deref()
    }

    /// Headers for an outgoing cross-service request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_TRACEPARENT, self.traceparent.as_deref().unwrap_or(""));
        headers.insert(HEADER_NOTIFY_TO, self.notify_to.as_deref().unwrap_or(""));
        headers
    }
}

/// Content recorded on a span or notification.
///
/// Text passes through verbatim; bytes render as UTF-8 when valid and as
/// a JSON array otherwise; values render compact.
#[derive(Debug, Clone)]
pub enum SpanValue {
    Text(String),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl SpanValue {
    pub fn render(&self) -> String {
        match self {
            SpanValue::Text(s) => s.clone(),
            SpanValue::Json(v) => serde_json::to_string(v).unwrap_or_default(),
            SpanValue::Bytes(b) => match std::str::from_utf8(b) {
                Ok(s) => s.to_string(),
                Err(_) => serde_json::to_string(b).unwrap_or_default(),
            },
        }
    }
}

impl From<&str> for SpanValue {
    fn from(s: &str) -> Self {
        SpanValue::Text(s.to_string())
    }
}

impl From<String> for SpanValue {
    fn from(s: String) -> Self {
        SpanValue::Text(s)
    }
}

impl From<&[u8]> for SpanValue {
    fn from(b: &[u8]) -> Self {
        SpanValue::Bytes(b.to_vec())
    }
}

impl From<serde_json::Value> for SpanValue {
    fn from(v: serde_json::Value) -> Self {
        SpanValue::Json(v)
    }
}

/// Progress event published to `notification.<notify-to>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub trace_id: String,
    pub span_id: String,
    pub parent_id: String,
    /// Event type: `request`, `response` or `error`.
    pub on: String,
    pub date: DateTime<Utc>,
    pub name: String,
    pub content: String,
}

/// A live span bound to the broker connection that will publish it.
pub struct SpanTracer {
    client: async_nats::Client,
    span: Span,
    next_traceparent: String,
    notify_to: Option<String>,
}

impl SpanTracer {
    /// Open a child span under `ctx`.
    ///
    /// The returned context carries a traceparent whose parent-id is the
    /// new span's id, so requests issued below nest under it.
    pub fn start(ctx: &TraceContext, client: &async_nats::Client, name: &str) -> (TraceContext, SpanTracer) {
        let mut tp = match ctx.traceparent().map(Traceparent::parse) {
            Some(Ok(tp)) => tp,
            _ => {
                let mut tp = Traceparent::new(true);
                tp.parent_id = String::new();
                tp
            }
        };

        let span = Span::new(&tp.trace_id, &tp.parent_id, name, SpanKind::Internal);
        tp.parent_id = span.span_id.clone();
        let next = tp.to_string();

        let next_ctx = TraceContext {
            traceparent: Some(next.clone()),
            notify_to: ctx.notify_to.clone(),
        };
        (
            next_ctx,
            SpanTracer {
                client: client.clone(),
                span,
                next_traceparent: next,
                notify_to: ctx.notify_to.clone(),
            },
        )
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Record the request payload and notify.
    pub async fn set_request(&mut self, value: impl Into<SpanValue>) {
        let content = value.into().render();
        self.span.set_attribute("request", content.clone());
        self.notify(content).await;
    }

    /// Record the response payload, promote status to ok, and notify.
    pub async fn set_response(&mut self, value: impl Into<SpanValue>) {
        if self.span.status == Status::Unset {
            self.span.status = Status::Ok;
        }
        let content = value.into().render();
        self.span.set_attribute("response", content.clone());
        self.notify(content).await;
    }

    /// Record a failure, set error status, and notify.
    ///
    /// The status code is parsed from a leading `<int>:` message prefix.
    pub async fn set_error(&mut self, error: &(dyn std::fmt::Display + Send + Sync)) {
        let message = error.to_string();
        tracing::error!(message = %message, "span error");
        self.span.status = Status::Error;
        self.span.status_code = jumon_core::error::parse_status_code(&message);
        self.span.set_attribute("error", message.clone());
        self.notify(message).await;
    }

    /// Stamp the end time and publish the span.
    pub async fn end(mut self) {
        self.span.end();
        let subject = format!(
            "{}.{}.{}",
            TRACE_SUBJECT, self.span.trace_id, self.span.span_id
        );
        if let Err(e) = self.client.publish(subject, self.span.to_json().into()).await {
            warn!(error = %e, "publish span");
        }
    }

    /// Headers for a response carrying this span's correlation onward.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_TRACEPARENT, self.next_traceparent.as_str());
        headers.insert(HEADER_NOTIFY_TO, self.notify_to.as_deref().unwrap_or(""));
        headers
    }

    async fn notify(&self, content: String) {
        let Some(notify_to) = self.notify_to.as_deref() else {
            return;
        };

        let on = match self.span.status {
            Status::Ok => "response",
            Status::Error => "error",
            Status::Unset => "request",
        };
        let notification = Notification {
            trace_id: self.span.trace_id.clone(),
            span_id: self.span.span_id.clone(),
            parent_id: self.span.parent_id.clone(),
            on: on.to_string(),
            date: Utc::now(),
            name: self.span.name.clone(),
            content,
        };
        let Ok(data) = serde_json::to_vec(&notification) else {
            return;
        };
        debug!(notify_to = %notify_to, on = %on, "notify");
        let subject = format!("{}.{}", NOTIFICATION_SUBJECT, notify_to);
        if let Err(e) = self.client.publish(subject, data.into()).await {
            warn!(error = %e, "publish notification");
        }
    }
}

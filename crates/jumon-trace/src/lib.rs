//! Span tracing and notification publishing.
//!
//! Correlation is carried in broker headers only, never shared memory: a
//! [`TraceContext`] is an immutable value holding the `traceparent` and
//! `notify-to` headers. [`SpanTracer::start`] mints a child span and
//! returns a rewritten context whose parent-id is the new span, so
//! downstream requests nest correctly. Finished spans publish to
//! `trace.<trace-id>.<span-id>`; when a notify-to id is present, request,
//! response and error events also publish to `notification.<id>`.

mod span;
mod traceparent;
mod tracer;

pub use span::{Span, SpanKind, Status};
pub use traceparent::Traceparent;
pub use tracer::{Notification, SpanTracer, SpanValue, TraceContext};

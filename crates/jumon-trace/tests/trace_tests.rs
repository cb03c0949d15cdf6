//! Tests for jumon-trace: traceparent parsing, span model, content rendering

use jumon_trace::{Span, SpanKind, SpanValue, Status, Traceparent};

// ===========================================================================
// traceparent
// ===========================================================================

#[test]
fn traceparent_round_trip() {
    let tp = Traceparent::new(true);
    let parsed = Traceparent::parse(&tp.to_string()).unwrap();
    assert_eq!(parsed, tp);
}

#[test]
fn traceparent_format() {
    let tp = Traceparent {
        version: "00".to_string(),
        trace_id: "0af7651916cd43dd8448eb211c80319c".to_string(),
        parent_id: "b7ad6b7169203331".to_string(),
        trace_flag: "01".to_string(),
    };
    assert_eq!(
        tp.to_string(),
        "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
    );
}

#[test]
fn traceparent_parse_invalid() {
    for input in [
        "",
        "00-short-b7ad6b7169203331-01",
        "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331",
        "not a traceparent at all",
    ] {
        assert!(Traceparent::parse(input).is_err(), "accepted: {input}");
    }
}

#[test]
fn traceparent_parse_trims_whitespace() {
    let input = "  00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01  ";
    let tp = Traceparent::parse(input).unwrap();
    assert_eq!(tp.trace_id, "0af7651916cd43dd8448eb211c80319c");
}

#[test]
fn new_ids_are_hex_with_expected_length() {
    let tp = Traceparent::new(false);
    assert_eq!(tp.trace_id.len(), 32);
    assert_eq!(tp.parent_id.len(), 16);
    assert!(tp.trace_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert!(tp.parent_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(tp.trace_flag, "00");
}

// ===========================================================================
// span
// ===========================================================================

#[test]
fn span_status_serializes_as_integer() {
    let mut span = Span::new("t", "p", "chat.generate", SpanKind::Internal);
    span.status = Status::Error;
    span.status_code = 500100;

    let json: serde_json::Value = serde_json::from_slice(&span.to_json()).unwrap();
    assert_eq!(json["status"], 2);
    assert_eq!(json["kind"], 1);
    assert_eq!(json["status_code"], 500100);
    assert_eq!(json["name"], "chat.generate");
}

#[test]
fn span_end_stamps_time() {
    let mut span = Span::new("t", "p", "x", SpanKind::Internal);
    assert!(!span.is_ended());
    span.end();
    assert!(span.is_ended());
}

#[test]
fn span_id_length() {
    let span = Span::new("trace", "", "x", SpanKind::Internal);
    assert_eq!(span.span_id.len(), 16);
}

// ===========================================================================
// span value rendering
// ===========================================================================

#[test]
fn span_value_render() {
    assert_eq!(SpanValue::from("hello world").render(), "hello world");
    assert_eq!(
        SpanValue::from(br#"{"key":"value"}"#.as_slice()).render(),
        r#"{"key":"value"}"#
    );
    assert_eq!(
        SpanValue::from(serde_json::json!({"key": "value"})).render(),
        r#"{"key":"value"}"#
    );
}

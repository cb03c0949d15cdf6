//! Tests for jumon-event: template formatting and key derivation

use jumon_event::{format_json, Event, EventType};

// ===========================================================================
// template formatting
// ===========================================================================

#[test]
fn format_json_no_template_strips_fences() {
    let input = b"\n```json\n{\"foo\":\"bar\"}\n```\n";
    let got = format_json(input, "").unwrap();
    assert_eq!(got, br#"{"foo":"bar"}"#);
}

#[test]
fn format_json_with_template() {
    let got = format_json(br#"{"foo":"bar"}"#, r#"{"buz":"{{ foo }}"}"#).unwrap();
    assert_eq!(got, br#"{"buz":"bar"}"#);
}

#[test]
fn format_json_template_over_fenced_input() {
    let input = b"```json\n{\"city\":\"tokyo\",\"temp\":21}\n```";
    let got = format_json(input, "{{ city }}: {{ temp }}").unwrap();
    assert_eq!(got, b"tokyo: 21");
}

#[test]
fn format_json_invalid_json_with_template_fails() {
    assert!(format_json(b"not json", "{{ x }}").is_err());
}

#[test]
fn format_json_invalid_json_without_template_passes_through() {
    let got = format_json(b"not json", "").unwrap();
    assert_eq!(got, b"not json");
}

// ===========================================================================
// key derivation
// ===========================================================================

fn event(kind: EventType) -> Event {
    Event {
        kind,
        subscribe_subject: "event.a".to_string(),
        publish_subject: "event.b".to_string(),
        consumer: String::new(),
        module: "test/module".to_string(),
        template: String::new(),
    }
}

#[test]
fn key_by_type() {
    assert_eq!(event(EventType::Subscribe).key(), "subscribe.event.a");
    assert_eq!(event(EventType::Forward).key(), "forward.event.a");
    assert_eq!(event(EventType::Consume).key(), "consume.event.a");
    assert_eq!(event(EventType::Publish).key(), "publish.test/module");
}

// ===========================================================================
// serde
// ===========================================================================

#[test]
fn event_type_serializes_lowercase() {
    let json = serde_json::to_value(event(EventType::Forward)).unwrap();
    assert_eq!(json["type"], "forward");
    assert_eq!(json["subscribe_subject"], "event.a");
}

#[test]
fn event_decodes_from_json() {
    let event: Event = serde_json::from_str(
        r#"{"type":"subscribe","subscribe_subject":"event.a","module":"test/module"}"#,
    )
    .unwrap();
    assert_eq!(event.kind, EventType::Subscribe);
    assert_eq!(event.module, "test/module");
    assert_eq!(event.publish_subject, "");
}

//! Tests for jumon-core: data URLs, subject escaping, coded errors, frontmatter

use jumon_core::error::parse_status_code;
use jumon_core::{dataurl, frontmatter, subject, Coded};
use serde::Deserialize;

// ===========================================================================
// dataurl
// ===========================================================================

#[test]
fn dataurl_encode_json() {
    let got = dataurl::encode("application/json", br#"{"key":"value"}"#);
    assert_eq!(got, "data:application/json;base64,eyJrZXkiOiJ2YWx1ZSJ9");
}

#[test]
fn dataurl_encode_empty() {
    let got = dataurl::encode("text/plain", b"");
    assert_eq!(got, "data:text/plain;base64,");
}

#[test]
fn dataurl_decode_json() {
    let (data, mime) = dataurl::decode("data:application/json;base64,eyJrZXkiOiJ2YWx1ZSJ9").unwrap();
    assert_eq!(data, br#"{"key":"value"}"#);
    assert_eq!(mime, "application/json;base64");
}

#[test]
fn dataurl_decode_no_comma() {
    assert!(dataurl::decode("data:application/json;base64").is_err());
}

#[test]
fn dataurl_decode_invalid_base64() {
    assert!(dataurl::decode("data:application/json;base64,!@#$").is_err());
}

#[test]
fn dataurl_decode_missing_prefix() {
    assert!(dataurl::decode("application/json;base64,eyJrZXkiOiJ2YWx1ZSJ9").is_err());
}

#[test]
fn dataurl_round_trip() {
    let data = b"hello \xf0\x9f\x8c\x8d world";
    let url = dataurl::encode("text/plain", data);
    let (decoded, mime) = dataurl::decode(&url).unwrap();
    assert_eq!(decoded, data);
    assert_eq!(mime, "text/plain;base64");
}

#[test]
fn detect_mime_variants() {
    assert_eq!(dataurl::detect_mime(br#"{"a":1}"#), "application/json");
    assert_eq!(dataurl::detect_mime(b"plain text"), "text/plain");
    assert_eq!(dataurl::detect_mime(&[0xff, 0xfe, 0x00]), "application/octet-stream");
}

// ===========================================================================
// subject escaping
// ===========================================================================

#[test]
fn subject_escape_round_trip() {
    for input in ["https://example.com/a/b?c=d", "日本語テキスト", "", "a.b.>"] {
        assert_eq!(subject::unescape(&subject::escape(input)), input);
    }
}

#[test]
fn subject_escape_is_token_safe() {
    let escaped = subject::escape("https://example.com/path?query=1");
    assert!(!escaped.contains('.'));
    assert!(!escaped.contains('/'));
    assert!(!escaped.contains('='));
}

#[test]
fn subject_unescape_invalid() {
    assert_eq!(subject::unescape("not base64 !!"), "");
}

// ===========================================================================
// coded errors
// ===========================================================================

#[test]
fn coded_error_format() {
    const ERR: Coded = Coded::new(400100, "bad request");
    let err = ERR.wrap("decode failed");
    assert_eq!(err.to_string(), "400100: bad request: decode failed");
    assert_eq!(err.code(), 400100);
}

#[test]
fn coded_service_error() {
    const ERR: Coded = Coded::new(500300, "run script failed");
    let service_error = ERR.service_error("boom");
    assert_eq!(service_error.code, 500300);
    assert_eq!(service_error.status, "run script failed: boom");
}

#[test]
fn parse_status_code_prefix() {
    assert_eq!(parse_status_code("500102: verify failed: nope"), 500102);
    assert_eq!(parse_status_code("no code here"), 0);
    assert_eq!(parse_status_code("abc: def"), 0);
}

// ===========================================================================
// frontmatter
// ===========================================================================

#[derive(Debug, Default, Deserialize)]
struct Envelope {
    #[serde(default)]
    module: String,
}

#[test]
fn frontmatter_yaml() {
    let input = "---\nmodule: test/module\n---\n# body\ncontent";
    let (envelope, body): (Envelope, String) = frontmatter::unmarshal(input).unwrap();
    assert_eq!(envelope.module, "test/module");
    assert_eq!(body.trim(), "# body\ncontent");
}

#[test]
fn frontmatter_toml() {
    let input = "+++\nmodule = \"test/module\"\n+++\nbody";
    let (envelope, body): (Envelope, String) = frontmatter::unmarshal(input).unwrap();
    assert_eq!(envelope.module, "test/module");
    assert_eq!(body.trim(), "body");
}

#[test]
fn frontmatter_absent() {
    let input = "# just a body";
    let (envelope, body): (Envelope, String) = frontmatter::unmarshal(input).unwrap();
    assert_eq!(envelope.module, "");
    assert_eq!(body, "# just a body");
}

#[test]
fn frontmatter_unterminated() {
    let input = "---\nmodule: x\nno closing";
    let result: Result<(Envelope, String), _> = frontmatter::unmarshal(input);
    assert!(result.is_err());
}

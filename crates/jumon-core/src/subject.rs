//! Broker subject-name escaping.
//!
//! URLs and other arbitrary strings are not valid subject tokens; they are
//! carried as unpadded URL-safe base64 instead. The same escaping doubles
//! as the object-store cache key.

use base64::prelude::{Engine as _, BASE64_URL_SAFE_NO_PAD};

/// Escape an arbitrary string into a single subject token.
pub fn escape(subject: &str) -> String {
    BASE64_URL_SAFE_NO_PAD.encode(subject.as_bytes())
}

/// Reverse [`escape`]. Returns an empty string for invalid input.
pub fn unescape(escaped: &str) -> String {
    BASE64_URL_SAFE_NO_PAD
        .decode(escaped.as_bytes())
        .ok()
        .and_then(|b| String::from_utf8(b).ok())
        .unwrap_or_default()
}

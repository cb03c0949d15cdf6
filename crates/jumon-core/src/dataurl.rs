//! Data-URL codec.
//!
//! Script and tool inputs travel as `data:<mime>;base64,<payload>` strings
//! so that binary payloads survive JSON bodies untouched.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataUrlError {
    #[error("invalid data URL: {0}")]
    InvalidFormat(String),

    #[error("base64 decode failed: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Encode data as a base64 data URL.
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, BASE64_STANDARD.encode(data))
}

/// Decode a data URL into its payload and MIME descriptor.
///
/// The descriptor is everything between `data:` and the comma, including
/// the `;base64` marker (e.g. `application/json;base64`).
pub fn decode(data_url: &str) -> Result<(Vec<u8>, String), DataUrlError> {
    let parts: Vec<&str> = data_url.split(',').collect();
    if parts.len() != 2 {
        return Err(DataUrlError::InvalidFormat(data_url.to_string()));
    }
    let mime = parts[0]
        .strip_prefix("data:")
        .ok_or_else(|| DataUrlError::InvalidFormat(data_url.to_string()))?;

    let data = BASE64_STANDARD.decode(parts[1])?;
    Ok((data, mime.to_string()))
}

/// Best-effort MIME sniffing for tool and script inputs.
///
/// JSON-looking bytes map to `application/json`, other valid UTF-8 to
/// `text/plain`, anything else to `application/octet-stream`.
pub fn detect_mime(data: &[u8]) -> &'static str {
    if data.is_empty() {
        return "text/plain";
    }
    if serde_json::from_slice::<serde_json::Value>(data).is_ok() {
        return "application/json";
    }
    if std::str::from_utf8(data).is_ok() {
        return "text/plain";
    }
    "application/octet-stream"
}

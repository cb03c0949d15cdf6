//! Coded error model shared by every jumon service.
//!
//! A `Coded` is a constant `(code, description)` pair. Codes are 3-byte
//! integers shaped `<http-class><domain-digit><sub>`: 400100 is a chat
//! domain bad request, 500300 a script domain execution failure. Domains:
//! 100 chat, 200 tool, 300 script, 400 module, 500 event.
//!
//! Errors cross the broker as service-error headers; `wrap` keeps the
//! `<code>: <description>: <cause>` shape so callers can re-wrap remote
//! failures with their own code while the original stays in the message.

use thiserror::Error;

/// A coded error constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coded {
    code: u32,
    description: &'static str,
}

impl Coded {
    pub const fn new(code: u32, description: &'static str) -> Self {
        Self { code, description }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Attach a cause, producing an error that displays as
    /// `<code>: <description>: <cause>`.
    pub fn wrap(self, cause: impl std::fmt::Display) -> CodedError {
        CodedError {
            coded: self,
            cause: cause.to_string(),
        }
    }

    /// Project into the broker service-error representation
    /// (`Nats-Service-Error-Code` / `Nats-Service-Error` headers).
    pub fn service_error(self, cause: impl std::fmt::Display) -> async_nats::service::error::Error {
        async_nats::service::error::Error {
            code: self.code as usize,
            status: format!("{}: {}", self.description, cause),
        }
    }
}

impl std::fmt::Display for Coded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.description)
    }
}

/// A `Coded` with a concrete cause attached.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{coded}: {cause}")]
pub struct CodedError {
    coded: Coded,
    cause: String,
}

impl CodedError {
    pub fn code(&self) -> u32 {
        self.coded.code()
    }

    pub fn coded(&self) -> Coded {
        self.coded
    }

    pub fn cause(&self) -> &str {
        &self.cause
    }

    pub fn service_error(&self) -> async_nats::service::error::Error {
        self.coded.service_error(&self.cause)
    }
}

/// Extract a remote service error from response headers, if present.
///
/// Returns `(code, message)` from the `Nats-Service-Error-Code` /
/// `Nats-Service-Error` pair.
pub fn remote_service_error(message: &async_nats::Message) -> Option<(String, String)> {
    let headers = message.headers.as_ref()?;
    let code = headers.get("Nats-Service-Error-Code")?.as_str().to_string();
    if code.is_empty() || code == "0" {
        return None;
    }
    let description = headers
        .get("Nats-Service-Error")
        .map(|v| v.as_str().to_string())
        .unwrap_or_default();
    Some((code, description))
}

/// Parse the leading `<int>:` prefix of an error message, if any.
///
/// Remote service errors arrive as `<code>: <description>: <cause>`; spans
/// record the numeric code when one is present.
pub fn parse_status_code(message: &str) -> u32 {
    match message.split_once(':') {
        Some((head, _)) => head.trim().parse().unwrap_or(0),
        None => 0,
    }
}

//! Client side of `chat.generate`.

use crate::types::{Request, Response};
use jumon_trace::TraceContext;
use thiserror::Error;

pub const SUBJECT: &str = "chat.generate";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("marshal chat: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("nats: {0}")]
    Transport(String),

    #[error("{0}: {1}")]
    Service(String, String),
}

/// Request a generation from the chat service, carrying correlation headers.
pub async fn generate(
    ctx: &TraceContext,
    client: &async_nats::Client,
    request: &Request,
) -> Result<Response, GenerateError> {
    let payload = serde_json::to_vec(request)?;

    let nats_request = async_nats::Request::new()
        .payload(payload.into())
        .headers(ctx.headers());

    let reply = client
        .send_request(SUBJECT, nats_request)
        .await
        .map_err(|e| GenerateError::Transport(e.to_string()))?;

    if let Some((code, message)) = jumon_core::error::remote_service_error(&reply) {
        return Err(GenerateError::Service(code, message));
    }

    let response: Response = serde_json::from_slice(&reply.payload)?;
    Ok(response)
}

//! Endpoint response helper.
//!
//! The service API responds without headers; success responses that must
//! carry span correlation publish to the reply subject directly.

use bytes::Bytes;

/// Respond to a service request with headers attached.
pub async fn with_headers(
    client: &async_nats::Client,
    request: &async_nats::service::Request,
    headers: async_nats::HeaderMap,
    payload: Bytes,
) -> Result<(), async_nats::PublishError> {
    let Some(reply) = request.message.reply.clone() else {
        return Ok(());
    };
    client.publish_with_headers(reply, headers, payload).await
}

//! Chat generation microservice.
//!
//! Subject: `chat.generate`. Headers: `traceparent`, `notify-to`,
//! `baseurl`, `stream-to`.

use crate::checks::{extract_current_checks, remove_checks};
use crate::provider::{GenerateOptions, Generator};
use crate::types::{Request, Response};
use crate::verify::verify_response;
use async_nats::service::ServiceExt;
use jumon_core::config::{self, ConfigKey};
use jumon_core::{Coded, CodedError};
use jumon_trace::{SpanTracer, TraceContext};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const ERR_BAD_REQUEST: Coded = Coded::new(400100, "bad request");
pub const ERR_GENERATION: Coded = Coded::new(500100, "chat generation failed");
pub const ERR_VERIFY: Coded = Coded::new(500101, "verify operation failed");
pub const ERR_VERIFY_FAILED: Coded = Coded::new(500102, "verify failed");

/// Start the chat service.
pub async fn start(
    client: async_nats::Client,
    generator: Arc<dyn Generator>,
) -> Result<async_nats::service::Service, async_nats::Error> {
    let service = client
        .service_builder()
        .description("jumon chat service")
        .queue_group("chat")
        .start("jumon_chat", "0.1.0")
        .await?;

    let mut endpoint = service.group("chat").endpoint("generate").await?;

    let endpoint_client = client.clone();
    tokio::spawn(async move {
        use futures::StreamExt;
        while let Some(request) = endpoint.next().await {
            let client = endpoint_client.clone();
            let generator = generator.clone();
            tokio::spawn(async move {
                generate_handler(client, generator, request).await;
            });
        }
    });

    info!(status = "started", "chat service");
    Ok(service)
}

async fn generate_handler(
    client: async_nats::Client,
    generator: Arc<dyn Generator>,
    request: async_nats::service::Request,
) {
    info!(status = "started", "chat generate");

    let ctx = TraceContext::from_headers(request.message.headers.as_ref());
    let (_ctx, mut span) = SpanTracer::start(&ctx, &client, "chat.generate");

    let mut chat_request: Request = match serde_json::from_slice(&request.message.payload) {
        Ok(req) => req,
        Err(e) => {
            span.set_error(&ERR_BAD_REQUEST.wrap(&e)).await;
            let _ = request.respond(Err(ERR_BAD_REQUEST.service_error(e))).await;
            span.end().await;
            return;
        }
    };

    let header = |name: &str| {
        request
            .message
            .headers
            .as_ref()
            .and_then(|h| h.get(name))
            .map(|v| v.as_str().to_string())
            .filter(|v| !v.is_empty())
    };

    // fan streamed chunks out to the caller-supplied subject
    let mut options = GenerateOptions {
        base_url: header("baseurl"),
        streamer: None,
    };
    if let Some(stream_to) = header("stream-to") {
        debug!(stream_to = %stream_to, "chat generate");
        let (tx, mut rx) = mpsc::unbounded_channel();
        options.streamer = Some(tx);
        let stream_client = client.clone();
        tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                let Ok(data) = serde_json::to_vec(&chunk) else {
                    continue;
                };
                if let Err(e) = stream_client.publish(stream_to.clone(), data.into()).await {
                    warn!(error = %e, "publish stream");
                    break;
                }
            }
        });
    }

    span.set_request(serde_json::to_value(&chat_request).unwrap_or_default())
        .await;

    // checks are handled out of band, never shown to the generator
    let checks = extract_current_checks(&chat_request);
    remove_checks(&mut chat_request);

    let response = match generator.generate(&chat_request, &options).await {
        Ok(resp) => resp,
        Err(e) => {
            info!(status = "completion failed", error = %e, "chat generate");
            span.set_error(&ERR_GENERATION.wrap(&e)).await;
            let _ = request.respond(Err(ERR_GENERATION.service_error(e))).await;
            span.end().await;
            return;
        }
    };

    span.set_response(serde_json::to_value(&response).unwrap_or_default())
        .await;

    if let Some(checks) = checks.as_deref() {
        if let Err(e) =
            handle_verify(&client, generator.as_ref(), &chat_request, &response, checks).await
        {
            span.set_error(&e).await;
            let _ = request.respond(Err(e.service_error())).await;
            span.end().await;
            return;
        }
    }

    let payload = serde_json::to_vec(&response).unwrap_or_default();
    if let Err(e) =
        jumon_core::respond::with_headers(&client, &request, span.headers(), payload.into()).await
    {
        warn!(error = %e, "chat generate respond");
    }
    span.end().await;
}

/// Verify the response against the extracted checks.
///
/// The configured verify model, when set, replaces the request model for
/// the verification call only.
async fn handle_verify(
    client: &async_nats::Client,
    generator: &dyn Generator,
    request: &Request,
    response: &Response,
    checks: &str,
) -> Result<(), CodedError> {
    info!(status = "started", checks = %checks, "chat verify");

    let mut request = request.clone();
    match config::get(client, ConfigKey::DefaultVerifyModel).await {
        Ok(model) if !model.is_empty() => request.model = model,
        Ok(_) => {}
        Err(e) => warn!(error = %e, "get default verify model"),
    }

    let passed = verify_response(generator, &request, response, checks)
        .await
        .map_err(|e| ERR_VERIFY.wrap(e))?;

    if !passed {
        let detail = format!("checks: {} response: {}", checks, response.text());
        info!(status = "verify failed", "chat verify");
        return Err(ERR_VERIFY_FAILED.wrap(detail));
    }
    Ok(())
}

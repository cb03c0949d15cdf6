//! Script microservice.
//!
//! Subject: `script.run`. Body: Script JSON. The run is wrapped in the
//! script's timeout (default 300 s).

use crate::run;
use crate::script::Script;
use async_nats::service::ServiceExt;
use futures::StreamExt;
use jumon_core::Coded;
use jumon_trace::{SpanTracer, TraceContext};
use std::time::Duration;
use tracing::{info, warn};

pub const ERR_VALIDATE_SCRIPT: Coded = Coded::new(400300, "validate script failed");
pub const ERR_RUN_SCRIPT: Coded = Coded::new(500300, "run script failed");

/// Start the script service.
pub async fn start(
    client: async_nats::Client,
) -> Result<async_nats::service::Service, async_nats::Error> {
    let service = client
        .service_builder()
        .description("jumon script service")
        .queue_group("script")
        .start("jumon_script", "0.1.0")
        .await?;

    let mut endpoint = service.group("script").endpoint("run").await?;

    let endpoint_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = endpoint.next().await {
            let client = endpoint_client.clone();
            tokio::spawn(async move {
                run_handler(client, request).await;
            });
        }
    });

    info!(status = "started", "script service");
    Ok(service)
}

async fn run_handler(client: async_nats::Client, request: async_nats::service::Request) {
    info!(status = "started", "script.run");

    let ctx = TraceContext::from_headers(request.message.headers.as_ref());
    let (ctx, mut span) = SpanTracer::start(&ctx, &client, "script.run");

    let script: Script = match serde_json::from_slice(&request.message.payload) {
        Ok(script) => script,
        Err(e) => {
            span.set_error(&ERR_VALIDATE_SCRIPT.wrap(&e)).await;
            let _ = request
                .respond(Err(ERR_VALIDATE_SCRIPT.service_error(e)))
                .await;
            span.end().await;
            return;
        }
    };

    if let Err(e) = script.validate() {
        span.set_error(&ERR_VALIDATE_SCRIPT.wrap(&e)).await;
        let _ = request
            .respond(Err(ERR_VALIDATE_SCRIPT.service_error(e)))
            .await;
        span.end().await;
        return;
    }

    span.set_request(serde_json::to_value(&script).unwrap_or_default())
        .await;

    let timeout = Duration::from_secs(script.timeout_seconds());
    let result = tokio::time::timeout(timeout, run::run(&ctx, &client, &script)).await;

    let output = match result {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            span.set_error(&ERR_RUN_SCRIPT.wrap(&e)).await;
            let _ = request.respond(Err(ERR_RUN_SCRIPT.service_error(e))).await;
            span.end().await;
            return;
        }
        Err(_) => {
            let e = format!("timed out after {}s", timeout.as_secs());
            span.set_error(&ERR_RUN_SCRIPT.wrap(&e)).await;
            let _ = request.respond(Err(ERR_RUN_SCRIPT.service_error(e))).await;
            span.end().await;
            return;
        }
    };

    span.set_response(output.as_slice()).await;
    if let Err(e) =
        jumon_core::respond::with_headers(&client, &request, span.headers(), output.into()).await
    {
        warn!(error = %e, "script.run respond");
    }
    span.end().await;
    info!(status = "finished", "script.run");
}

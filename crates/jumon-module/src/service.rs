//! Module microservice.
//!
//! Listens on `module.>`: `module.run.<modurl>` executes a module,
//! `module.put.<modurl>` parses and stores module Markdown.

use crate::{kv, parse, run};
use crate::run::{ERR_MODULE_NOT_FOUND, ERR_RUN_MODULE};
use async_nats::service::ServiceExt;
use futures::StreamExt;
use jumon_trace::{SpanTracer, TraceContext};
use std::time::Duration;
use tracing::{info, warn};

const PUT_TIMEOUT: Duration = Duration::from_secs(5);

/// Start the module service.
pub async fn start(
    client: async_nats::Client,
) -> Result<async_nats::service::Service, async_nats::Error> {
    let service = client
        .service_builder()
        .description("jumon module service")
        .start("jumon_module", "0.1.0")
        .await?;

    let mut endpoint = service.endpoint("module.>").await?;

    let endpoint_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = endpoint.next().await {
            let client = endpoint_client.clone();
            tokio::spawn(async move {
                let subject = request.message.subject.to_string();
                if subject.starts_with("module.run.") {
                    run_handler(client, request).await;
                } else if subject.starts_with("module.put.") {
                    put_handler(client, request).await;
                }
            });
        }
    });

    info!(status = "started", "module service");
    Ok(service)
}

/// Run the module named by the subject with the request body as input.
async fn run_handler(client: async_nats::Client, request: async_nats::service::Request) {
    let subject = request.message.subject.to_string();
    let modurl = subject.trim_start_matches("module.run.").to_string();
    if modurl.is_empty() {
        let _ = request
            .respond(Err(ERR_MODULE_NOT_FOUND.service_error("module url is empty")))
            .await;
        return;
    }
    info!(status = "started", modurl = %modurl, "module.run");

    let ctx = TraceContext::from_headers(request.message.headers.as_ref());
    let (ctx, mut span) = SpanTracer::start(&ctx, &client, "module.run");

    match run::run(&ctx, &client, &modurl, &request.message.payload).await {
        Ok(output) => {
            span.set_response(output.as_slice()).await;
            if let Err(e) =
                jumon_core::respond::with_headers(&client, &request, span.headers(), output.into())
                    .await
            {
                warn!(error = %e, "module.run respond");
            }
            info!(status = "finished", modurl = %modurl, "module.run");
        }
        Err(e) => {
            span.set_error(&ERR_RUN_MODULE.wrap(&e)).await;
            let _ = request.respond(Err(ERR_RUN_MODULE.service_error(e))).await;
        }
    }
    span.end().await;
}

/// Parse and store the module Markdown carried in the body.
async fn put_handler(client: async_nats::Client, request: async_nats::service::Request) {
    let subject = request.message.subject.to_string();
    let modurl = subject.trim_start_matches("module.put.").to_string();
    if modurl.is_empty() {
        let _ = request
            .respond(Err(ERR_MODULE_NOT_FOUND.service_error("module url is empty")))
            .await;
        return;
    }
    info!(status = "started", modurl = %modurl, "module.put");

    let result = tokio::time::timeout(PUT_TIMEOUT, put_module(&client, &request)).await;
    match result {
        Ok(Ok(())) => {
            let _ = request.respond(Ok("".into())).await;
            info!(status = "finished", modurl = %modurl, "module.put");
        }
        Ok(Err(e)) => {
            let _ = request.respond(Err(ERR_MODULE_NOT_FOUND.service_error(e))).await;
        }
        Err(_) => {
            let _ = request
                .respond(Err(ERR_MODULE_NOT_FOUND.service_error("put timed out")))
                .await;
        }
    }
}

async fn put_module(
    client: &async_nats::Client,
    request: &async_nats::service::Request,
) -> Result<(), String> {
    let kv = kv::keyvalue(client).await.map_err(|e| e.to_string())?;

    let module =
        parse::parse_markdown(&request.message.payload).map_err(|e| format!("parse module: {e}"))?;
    info!(module = %module.name, scripts = module.scripts.len(), status = "parsed", "module.put");

    kv.put(module.name.clone(), request.message.payload.clone())
        .await
        .map_err(|e| format!("put module: {e}"))?;
    Ok(())
}

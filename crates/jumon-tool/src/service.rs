//! Tool microservice.
//!
//! Subjects: `tool.run` plus the std endpoints `tool.std.time.{now,sleep}`.

use crate::tool::Tool;
use crate::{run, std_tools, ERR_RUN_TOOL, ERR_TOOL_VALIDATE};
use async_nats::jetstream::object_store::ObjectStore;
use async_nats::service::ServiceExt;
use futures::StreamExt;
use jumon_trace::{SpanTracer, TraceContext};
use tracing::{info, warn};

/// Start the tool service. `store` backs the resource cache.
pub async fn start(
    client: async_nats::Client,
    store: Option<ObjectStore>,
) -> Result<async_nats::service::Service, async_nats::Error> {
    let service = client
        .service_builder()
        .description("jumon tool service")
        .queue_group("tool")
        .start("jumon_tool", "0.1.0")
        .await?;

    let group = service.group("tool");
    let mut run_endpoint = group.endpoint("run").await?;

    let time_group = service.group("tool.std.time");
    let mut now_endpoint = time_group.endpoint("now").await?;
    let mut sleep_endpoint = time_group.endpoint("sleep").await?;

    let endpoint_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = run_endpoint.next().await {
            let client = endpoint_client.clone();
            let store = store.clone();
            tokio::spawn(async move {
                run_handler(client, store, request).await;
            });
        }
    });

    tokio::spawn(async move {
        while let Some(request) = now_endpoint.next().await {
            tokio::spawn(std_tools::handle_now(request));
        }
    });
    tokio::spawn(async move {
        while let Some(request) = sleep_endpoint.next().await {
            tokio::spawn(std_tools::handle_sleep(request));
        }
    });

    info!(status = "started", "tool service");
    Ok(service)
}

/// Run the given tool with its input; responds with the raw output bytes.
async fn run_handler(
    client: async_nats::Client,
    store: Option<ObjectStore>,
    request: async_nats::service::Request,
) {
    info!(status = "started", "tool.run");

    let ctx = TraceContext::from_headers(request.message.headers.as_ref());
    let (ctx, mut span) = SpanTracer::start(&ctx, &client, "tool.run");

    let mut tool: Tool = match serde_json::from_slice(&request.message.payload) {
        Ok(tool) => tool,
        Err(e) => {
            span.set_error(&ERR_TOOL_VALIDATE.wrap(&e)).await;
            let _ = request.respond(Err(ERR_TOOL_VALIDATE.service_error(e))).await;
            span.end().await;
            return;
        }
    };

    span.set_request(serde_json::to_value(&tool).unwrap_or_default())
        .await;

    match run::dispatch(&ctx, &client, store.as_ref(), &mut tool).await {
        Ok(output) => {
            span.set_response(output.as_slice()).await;
            info!(status = "finished", "tool.run");
            if let Err(e) =
                jumon_core::respond::with_headers(&client, &request, span.headers(), output.into())
                    .await
            {
                warn!(error = %e, "tool.run respond");
            }
        }
        Err(e) => {
            span.set_error(&e).await;
            let _ = request.respond(Err(ERR_RUN_TOOL.service_error(e))).await;
        }
    }
    span.end().await;
}

//! Tool execution: the broker client call and the in-service dispatch.

use crate::plugin::{run_nats_plugin, run_script_plugin, run_wasm_plugin};
use crate::tool::Tool;
use crate::{ERR_LOAD_RESOURCES, ERR_TOOL_VALIDATE, ERR_UNKNOWN_TOOL_TYPE};
use async_nats::jetstream::object_store::ObjectStore;
use jumon_core::CodedError;
use jumon_trace::TraceContext;
use thiserror::Error;
use tracing::{debug, info};

pub const SUBJECT: &str = "tool.run";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to marshal tool: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to request tool: {0}")]
    Transport(String),

    #[error("tool error: {0}: {1}")]
    Service(String, String),
}

/// Run a tool through the tool service.
pub async fn run(
    ctx: &TraceContext,
    client: &async_nats::Client,
    tool: &Tool,
) -> Result<Vec<u8>, RunError> {
    info!(status = "start", tool = %tool.name, "run tool");

    let data = serde_json::to_vec(tool)?;
    debug!(tool = %tool.name, inputsize = tool.input_url.len(), "run tool");

    let request = async_nats::Request::new()
        .payload(data.into())
        .headers(ctx.headers());
    let reply = client
        .send_request(SUBJECT, request)
        .await
        .map_err(|e| RunError::Transport(e.to_string()))?;

    if let Some((code, message)) = jumon_core::error::remote_service_error(&reply) {
        return Err(RunError::Service(code, message));
    }

    info!(status = "end", tool = %tool.name, "run tool");
    Ok(reply.payload.to_vec())
}

/// Execute a tool in-service.
///
/// 1. Validates the tool.
/// 2. Loads resources.
/// 3. Dispatches by kind.
/// 4. Cleans up resources.
pub(crate) async fn dispatch(
    ctx: &TraceContext,
    client: &async_nats::Client,
    store: Option<&ObjectStore>,
    tool: &mut Tool,
) -> Result<Vec<u8>, CodedError> {
    tool.validate()
        .map_err(|e| ERR_TOOL_VALIDATE.wrap(format!("validate tool: {e}")))?;

    tool.load_resources(store)
        .await
        .map_err(|e| ERR_LOAD_RESOURCES.wrap(format!("load resources: {e}")))?;

    let result = match tool.kind.as_str() {
        "wasm" => run_wasm_plugin(tool).await,
        "nats" => run_nats_plugin(ctx, client, tool).await,
        "script" => run_script_plugin(ctx, client, tool).await,
        other => Err(ERR_UNKNOWN_TOOL_TYPE.wrap(format!("unknown type: {other}"))),
    };

    tool.close_resources();
    result
}

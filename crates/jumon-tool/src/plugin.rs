//! Plugin runners for the three tool kinds.

use crate::tool::Tool;
use crate::wasm::WasmRunner;
use crate::{
    ERR_NATS_VALIDATE, ERR_RUN_SCRIPT, ERR_RUN_WASM, ERR_SCRIPT_VALIDATE, ERR_WASM_VALIDATE,
};
use jumon_core::CodedError;
use jumon_trace::TraceContext;
use tracing::debug;

/// Run a wasm plugin and return its output.
pub async fn run_wasm_plugin(tool: &Tool) -> Result<Vec<u8>, CodedError> {
    let runner = WasmRunner::new(&tool.arguments, &tool.resources)
        .map_err(|e| ERR_WASM_VALIDATE.wrap(format!("wasm runner create failed: {e}")))?;

    let input = tool
        .input()
        .map_err(|e| ERR_WASM_VALIDATE.wrap(format!("input decode failed: {e}")))?;

    // execution is synchronous and fuel-bounded
    let output = tokio::task::spawn_blocking(move || runner.run(&input))
        .await
        .map_err(|e| ERR_RUN_WASM.wrap(format!("wasm task failed: {e}")))?
        .map_err(|e| ERR_RUN_WASM.wrap(format!("wasm runner run failed: {e}")))?;

    debug!(size = output.len(), "wasm output");
    Ok(output)
}

/// Run a broker-subject plugin: request-reply to the configured subject.
pub async fn run_nats_plugin(
    ctx: &TraceContext,
    client: &async_nats::Client,
    tool: &Tool,
) -> Result<Vec<u8>, CodedError> {
    let subject = tool
        .string_argument("subject")
        .ok_or_else(|| ERR_NATS_VALIDATE.wrap("nats subject is not set"))?
        .to_string();

    let input = tool
        .input()
        .map_err(|e| ERR_NATS_VALIDATE.wrap(format!("input decode failed: {e}")))?;

    debug!(subject = %subject, "nats plugin");

    let request = async_nats::Request::new()
        .payload(input.into())
        .headers(ctx.headers());
    let reply = client
        .send_request(subject, request)
        .await
        .map_err(|e| ERR_NATS_VALIDATE.wrap(format!("nats request failed: {e}")))?;

    if let Some((code, message)) = jumon_core::error::remote_service_error(&reply) {
        return Err(ERR_NATS_VALIDATE.wrap(format!("{code}: {message}")));
    }

    Ok(reply.payload.to_vec())
}

/// Run a script plugin: request-reply to `script.run` with the serialized
/// script as body.
pub async fn run_script_plugin(
    ctx: &TraceContext,
    client: &async_nats::Client,
    tool: &Tool,
) -> Result<Vec<u8>, CodedError> {
    let script = tool
        .string_argument("script")
        .ok_or_else(|| ERR_SCRIPT_VALIDATE.wrap("script is not set"))?
        .to_string();

    let request = async_nats::Request::new()
        .payload(script.into_bytes().into())
        .headers(ctx.headers());
    let reply = client
        .send_request("script.run", request)
        .await
        .map_err(|e| ERR_RUN_SCRIPT.wrap(format!("script run failed: {e}")))?;

    if let Some((_, message)) = jumon_core::error::remote_service_error(&reply) {
        return Err(ERR_RUN_SCRIPT.wrap(format!("script error: {message}")));
    }

    Ok(reply.payload.to_vec())
}

//! Built-in tools under `tool.std.>`.

use async_nats::service::Request;
use chrono::{SecondsFormat, Utc};
use tracing::debug;

/// `tool.std.time.now`: current time as an RFC3339 JSON string.
pub async fn handle_now(request: Request) {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let payload = serde_json::to_vec(&now).unwrap_or_default();
    let _ = request.respond(Ok(payload.into())).await;
}

/// `tool.std.time.sleep`: sleep the given number of seconds (min 1) and
/// echo it back.
pub async fn handle_sleep(request: Request) {
    let seconds: u64 = std::str::from_utf8(&request.message.payload)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1)
        .max(1);

    debug!(seconds, "std sleep");
    tokio::time::sleep(std::time::Duration::from_secs(seconds)).await;

    let payload = serde_json::to_vec(&seconds).unwrap_or_default();
    let _ = request.respond(Ok(payload.into())).await;
}

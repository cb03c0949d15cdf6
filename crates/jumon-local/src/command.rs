//! Shell command handler gated by an allowed-prefix list.

use crate::service::LocalConfig;
use async_nats::service::Request;
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct CommandResponse {
    pub code: i32,
    pub output: String,
    pub error: String,
}

/// `local.exec`: run the `command` header through `sh -c` when it matches
/// an allowed prefix.
pub async fn command_handler(config: &LocalConfig, request: Request) {
    let command = request
        .message
        .headers
        .as_ref()
        .and_then(|h| h.get("command"))
        .map(|v| v.as_str().to_string())
        .unwrap_or_default();

    let allowed = config
        .allowed_commands
        .iter()
        .any(|prefix| command.starts_with(prefix.as_str()));
    if !allowed {
        let _ = request
            .respond(Err(async_nats::service::error::Error {
                code: 400,
                status: "command not allowed".to_string(),
            }))
            .await;
        return;
    }

    info!(run = %command, "command");
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(&command)
        .current_dir(&config.working_dir)
        .output()
        .await;

    match output {
        Ok(output) => {
            let response = CommandResponse {
                code: output.status.code().unwrap_or(-1),
                output: String::from_utf8_lossy(&output.stdout).to_string(),
                error: String::from_utf8_lossy(&output.stderr).to_string(),
            };
            let payload = serde_json::to_vec(&response).unwrap_or_default();
            let _ = request.respond(Ok(payload.into())).await;
        }
        Err(e) => {
            error!(error = %e, "command");
            let _ = request
                .respond(Err(async_nats::service::error::Error {
                    code: 500,
                    status: format!("command execution failed: {e}"),
                }))
                .await;
        }
    }
}

//! File handlers rooted at the configured working directory.

use crate::service::LocalConfig;
use async_nats::service::Request;
use std::path::{Path, PathBuf};

/// Resolve `path` inside the working directory, rejecting escapes.
fn resolve(config: &LocalConfig, path: &str) -> Result<PathBuf, String> {
    let relative = Path::new(path);
    if relative.is_absolute() {
        return Err(format!("absolute path not allowed: {path}"));
    }
    if relative
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
    {
        return Err(format!("path escapes working directory: {path}"));
    }
    Ok(config.working_dir.join(relative))
}

fn header_path(request: &Request) -> String {
    request
        .message
        .headers
        .as_ref()
        .and_then(|h| h.get("path"))
        .map(|v| v.as_str().to_string())
        .unwrap_or_default()
}

fn respond_error(request: Request, code: usize, message: String) {
    tokio::spawn(async move {
        let _ = request
            .respond(Err(async_nats::service::error::Error {
                code,
                status: message,
            }))
            .await;
    });
}

/// `local.file.list`: directory entry names as a JSON array.
pub async fn list_handler(config: &LocalConfig, request: Request) {
    let path = match resolve(config, &header_path(&request)) {
        Ok(path) => path,
        Err(e) => return respond_error(request, 403, e),
    };

    let mut entries = match tokio::fs::read_dir(&path).await {
        Ok(entries) => entries,
        Err(e) => return respond_error(request, 500, format!("failed to read directory: {e}")),
    };

    let mut names = Vec::new();
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.push(entry.file_name().to_string_lossy().to_string());
    }

    let payload = serde_json::to_vec(&names).unwrap_or_default();
    let _ = request.respond(Ok(payload.into())).await;
}

/// `local.file.read`: raw file bytes.
pub async fn read_handler(config: &LocalConfig, request: Request) {
    let path = match resolve(config, &header_path(&request)) {
        Ok(path) => path,
        Err(e) => return respond_error(request, 403, e),
    };

    match tokio::fs::read(&path).await {
        Ok(data) => {
            let _ = request.respond(Ok(data.into())).await;
        }
        Err(e) => respond_error(request, 500, format!("failed to read file: {e}")),
    }
}

/// `local.file.write`: write the body to the given path, honoring the
/// read-only and create-only modes.
pub async fn write_handler(config: &LocalConfig, request: Request) {
    if config.read_only {
        return respond_error(request, 403, "read only mode".to_string());
    }

    let raw_path = header_path(&request);
    let path = match resolve(config, &raw_path) {
        Ok(path) => path,
        Err(e) => return respond_error(request, 403, e),
    };

    if config.create_only && path.exists() {
        return respond_error(request, 403, format!("append only mode: {raw_path}"));
    }

    match tokio::fs::write(&path, &request.message.payload).await {
        Ok(()) => {
            let _ = request.respond(Ok("".into())).await;
        }
        Err(e) => respond_error(request, 500, format!("failed to write file: {e}")),
    }
}

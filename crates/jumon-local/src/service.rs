//! Local microservice: `local.file.{read,write,list}` and `local.exec`.

use crate::{command, file};
use async_nats::service::ServiceExt;
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone)]
pub struct LocalConfig {
    pub working_dir: PathBuf,
    pub read_only: bool,
    pub create_only: bool,
    pub allowed_commands: Vec<String>,
}

#[derive(Debug, Error)]
pub enum LocalConfigError {
    #[error("working directory is required")]
    MissingWorkingDir,

    #[error("working directory cannot be root")]
    RootWorkingDir,

    #[error("working directory does not exist: {0}")]
    NotFound(String),

    #[error("working directory is not a directory: {0}")]
    NotADirectory(String),
}

fn check_working_dir(config: &LocalConfig) -> Result<(), LocalConfigError> {
    if config.working_dir.as_os_str().is_empty() {
        return Err(LocalConfigError::MissingWorkingDir);
    }
    if config.working_dir == PathBuf::from("/") {
        return Err(LocalConfigError::RootWorkingDir);
    }
    let display = config.working_dir.display().to_string();
    let Ok(metadata) = std::fs::metadata(&config.working_dir) else {
        return Err(LocalConfigError::NotFound(display));
    };
    if !metadata.is_dir() {
        return Err(LocalConfigError::NotADirectory(display));
    }
    Ok(())
}

/// Start the local service.
pub async fn start(
    client: async_nats::Client,
    config: LocalConfig,
) -> Result<async_nats::service::Service, async_nats::Error> {
    check_working_dir(&config)?;
    let config = Arc::new(config);

    let service = client
        .service_builder()
        .description("jumon local service")
        .start("jumon_local", "0.1.0")
        .await?;

    let group = service.group("local");
    let file_group = service.group("local.file");
    let mut read_endpoint = file_group.endpoint("read").await?;
    let mut write_endpoint = file_group.endpoint("write").await?;
    let mut list_endpoint = file_group.endpoint("list").await?;
    let mut exec_endpoint = group.endpoint("exec").await?;

    let read_config = config.clone();
    tokio::spawn(async move {
        while let Some(request) = read_endpoint.next().await {
            file::read_handler(&read_config, request).await;
        }
    });
    let write_config = config.clone();
    tokio::spawn(async move {
        while let Some(request) = write_endpoint.next().await {
            file::write_handler(&write_config, request).await;
        }
    });
    let list_config = config.clone();
    tokio::spawn(async move {
        while let Some(request) = list_endpoint.next().await {
            file::list_handler(&list_config, request).await;
        }
    });
    tokio::spawn(async move {
        while let Some(request) = exec_endpoint.next().await {
            command::command_handler(&config, request).await;
        }
    });

    info!(status = "started", "local service");
    Ok(service)
}

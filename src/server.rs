//! Server bootstrap: broker connection, buckets, services.

use anyhow::Context;
use async_nats::jetstream::{self, kv, object_store};
use futures::StreamExt;
use jumon_chat::OpenAiProvider;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const DEFAULT_SERVER_URL: &str = "nats://localhost:4222";
const CACHE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 30);

fn pid_path() -> std::path::PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("jumon")
        .join("server.pid")
}

/// Signal a running server via its pid file.
pub async fn quit() -> anyhow::Result<()> {
    let path = pid_path();
    let pid = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read pid file: {}", path.display()))?;
    let pid = pid.trim().to_string();
    info!(pid = %pid, "quitting server");

    let status = tokio::process::Command::new("kill")
        .arg(&pid)
        .status()
        .await
        .context("send signal")?;
    if !status.success() {
        anyhow::bail!("no running server with pid {pid}");
    }
    Ok(())
}

/// Connect to the broker, create the persistent buckets, and run every
/// service until ctrl-c.
pub async fn serve(url: Option<String>, disable_telemetry: bool) -> anyhow::Result<()> {
    let url = url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let client = async_nats::connect(&url)
        .await
        .with_context(|| format!("nats connect: {url}"))?;
    let js = jetstream::new(client.clone());

    setup_buckets(&js).await?;
    let cache = js.get_object_store("cache").await.context("cache setup")?;

    if !disable_telemetry {
        spawn_trace_counter(&client).await?;
    }

    let generator = Arc::new(OpenAiProvider::from_env());

    let mut services = Vec::new();
    services.push(
        jumon_chat::service::start(client.clone(), generator)
            .await
            .map_err(|e| start_error("chat", e))?,
    );
    services.push(
        jumon_tool::service::start(client.clone(), Some(cache))
            .await
            .map_err(|e| start_error("tool", e))?,
    );
    services.push(
        jumon_script::service::start(client.clone())
            .await
            .map_err(|e| start_error("script", e))?,
    );
    services.push(
        jumon_module::service::start(client.clone())
            .await
            .map_err(|e| start_error("module", e))?,
    );
    services.push(
        jumon_event::service::start(client.clone())
            .await
            .map_err(|e| start_error("event", e))?,
    );

    let pid_file = pid_path();
    if let Some(parent) = pid_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&pid_file, std::process::id().to_string());

    debug!(disable_telemetry, "server");
    info!("server is ready");

    tokio::signal::ctrl_c().await.context("signal handler")?;

    // stop services in reverse order
    for service in services.into_iter().rev() {
        let _ = service.stop().await;
    }
    let _ = std::fs::remove_file(&pid_file);
    Ok(())
}

/// Create the KV buckets and the resource cache if missing.
async fn setup_buckets(js: &jetstream::Context) -> anyhow::Result<()> {
    ensure_kv(js, jumon_module::kv::BUCKET, "module markdown store").await?;
    ensure_kv(js, jumon_core::config::BUCKET, "server configuration").await?;
    ensure_kv(js, jumon_event::event::BUCKET, "event key value store").await?;

    if js.get_object_store("cache").await.is_err() {
        js.create_object_store(object_store::Config {
            bucket: "cache".to_string(),
            description: Some("cache for jumon".to_string()),
            max_age: CACHE_TTL,
            ..Default::default()
        })
        .await
        .context("object store create")?;
    }
    Ok(())
}

fn start_error(name: &str, e: async_nats::Error) -> anyhow::Error {
    anyhow::anyhow!("{name} service create error: {e}")
}

async fn ensure_kv(js: &jetstream::Context, bucket: &str, description: &str) -> anyhow::Result<()> {
    if js.get_key_value(bucket).await.is_ok() {
        return Ok(());
    }
    js.create_key_value(kv::Config {
        bucket: bucket.to_string(),
        description: description.to_string(),
        ..Default::default()
    })
    .await
    .with_context(|| format!("create kv bucket {bucket}"))?;
    Ok(())
}

/// Count published spans; the push endpoint itself is an external
/// collaborator, so the counter only surfaces periodic totals in the log.
async fn spawn_trace_counter(client: &async_nats::Client) -> anyhow::Result<()> {
    let mut subscription = client.subscribe("trace.>").await.context("subscribe trace")?;
    tokio::spawn(async move {
        let mut spans: u64 = 0;
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            tokio::select! {
                message = subscription.next() => {
                    if message.is_none() {
                        break;
                    }
                    spans += 1;
                }
                _ = interval.tick() => {
                    info!(spans, "telemetry");
                }
            }
        }
    });
    Ok(())
}

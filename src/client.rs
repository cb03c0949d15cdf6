//! Client run path: resolve the module, subscribe to notifications, run.

use crate::config::{default_config_path, ClientConfig};
use anyhow::Context;
use async_nats::jetstream;
use futures::StreamExt;
use jumon_chat::{Message, Request, Role};
use jumon_trace::{Notification, TraceContext};
use tracing::{debug, info, warn};

/// Run a module by URL or local path with the given input.
pub async fn run(name: &str, input: &[u8]) -> anyhow::Result<()> {
    let config = ClientConfig::load(&default_config_path()).context("load client config")?;

    let client = async_nats::connect(&config.server_url)
        .await
        .context("nats connect")?;
    let js = jetstream::new(client.clone());

    // module tools reach back into the caller's directory, read-only
    let local = jumon_local::start(
        client.clone(),
        jumon_local::LocalConfig {
            working_dir: std::env::current_dir().unwrap_or_else(|_| ".".into()),
            read_only: true,
            create_only: false,
            allowed_commands: Vec::new(),
        },
    )
    .await
    .map_err(|e| anyhow::anyhow!("local service setup: {e}"))?;

    let (ctx, notify_to) = TraceContext::with_notify();
    debug!(notify_to = %notify_to, "created notification context");

    let subscription = client
        .subscribe(format!("notification.{notify_to}"))
        .await
        .context("subscribe notification")?;
    let printer = tokio::spawn(print_notifications(subscription));

    let module = resolve_module(&js, name).await?;

    let result = tokio::time::timeout(
        config.run_timeout(),
        run_module(&ctx, &client, &module.name, input),
    )
    .await;

    printer.abort();
    let _ = local.stop().await;
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("run timed out after {:?}", config.run_timeout()),
    }
}

/// Resolve a module from a local path or a git URL and store it.
async fn resolve_module(
    js: &jetstream::Context,
    name: &str,
) -> anyhow::Result<jumon_module::Module> {
    let kv = js
        .get_key_value(jumon_module::kv::BUCKET)
        .await
        .context("module kv")?;

    let module = if name.starts_with('/') || name.starts_with('.') {
        jumon_module::fetch::get_by_dir(&kv, std::path::Path::new(name))
            .await
            .context("get dir failed")?
    } else {
        jumon_module::fetch::get_by_git(&kv, name)
            .await
            .context("get git failed")?
    };
    Ok(module)
}

async fn run_module(
    ctx: &TraceContext,
    client: &async_nats::Client,
    modname: &str,
    input: &[u8],
) -> anyhow::Result<()> {
    let request = async_nats::Request::new()
        .payload(input.to_vec().into())
        .headers(ctx.headers());
    let reply = client
        .send_request(format!("module.run.{modname}"), request)
        .await
        .map_err(|e| anyhow::anyhow!("request module failed: {e}"))?;

    if let Some((code, message)) = jumon_core::error::remote_service_error(&reply) {
        anyhow::bail!("module run error: {code}: {message}");
    }

    info!(response = %String::from_utf8_lossy(&reply.payload), "run module");
    Ok(())
}

/// Render progress notifications as they arrive.
async fn print_notifications(mut subscription: async_nats::Subscriber) {
    while let Some(message) = subscription.next().await {
        let Ok(notification) = serde_json::from_slice::<Notification>(&message.payload) else {
            continue;
        };

        match (notification.name.as_str(), notification.on.as_str()) {
            ("script.step.run", "request") => print_step_request(&notification.content),
            ("script.step.run", "response") => print_step_response(&notification.content),
            ("script.run", "response") => {
                println!("\nFinal Output: {}", notification.content);
            }
            (_, "error") => {
                warn!(content = %notification.content, "error notification");
                eprintln!("Error: {}", notification.content);
            }
            _ => {}
        }
    }
}

fn print_step_request(content: &str) {
    let Ok(request) = serde_json::from_str::<Request>(content) else {
        return;
    };
    let Some(last) = request.messages.last() else {
        return;
    };
    if last.role == Role::Human {
        println!("  {}", last.content_string());
    }
}

fn print_step_response(content: &str) {
    let Ok(messages) = serde_json::from_str::<Vec<Message>>(content) else {
        return;
    };
    let text = messages
        .iter()
        .map(|m| m.content_string())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    println!("  {}", text);
}

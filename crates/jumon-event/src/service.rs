//! Event microservice and pump.
//!
//! CRUD endpoints live under `event.{put,get,list,delete}`; everything
//! else published under `event.>` feeds the pump, which couples subjects
//! to module runs with forward-and-publish semantics.

use crate::event::{self, Event, EventStoreError, EventType};
use crate::format::format_json;
use async_nats::service::ServiceExt;
use futures::StreamExt;
use jumon_core::Coded;
use jumon_trace::TraceContext;
use tracing::{error, info};

pub const ERR_VALIDATE_EVENT: Coded = Coded::new(400500, "validate event failed");
pub const ERR_EVENT_NOT_FOUND: Coded = Coded::new(404500, "event not found");
pub const ERR_EVENT_STORE: Coded = Coded::new(500500, "event store failed");

const MANAGE_ENDPOINTS: [&str; 4] = ["event.put", "event.get", "event.list", "event.delete"];

/// Start the event service: CRUD endpoints plus the `event.>` pump.
pub async fn start(
    client: async_nats::Client,
) -> Result<async_nats::service::Service, async_nats::Error> {
    let service = client
        .service_builder()
        .description("jumon event service")
        .start("jumon_event", "0.1.0")
        .await?;

    let group = service.group("event");
    let mut put_endpoint = group.endpoint("put").await?;
    let mut get_endpoint = group.endpoint("get").await?;
    let mut list_endpoint = group.endpoint("list").await?;
    let mut delete_endpoint = group.endpoint("delete").await?;

    let put_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = put_endpoint.next().await {
            put_handler(&put_client, request).await;
        }
    });
    let get_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = get_endpoint.next().await {
            get_handler(&get_client, request).await;
        }
    });
    let list_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = list_endpoint.next().await {
            list_handler(&list_client, request).await;
        }
    });
    let delete_client = client.clone();
    tokio::spawn(async move {
        while let Some(request) = delete_endpoint.next().await {
            delete_handler(&delete_client, request).await;
        }
    });

    // the pump: plain subscription, CRUD subjects excluded
    let mut subscription = client.subscribe("event.>").await?;
    let pump_client = client.clone();
    tokio::spawn(async move {
        while let Some(message) = subscription.next().await {
            if MANAGE_ENDPOINTS.contains(&message.subject.as_str()) {
                continue;
            }
            let client = pump_client.clone();
            tokio::spawn(async move {
                if let Err(e) = pump(&client, &message.subject, &message.payload).await {
                    error!(status = "pump failed", error = %e, "event service");
                }
            });
        }
    });

    info!(status = "started", "event service");
    Ok(service)
}

/// Deliver one pumped message.
///
/// Forward events win over subscribe events for the same subject; a
/// publish event only fires when its module matches the subscribe event's
/// module and its publish subject differs from the trigger subject.
pub async fn pump(
    client: &async_nats::Client,
    subject: &str,
    payload: &[u8],
) -> Result<(), String> {
    info!(subject = %subject, "event");

    match event::get_event(client, EventType::Forward, subject).await {
        Ok(forward) => {
            let rendered =
                format_json(payload, &forward.template).map_err(|e| e.to_string())?;
            client
                .publish(forward.publish_subject.clone(), rendered.into())
                .await
                .map_err(|e| e.to_string())?;
            return Ok(());
        }
        Err(EventStoreError::NotFound) => {}
        Err(e) => return Err(e.to_string()),
    }

    let subscribed = match event::get_event(client, EventType::Subscribe, subject).await {
        Ok(event) => event,
        Err(EventStoreError::NotFound) => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };

    let ctx = TraceContext::default();
    let response = jumon_module::run(&ctx, client, &subscribed.module, payload)
        .await
        .map_err(|e| format!("run module: {e}"))?;

    info!(subject = %subject, response = %String::from_utf8_lossy(&response), "event");

    let publish = match event::get_event(client, EventType::Publish, &subscribed.module).await {
        Ok(event) => event,
        Err(EventStoreError::NotFound) => return Ok(()),
        Err(e) => return Err(e.to_string()),
    };

    if publish.module != subscribed.module {
        return Ok(());
    }
    if publish.publish_subject == subscribed.subscribe_subject {
        return Err(format!(
            "publish subject equals subscribe subject: {}",
            publish.publish_subject
        ));
    }

    let rendered = format_json(&response, &publish.template).map_err(|e| e.to_string())?;
    client
        .publish(publish.publish_subject.clone(), rendered.into())
        .await
        .map_err(|e| e.to_string())?;
    Ok(())
}

async fn put_handler(client: &async_nats::Client, request: async_nats::service::Request) {
    let event: Event = match serde_json::from_slice(&request.message.payload) {
        Ok(event) => event,
        Err(e) => {
            let _ = request
                .respond(Err(ERR_VALIDATE_EVENT.service_error(format!("invalid payload: {e}"))))
                .await;
            return;
        }
    };

    match event::put_event(client, &event).await {
        Ok(()) => {
            let _ = request.respond(Ok("".into())).await;
        }
        Err(e) => {
            error!(status = "put event failed", error = %e, "event service");
            let _ = request.respond(Err(ERR_EVENT_STORE.service_error(e))).await;
        }
    }
}

async fn get_handler(client: &async_nats::Client, request: async_nats::service::Request) {
    let input: Event = match serde_json::from_slice(&request.message.payload) {
        Ok(event) => event,
        Err(e) => {
            let _ = request
                .respond(Err(ERR_VALIDATE_EVENT.service_error(format!("invalid payload: {e}"))))
                .await;
            return;
        }
    };

    match event::get_event(client, input.kind, key_part(&input)).await {
        Ok(event) => {
            let payload = serde_json::to_vec(&event).unwrap_or_default();
            let _ = request.respond(Ok(payload.into())).await;
        }
        Err(e) => {
            let _ = request
                .respond(Err(ERR_EVENT_NOT_FOUND.service_error(e)))
                .await;
        }
    }
}

async fn list_handler(client: &async_nats::Client, request: async_nats::service::Request) {
    match event::list_events(client).await {
        Ok(events) => {
            let payload = serde_json::to_vec(&events).unwrap_or_default();
            let _ = request.respond(Ok(payload.into())).await;
        }
        Err(e) => {
            error!(status = "list events failed", error = %e, "event service");
            let _ = request.respond(Err(ERR_EVENT_STORE.service_error(e))).await;
        }
    }
}

/// Delete is parameterized by `{type, key}`: the key part follows the
/// same type-specific derivation as storage.
async fn delete_handler(client: &async_nats::Client, request: async_nats::service::Request) {
    let input: Event = match serde_json::from_slice(&request.message.payload) {
        Ok(event) => event,
        Err(e) => {
            let _ = request
                .respond(Err(ERR_VALIDATE_EVENT.service_error(format!("invalid payload: {e}"))))
                .await;
            return;
        }
    };

    match event::delete_event(client, input.kind, key_part(&input)).await {
        Ok(()) => {
            let _ = request.respond(Ok("".into())).await;
        }
        Err(e) => {
            error!(status = "delete event failed", error = %e, "event service");
            let _ = request.respond(Err(ERR_EVENT_STORE.service_error(e))).await;
        }
    }
}

fn key_part(event: &Event) -> &str {
    match event.kind {
        EventType::Publish => &event.module,
        _ => &event.subscribe_subject,
    }
}

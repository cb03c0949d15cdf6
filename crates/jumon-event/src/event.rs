//! Event model and KV persistence.

use async_nats::jetstream::{self, kv::Store};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const BUCKET: &str = "event";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Subscribe,
    Publish,
    Consume,
    Forward,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EventType::Subscribe => "subscribe",
            EventType::Publish => "publish",
            EventType::Consume => "consume",
            EventType::Forward => "forward",
        };
        f.write_str(s)
    }
}

/// A persistent rule tying a broker subject to a module invocation or a
/// forwarding template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subscribe_subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub publish_subject: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub consumer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

impl Event {
    /// KV key: `<type>.<subscribe-subject>` for subscribe, forward and
    /// consume events, `<type>.<module>` for publish events.
    pub fn key(&self) -> String {
        match self.kind {
            EventType::Subscribe | EventType::Forward | EventType::Consume => {
                format!("{}.{}", self.kind, self.subscribe_subject)
            }
            EventType::Publish => format!("{}.{}", self.kind, self.module),
        }
    }
}

#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("key value store: {0}")]
    Store(String),

    #[error("event not found")]
    NotFound,

    #[error("unmarshal event: {0}")]
    Decode(#[from] serde_json::Error),
}

pub async fn keyvalue(client: &async_nats::Client) -> Result<Store, EventStoreError> {
    let js = jetstream::new(client.clone());
    js.get_key_value(BUCKET)
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))
}

/// Store an event under its type-derived key.
pub async fn put_event(client: &async_nats::Client, event: &Event) -> Result<(), EventStoreError> {
    let key = event.key();
    let data = serde_json::to_vec(event)?;
    debug!(key = %key, "put event");

    let kv = keyvalue(client).await?;
    kv.put(key, data.into())
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))?;
    Ok(())
}

/// Look up an event by type and subject/module key part.
pub async fn get_event(
    client: &async_nats::Client,
    kind: EventType,
    key_part: &str,
) -> Result<Event, EventStoreError> {
    let kv = keyvalue(client).await?;
    let key = format!("{}.{}", kind, key_part);

    let data = kv
        .get(key)
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))?
        .ok_or(EventStoreError::NotFound)?;

    Ok(serde_json::from_slice(&data)?)
}

/// Delete an event by type and key part.
pub async fn delete_event(
    client: &async_nats::Client,
    kind: EventType,
    key_part: &str,
) -> Result<(), EventStoreError> {
    let kv = keyvalue(client).await?;
    kv.delete(format!("{}.{}", kind, key_part))
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))?;
    Ok(())
}

/// List all stored events.
pub async fn list_events(client: &async_nats::Client) -> Result<Vec<Event>, EventStoreError> {
    let kv = keyvalue(client).await?;

    let keys: Vec<String> = kv
        .keys()
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))?
        .try_collect()
        .await
        .map_err(|e| EventStoreError::Store(e.to_string()))?;

    let mut events = Vec::new();
    for key in keys {
        let Some(data) = kv
            .get(key.as_str())
            .await
            .map_err(|e| EventStoreError::Store(e.to_string()))?
        else {
            continue;
        };
        events.push(serde_json::from_slice(&data)?);
    }
    Ok(events)
}

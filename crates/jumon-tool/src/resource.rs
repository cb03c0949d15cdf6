//! Plugin resources: named URLs loaded through the cache before a run.

use crate::fetch;
use async_nats::jetstream::object_store::ObjectStore;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    /// SHA-256 hex hash of the resource.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    /// Data size of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Loaded bytes, present only between load and close.
    #[serde(skip)]
    data: Option<Bytes>,
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("name is required")]
    NameRequired,

    #[error("url is required")]
    UrlRequired,

    #[error("load resource {name}: {source}")]
    Load {
        name: String,
        #[source]
        source: fetch::FetchError,
    },
}

impl Resource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ResourceError> {
        if self.name.is_empty() {
            return Err(ResourceError::NameRequired);
        }
        if self.url.is_empty() {
            return Err(ResourceError::UrlRequired);
        }
        Ok(())
    }

    pub fn data(&self) -> Option<&Bytes> {
        self.data.as_ref()
    }

    /// Preloaded content, used by tests and in-process callers.
    pub fn with_data(mut self, data: Bytes) -> Self {
        self.data = Some(data);
        self
    }

    async fn load(&mut self, store: Option<&ObjectStore>) -> Result<(), ResourceError> {
        let data = fetch::open(&self.url, store)
            .await
            .map_err(|e| ResourceError::Load {
                name: self.name.clone(),
                source: e,
            })?;
        self.data = Some(data);
        Ok(())
    }

    fn close(&mut self) {
        self.data = None;
    }
}

impl crate::tool::Tool {
    /// Load every resource through the cache.
    pub async fn load_resources(&mut self, store: Option<&ObjectStore>) -> Result<(), ResourceError> {
        for resource in &mut self.resources {
            resource.validate()?;
            if resource.data.is_none() {
                resource.load(store).await?;
            }
        }
        Ok(())
    }

    /// Drop loaded resource buffers.
    pub fn close_resources(&mut self) {
        for resource in &mut self.resources {
            resource.close();
        }
    }
}

//! Server configuration stored in the `config` KV bucket.
//!
//! Keys are plain UTF-8 strings; a missing key falls back to its built-in
//! default so a fresh deployment works without any seeding.

use async_nats::jetstream;
use thiserror::Error;

pub const BUCKET: &str = "config";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    /// Model used when a script does not name one.
    DefaultModel,
    /// Model used for check-directive verification.
    DefaultVerifyModel,
}

impl ConfigKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::DefaultModel => "DefaultModel",
            ConfigKey::DefaultVerifyModel => "DefaultVerifyModel",
        }
    }

    fn default_value(&self) -> &'static str {
        match self {
            ConfigKey::DefaultModel => "gpt-4o",
            ConfigKey::DefaultVerifyModel => "gpt-4o-mini",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("key value store: {0}")]
    Store(String),

    #[error("config value is not utf-8")]
    Encoding,
}

/// Read a config value, falling back to the key's default when unset.
pub async fn get(client: &async_nats::Client, key: ConfigKey) -> Result<String, ConfigError> {
    let js = jetstream::new(client.clone());
    let kv = js
        .get_key_value(BUCKET)
        .await
        .map_err(|e| ConfigError::Store(e.to_string()))?;

    let entry = kv
        .get(key.as_str())
        .await
        .map_err(|e| ConfigError::Store(e.to_string()))?;

    match entry {
        Some(value) => String::from_utf8(value.to_vec()).map_err(|_| ConfigError::Encoding),
        None => Ok(key.default_value().to_string()),
    }
}

/// Write a config value.
pub async fn set(
    client: &async_nats::Client,
    key: ConfigKey,
    value: &str,
) -> Result<(), ConfigError> {
    let js = jetstream::new(client.clone());
    let kv = js
        .get_key_value(BUCKET)
        .await
        .map_err(|e| ConfigError::Store(e.to_string()))?;

    kv.put(key.as_str(), value.as_bytes().to_vec().into())
        .await
        .map_err(|e| ConfigError::Store(e.to_string()))?;
    Ok(())
}

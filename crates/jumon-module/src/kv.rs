//! Module storage: the `module` KV bucket keyed by module name, holding
//! the original Markdown bytes as the authoritative form.

use crate::module::Module;
use crate::parse;
use async_nats::jetstream::{self, kv::Store};
use thiserror::Error;

pub const BUCKET: &str = "module";

#[derive(Debug, Error)]
pub enum KvError {
    #[error("get keyvalue: {0}")]
    Store(String),

    #[error("module not found: {0}")]
    NotFound(String),

    #[error("parse module: {0}")]
    Parse(#[from] parse::ParseError),
}

pub async fn keyvalue(client: &async_nats::Client) -> Result<Store, KvError> {
    let js = jetstream::new(client.clone());
    js.get_key_value(BUCKET)
        .await
        .map_err(|e| KvError::Store(e.to_string()))
}

/// Load and parse a stored module by name.
pub async fn get_module(client: &async_nats::Client, name: &str) -> Result<Module, KvError> {
    let kv = keyvalue(client).await?;
    let data = kv
        .get(name)
        .await
        .map_err(|e| KvError::Store(e.to_string()))?
        .ok_or_else(|| KvError::NotFound(name.to_string()))?;

    Ok(parse::parse_markdown(&data)?)
}

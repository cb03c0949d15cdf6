//! URL fetch through the object-store cache.
//!
//! Cache key is the subject-escaped URL. A miss issues exactly one HTTP
//! GET, stores the body, and serves the stored copy; entries expire with
//! the store TTL.

use async_nats::jetstream::object_store::{ObjectMetadata, ObjectStore};
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tracing::{debug, error};

const FETCH_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("get resource: {0}")]
    Http(#[from] reqwest::Error),

    #[error("get resource: status code {0}")]
    Status(u16),

    #[error("open cache: {0}")]
    Cache(String),
}

/// Fetch `url`, consulting and populating the store when one is given.
pub async fn open(url: &str, store: Option<&ObjectStore>) -> Result<Bytes, FetchError> {
    let key = jumon_core::subject::escape(url);

    let Some(store) = store else {
        return get_http(url).await;
    };

    match read_object(store, &key).await {
        Ok(Some(data)) => return Ok(data),
        Ok(None) => {}
        Err(e) => return Err(FetchError::Cache(e)),
    }

    // cache miss
    let body = get_http(url).await.map_err(|e| {
        error!(status = "get http failed", url = %url, error = %e, "cachefetch");
        e
    })?;

    let meta = ObjectMetadata {
        name: key.clone(),
        ..Default::default()
    };
    store
        .put(meta, &mut body.as_ref())
        .await
        .map_err(|e| FetchError::Cache(e.to_string()))?;
    debug!(status = "body cached", url = %url, "cachefetch");

    match read_object(store, &key).await {
        Ok(Some(data)) => Ok(data),
        Ok(None) => Err(FetchError::Cache(format!("cached object missing: {key}"))),
        Err(e) => Err(FetchError::Cache(e)),
    }
}

/// Read an object fully, mapping not-found to `None`.
async fn read_object(store: &ObjectStore, key: &str) -> Result<Option<Bytes>, String> {
    use async_nats::jetstream::object_store::GetErrorKind;

    let mut object = match store.get(key).await {
        Ok(object) => object,
        Err(e) if e.kind() == GetErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.to_string()),
    };

    let mut data = Vec::new();
    object
        .read_to_end(&mut data)
        .await
        .map_err(|e| e.to_string())?;
    Ok(Some(data.into()))
}

async fn get_http(url: &str) -> Result<Bytes, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()?;
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(FetchError::Status(response.status().as_u16()));
    }
    Ok(response.bytes().await?)
}

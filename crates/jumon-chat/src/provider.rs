//! Generator seam.
//!
//! The chat service fronts an inference collaborator behind this trait so
//! tests can swap in a scripted generator.

use crate::types::{Request, Response, StreamResponse};
use tokio::sync::mpsc;

/// Per-call options resolved from request headers.
#[derive(Default)]
pub struct GenerateOptions {
    /// Override the provider's endpoint base URL.
    pub base_url: Option<String>,
    /// When set, the provider forwards each streamed chunk here while the
    /// full response is still returned at the end.
    pub streamer: Option<mpsc::UnboundedSender<StreamResponse>>,
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        request: &Request,
        options: &GenerateOptions,
    ) -> Result<Response, GeneratorError>;
}

//! Shared primitives for jumon services.
//!
//! Everything here is broker-adjacent but service-agnostic: the coded error
//! model, the data-URL codec used for tool and script inputs, subject-name
//! escaping, frontmatter splitting, and the config KV accessors.

pub mod config;
pub mod dataurl;
pub mod error;
pub mod frontmatter;
pub mod respond;
pub mod subject;

pub use error::{Coded, CodedError};

/// JSON Schema carried verbatim on scripts and tools.
pub type Schema = serde_json::Value;

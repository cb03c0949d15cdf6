//! Tool definition.

use crate::resource::Resource;
use jumon_chat::ChatTool;
use jumon_core::{dataurl, Schema};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type-specific arguments, e.g. `name` for wasm, `subject` for nats,
/// `script` for script tools.
pub type Arguments = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tool {
    /// One of `script`, `wasm`, `nats`.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Name of the tool; also referred to as a symbol.
    #[serde(default)]
    pub name: String,
    /// Module reference used when the tool is imported from elsewhere.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub input_schema: Schema,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub output_schema: Schema,
    #[serde(default, skip_serializing_if = "Arguments::is_empty")]
    pub arguments: Arguments,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<Resource>,
    /// Input as a data URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input_url: String,
}

#[derive(Debug, Error)]
pub enum ToolValidateError {
    #[error("name is required")]
    NameRequired,

    #[error("type is required")]
    TypeRequired,
}

impl Tool {
    pub fn validate(&self) -> Result<(), ToolValidateError> {
        if self.name.is_empty() {
            return Err(ToolValidateError::NameRequired);
        }
        if self.kind.is_empty() {
            return Err(ToolValidateError::TypeRequired);
        }
        Ok(())
    }

    /// Projection into the chat tool shape.
    pub fn chat_tool(&self) -> ChatTool {
        ChatTool {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
        }
    }

    /// Set the input as a data URL, sniffing the MIME type.
    pub fn set_input(&mut self, input: &[u8]) {
        let mime = dataurl::detect_mime(input);
        self.input_url = dataurl::encode(mime, input);
    }

    /// Decoded input bytes.
    pub fn input(&self) -> Result<Vec<u8>, dataurl::DataUrlError> {
        if self.input_url.is_empty() {
            return Ok(Vec::new());
        }
        dataurl::decode(&self.input_url).map(|(data, _)| data)
    }

    pub fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

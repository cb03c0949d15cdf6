//! Script definition for multi-step AI prompts.

use crate::markdown;
use jumon_chat::ModelConfig;
use jumon_core::{dataurl, Schema};
use jumon_tool::Tool;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

/// A definition for a multi-step AI prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Script {
    /// Name of the script; also referred to as a symbol.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Run configuration such as the timeout.
    #[serde(default)]
    pub config: ScriptConfig,
    /// Model name, defaulted from config when absent.
    #[serde(default)]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_config: Option<ModelConfig>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub input_schema: Schema,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub output_schema: Schema,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Markdown body of the script.
    #[serde(default)]
    pub content: String,
    /// Input as a data URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub input_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    #[serde(default)]
    pub timeout_seconds: u64,
}

/// A node in a script's ordered step tree.
///
/// The root holds top-level steps at level 0; list items start at level 1.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub level: usize,
    /// List marker including the trailing space, e.g. `- ` or `1. `.
    pub marker: String,
    /// Markdown text of the item excluding nested lists.
    pub content: String,
    pub children: Vec<Step>,
}

impl Step {
    /// Render this step and its children back to indented Markdown.
    pub fn markdown(&self) -> String {
        let mut out = String::new();
        if self.level > 0 {
            for _ in 0..(self.level - 1) {
                out.push_str("  ");
            }
            out.push_str(&self.marker);
            out.push_str(&self.content);
            out.push('\n');
        }
        for child in &self.children {
            out.push_str(&child.markdown());
        }
        out
    }
}

/// A name extracted from an inline code span, referenceable as a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Always `function` today.
    pub kind: String,
    pub name: String,
}

#[derive(Debug, Error)]
pub enum ScriptValidateError {
    #[error("name is required")]
    NameRequired,

    #[error("model is required")]
    ModelRequired,
}

impl Script {
    /// Parse the content into top-level steps and the preface text that
    /// precedes the first list.
    pub fn steps(&self) -> (Vec<Step>, String) {
        let (root, preface) = markdown::parse_list(&self.content);
        (root.children, preface)
    }

    /// Symbols referenced by this script's content.
    pub fn symbols(&self) -> Vec<Symbol> {
        markdown::parse_symbols(&self.content)
    }

    pub fn validate(&self) -> Result<(), ScriptValidateError> {
        if self.name.is_empty() {
            return Err(ScriptValidateError::NameRequired);
        }
        if self.model.is_empty() {
            return Err(ScriptValidateError::ModelRequired);
        }
        Ok(())
    }

    /// Set the input as a data URL, sniffing the MIME type.
    pub fn set_input(&mut self, input: &[u8]) {
        let mime = dataurl::detect_mime(input);
        self.input_url = dataurl::encode(mime, input);
    }

    /// Effective timeout for a run.
    pub fn timeout_seconds(&self) -> u64 {
        if self.config.timeout_seconds == 0 {
            DEFAULT_TIMEOUT_SECONDS
        } else {
            self.config.timeout_seconds
        }
    }

    /// Convert the script into a `script`-kind tool carrying a serialized
    /// copy of itself.
    pub fn as_tool(&self) -> Result<Tool, serde_json::Error> {
        let serialized = serde_json::to_string(self)?;
        let mut arguments = jumon_tool::Arguments::new();
        arguments.insert("script".to_string(), serde_json::Value::String(serialized));

        Ok(Tool {
            kind: "script".to_string(),
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.clone(),
            output_schema: self.output_schema.clone(),
            arguments,
            ..Default::default()
        })
    }
}

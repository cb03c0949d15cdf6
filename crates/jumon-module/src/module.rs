//! Module definition.

use jumon_core::Schema;
use jumon_script::Script;
use jumon_tool::Tool;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const JUMON_VERSION: &str = "0.1";

/// A jumon module: scripts and tools defined by one Markdown document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    /// Compatibility version.
    #[serde(rename = "jumon", default, skip_serializing_if = "String::is_empty")]
    pub jumon_version: String,
    /// Unique identifier in package path format.
    #[serde(rename = "module", default)]
    pub name: String,
    #[serde(default)]
    pub scripts: Vec<Script>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    /// Frontmatter schemas keyed `<script>.input` / `<script>.output`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub schemas: HashMap<String, Schema>,
}

#[derive(Debug, Error)]
pub enum ModuleValidateError {
    #[error("module name is required")]
    NameRequired,

    #[error("scripts are required")]
    ScriptsRequired,

    #[error("script name is required")]
    ScriptNameRequired,
}

impl Module {
    pub fn validate(&self) -> Result<(), ModuleValidateError> {
        if self.name.is_empty() {
            return Err(ModuleValidateError::NameRequired);
        }
        if self.scripts.is_empty() {
            return Err(ModuleValidateError::ScriptsRequired);
        }
        for script in &self.scripts {
            if script.name.is_empty() {
                return Err(ModuleValidateError::ScriptNameRequired);
            }
        }
        Ok(())
    }

    /// The named script, or the `main` script when `name` is empty.
    pub fn get_script(&self, name: &str) -> Option<&Script> {
        let name = if name.is_empty() { "main" } else { name };
        self.scripts.iter().find(|s| s.name == name)
    }
}

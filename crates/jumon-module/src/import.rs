//! Tool composition: module-imported tools and script-symbol tools.

use crate::kv;
use crate::module::Module;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("get module: {0}")]
    Get(#[from] kv::KvError),

    #[error("convert tool: {0}")]
    Convert(#[from] serde_json::Error),
}

/// Resolve tools that reference another module and append the referenced
/// definitions to this module's tool list.
///
/// Only the immediate module boundary is visited, once per reference, so
/// cyclic references cannot recurse.
pub async fn import_module_tools(
    client: &async_nats::Client,
    module: &mut Module,
) -> Result<(), ImportError> {
    let references: Vec<(String, String)> = module
        .tools
        .iter()
        .filter(|t| !t.module.is_empty())
        .map(|t| (t.name.clone(), t.module.clone()))
        .collect();

    for (name, source) in references {
        debug!(module = %source, tool = %name, "importing module tool");
        let imported = kv::get_module(client, &source).await?;
        for tool in imported.tools {
            if tool.name != name {
                continue;
            }
            module.tools.push(tool);
        }
    }
    Ok(())
}

/// Wire scripts referenced as symbols into the referencing script's tools.
///
/// For every pair of distinct scripts (A, B), when A's content names B in
/// an inline code span, B becomes a `script` tool on A. B's model is
/// defaulted first so the serialized copy is runnable.
pub fn import_script_symbol_tools(
    module: &mut Module,
    default_model: &str,
) -> Result<(), ImportError> {
    let names: Vec<String> = module.scripts.iter().map(|s| s.name.clone()).collect();
    let symbols: Vec<Vec<String>> = module
        .scripts
        .iter()
        .map(|s| s.symbols().into_iter().map(|sym| sym.name).collect())
        .collect();

    for i in 0..names.len() {
        for j in 0..names.len() {
            if i == j || !symbols[i].contains(&names[j]) {
                continue;
            }

            let tool = {
                let target = &mut module.scripts[j];
                if target.model.is_empty() {
                    target.model = default_model.to_string();
                }
                target.as_tool()?
            };
            module.scripts[i].tools.push(tool);
        }
    }
    Ok(())
}

//! Module execution: resolve, compose tools, dispatch to the script engine.

use crate::import::{import_module_tools, import_script_symbol_tools};
use crate::kv;
use crate::module::Module;
use jumon_core::config::{self, ConfigKey};
use jumon_core::{Coded, CodedError};
use jumon_trace::TraceContext;
use tracing::debug;

pub const ERR_VALIDATE_MODULE: Coded = Coded::new(400400, "validate module failed");
pub const ERR_MODULE_NOT_FOUND: Coded = Coded::new(404400, "module not found");
pub const ERR_SCRIPT_NOT_FOUND: Coded = Coded::new(404401, "script not found");
pub const ERR_RUN_MODULE: Coded = Coded::new(500400, "run module failed");

/// Execute the script selected by `modurl` with `input`.
///
/// `modurl` is `<modname>[#<script>]`; the default script is `main`.
/// Module tools are concatenated in front of the script's own tools.
pub async fn run(
    ctx: &TraceContext,
    client: &async_nats::Client,
    modurl: &str,
    input: &[u8],
) -> Result<Vec<u8>, CodedError> {
    let (modname, scriptname) = extract_mod_script_name(modurl);
    debug!(modurl = %modurl, modname = %modname, script = %scriptname, "run module");

    let module = get(client, modname).await?;

    let mut script = module
        .get_script(scriptname)
        .cloned()
        .ok_or_else(|| ERR_SCRIPT_NOT_FOUND.wrap(format!("script not found: {scriptname}")))?;

    if script.model.is_empty() {
        let default_model = config::get(client, ConfigKey::DefaultModel)
            .await
            .map_err(|e| ERR_RUN_MODULE.wrap(format!("get default model: {e}")))?;
        debug!(model = %default_model, "using default model");
        script.model = default_model;
    }

    script.set_input(input);

    let mut tools = module.tools.clone();
    tools.append(&mut script.tools);
    script.tools = tools;

    jumon_script::run(ctx, client, &script)
        .await
        .map_err(|e| ERR_RUN_MODULE.wrap(e))
}

/// Fetch a module by name with tools and symbols resolved.
pub async fn get(client: &async_nats::Client, modname: &str) -> Result<Module, CodedError> {
    let mut module = kv::get_module(client, modname)
        .await
        .map_err(|e| ERR_MODULE_NOT_FOUND.wrap(format!("{e}: {modname}")))?;

    module
        .validate()
        .map_err(|e| ERR_VALIDATE_MODULE.wrap(format!("validate module: {e}")))?;

    import_module_tools(client, &mut module)
        .await
        .map_err(|e| ERR_RUN_MODULE.wrap(format!("prepare import tools: {e}")))?;

    let default_model = config::get(client, ConfigKey::DefaultModel)
        .await
        .map_err(|e| ERR_RUN_MODULE.wrap(format!("get default model: {e}")))?;

    import_script_symbol_tools(&mut module, &default_model)
        .map_err(|e| ERR_RUN_MODULE.wrap(format!("prepare script tools: {e}")))?;

    Ok(module)
}

/// Split a module URL into module name and script name.
///
/// e.g. `jumonmd/example/hello#sayname` -> (`jumonmd/example/hello`, `sayname`).
pub fn extract_mod_script_name(modurl: &str) -> (&str, &str) {
    match modurl.split_once('#') {
        Some((modname, scriptname)) => (modname, scriptname),
        None => (modurl, ""),
    }
}

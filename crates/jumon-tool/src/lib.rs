//! Tool execution for jumon.
//!
//! A tool is a tagged variant over `{wasm, nats, script}`; the dispatcher
//! validates, loads resources through the object-store cache, selects the
//! runner, and cleans up. Input and output are plain bytes; inputs travel
//! as data URLs on the tool record.

pub mod fetch;
pub mod plugin;
pub mod resource;
pub mod run;
pub mod service;
pub mod std_tools;
pub mod tool;
mod wasm;

pub use resource::Resource;
pub use run::run;
pub use tool::{Arguments, Tool};

use jumon_core::Coded;

pub const ERR_TOOL_VALIDATE: Coded = Coded::new(400200, "tool validation failed");
pub const ERR_UNKNOWN_TOOL_TYPE: Coded = Coded::new(400201, "unknown tool type");
pub const ERR_WASM_VALIDATE: Coded = Coded::new(400202, "wasm validation failed");
pub const ERR_NATS_VALIDATE: Coded = Coded::new(400203, "nats validation failed");
pub const ERR_SCRIPT_VALIDATE: Coded = Coded::new(400204, "script validation failed");

pub const ERR_LOAD_RESOURCES: Coded = Coded::new(500200, "load resources failed");
pub const ERR_RUN_TOOL: Coded = Coded::new(500201, "tool execution failed");
pub const ERR_RUN_WASM: Coded = Coded::new(500202, "wasm execution failed");
pub const ERR_RUN_NATS: Coded = Coded::new(500203, "nats execution failed");
pub const ERR_RUN_SCRIPT: Coded = Coded::new(500204, "script execution failed");

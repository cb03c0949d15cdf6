//! Script model and step-execution engine.
//!
//! A script is a Markdown document whose list items are executed as LLM
//! steps. Inline code spans name other scripts and tools; `check:` lines
//! become post-generation assertions handled by the chat service.

pub mod markdown;
pub mod run;
pub mod script;
pub mod service;

pub use run::{final_output, run, EngineError};
pub use script::{Script, ScriptConfig, Step, Symbol, DEFAULT_TIMEOUT_SECONDS};

//! Module model: parsing, storage, tool import and run dispatch.
//!
//! A module is a Markdown document defining scripts and tools under
//! `## Scripts` / `## Tools` headings, identified by a package-path-style
//! name. The KV bucket `module` stores the original Markdown bytes as the
//! authoritative form.

pub mod fetch;
pub mod import;
pub mod init;
pub mod kv;
pub mod module;
pub mod parse;
pub mod run;
pub mod service;

pub use init::init_module;
pub use module::{Module, JUMON_VERSION};
pub use parse::parse_markdown;
pub use run::{extract_mod_script_name, get, run};

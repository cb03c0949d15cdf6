//! Local filesystem and exec service, constrained to a working directory.

pub mod command;
pub mod file;
pub mod service;

pub use command::CommandResponse;
pub use service::{start, LocalConfig};

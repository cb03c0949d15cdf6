//! Event fabric: persistent subscribe/publish/consume/forward rules that
//! couple broker subjects to module runs.

pub mod event;
pub mod format;
pub mod service;

pub use event::{Event, EventType};
pub use format::format_json;

//! Chat generation for jumon.
//!
//! The service fronts a [`Generator`] on `chat.generate`: it strips check
//! directives from the request, streams chunks to an opt-in `stream-to`
//! subject, and verifies the response against the extracted checks before
//! replying.

pub mod checks;
pub mod generate;
pub mod openai;
pub mod provider;
pub mod service;
pub mod types;
pub mod verify;

pub use generate::generate;
pub use openai::OpenAiProvider;
pub use provider::{GenerateOptions, Generator, GeneratorError};
pub use types::{
    ChatTool, ContentPart, Message, ModelConfig, Request, Response, Role, StreamResponse, ToolCall,
};

//! Check-directive plumbing on chat requests.
//!
//! Check directives arrive as `check` content parts on human messages.
//! The current directive is the one on the last human message; all check
//! parts are stripped before the request reaches the generator.

use crate::types::{Request, Role};

/// The check directive attached to the last human message, if any.
pub fn extract_current_checks(request: &Request) -> Option<String> {
    let last_human = request
        .messages
        .iter()
        .filter(|m| m.role == Role::Human)
        .next_back()?;

    last_human
        .content
        .iter()
        .find(|p| p.kind == "check")
        .map(|p| p.text.clone())
}

/// Remove every `check` content part from human messages.
pub fn remove_checks(request: &mut Request) {
    for message in &mut request.messages {
        if message.role != Role::Human {
            continue;
        }
        message.content.retain(|p| p.kind != "check");
    }
}

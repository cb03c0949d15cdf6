//! Response verification against check directives.

use crate::provider::{GenerateOptions, Generator, GeneratorError};
use crate::types::{Message, ModelConfig, Request, Response, Role};
use tracing::{debug, info};

const CHECK_PROMPT: &str = "\
You are a helpful assistant that checks the response of the user.
The user will provide a response and a list of checks.
You will check the response against the checks and return a list of results.
Answer only with true or false.

Response:
{response}

Checks:
{checks}
";

/// Ask the generator whether `response` satisfies `checks`.
///
/// Runs near-deterministic (temperature 0.0001) against the request's
/// model and accepts iff the answer contains `true`.
pub async fn verify_response(
    generator: &dyn Generator,
    request: &Request,
    response: &Response,
    checks: &str,
) -> Result<bool, GeneratorError> {
    info!(checks = %checks, "check response");

    let prompt = CHECK_PROMPT
        .replace("{response}", &response.text())
        .replace("{checks}", checks);

    let verify_request = Request {
        model: request.model.clone(),
        config: Some(ModelConfig {
            temperature: Some(0.0001),
            ..Default::default()
        }),
        messages: vec![Message::text(Role::Human, prompt)],
        tools: Vec::new(),
    };

    let verdict = generator
        .generate(&verify_request, &GenerateOptions::default())
        .await?;

    let text = verdict.text();
    debug!(verdict = %text, "check response");
    Ok(text.to_lowercase().contains("true"))
}

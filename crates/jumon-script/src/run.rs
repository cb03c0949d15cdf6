//! Script step-execution engine.
//!
//! Runs each step as one chat generation, fanning tool calls out through
//! the tool service, and coerces the last AI message into the final JSON
//! output. Never partially commits output: the first failing step aborts
//! the run.

use crate::markdown::{parse_checks, remove_checks};
use crate::script::{Script, Step};
use jumon_chat::{self as chat, ContentPart, Message, Request, Response, Role};
use jumon_core::dataurl;
use jumon_trace::{SpanTracer, TraceContext};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("construct initial prompt: {0}")]
    InitialPrompt(#[from] dataurl::DataUrlError),

    #[error("chat generate: {0}")]
    Generate(#[from] chat::generate::GenerateError),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool execute: {0}")]
    ToolExecute(#[from] jumon_tool::run::RunError),

    #[error("last message is not an AI message")]
    NotAiMessage,

    #[error("marshal: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Run the given script and return the final output as raw JSON bytes.
pub async fn run(
    ctx: &TraceContext,
    client: &async_nats::Client,
    script: &Script,
) -> Result<Vec<u8>, EngineError> {
    info!(name = %script.name, "run script");

    let (ctx, mut span) = SpanTracer::start(ctx, client, "script.run");

    let result = run_steps(&ctx, client, script, &mut span).await;
    match &result {
        Ok(output) => span.set_response(output.as_slice()).await,
        Err(e) => span.set_error(e).await,
    }
    span.end().await;
    result
}

async fn run_steps(
    ctx: &TraceContext,
    client: &async_nats::Client,
    script: &Script,
    span: &mut SpanTracer,
) -> Result<Vec<u8>, EngineError> {
    let (mut steps, preface) = script.steps();

    let mut history: Vec<Message> = Vec::new();

    let prompt = initial_prompt(&preface, &script.input_url)?;
    if !prompt.is_empty() {
        history.push(Message::text(Role::Human, prompt.clone()));
    }

    // zero-step scripts still execute exactly one generation
    if steps.is_empty() {
        steps = vec![Step {
            level: 1,
            marker: String::new(),
            content: prompt.clone(),
            children: Vec::new(),
        }];
    }

    debug!(prompt = %prompt, steps = steps.len(), "initial prompt");
    span.set_request(serde_json::to_value(script)?).await;

    for (index, step) in steps.iter().enumerate() {
        let (step_ctx, mut step_span) = SpanTracer::start(ctx, client, "script.step.run");
        debug!(index = index + 1, step = %step.content, "run step");

        let request = step_request(script, step, &history);
        step_span
            .set_request(serde_json::to_value(&request)?)
            .await;

        // the step's message is the last one of the prepared request
        if let Some(message) = request.messages.last() {
            history.push(message.clone());
        }

        match run_step(&step_ctx, client, &request, script).await {
            Ok(messages) => {
                history.extend(messages.iter().cloned());
                step_span
                    .set_response(serde_json::to_value(&messages)?)
                    .await;
                step_span.end().await;
            }
            Err(e) => {
                step_span.set_error(&e).await;
                step_span.end().await;
                return Err(e);
            }
        }
    }

    final_output(history.last().ok_or(EngineError::NotAiMessage)?)
}

/// Construct the initial prompt from the preface and a text-like input.
fn initial_prompt(preface: &str, input_url: &str) -> Result<String, EngineError> {
    let mut prompt = preface.to_string();
    if !input_url.is_empty() {
        let (input, mime) = dataurl::decode(input_url)?;
        if mime.starts_with("text/") || mime.starts_with("application/") {
            prompt = format!("{}\n\nINPUT:\n{}", prompt, String::from_utf8_lossy(&input));
        }
    }
    Ok(prompt.trim().to_string())
}

/// Prepare the chat request for one step.
///
/// The step's Markdown is split into the prompt body and its check
/// directives; checks travel as a separate `check` content part.
fn step_request(script: &Script, step: &Step, history: &[Message]) -> Request {
    let markdown = step.markdown();

    let mut message = Message::text(Role::Human, remove_checks(&markdown));
    let checks = parse_checks(&markdown);
    if !checks.is_empty() {
        message.content.push(ContentPart::check(checks));
    }

    let mut messages = history.to_vec();
    messages.push(message);

    Request {
        model: script.model.clone(),
        config: script.model_config.clone(),
        messages,
        tools: script.tools.iter().map(|t| t.chat_tool()).collect(),
    }
}

/// Run one generation and dispatch any tool calls it requests.
///
/// Returns the messages to append to history: the generator's messages
/// followed by one tool-response message per executed call.
async fn run_step(
    ctx: &TraceContext,
    client: &async_nats::Client,
    request: &Request,
    script: &Script,
) -> Result<Vec<Message>, EngineError> {
    let response: Response = chat::generate(ctx, client, request).await?;

    let mut messages = response.messages.clone();
    for call_message in response.tool_calls() {
        let call = call_message.tool_call.as_ref().expect("tool call message");
        info!(tool = %call.name, args = %call.arguments, "tool call");

        let mut tool = script
            .tools
            .iter()
            .find(|t| t.name == call.name)
            .cloned()
            .ok_or_else(|| EngineError::ToolNotFound(call.name.clone()))?;

        tool.set_input(call.arguments.as_bytes());
        let output = jumon_tool::run(ctx, client, &tool).await?;

        debug!(tool = %call.name, response = %String::from_utf8_lossy(&output), "tool call response");
        messages.push(Message::tool_response(
            call.name.clone(),
            call.id.clone(),
            String::from_utf8_lossy(&output),
        ));
    }

    Ok(messages)
}

/// Coerce the final message into JSON output bytes.
///
/// Valid JSON text is returned verbatim; anything else is returned as a
/// JSON string encoding of the text.
pub fn final_output(message: &Message) -> Result<Vec<u8>, EngineError> {
    if message.role != Role::Ai {
        return Err(EngineError::NotAiMessage);
    }

    let text = message.content_string();
    if serde_json::from_str::<serde_json::Value>(&text).is_ok() {
        return Ok(text.into_bytes());
    }

    Ok(serde_json::to_vec(&text)?)
}

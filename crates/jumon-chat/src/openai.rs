//! OpenAI-compatible chat-completions provider with SSE streaming.

use crate::provider::{GenerateOptions, Generator, GeneratorError};
use crate::types::{ContentPart, Message, Request, Response, Role, StreamResponse, ToolCall};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Key from `JUMON_API_KEY`, falling back to `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        let key = std::env::var("JUMON_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .unwrap_or_default();
        Self::new(key)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn wire_request(&self, request: &Request, stream: bool) -> WireRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| match (&m.tool_call, &m.tool_call_id) {
                (Some(call), _) => WireMessage {
                    role: "assistant".to_string(),
                    content: None,
                    tool_calls: Some(vec![WireToolCall {
                        id: call.id.clone(),
                        kind: "function".to_string(),
                        function: WireFunction {
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        },
                    }]),
                    tool_call_id: None,
                },
                (None, Some(call_id)) => WireMessage {
                    role: "tool".to_string(),
                    content: Some(m.content_string()),
                    tool_calls: None,
                    tool_call_id: Some(call_id.clone()),
                },
                (None, None) => WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::Human => "user",
                        Role::Ai => "assistant",
                        Role::Tool => "tool",
                    }
                    .to_string(),
                    content: Some(m.content_string()),
                    tool_calls: None,
                    tool_call_id: None,
                },
            })
            .collect();

        let tools = request
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.input_schema,
                    }
                })
            })
            .collect::<Vec<_>>();

        let config = request.config.clone().unwrap_or_default();
        WireRequest {
            model: request.model.clone(),
            messages,
            tools: if tools.is_empty() { None } else { Some(tools) },
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
            stream,
        }
    }
}

#[async_trait::async_trait]
impl Generator for OpenAiProvider {
    async fn generate(
        &self,
        request: &Request,
        options: &GenerateOptions,
    ) -> Result<Response, GeneratorError> {
        let base = options.base_url.as_deref().unwrap_or(&self.base_url);
        let url = format!("{}/chat/completions", base.trim_end_matches('/'));
        let stream = options.streamer.is_some();
        let body = self.wire_request(request, stream);

        debug!(model = %body.model, messages = body.messages.len(), stream, "generate request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "generate failed");
            return Err(GeneratorError::RequestFailed(format!("{}: {}", status, text)));
        }

        if let Some(streamer) = &options.streamer {
            return collect_sse(response, streamer).await;
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;
        Ok(wire.into_response())
    }
}

/// Accumulate an SSE stream into a full response, forwarding text deltas.
async fn collect_sse(
    response: reqwest::Response,
    streamer: &tokio::sync::mpsc::UnboundedSender<StreamResponse>,
) -> Result<Response, GeneratorError> {
    let mut text = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    let mut buffer = String::new();

    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;
        buffer.push_str(&String::from_utf8_lossy(&chunk));

        while let Some(end) = buffer.find('\n') {
            let line = buffer[..end].trim().to_string();
            buffer.drain(..=end);

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() || data == "[DONE]" {
                continue;
            }
            let Ok(event) = serde_json::from_str::<WireStreamEvent>(data) else {
                continue;
            };
            let Some(choice) = event.choices.into_iter().next() else {
                continue;
            };

            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    text.push_str(&content);
                    let _ = streamer.send(StreamResponse { text: content });
                }
            }
            for delta in choice.delta.tool_calls.unwrap_or_default() {
                let index = delta.index as usize;
                if tool_calls.len() <= index {
                    tool_calls.resize_with(index + 1, || ToolCall {
                        id: String::new(),
                        name: String::new(),
                        arguments: String::new(),
                    });
                }
                let call = &mut tool_calls[index];
                if let Some(id) = delta.id {
                    call.id = id;
                }
                if let Some(function) = delta.function {
                    if let Some(name) = function.name {
                        call.name = name;
                    }
                    if let Some(arguments) = function.arguments {
                        call.arguments.push_str(&arguments);
                    }
                }
            }
        }
    }

    let mut messages = Vec::new();
    if !text.is_empty() || tool_calls.is_empty() {
        messages.push(Message::text(Role::Ai, text));
    }
    for call in tool_calls {
        messages.push(Message {
            role: Role::Ai,
            content: Vec::new(),
            tool_call: Some(call),
            tool_call_id: None,
            name: None,
        });
    }
    Ok(Response { messages })
}

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunction,
}

#[derive(Serialize, Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Deserialize)]
struct WireChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

impl WireResponse {
    fn into_response(self) -> Response {
        let mut messages = Vec::new();
        for choice in self.choices {
            if let Some(content) = choice.message.content {
                messages.push(Message::text(Role::Ai, content));
            }
            for call in choice.message.tool_calls.unwrap_or_default() {
                messages.push(Message {
                    role: Role::Ai,
                    content: Vec::new(),
                    tool_call: Some(ToolCall {
                        id: call.id,
                        name: call.function.name,
                        arguments: call.function.arguments,
                    }),
                    tool_call_id: None,
                    name: None,
                });
            }
        }
        if messages.is_empty() {
            messages.push(Message {
                role: Role::Ai,
                content: vec![ContentPart::text("")],
                tool_call: None,
                tool_call_id: None,
                name: None,
            });
        }
        Response { messages }
    }
}

#[derive(Deserialize)]
struct WireStreamEvent {
    #[serde(default)]
    choices: Vec<WireStreamChoice>,
}

#[derive(Deserialize)]
struct WireStreamChoice {
    delta: WireDelta,
}

#[derive(Deserialize)]
struct WireDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCallDelta>>,
}

#[derive(Deserialize)]
struct WireToolCallDelta {
    #[serde(default)]
    index: u32,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<WireFunctionDelta>,
}

#[derive(Deserialize)]
struct WireFunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

//! Tests for jumon-chat: message model, check plumbing, verification

use jumon_chat::checks::{extract_current_checks, remove_checks};
use jumon_chat::verify::verify_response;
use jumon_chat::{
    ContentPart, GenerateOptions, Generator, GeneratorError, Message, Request, Response, Role,
};

// ===========================================================================
// message model
// ===========================================================================

#[test]
fn message_content_string_joins_text_parts() {
    let mut message = Message::text(Role::Human, "hello");
    message.content.push(ContentPart::text(" world"));
    message.content.push(ContentPart::check("must be polite"));
    assert_eq!(message.content_string(), "hello world");
}

#[test]
fn role_serializes_lowercase() {
    let message = Message::text(Role::Ai, "hi");
    let json = serde_json::to_value(&message).unwrap();
    assert_eq!(json["role"], "ai");
    assert_eq!(json["content"][0]["type"], "text");
    assert_eq!(json["content"][0]["text"], "hi");
}

#[test]
fn response_text_and_tool_calls() {
    let response = Response {
        messages: vec![
            Message::text(Role::Ai, "hello"),
            Message {
                role: Role::Ai,
                content: Vec::new(),
                tool_call: Some(jumon_chat::ToolCall {
                    id: "call_1".to_string(),
                    name: "get_weather".to_string(),
                    arguments: r#"{"city":"tokyo"}"#.to_string(),
                }),
                tool_call_id: None,
                name: None,
            },
        ],
    };
    assert_eq!(response.text(), "hello");
    assert_eq!(response.tool_calls().count(), 1);
}

#[test]
fn tool_response_message_shape() {
    let message = Message::tool_response("get_weather", "call_1", "sunny");
    assert_eq!(message.role, Role::Tool);
    assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(message.content_string(), "sunny");
}

// ===========================================================================
// check plumbing
// ===========================================================================

fn request_with_checks() -> Request {
    let mut first = Message::text(Role::Human, "step one");
    first.content.push(ContentPart::check("old check"));
    let mut last = Message::text(Role::Human, "step two");
    last.content.push(ContentPart::check("answer contains hello"));

    Request {
        model: "m".to_string(),
        messages: vec![first, Message::text(Role::Ai, "ok"), last],
        ..Default::default()
    }
}

#[test]
fn extract_checks_takes_last_human_message() {
    let request = request_with_checks();
    assert_eq!(
        extract_current_checks(&request).as_deref(),
        Some("answer contains hello")
    );
}

#[test]
fn extract_checks_none_when_absent() {
    let request = Request {
        messages: vec![Message::text(Role::Human, "no checks")],
        ..Default::default()
    };
    assert_eq!(extract_current_checks(&request), None);
}

#[test]
fn remove_checks_strips_all_check_parts() {
    let mut request = request_with_checks();
    remove_checks(&mut request);
    for message in &request.messages {
        assert!(message.content.iter().all(|p| p.kind != "check"));
    }
    // text parts survive
    assert_eq!(request.messages[0].content_string(), "step one");
    assert_eq!(request.messages[2].content_string(), "step two");
}

// ===========================================================================
// verification
// ===========================================================================

struct ScriptedGenerator {
    reply: String,
}

#[async_trait::async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(
        &self,
        _request: &Request,
        _options: &GenerateOptions,
    ) -> Result<Response, GeneratorError> {
        Ok(Response {
            messages: vec![Message::text(Role::Ai, self.reply.clone())],
        })
    }
}

#[tokio::test]
async fn verify_passes_on_true() {
    let generator = ScriptedGenerator {
        reply: "True".to_string(),
    };
    let request = Request {
        model: "m".to_string(),
        ..Default::default()
    };
    let response = Response {
        messages: vec![Message::text(Role::Ai, "hello")],
    };
    let passed = verify_response(&generator, &request, &response, "contains hello")
        .await
        .unwrap();
    assert!(passed);
}

#[tokio::test]
async fn verify_fails_on_false() {
    let generator = ScriptedGenerator {
        reply: "false".to_string(),
    };
    let request = Request::default();
    let response = Response::default();
    let passed = verify_response(&generator, &request, &response, "anything")
        .await
        .unwrap();
    assert!(!passed);
}

#[tokio::test]
async fn verify_prompt_carries_response_and_checks() {
    struct CapturingGenerator;

    #[async_trait::async_trait]
    impl Generator for CapturingGenerator {
        async fn generate(
            &self,
            request: &Request,
            _options: &GenerateOptions,
        ) -> Result<Response, GeneratorError> {
            let prompt = request.messages[0].content_string();
            assert!(prompt.contains("Response:\nthe answer"));
            assert!(prompt.contains("Checks:\nmust contain answer"));
            let temperature = request.config.as_ref().and_then(|c| c.temperature);
            assert!(temperature.unwrap() < 0.001);
            Ok(Response {
                messages: vec![Message::text(Role::Ai, "true")],
            })
        }
    }

    let response = Response {
        messages: vec![Message::text(Role::Ai, "the answer")],
    };
    let passed = verify_response(
        &CapturingGenerator,
        &Request::default(),
        &response,
        "must contain answer",
    )
    .await
    .unwrap();
    assert!(passed);
}

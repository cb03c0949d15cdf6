//! Tests for jumon-tool: model validation, input plumbing, runner preconditions

use jumon_tool::{Resource, Tool};

// ===========================================================================
// tool model
// ===========================================================================

#[test]
fn validate_requires_name_and_type() {
    let tool = Tool::default();
    assert!(tool.validate().is_err());

    let tool = Tool {
        name: "t".to_string(),
        ..Default::default()
    };
    assert!(tool.validate().is_err());

    let tool = Tool {
        name: "t".to_string(),
        kind: "nats".to_string(),
        ..Default::default()
    };
    assert!(tool.validate().is_ok());
}

#[test]
fn chat_tool_projection() {
    let tool = Tool {
        name: "get_weather".to_string(),
        kind: "nats".to_string(),
        description: "weather lookup".to_string(),
        input_schema: serde_json::json!({"type": "object"}),
        ..Default::default()
    };
    let chat_tool = tool.chat_tool();
    assert_eq!(chat_tool.name, "get_weather");
    assert_eq!(chat_tool.description, "weather lookup");
    assert_eq!(chat_tool.input_schema["type"], "object");
}

#[test]
fn set_input_round_trip() {
    let mut tool = Tool::default();
    tool.set_input(br#"{"city":"tokyo"}"#);
    assert!(tool.input_url.starts_with("data:application/json;base64,"));
    assert_eq!(tool.input().unwrap(), br#"{"city":"tokyo"}"#);
}

#[test]
fn input_empty_when_unset() {
    let tool = Tool::default();
    assert!(tool.input().unwrap().is_empty());
}

#[test]
fn string_argument_lookup() {
    let mut tool = Tool::default();
    tool.arguments.insert(
        "subject".to_string(),
        serde_json::Value::String("tool.std.time.now".to_string()),
    );
    tool.arguments
        .insert("count".to_string(), serde_json::json!(3));

    assert_eq!(tool.string_argument("subject"), Some("tool.std.time.now"));
    assert_eq!(tool.string_argument("count"), None);
    assert_eq!(tool.string_argument("missing"), None);
}

#[test]
fn tool_json_shape() {
    let json = r#"{"type":"wasm","name":"encode","arguments":{"name":"run"},"resources":[{"name":"bin","url":"https://example.com/t.wasm","hash":"abc123"}]}"#;
    let tool: Tool = serde_json::from_str(json).unwrap();
    assert_eq!(tool.kind, "wasm");
    assert_eq!(tool.resources.len(), 1);
    assert_eq!(tool.resources[0].hash, "abc123");
    assert_eq!(tool.string_argument("name"), Some("run"));
}

// ===========================================================================
// resources
// ===========================================================================

#[test]
fn resource_validate() {
    assert!(Resource::new("bin", "https://example.com/x").validate().is_ok());
    assert!(Resource::new("", "https://example.com/x").validate().is_err());
    assert!(Resource::new("bin", "").validate().is_err());
}

#[test]
fn resource_with_data() {
    let resource = Resource::new("bin", "https://example.com/x").with_data("bytes".into());
    assert_eq!(resource.data().unwrap().as_ref(), b"bytes");
}

// ===========================================================================
// wasm runner preconditions
// ===========================================================================

mod wasm_preconditions {
    use super::*;
    use jumon_tool::Arguments;

    fn args_with_name() -> Arguments {
        let mut arguments = Arguments::new();
        arguments.insert(
            "name".to_string(),
            serde_json::Value::String("process".to_string()),
        );
        arguments
    }

    #[tokio::test]
    async fn wasm_requires_a_resource() {
        let mut tool = Tool {
            name: "w".to_string(),
            kind: "wasm".to_string(),
            arguments: args_with_name(),
            ..Default::default()
        };
        tool.set_input(b"{}");
        let err = jumon_tool::plugin::run_wasm_plugin(&tool).await.unwrap_err();
        assert_eq!(err.code(), 400202);
    }

    #[tokio::test]
    async fn wasm_requires_function_name() {
        let mut tool = Tool {
            name: "w".to_string(),
            kind: "wasm".to_string(),
            resources: vec![Resource::new("bin", "https://example.com/t.wasm")
                .with_data("not wasm".into())],
            ..Default::default()
        };
        tool.set_input(b"{}");
        let err = jumon_tool::plugin::run_wasm_plugin(&tool).await.unwrap_err();
        assert_eq!(err.code(), 400202);
    }

    #[tokio::test]
    async fn wasm_verifies_resource_hash() {
        let mut resource =
            Resource::new("bin", "https://example.com/t.wasm").with_data("payload".into());
        resource.hash = "deadbeef".to_string();

        let tool = Tool {
            name: "w".to_string(),
            kind: "wasm".to_string(),
            arguments: args_with_name(),
            resources: vec![resource],
            ..Default::default()
        };
        let err = jumon_tool::plugin::run_wasm_plugin(&tool).await.unwrap_err();
        assert_eq!(err.code(), 400202);
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[tokio::test]
    async fn wasm_rejects_invalid_binary() {
        let tool = Tool {
            name: "w".to_string(),
            kind: "wasm".to_string(),
            arguments: args_with_name(),
            resources: vec![Resource::new("bin", "https://example.com/t.wasm")
                .with_data("not a wasm module".into())],
            ..Default::default()
        };
        let err = jumon_tool::plugin::run_wasm_plugin(&tool).await.unwrap_err();
        assert_eq!(err.code(), 400202);
    }
}

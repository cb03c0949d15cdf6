//! Tests for jumon-script: step trees, symbols, check directives, output coercion

use jumon_chat::{Message, Role};
use jumon_script::markdown::{parse_checks, parse_list, parse_symbols, remove_checks};
use jumon_script::{final_output, Script, Step};

// ===========================================================================
// symbols
// ===========================================================================

#[test]
fn symbols_none() {
    assert!(parse_symbols("this is a test").is_empty());
}

#[test]
fn symbols_single() {
    let symbols = parse_symbols("this is a `test` symbol");
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "test");
    assert_eq!(symbols[0].kind, "function");
}

#[test]
fn symbols_empty_span_skipped() {
    assert!(parse_symbols("this is a ` ` symbol").is_empty());
}

#[test]
fn symbols_multiple_in_order() {
    let symbols = parse_symbols("this is a `test` symbol\n and `another` symbol");
    let names: Vec<&str> = symbols.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["test", "another"]);
}

#[test]
fn symbols_from_script() {
    let script = Script {
        content: "Call `ScriptB` and show the result.".to_string(),
        ..Default::default()
    };
    let symbols = script.symbols();
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name, "ScriptB");
}

// ===========================================================================
// step trees
// ===========================================================================

fn render(content: &str) -> String {
    let (root, _) = parse_list(content);
    root.markdown()
}

#[test]
fn step_markdown_simple_list() {
    assert_eq!(
        render("- Item 1\n- Item 2\n- Item 3"),
        "- Item 1\n- Item 2\n- Item 3\n"
    );
}

#[test]
fn step_markdown_nested_list() {
    let input = "- Parent 1\n  - Child 1.1\n  - Child 1.2\n- Parent 2\n  - Child 2.1";
    assert_eq!(
        render(input),
        "- Parent 1\n  - Child 1.1\n  - Child 1.2\n- Parent 2\n  - Child 2.1\n"
    );
}

#[test]
fn step_markdown_deep_nested_list() {
    let input = "- Level 1\n  - Level 2\n    - Level 3\n      - Level 4";
    assert_eq!(
        render(input),
        "- Level 1\n  - Level 2\n    - Level 3\n      - Level 4\n"
    );
}

#[test]
fn step_markdown_preserves_inline_formatting() {
    let input = "- Item with *emphasis*\n- Item with **strong emphasis**\n- Item with `code`\n- Item with [link](https://example.com)";
    assert_eq!(render(input), format!("{input}\n"));
}

#[test]
fn step_markdown_is_idempotent_under_reparse() {
    let input = "- Parent 1\n  - **Child 1.1**\n";
    let once = render(input);
    let twice = render(&once);
    assert_eq!(once, twice);
}

#[test]
fn step_tree_structure() {
    let (root, _) = parse_list("- Parent\n  - Child A\n  - Child B\n- Sibling");
    assert_eq!(root.level, 0);
    assert_eq!(root.children.len(), 2);

    let parent = &root.children[0];
    assert_eq!(parent.level, 1);
    assert_eq!(parent.content, "Parent");
    assert_eq!(parent.marker, "- ");
    assert_eq!(parent.children.len(), 2);
    assert_eq!(parent.children[0].content, "Child A");
    assert_eq!(parent.children[0].level, 2);

    assert_eq!(root.children[1].content, "Sibling");
}

#[test]
fn step_tree_ordered_markers() {
    let (root, _) = parse_list("1. first\n2. second");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].marker, "1. ");
    assert_eq!(root.children[1].marker, "2. ");
    assert_eq!(root.children[0].content, "first");
}

#[test]
fn preface_before_first_list() {
    let content = "This is the preface.\n\nMore preface text.\n\n- step one\n- step two";
    let (root, preface) = parse_list(content);
    assert_eq!(preface, "This is the preface.\n\nMore preface text.");
    assert_eq!(root.children.len(), 2);
}

#[test]
fn preface_empty_without_leading_text() {
    let (_, preface) = parse_list("- only steps");
    assert_eq!(preface, "");
}

#[test]
fn preface_ignores_text_after_list() {
    let (root, preface) = parse_list("intro\n\n- a step\n\ntrailing paragraph");
    assert_eq!(preface, "intro");
    assert_eq!(root.children.len(), 1);
}

#[test]
fn no_list_means_no_steps() {
    let script = Script {
        content: "just prose, no steps".to_string(),
        ..Default::default()
    };
    let (steps, preface) = script.steps();
    assert!(steps.is_empty());
    assert_eq!(preface, "just prose, no steps");
}

// ===========================================================================
// check directives
// ===========================================================================

#[test]
fn checks_parsed_from_lines() {
    let markdown = "- say hello\ncheck: response contains hello\nverify: response is polite";
    assert_eq!(
        parse_checks(markdown),
        "response contains hello\nresponse is polite"
    );
}

#[test]
fn checks_case_insensitive() {
    assert_eq!(parse_checks("CHECK: uppercase works"), "uppercase works");
    assert_eq!(parse_checks("Verify: mixed case"), "mixed case");
}

#[test]
fn checks_japanese_prefix() {
    assert_eq!(parse_checks("確認: 日本語のチェック"), "日本語のチェック");
    assert_eq!(parse_checks("確認： 全角コロン"), "全角コロン");
}

#[test]
fn remove_checks_drops_directive_lines() {
    let markdown = "- say hello\ncheck: response contains hello\n- next step";
    assert_eq!(remove_checks(markdown), "- say hello\n- next step");
}

#[test]
fn checks_and_removal_cover_all_lines() {
    let markdown = "line one\ncheck: a check\nline two\nverify: another";
    let removed = remove_checks(markdown);
    let checks = parse_checks(markdown);

    for line in markdown.lines() {
        let in_removed = removed.lines().any(|l| l == line);
        let is_check = checks.lines().any(|c| line.contains(c));
        assert!(
            in_removed ^ is_check,
            "line must be in exactly one partition: {line}"
        );
    }
}

#[test]
fn remove_checks_empty_input() {
    assert_eq!(remove_checks(""), "");
}

// ===========================================================================
// final output coercion
// ===========================================================================

#[test]
fn final_output_valid_json_verbatim() {
    let message = Message::text(Role::Ai, r#"{"key": "value"}"#);
    let output = final_output(&message).unwrap();
    assert_eq!(output, br#"{"key": "value"}"#);
}

#[test]
fn final_output_plain_text_becomes_json_string() {
    let message = Message::text(Role::Ai, "hello");
    let output = final_output(&message).unwrap();
    assert_eq!(output, br#""hello""#);
    let decoded: String = serde_json::from_slice(&output).unwrap();
    assert_eq!(decoded, "hello");
}

#[test]
fn final_output_rejects_non_ai_message() {
    let message = Message::text(Role::Human, "not from the model");
    assert!(final_output(&message).is_err());
}

// ===========================================================================
// script model
// ===========================================================================

#[test]
fn script_as_tool_round_trip() {
    let script = Script {
        name: "helper".to_string(),
        description: "a helper script".to_string(),
        model: "gpt-4o".to_string(),
        content: "1. do the thing".to_string(),
        ..Default::default()
    };

    let tool = script.as_tool().unwrap();
    assert_eq!(tool.kind, "script");
    assert_eq!(tool.name, "helper");

    let serialized = tool.string_argument("script").unwrap();
    let restored: Script = serde_json::from_str(serialized).unwrap();
    assert_eq!(restored.name, "helper");
    assert_eq!(restored.content, "1. do the thing");
    assert_eq!(restored.model, "gpt-4o");
}

#[test]
fn script_validate() {
    let mut script = Script {
        name: "x".to_string(),
        model: "m".to_string(),
        ..Default::default()
    };
    assert!(script.validate().is_ok());

    script.model = String::new();
    assert!(script.validate().is_err());

    script.name = String::new();
    assert!(script.validate().is_err());
}

#[test]
fn script_timeout_defaults() {
    let script = Script::default();
    assert_eq!(script.timeout_seconds(), 300);

    let script = Script {
        config: jumon_script::ScriptConfig {
            timeout_seconds: 10,
        },
        ..Default::default()
    };
    assert_eq!(script.timeout_seconds(), 10);
}

#[test]
fn script_set_input_detects_json() {
    let mut script = Script::default();
    script.set_input(br#"{"key":"value"}"#);
    assert!(script.input_url.starts_with("data:application/json;base64,"));
}

#[test]
fn step_markdown_indents_by_level() {
    let step = Step {
        level: 2,
        marker: "- ".to_string(),
        content: "child".to_string(),
        children: Vec::new(),
    };
    assert_eq!(step.markdown(), "  - child\n");
}

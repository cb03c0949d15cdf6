//! Tests for jumon-module: markdown parsing, model validation, URL handling

use jumon_module::parse::{code_block, key_value_map, parse_markdown};
use jumon_module::{extract_mod_script_name, Module};

// ===========================================================================
// parsing
// ===========================================================================

#[test]
fn parse_basic_module() {
    let markdown = b"---\nmodule: basic\n---\n# t\n## Scripts\n### ModuleA\n### ModuleB\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.name, "basic");
    assert_eq!(module.scripts.len(), 2);
    assert_eq!(module.scripts[0].name, "ModuleA");
    assert_eq!(module.scripts[1].name, "ModuleB");
}

#[test]
fn parse_scripts_with_content() {
    let markdown = b"## Scripts\n### ScriptA\n- do something\n### ScriptB\n- do something else\nfirst line\nsecond line\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.name, "");
    assert_eq!(module.scripts.len(), 2);
    assert_eq!(module.scripts[0].content, "- do something");
    assert_eq!(
        module.scripts[1].content,
        "- do something else\nfirst line\nsecond line"
    );
}

#[test]
fn parse_scripts_preserve_document_order() {
    let markdown = b"## Scripts\n### zeta\n### alpha\n### mid\n";
    let module = parse_markdown(markdown).unwrap();
    let names: Vec<&str> = module.scripts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn parse_script_content_excludes_other_sections() {
    let markdown = b"## Scripts\n### main\n1. say hello\n## Tools\n### hammer\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.scripts.len(), 1);
    assert_eq!(module.scripts[0].content, "1. say hello");
    assert!(!module.scripts[0].content.contains("Tools"));
    assert_eq!(module.tools.len(), 1);
}

#[test]
fn parse_tool_with_import() {
    let markdown = b"---\nmodule: import\n---\n## Tools\n### get_weather\nimport: anothermodule\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.name, "import");
    assert_eq!(module.tools.len(), 1);
    assert_eq!(module.tools[0].name, "get_weather");
    assert_eq!(module.tools[0].module, "anothermodule");
}

#[test]
fn parse_tool_with_json_block() {
    let markdown = br#"## Tools
### ToolA
```json
{"type": "nats", "description": "Tool A description", "arguments": {"subject": "tool.std.time.now"}}
```
"#;
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.tools.len(), 1);
    let tool = &module.tools[0];
    assert_eq!(tool.name, "ToolA");
    assert_eq!(tool.kind, "nats");
    assert_eq!(tool.description, "Tool A description");
    assert_eq!(tool.string_argument("subject"), Some("tool.std.time.now"));
}

#[test]
fn parse_tool_name_overrides_json_name() {
    let markdown = b"## Tools\n### outer\n```json\n{\"name\": \"inner\", \"type\": \"wasm\"}\n```\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.tools[0].name, "outer");
    assert_eq!(module.tools[0].kind, "wasm");
}

#[test]
fn parse_events_section_is_recognized_but_empty() {
    let markdown = b"## Events\n### some-event\nsubject: event.a\n## Scripts\n### main\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.scripts.len(), 1);
    assert!(module.tools.is_empty());
}

#[test]
fn parse_other_sections_are_ignored() {
    let markdown = b"## Notes\n### not-a-script\n## Scripts\n### main\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.scripts.len(), 1);
    assert_eq!(module.scripts[0].name, "main");
}

#[test]
fn parse_frontmatter_schemas_attach_to_scripts() {
    let markdown = br#"---
module: schema
schemas:
  main.input:
    type: object
    properties:
      query:
        type: string
  main.output:
    type: object
---
## Scripts
### main
1. answer the query
"#;
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.name, "schema");
    let main = module.get_script("main").unwrap();
    assert_eq!(main.input_schema["type"], "object");
    assert_eq!(main.input_schema["properties"]["query"]["type"], "string");
    assert_eq!(main.output_schema["type"], "object");
}

#[test]
fn parse_round_trip_name_matches_frontmatter() {
    let markdown = b"---\nmodule: test/module\n---\n# t\n## Scripts\n### main\n1. say hello\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.name, "test/module");
    assert_eq!(module.scripts[0].content, "1. say hello");
}

// ===========================================================================
// code blocks and key:value lines
// ===========================================================================

#[test]
fn code_block_with_language() {
    let (lang, content) = code_block("```go\npackage main\n\nfunc main() {}\n```");
    assert_eq!(lang, "go");
    assert_eq!(content, "package main\n\nfunc main() {}");
}

#[test]
fn code_block_without_language() {
    let (lang, content) = code_block("```\nsome code\n```");
    assert_eq!(lang, "");
    assert_eq!(content, "some code");
}

#[test]
fn code_block_empty() {
    let (lang, content) = code_block("```python\n```");
    assert_eq!(lang, "python");
    assert_eq!(content, "");
}

#[test]
fn code_block_absent() {
    let (lang, content) = code_block("no fences here");
    assert_eq!(lang, "");
    assert_eq!(content, "");
}

#[test]
fn key_value_lines() {
    let map = key_value_map("import: anothermodule\ndescription: a tool\nnot a pair");
    assert_eq!(map.get("import").unwrap(), "anothermodule");
    assert_eq!(map.get("description").unwrap(), "a tool");
    assert_eq!(map.len(), 2);
}

// ===========================================================================
// model
// ===========================================================================

#[test]
fn validate_requires_name_and_scripts() {
    let module = Module::default();
    assert!(module.validate().is_err());

    let markdown = b"---\nmodule: ok\n---\n## Scripts\n### main\n";
    let module = parse_markdown(markdown).unwrap();
    assert!(module.validate().is_ok());

    let markdown = b"---\nmodule: noscripts\n---\n# nothing\n";
    let module = parse_markdown(markdown).unwrap();
    assert!(module.validate().is_err());
}

#[test]
fn get_script_defaults_to_main() {
    let markdown = b"---\nmodule: m\n---\n## Scripts\n### main\n### other\n";
    let module = parse_markdown(markdown).unwrap();
    assert_eq!(module.get_script("").unwrap().name, "main");
    assert_eq!(module.get_script("other").unwrap().name, "other");
    assert!(module.get_script("missing").is_none());
}

#[test]
fn mod_script_name_extraction() {
    assert_eq!(
        extract_mod_script_name("jumonmd/example/hello#sayname"),
        ("jumonmd/example/hello", "sayname")
    );
    assert_eq!(
        extract_mod_script_name("jumonmd/example/hello"),
        ("jumonmd/example/hello", "")
    );
}

// ===========================================================================
// vcs paths
// ===========================================================================

#[test]
fn vcs_path_github() {
    let (repo, dir) = jumon_module::fetch::vcs_path("github.com/jumonmd/jumon/example/hello").unwrap();
    assert_eq!(repo, "https://github.com/jumonmd/jumon");
    assert_eq!(dir, "example/hello");
}

#[test]
fn vcs_path_github_without_subpath() {
    let (repo, dir) = jumon_module::fetch::vcs_path("github.com/jumonmd/jumon").unwrap();
    assert_eq!(repo, "https://github.com/jumonmd/jumon");
    assert_eq!(dir, "");
}

#[test]
fn vcs_path_generic_host() {
    let (repo, dir) = jumon_module::fetch::vcs_path("gitlab.example.com/user/repo/sub/dir").unwrap();
    assert_eq!(repo, "https://gitlab.example.com/user/repo");
    assert_eq!(dir, "sub/dir");
}

#[test]
fn vcs_path_invalid() {
    assert!(jumon_module::fetch::vcs_path("not a module path").is_err());
}

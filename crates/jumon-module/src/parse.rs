//! Markdown-to-Module parser.
//!
//! The document may open with YAML (`---`) or TOML (`+++`) frontmatter
//! holding the envelope (name, version, schemas). The body is walked by
//! headings: level-2 headings `Scripts` / `Tools` / `Events` select a
//! section, level-3 headings open an item whose body runs to the next
//! heading of any level.

use crate::module::Module;
use jumon_core::frontmatter;
use jumon_script::Script;
use jumon_tool::Tool;
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

pub const SECTION_SCRIPTS: &str = "Scripts";
pub const SECTION_TOOLS: &str = "Tools";
pub const SECTION_EVENTS: &str = "Events";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("failed to unmarshal frontmatter: {0}")]
    Frontmatter(#[from] frontmatter::FrontmatterError),

    #[error("failed to unmarshal tool data: {0}")]
    ToolData(#[from] serde_json::Error),
}

/// Parse module Markdown into its executable model.
pub fn parse_markdown(markdown: &[u8]) -> Result<Module, ParseError> {
    let text = String::from_utf8_lossy(markdown);
    let (envelope, body): (Module, String) = frontmatter::unmarshal(&text)?;

    let mut module = parse_body(&body)?;
    module.name = envelope.name;
    module.jumon_version = envelope.jumon_version;
    module.schemas = envelope.schemas;
    apply_schemas(&mut module);

    Ok(module)
}

/// One heading with its resolved text and source span.
struct Heading {
    level: HeadingLevel,
    text: String,
    start: usize,
    end: usize,
}

fn parse_body(body: &str) -> Result<Module, ParseError> {
    let headings = collect_headings(body);
    let mut module = Module::default();
    let mut section = "";

    for (index, heading) in headings.iter().enumerate() {
        if heading.level == HeadingLevel::H2 {
            section = detect_section(&heading.text);
            continue;
        }
        if heading.level != HeadingLevel::H3 {
            continue;
        }

        let next_start = headings
            .get(index + 1)
            .map(|h| h.start)
            .unwrap_or(body.len());
        let content = heading_content(body, heading.end, next_start);
        let name = heading.text.trim().to_string();

        match section {
            SECTION_SCRIPTS => {
                module.scripts.push(Script {
                    name,
                    content,
                    ..Default::default()
                });
            }
            SECTION_TOOLS => {
                module.tools.push(parse_tool(name, &content)?);
            }
            _ => {}
        }
    }

    Ok(module)
}

/// Item body: the source between a heading and the next heading of any
/// level, with trailing hashes and whitespace stripped.
fn heading_content(body: &str, from: usize, to: usize) -> String {
    let content = &body[from..to];
    content.trim_end_matches(['#', ' ']).trim().to_string()
}

fn detect_section(text: &str) -> &'static str {
    match text.trim() {
        SECTION_SCRIPTS => SECTION_SCRIPTS,
        SECTION_TOOLS => SECTION_TOOLS,
        SECTION_EVENTS => SECTION_EVENTS,
        _ => "",
    }
}

/// Parse a tool item: `import:` line plus an optional fenced `json` block.
fn parse_tool(name: String, content: &str) -> Result<Tool, ParseError> {
    let mut tool = Tool::default();

    let (lang, code) = code_block(content);
    if lang == "json" && !code.is_empty() {
        tool = serde_json::from_str(&code)?;
        debug!(tool = %name, "parsed tool data");
    }

    let map = key_value_map(content);
    if tool.module.is_empty() {
        if let Some(import) = map.get("import") {
            debug!(module = %import, "import");
            tool.module = import.clone();
        }
    }

    tool.name = name;
    Ok(tool)
}

fn collect_headings(body: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    let mut current: Option<Heading> = None;

    for (event, range) in Parser::new(body).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some(Heading {
                    level,
                    text: String::new(),
                    start: range.start,
                    end: range.end,
                });
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(heading) = current.as_mut() {
                    heading.text.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(heading) = current.take() {
                    headings.push(heading);
                }
            }
            _ => {}
        }
    }
    headings
}

/// First fenced code block of `content` as `(language, code)`.
pub fn code_block(content: &str) -> (String, String) {
    use pulldown_cmark::CodeBlockKind;

    let mut lang = String::new();
    let mut code = String::new();
    let mut in_block = false;
    let mut found = false;

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) if !found => {
                lang = info.to_string();
                in_block = true;
            }
            Event::Text(text) if in_block => {
                code.push_str(&text);
            }
            Event::End(TagEnd::CodeBlock) if in_block => {
                in_block = false;
                found = true;
            }
            _ => {}
        }
    }

    (lang, code.trim_end_matches(['\n', '\r']).to_string())
}

/// Linewise `key: value` pairs of `content`.
pub fn key_value_map(content: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            map.insert(key.trim().to_string(), value.trim().to_string());
        }
    }
    map
}

/// Attach frontmatter schemas to the scripts they name.
fn apply_schemas(module: &mut Module) {
    for script in &mut module.scripts {
        if let Some(schema) = module.schemas.get(&format!("{}.input", script.name)) {
            script.input_schema = schema.clone();
        }
        if let Some(schema) = module.schemas.get(&format!("{}.output", script.name)) {
            script.output_schema = schema.clone();
        }
    }
}

//! Markdown analysis for scripts: step trees, symbols, check directives.

use crate::script::{Step, Symbol};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

fn check_prefixes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(check:|verify:|確認[:：])").unwrap())
}

/// Parse `content` into a step tree rooted at level 0, plus the preface:
/// the text of headings, paragraphs, code blocks and blockquotes that
/// appear before the first list, joined with blank lines.
pub fn parse_list(content: &str) -> (Step, String) {
    struct ItemFrame {
        level: usize,
        marker: String,
        start: Option<usize>,
        end: usize,
        children: Vec<Step>,
    }

    let mut root = Step::default();
    let mut frames: Vec<ItemFrame> = Vec::new();
    let mut list_depth = 0usize;
    let mut found_first_list = false;
    let mut preface_parts: Vec<String> = Vec::new();
    let mut preface_end = 0usize;

    for (event, range) in Parser::new(content).into_offset_iter() {
        match &event {
            Event::Start(Tag::List(_)) => {
                found_first_list = true;
                list_depth += 1;
                continue;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth -= 1;
                continue;
            }
            Event::Start(Tag::Item) => {
                frames.push(ItemFrame {
                    level: list_depth,
                    marker: item_marker(&content[range.clone()]),
                    start: None,
                    end: range.start,
                    children: Vec::new(),
                });
                continue;
            }
            Event::End(TagEnd::Item) => {
                let frame = frames.pop().expect("item frame");
                let text = match frame.start {
                    Some(start) => content[start..frame.end].trim().to_string(),
                    None => String::new(),
                };
                let step = Step {
                    level: frame.level,
                    marker: frame.marker,
                    content: text,
                    children: frame.children,
                };
                match frames.last_mut() {
                    Some(parent) => parent.children.push(step),
                    None => root.children.push(step),
                }
                continue;
            }
            _ => {}
        }

        if let Some(frame) = frames.last_mut() {
            // item body, excluding nested lists which build their own frames
            let start = frame.start.get_or_insert(range.start);
            *start = (*start).min(range.start);
            frame.end = frame.end.max(range.end);
            continue;
        }

        if found_first_list {
            continue;
        }

        if let Event::Start(
            Tag::Heading { .. } | Tag::Paragraph | Tag::CodeBlock(_) | Tag::BlockQuote(_),
        ) = &event
        {
            // skip blocks nested inside an already collected one
            if range.start >= preface_end {
                preface_parts.push(content[range.clone()].trim_end().to_string());
                preface_end = range.end;
            }
        }
    }

    (root, preface_parts.join("\n\n").trim().to_string())
}

/// The list marker at the start of an item's source, with a trailing space.
fn item_marker(item_source: &str) -> String {
    let marker: String = item_source
        .chars()
        .take_while(|c| !c.is_whitespace())
        .collect();
    format!("{} ", marker)
}

/// Extract inline code spans as symbols, in document order.
///
/// e.g. "This is a `function`" yields one `function` symbol.
pub fn parse_symbols(content: &str) -> Vec<Symbol> {
    let mut symbols = Vec::new();
    for event in Parser::new(content) {
        if let Event::Code(code) = event {
            let name = code.trim();
            if !name.is_empty() {
                symbols.push(Symbol {
                    kind: "function".to_string(),
                    name: name.to_string(),
                });
            }
        }
    }
    symbols
}

/// Collect check-directive texts, joined with newlines.
///
/// A directive is any line containing `check:`, `verify:` or `確認:`
/// (case-insensitive); the text after the prefix is the check.
pub fn parse_checks(markdown: &str) -> String {
    let mut checks = Vec::new();
    for line in markdown.lines() {
        let trimmed = line.trim();
        if let Some(found) = check_prefixes().find(trimmed) {
            let text = trimmed[found.end()..].trim();
            if !text.is_empty() {
                checks.push(text.to_string());
            }
        }
    }
    checks.join("\n")
}

/// Drop every check-directive line from the document.
pub fn remove_checks(markdown: &str) -> String {
    if markdown.is_empty() {
        return String::new();
    }
    markdown
        .lines()
        .filter(|line| !check_prefixes().is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
}

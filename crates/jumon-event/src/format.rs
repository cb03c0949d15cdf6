//! JSON template formatting for event payloads.

use minijinja::Environment;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unmarshal json: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Render `data` through `template`.
///
/// Fenced ```` ```json ```` markers and surrounding whitespace are
/// stripped first. With an empty template the cleaned bytes pass through;
/// otherwise the bytes are decoded as a JSON map and the template renders
/// with that map as context (`{{ field }}`).
pub fn format_json(data: &[u8], template: &str) -> Result<Vec<u8>, FormatError> {
    let text = String::from_utf8_lossy(data);
    let text = text
        .trim()
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string();

    if template.is_empty() {
        return Ok(text.into_bytes());
    }

    let context: serde_json::Value = serde_json::from_str(&text)?;

    let mut env = Environment::new();
    env.add_template("tmpl", template)?;
    let rendered = env
        .get_template("tmpl")?
        .render(minijinja::Value::from_serialize(&context))?;

    Ok(rendered.into_bytes())
}

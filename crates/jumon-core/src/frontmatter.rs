//! Frontmatter splitting for module documents.
//!
//! A document may open with `---` YAML or `+++` TOML frontmatter. The
//! envelope decodes into the caller's type and the remainder is returned
//! as the body. Without delimiters the whole input is the body.

use serde::de::DeserializeOwned;
use thiserror::Error;

const YAML_DELIM: &str = "---";
const TOML_DELIM: &str = "+++";

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("yaml frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("toml frontmatter: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("unterminated frontmatter")]
    Unterminated,
}

/// Split frontmatter off `input`, decoding it into `T`.
///
/// Returns the decoded envelope (default when absent) and the body.
pub fn unmarshal<T>(input: &str) -> Result<(T, String), FrontmatterError>
where
    T: Default + DeserializeOwned,
{
    let trimmed = input.trim();

    if let Some(rest) = trimmed.strip_prefix(YAML_DELIM) {
        let (matter, body) = split_matter(rest, YAML_DELIM)?;
        let value: T = serde_yaml::from_str(matter)?;
        return Ok((value, body.to_string()));
    }
    if let Some(rest) = trimmed.strip_prefix(TOML_DELIM) {
        let (matter, body) = split_matter(rest, TOML_DELIM)?;
        let value: T = toml::from_str(matter)?;
        return Ok((value, body.to_string()));
    }

    Ok((T::default(), trimmed.to_string()))
}

fn split_matter<'a>(rest: &'a str, delim: &str) -> Result<(&'a str, &'a str), FrontmatterError> {
    match rest.split_once(delim) {
        Some((matter, body)) => Ok((matter, body)),
        None => Err(FrontmatterError::Unterminated),
    }
}

//! Proposal extraction from raw model output.
//!
//! The generation collaborator is asked for a bare JSON object but may
//! wrap it in prose, markdown fences, or both. The parser strips such
//! wrapping, locates the first balanced JSON object, and validates that
//! every required field is present and non-empty before the response
//! counts as a proposal.

use thiserror::Error;

use crate::domain::models::Proposal;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("no JSON object found in response")]
    NoJsonObject,

    #[error("response JSON is malformed: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("proposal field `{0}` is missing or empty")]
    MissingField(&'static str),
}

/// Parses collaborator responses into [`Proposal`] values.
pub struct ProposalParser;

impl ProposalParser {
    pub fn parse(raw: &str) -> Result<Proposal, ParseError> {
        let object = extract_object(raw).ok_or(ParseError::NoJsonObject)?;
        let value: serde_json::Value = serde_json::from_str(object)?;

        let filepath = required_field(&value, &["filepath", "file_path"], "filepath")?;
        // The collaborator contract has used both spellings over time.
        let content = required_field(&value, &["content", "new_code"], "content")?;
        let description = required_field(&value, &["description"], "description")?;

        Ok(Proposal {
            filepath,
            content,
            description,
        })
    }
}

fn required_field(
    value: &serde_json::Value,
    keys: &[&str],
    canonical: &'static str,
) -> Result<String, ParseError> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_str))
        .map(str::to_string)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ParseError::MissingField(canonical))
}

/// Slice of `raw` spanning the first balanced JSON object, skipping
/// braces inside string literals.
fn extract_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }

    None
}

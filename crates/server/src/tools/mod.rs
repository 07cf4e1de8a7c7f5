//! MCP tool implementations.
//!
//! This module contains all tools exposed by the offgrid server.

pub mod cache;
pub mod web_fetch;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One response header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

pub(crate) fn header_fields(headers: &[(String, String)]) -> Vec<HeaderField> {
    headers
        .iter()
        .map(|(name, value)| HeaderField { name: name.clone(), value: value.clone() })
        .collect()
}

/// A response body rendered for JSON output.
///
/// Textual bodies that are valid UTF-8 come back as `body_text`; anything
/// else as standard base64 in `body_base64`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct BodyOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_base64: Option<String>,
}

impl BodyOutput {
    pub(crate) fn encode(content_type: Option<&str>, body: &[u8]) -> Self {
        if is_textual(content_type)
            && let Ok(text) = std::str::from_utf8(body)
        {
            return Self { body_text: Some(text.to_string()), body_base64: None };
        }
        Self { body_text: None, body_base64: Some(STANDARD.encode(body)) }
    }
}

fn is_textual(content_type: Option<&str>) -> bool {
    let Some(ct) = content_type else {
        return false;
    };
    let ct = ct.to_ascii_lowercase();
    ct.starts_with("text/") || ["json", "javascript", "xml", "webmanifest"].iter().any(|t| ct.contains(t))
}

//! Response formatter
//!
//! Every tool call is rendered into a uniform envelope before it crosses the
//! transport boundary: `{ "success": true, ...payload }` on success,
//! `{ "success": false, "error": <message> }` on failure. The envelope is
//! serialized as pretty-printed JSON inside a single text content block.

use crate::error::DocsError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fallback when an error carries no message text
pub const UNKNOWN_ERROR: &str = "Unknown error occurred";

/// What a tool handler hands back to the formatter
#[derive(Debug, Clone)]
pub enum Reply {
    /// Operation-specific fields merged into the success envelope
    Payload(Map<String, Value>),
    /// Raw text passed through untouched (creatorInfo)
    Text(String),
}

impl Reply {
    /// Build a payload reply from (key, value) pairs
    pub fn payload(fields: Vec<(&str, Value)>) -> Self {
        let mut map = Map::new();
        for (key, value) in fields {
            map.insert(key.to_string(), value);
        }
        Reply::Payload(map)
    }

    /// Build a text reply
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// MCP tool call result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// Content blocks for the result
    pub content: Vec<ContentBlock>,
    /// Whether this is an error result
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    #[serde(rename = "isError")]
    pub is_error: bool,
}

/// Content block in a tool result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// Text content
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: content.into(),
            }],
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// Convert to JSON value for MCP protocol
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "content": self.content,
            "isError": self.is_error
        })
    }
}

/// Build the success envelope for a payload
pub fn success(fields: Map<String, Value>) -> Value {
    let mut envelope = Map::new();
    envelope.insert("success".to_string(), Value::Bool(true));
    envelope.extend(fields);
    Value::Object(envelope)
}

/// Build the failure envelope for an error
pub fn failure(err: &DocsError) -> Value {
    let message = err.to_string();
    let message = if message.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    };
    serde_json::json!({
        "success": false,
        "error": message
    })
}

/// Render a handler outcome into an MCP tool result
pub fn render(outcome: crate::error::Result<Reply>) -> ToolResult {
    match outcome {
        Ok(Reply::Text(text)) => ToolResult::text(text),
        Ok(Reply::Payload(fields)) => ToolResult::text(pretty(&success(fields))),
        Err(err) => ToolResult::error(pretty(&failure(&err))),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| UNKNOWN_ERROR.to_string())
}

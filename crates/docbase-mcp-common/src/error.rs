//! Error types for docbase-mcp-common
//!
//! Provides unified error handling across the server and store client.

use thiserror::Error;

/// Result type alias for Docbase operations
pub type Result<T> = std::result::Result<T, DocsError>;

/// Docbase error types
#[derive(Debug, Error)]
pub enum DocsError {
    /// Tool registry errors
    #[error("Registry error: {0}")]
    Registry(String),

    /// Tool count exceeds maximum
    #[error("Tool count {count} exceeds maximum {max}")]
    ToolCountExceeded { count: usize, max: usize },

    /// Duplicate tool registration
    #[error("Duplicate tool: {0}")]
    DuplicateTool(String),

    /// Tool not found during dispatch
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Invalid tool arguments (schema validation failure)
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Read/update/delete target matched zero rows
    #[error("No document found with id: {0}")]
    NotFound(String),

    /// clearCollection called without confirm = true
    #[error("Confirmation required. Set confirm parameter to true.")]
    ConfirmationRequired,

    /// updateDocument called with an empty field subset
    #[error("At least one field must be provided for update")]
    NoFieldsProvided,

    /// Failure surfaced by the remote store (constraint violations,
    /// connectivity, malformed responses)
    #[error("{0}")]
    Store(String),

    /// Configuration error (startup-fatal)
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON-RPC protocol error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocsError {
    /// Convert to JSON-RPC error code
    pub fn to_jsonrpc_code(&self) -> i32 {
        match self {
            DocsError::InvalidParams(_) => -32602,
            DocsError::ToolNotFound(_) => -32601,
            DocsError::Protocol(_) | DocsError::Serialization(_) => -32700,
            DocsError::Store(_) => -32003,
            _ => -32603,
        }
    }

    /// Create an invalid params error
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        DocsError::InvalidParams(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        DocsError::Store(msg.into())
    }
}

impl From<anyhow::Error> for DocsError {
    fn from(err: anyhow::Error) -> Self {
        DocsError::Internal(err.to_string())
    }
}

impl From<reqwest::Error> for DocsError {
    fn from(err: reqwest::Error) -> Self {
        DocsError::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jsonrpc_codes() {
        assert_eq!(
            DocsError::InvalidParams("x".into()).to_jsonrpc_code(),
            -32602
        );
        assert_eq!(DocsError::ToolNotFound("x".into()).to_jsonrpc_code(), -32601);
        assert_eq!(DocsError::Protocol("x".into()).to_jsonrpc_code(), -32700);
        assert_eq!(DocsError::Store("x".into()).to_jsonrpc_code(), -32003);
        assert_eq!(DocsError::ConfirmationRequired.to_jsonrpc_code(), -32603);
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(
            DocsError::ConfirmationRequired.to_string(),
            "Confirmation required. Set confirm parameter to true."
        );
        assert_eq!(
            DocsError::NoFieldsProvided.to_string(),
            "At least one field must be provided for update"
        );
        // Store errors surface the backend text as-is
        assert_eq!(
            DocsError::Store("duplicate key value violates unique constraint".into()).to_string(),
            "duplicate key value violates unique constraint"
        );
    }
}

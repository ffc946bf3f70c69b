//! Info tools for docbase-mcp
//!
//! 1 tool: creatorInfo (static text, no store access).

use docbase_mcp_common::error::Result;
use docbase_mcp_common::registry::{ToolDefinition, ToolRegistry};

/// Static text returned by creatorInfo
pub const CREATOR_INFO: &str = r#"# Docbase
Hosted-table CRUD tools for MCP clients.

## About
Docbase-MCP exposes a Supabase-backed company directory to AI agents through
the Model Context Protocol. Every tool is a thin pass-through to the hosted
table: no local state, no caching, one round trip per call.

## Tools
- getDocument / listDocuments: read by id, or page with ordering
- createDocument / updateDocument / deleteDocument: row lifecycle
- upsertDocument: insert-or-update keyed on company_id
- clearCollection: wipe a table (requires confirm = true)

## Stack
Rust, tokio, axum, reqwest against the Supabase PostgREST API.
Transports: stdio, TCP and HTTP (streamable + SSE).

---
Maintained by the Docbase contributors. Issues and patches welcome at the
project repository."#;

/// Register info tools (1 tool)
pub fn register(registry: &mut ToolRegistry) -> Result<()> {
    registry.register(creator_info())
}

fn creator_info() -> ToolDefinition {
    ToolDefinition::new(
        "creatorInfo",
        "Get information about Docbase and the team behind this MCP server",
        "info",
    )
}

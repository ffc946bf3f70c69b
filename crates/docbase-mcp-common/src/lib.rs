//! Docbase-MCP Common Infrastructure
//!
//! Shared MCP server infrastructure for Docbase servers.
//! Provides:
//! - Tool registry with schema validation and defaulting
//! - Shared meta tools (mcp_capabilities, mcp_version, mcp_health)
//! - Supabase (PostgREST) store client with sparse write payloads
//! - Server core with stdio, TCP and HTTP/SSE transports
//! - Uniform success/error response envelopes

pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod meta;
pub mod registry;
pub mod server;
pub mod store;

pub use config::{ServerConfig, StoreConfig};
pub use envelope::{ContentBlock, Reply, ToolResult};
pub use error::{DocsError, Result};
pub use meta::{ServerIdentity, SharedMetaTools};
pub use registry::{PropertySchema, ToolDefinition, ToolInputSchema, ToolRegistry};
pub use server::{McpServer, ToolHandlerFn, Transport};
pub use store::{DocumentFields, ListQuery, StoreClient};

// Re-export tracing for convenience
pub use tracing::{debug, error, info, trace, warn};

/// Maximum number of tools per server (MCP client constraint)
pub const MAX_TOOLS_PER_SERVER: usize = 90;

/// Docbase-MCP version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

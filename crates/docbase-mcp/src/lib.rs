//! Docbase MCP Server
//!
//! Document CRUD tools over a hosted Supabase table, served over stdio, TCP
//! or HTTP. Tool surface:
//!
//! - Documents (7): getDocument, listDocuments, createDocument,
//!   updateDocument, deleteDocument, upsertDocument, clearCollection
//! - Info (1): creatorInfo
//! - Meta shared (3): mcp_capabilities, mcp_version, mcp_health

pub mod handlers;
pub mod tools;

use crate::handlers::DocToolHandler;
use docbase_mcp_common::config::ServerConfig;
use docbase_mcp_common::error::{DocsError, Result};
use docbase_mcp_common::meta::ServerIdentity;
use docbase_mcp_common::registry::ToolRegistry;
use docbase_mcp_common::server::McpServer;
use docbase_mcp_common::store::StoreClient;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Expected registry count excluding shared meta (3)
pub const EXPECTED_REGISTRY_COUNT: usize = 8;

/// Expected total tool count (8 registry + 3 shared meta)
pub const EXPECTED_TOOL_COUNT: usize = 11;

/// Create and configure the tool registry for docbase-mcp
///
/// # Errors
/// Returns an error if tool registration fails (duplicate names, exceeding
/// the tool limit) or the count drifts from the expected surface.
pub fn create_registry() -> Result<ToolRegistry> {
    debug!(target: "docbase_mcp", "Creating tool registry");
    let mut registry = ToolRegistry::new();

    register_category(&mut registry, "documents", tools::documents::register)?;
    register_category(&mut registry, "info", tools::info::register)?;

    let tool_count = registry.len();
    if tool_count != EXPECTED_REGISTRY_COUNT {
        return Err(DocsError::Registry(format!(
            "Registry count mismatch: got {}, expected {} (registry only, shared meta not included)",
            tool_count, EXPECTED_REGISTRY_COUNT
        )));
    }

    info!(
        target: "docbase_mcp",
        "Registry created: {} tools (limit {})",
        tool_count,
        docbase_mcp_common::MAX_TOOLS_PER_SERVER
    );

    Ok(registry)
}

/// Helper to register a category with logging and error context
fn register_category(
    registry: &mut ToolRegistry,
    category: &str,
    register_fn: fn(&mut ToolRegistry) -> Result<()>,
) -> Result<()> {
    let before = registry.len();
    register_fn(registry).map_err(|e| {
        error!(target: "docbase_mcp", "Failed to register {} tools: {}", category, e);
        e
    })?;
    let added = registry.len() - before;
    debug!(target: "docbase_mcp", "Registered {} {} tools", added, category);
    Ok(())
}

/// Create the MCP server with the store client and all tools wired in
///
/// # Errors
/// Returns an error when the store configuration is invalid or registration
/// fails. A missing store URL or key fails here, once, at startup.
pub async fn create_server_with_tools(config: ServerConfig) -> Result<McpServer> {
    debug!(target: "docbase_mcp", "Creating server with tools");

    let store = Arc::new(StoreClient::new(&config.store)?);
    let server = McpServer::new(ServerIdentity::docs(), config)
        .with_store(Arc::clone(&store))
        .with_tool_handler(DocToolHandler::new(store));

    let tool_registry = create_registry()?;

    let mut registered = 0;
    {
        let mut registry = server.registry().await;
        for tool in tool_registry.tools() {
            registry.register(tool.clone()).map_err(|e| {
                error!(target: "docbase_mcp", "Failed to register tool '{}': {}", tool.name, e);
                e
            })?;
            registered += 1;
        }
    }

    info!(target: "docbase_mcp", "Server ready: {} tools registered", registered);

    Ok(server)
}

/// Validate that the registry meets the expected tool surface
///
/// # Errors
/// Returns an error if the registry exceeds the tool limit.
pub fn validate_registry(registry: &ToolRegistry) -> Result<()> {
    registry.validate()?;

    let count = registry.len();
    let limit = docbase_mcp_common::MAX_TOOLS_PER_SERVER;

    if count > limit * 8 / 10 {
        warn!(
            target: "docbase_mcp",
            "Registry at {}% capacity: {}/{} tools",
            count * 100 / limit,
            count,
            limit
        );
    }

    info!(target: "docbase_mcp", "{}", registry.summary());
    Ok(())
}

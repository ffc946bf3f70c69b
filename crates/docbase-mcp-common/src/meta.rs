//! Shared Meta Tools
//!
//! Meta tools registered on every Docbase MCP server:
//! - mcp_capabilities: List tools organized by category
//! - mcp_version: Get server version information
//! - mcp_health: Check server and store health

use crate::envelope::Reply;
use crate::error::Result;
use crate::registry::{PropertySchema, ToolDefinition, ToolInputSchema, ToolRegistry};
use crate::store::{StoreClient, DEFAULT_TABLE};
use crate::VERSION;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::time::Instant;

/// Server identity for meta tools
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Server name (e.g., "docbase-mcp")
    pub name: String,
    /// Server description
    pub description: String,
    /// Categories of tools provided
    pub categories: Vec<String>,
    /// Whether this server requires a reachable store
    pub requires_store: bool,
}

impl ServerIdentity {
    /// Create identity for the document CRUD server
    pub fn docs() -> Self {
        Self {
            name: "docbase-mcp".to_string(),
            description: "Document CRUD tools over a hosted Supabase table".to_string(),
            categories: vec![
                "documents".to_string(),
                "info".to_string(),
                "meta".to_string(),
            ],
            requires_store: true,
        }
    }
}

/// Shared meta tools that are registered on every server
pub struct SharedMetaTools {
    identity: ServerIdentity,
}

impl SharedMetaTools {
    /// Create shared meta tools for a server
    pub fn new(identity: ServerIdentity) -> Self {
        Self { identity }
    }

    /// Names of the shared meta tools, used for dispatch routing
    pub fn is_meta_tool(name: &str) -> bool {
        matches!(name, "mcp_capabilities" | "mcp_version" | "mcp_health")
    }

    /// Get the shared meta tool definitions
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        vec![
            self.mcp_capabilities_def(),
            self.mcp_version_def(),
            self.mcp_health_def(),
        ]
    }

    /// Register shared meta tools into a registry
    pub fn register(&self, registry: &mut ToolRegistry) -> Result<()> {
        for tool in self.tool_definitions() {
            registry.register(tool)?;
        }
        Ok(())
    }

    fn mcp_capabilities_def(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "category".to_string(),
            PropertySchema::string("Filter by category name"),
        );

        ToolDefinition::new(
            "mcp_capabilities",
            "List all available tools organized by category",
            "meta",
        )
        .with_schema(ToolInputSchema::object(properties, vec![]))
    }

    fn mcp_version_def(&self) -> ToolDefinition {
        ToolDefinition::new("mcp_version", "Get server version information", "meta")
    }

    fn mcp_health_def(&self) -> ToolDefinition {
        ToolDefinition::new(
            "mcp_health",
            "Check health of the server and the backing store",
            "meta",
        )
    }

    /// Handle mcp_capabilities
    pub fn handle_capabilities(
        &self,
        args: &serde_json::Value,
        registry: &ToolRegistry,
    ) -> Result<Reply> {
        let filter = args.get("category").and_then(|v| v.as_str());

        let mut categories = serde_json::Map::new();
        for category in registry.categories() {
            if let Some(wanted) = filter {
                if wanted != category {
                    continue;
                }
            }
            let tools: Vec<_> = registry
                .by_category(category)
                .iter()
                .map(|t| json!({"name": t.name, "description": t.description}))
                .collect();
            categories.insert(category.to_string(), json!(tools));
        }

        Ok(Reply::payload(vec![
            ("server", json!(self.identity.name)),
            ("version", json!(VERSION)),
            ("tool_count", json!(registry.len())),
            ("categories", serde_json::Value::Object(categories)),
        ]))
    }

    /// Handle mcp_version
    pub fn handle_version(&self, registry: &ToolRegistry) -> Result<Reply> {
        Ok(Reply::payload(vec![
            ("server", json!(self.identity.name)),
            ("version", json!(VERSION)),
            ("description", json!(self.identity.description)),
            ("tool_count", json!(registry.len())),
        ]))
    }

    /// Handle mcp_health
    pub async fn handle_health(
        &self,
        store: Option<&StoreClient>,
        registry: &ToolRegistry,
    ) -> Result<Reply> {
        let started = Instant::now();
        let mut components = Vec::new();
        let mut healthy = true;

        components.push(json!({
            "name": "registry",
            "ok": true,
            "message": registry.summary(),
        }));

        match store {
            Some(client) => match client.ping(DEFAULT_TABLE).await {
                Ok(()) => components.push(json!({
                    "name": "store",
                    "ok": true,
                    "message": "store reachable",
                })),
                Err(e) => {
                    healthy = false;
                    components.push(json!({
                        "name": "store",
                        "ok": false,
                        "message": e.to_string(),
                    }));
                }
            },
            None => {
                healthy = !self.identity.requires_store;
                components.push(json!({
                    "name": "store",
                    "ok": !self.identity.requires_store,
                    "message": "store not configured",
                }));
            }
        }

        Ok(Reply::payload(vec![
            ("healthy", json!(healthy)),
            ("checked_at", json!(Utc::now().to_rfc3339())),
            (
                "check_duration_ms",
                json!(started.elapsed().as_millis() as u64),
            ),
            ("components", json!(components)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope;

    #[test]
    fn test_docs_identity() {
        let identity = ServerIdentity::docs();
        assert_eq!(identity.name, "docbase-mcp");
        assert!(identity.requires_store);
        assert!(identity.categories.contains(&"documents".to_string()));
    }

    #[test]
    fn test_meta_tool_names() {
        assert!(SharedMetaTools::is_meta_tool("mcp_capabilities"));
        assert!(SharedMetaTools::is_meta_tool("mcp_version"));
        assert!(SharedMetaTools::is_meta_tool("mcp_health"));
        assert!(!SharedMetaTools::is_meta_tool("getDocument"));
    }

    #[test]
    fn test_register_meta_tools() {
        let meta = SharedMetaTools::new(ServerIdentity::docs());
        let mut registry = ToolRegistry::new();
        meta.register(&mut registry).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("mcp_health").is_some());
    }

    #[test]
    fn test_capabilities_reply() {
        let meta = SharedMetaTools::new(ServerIdentity::docs());
        let mut registry = ToolRegistry::new();
        meta.register(&mut registry).unwrap();

        let reply = meta
            .handle_capabilities(&serde_json::json!({}), &registry)
            .unwrap();
        let result = envelope::render(Ok(reply));
        assert!(!result.is_error);

        let crate::envelope::ContentBlock::Text { text } = &result.content[0];
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["success"], true);
        assert_eq!(parsed["tool_count"], 3);
        assert!(parsed["categories"]["meta"].is_array());
    }

    #[tokio::test]
    async fn test_health_without_store() {
        let meta = SharedMetaTools::new(ServerIdentity::docs());
        let registry = ToolRegistry::new();

        let reply = meta.handle_health(None, &registry).await.unwrap();
        let result = envelope::render(Ok(reply));
        let crate::envelope::ContentBlock::Text { text } = &result.content[0];
        let parsed: serde_json::Value = serde_json::from_str(text).unwrap();
        // docs server requires a store, so an unconfigured store is unhealthy
        assert_eq!(parsed["healthy"], false);
        assert_eq!(parsed["success"], true);
    }
}

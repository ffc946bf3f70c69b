//! MCP Server Core
//!
//! Line-delimited JSON-RPC 2.0 server with stdio and TCP transports (the
//! HTTP transports live in [`crate::http`]). Tool-level failures (unknown
//! tool, invalid arguments, handler errors) never become JSON-RPC errors:
//! they are rendered into the uniform failure envelope so nothing ever
//! crosses the transport boundary as an exception. JSON-RPC errors are
//! reserved for protocol faults.

use crate::config::ServerConfig;
use crate::envelope::{self, Reply};
use crate::error::{DocsError, Result};
use crate::meta::{ServerIdentity, SharedMetaTools};
use crate::registry::ToolRegistry;
use crate::store::StoreClient;
use serde::Deserialize;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// MCP protocol version advertised by initialize
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Transport mode for the server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Standard input/output (for MCP desktop clients)
    Stdio,
    /// TCP socket on specified port
    Tcp(u16),
    /// HTTP on specified port: POST /mcp plus GET /sse
    Http(u16),
}

/// Trait for tool handlers
pub trait ToolHandlerFn: Send + Sync {
    fn handle(
        &self,
        name: String,
        args: serde_json::Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Reply>> + Send + '_>>;
}

impl<F, Fut> ToolHandlerFn for F
where
    F: Fn(String, serde_json::Value) -> Fut + Send + Sync,
    Fut: std::future::Future<Output = Result<Reply>> + Send + 'static,
{
    fn handle(
        &self,
        name: String,
        args: serde_json::Value,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Reply>> + Send + '_>> {
        Box::pin(self(name, args))
    }
}

/// JSON-RPC request structure
#[derive(Debug, Clone, Deserialize)]
struct JsonRpcRequest {
    /// JSON-RPC version (should be "2.0")
    #[serde(default)]
    #[allow(dead_code)]
    jsonrpc: String,
    /// Request ID (None for notifications)
    id: Option<serde_json::Value>,
    /// Method name
    method: String,
    /// Method parameters
    #[serde(default)]
    params: serde_json::Value,
}

impl JsonRpcRequest {
    fn validate(&self) -> Result<()> {
        if self.method.is_empty() {
            return Err(DocsError::InvalidParams(
                "Method name cannot be empty".to_string(),
            ));
        }
        if self.method.len() > 256 {
            return Err(DocsError::InvalidParams(
                "Method name too long (max 256 chars)".to_string(),
            ));
        }
        Ok(())
    }
}

/// MCP server with configurable transport
pub struct McpServer {
    /// Server identity
    identity: ServerIdentity,
    /// Server configuration
    config: ServerConfig,
    /// Tool registry
    registry: Arc<RwLock<ToolRegistry>>,
    /// Store client, shared with handlers and mcp_health
    store: Option<Arc<StoreClient>>,
    /// Shared meta tools handler
    meta_tools: Arc<SharedMetaTools>,
    /// Tool handler for non-meta tools
    tool_handler: Option<Arc<dyn ToolHandlerFn>>,
}

impl McpServer {
    /// Create a new MCP server; shared meta tools are registered up front
    pub fn new(identity: ServerIdentity, config: ServerConfig) -> Self {
        let meta_tools = Arc::new(SharedMetaTools::new(identity.clone()));
        let mut registry = ToolRegistry::new();

        if let Err(e) = meta_tools.register(&mut registry) {
            error!("Failed to register meta tools: {}", e);
        }

        Self {
            identity,
            config,
            registry: Arc::new(RwLock::new(registry)),
            store: None,
            meta_tools,
            tool_handler: None,
        }
    }

    /// Attach the store client
    pub fn with_store(mut self, store: Arc<StoreClient>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the tool handler
    pub fn with_tool_handler<H: ToolHandlerFn + 'static>(mut self, handler: H) -> Self {
        self.tool_handler = Some(Arc::new(handler));
        self
    }

    /// Get mutable access to registry for tool registration
    pub async fn registry(&self) -> tokio::sync::RwLockWriteGuard<'_, ToolRegistry> {
        self.registry.write().await
    }

    /// Get read access to registry
    pub async fn registry_read(&self) -> tokio::sync::RwLockReadGuard<'_, ToolRegistry> {
        self.registry.read().await
    }

    /// Get server identity
    pub fn identity(&self) -> &ServerIdentity {
        &self.identity
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Run server in stdio mode
    pub async fn serve_stdio(self) -> Result<()> {
        info!("Starting {} in stdio mode", self.identity.name);

        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        let mut lines = stdin.lines();

        info!("MCP server ready, waiting for requests...");

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }

            debug!(direction = "REQUEST", "{}", truncate_for_log(&line));

            let response = self.handle_request(&line).await;

            // Don't send response for notifications
            if !response.is_null() {
                let response_str =
                    serde_json::to_string(&response).map_err(DocsError::Serialization)?;
                debug!(direction = "RESPONSE", "{}", truncate_for_log(&response_str));

                stdout.write_all(response_str.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Run server in TCP mode
    pub async fn serve_tcp(self, port: u16) -> Result<()> {
        let addr = format!("127.0.0.1:{}", port);
        info!("Starting {} on {}", self.identity.name, addr);

        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", addr);

        let server = Arc::new(self);

        loop {
            let (stream, peer) = listener.accept().await?;
            info!("New connection from {}", peer);

            let server_clone = Arc::clone(&server);
            tokio::spawn(async move {
                if let Err(e) = server_clone.handle_tcp_connection(stream).await {
                    error!("Connection error: {}", e);
                }
            });
        }
    }

    /// Handle a single TCP connection
    async fn handle_tcp_connection(&self, stream: TcpStream) -> Result<()> {
        stream.set_nodelay(true)?;
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_request(&line).await;

            if !response.is_null() {
                let response_str = serde_json::to_string(&response)?;
                writer.write_all(response_str.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Run with specified transport
    pub async fn serve(self, transport: Transport) -> Result<()> {
        match transport {
            Transport::Stdio => self.serve_stdio().await,
            Transport::Tcp(port) => self.serve_tcp(port).await,
            Transport::Http(port) => crate::http::serve(Arc::new(self), port).await,
        }
    }

    /// Handle a raw JSON-RPC request line and produce the response value.
    ///
    /// Returns `Value::Null` for notifications. This is the single entry
    /// point shared by every transport.
    pub async fn handle_request(&self, line: &str) -> serde_json::Value {
        if line.len() > self.config.max_request_bytes {
            error!(target: "docbase::server", size = line.len(), "Request too large");
            return serde_json::json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {
                    "code": -32600,
                    "message": format!("Request too large (max {} bytes)", self.config.max_request_bytes)
                }
            });
        }

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => {
                error!(target: "docbase::server", error = %e, "Failed to parse request");
                return serde_json::json!({
                    "jsonrpc": "2.0",
                    "id": null,
                    "error": {
                        "code": -32700,
                        "message": format!("Parse error: {}", e)
                    }
                });
            }
        };

        if let Err(e) = request.validate() {
            error!(target: "docbase::server", error = %e, "Invalid request");
            return serde_json::json!({
                "jsonrpc": "2.0",
                "id": request.id,
                "error": {
                    "code": e.to_jsonrpc_code(),
                    "message": e.to_string()
                }
            });
        }

        // Handle notifications (no id)
        if request.id.is_none() {
            self.handle_notification(&request.method).await;
            return serde_json::Value::Null;
        }

        let id = request.id.clone().unwrap_or(serde_json::Value::Null);

        match self.dispatch_method(&request.method, request.params).await {
            Ok(result) => serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result
            }),
            Err(e) => serde_json::json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {
                    "code": e.to_jsonrpc_code(),
                    "message": e.to_string()
                }
            }),
        }
    }

    /// Dispatch method call
    async fn dispatch_method(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        match method {
            "initialize" => self.handle_initialize().await,
            "tools/list" => self.handle_tools_list().await,
            "tools/call" => self.handle_tools_call(&params).await,
            _ => Err(DocsError::Protocol(format!("Unknown method: {}", method))),
        }
    }

    /// Handle notifications
    async fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => {
                info!("Client initialized");
            }
            "notifications/cancelled" => {
                debug!("Request cancelled");
            }
            _ => {
                debug!("Unknown notification: {}", method);
            }
        }
    }

    /// Handle initialize
    async fn handle_initialize(&self) -> Result<serde_json::Value> {
        let registry = self.registry.read().await;
        Ok(serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.identity.name,
                "version": crate::VERSION
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "instructions": format!(
                "{} - {} tools available across {} categories",
                self.identity.description,
                registry.len(),
                self.identity.categories.len()
            )
        }))
    }

    /// Handle tools/list
    async fn handle_tools_list(&self) -> Result<serde_json::Value> {
        let registry = self.registry.read().await;
        Ok(serde_json::json!({ "tools": registry.to_mcp_tools() }))
    }

    /// Handle tools/call: look up, validate, invoke, envelope.
    ///
    /// Every tool-level failure is converted into the failure envelope; the
    /// only errors returned from here are protocol faults (missing name).
    async fn handle_tools_call(&self, params: &serde_json::Value) -> Result<serde_json::Value> {
        let name = params
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| DocsError::InvalidParams("Missing 'name' parameter".to_string()))?;

        let args = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        debug!(target: "docbase::server", tool = %name, "Tool call");

        let outcome = self.run_tool(name, args).await;
        if let Err(e) = &outcome {
            error!(target: "docbase::server", tool = %name, error = %e, "Tool call failed");
        }
        Ok(envelope::render(outcome).to_value())
    }

    async fn run_tool(&self, name: &str, raw_args: serde_json::Value) -> Result<Reply> {
        let registry = self.registry.read().await;
        let tool = registry
            .get(name)
            .ok_or_else(|| DocsError::ToolNotFound(name.to_string()))?;

        let args = tool.input_schema.validate(raw_args)?;

        if SharedMetaTools::is_meta_tool(name) {
            return match name {
                "mcp_capabilities" => self.meta_tools.handle_capabilities(&args, &registry),
                "mcp_version" => self.meta_tools.handle_version(&registry),
                _ => {
                    self.meta_tools
                        .handle_health(self.store.as_deref(), &registry)
                        .await
                }
            };
        }

        // The registry guard is not held across the handler: tool calls are
        // independent and the registry is immutable after startup.
        drop(registry);

        match &self.tool_handler {
            Some(handler) => handler.handle(name.to_string(), args).await,
            None => Err(DocsError::ToolNotFound(name.to_string())),
        }
    }
}

/// Truncate long payloads for logging at a char boundary
fn truncate_for_log(s: &str) -> String {
    const MAX: usize = 500;
    if s.len() <= MAX {
        return s.to_string();
    }
    let mut end = MAX;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &s[..end])
}

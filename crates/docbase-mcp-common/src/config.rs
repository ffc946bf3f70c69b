//! Server and store configuration
//!
//! Configuration handling for Docbase MCP servers. The store URL and
//! service-role key are the two required values; everything else defaults.

use crate::error::{DocsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the store URL
pub const ENV_STORE_URL: &str = "SUPABASE_URL";

/// Environment variable holding the service-role key
pub const ENV_SERVICE_ROLE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server name
    pub name: String,
    /// TCP port to listen on
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    /// HTTP port to listen on
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
    /// Maximum request body size in bytes
    #[serde(default = "default_max_request_bytes")]
    pub max_request_bytes: usize,
    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Supabase (PostgREST) store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`
    #[serde(default)]
    pub url: String,
    /// Service-role key (bypasses row-level security)
    #[serde(default)]
    pub service_role_key: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

// Default value functions

fn default_tcp_port() -> u16 {
    7040
}

fn default_http_port() -> u16 {
    8080
}

fn default_timeout_ms() -> u64 {
    30000
}

fn default_max_request_bytes() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "docbase-mcp".to_string(),
            tcp_port: default_tcp_port(),
            http_port: default_http_port(),
            verbose: false,
            max_request_bytes: default_max_request_bytes(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            service_role_key: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl StoreConfig {
    /// Create a store config from explicit values
    pub fn new(url: impl Into<String>, service_role_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service_role_key: service_role_key.into(),
            timeout_ms: default_timeout_ms(),
        }
    }

    /// Load the store configuration from the environment
    ///
    /// # Errors
    /// Returns a `Config` error if either required variable is missing;
    /// missing store credentials are startup-fatal, never a per-call failure.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(ENV_STORE_URL)
            .map_err(|_| DocsError::Config(format!("{} is not set", ENV_STORE_URL)))?;
        let service_role_key = std::env::var(ENV_SERVICE_ROLE_KEY)
            .map_err(|_| DocsError::Config(format!("{} is not set", ENV_SERVICE_ROLE_KEY)))?;

        let config = Self::new(url, service_role_key);
        config.validate()?;
        Ok(config)
    }

    /// Validate that the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(DocsError::Config("store URL is empty".to_string()));
        }
        if self.service_role_key.is_empty() {
            return Err(DocsError::Config("service-role key is empty".to_string()));
        }
        url::Url::parse(&self.url)
            .map_err(|e| DocsError::Config(format!("invalid store URL '{}': {}", self.url, e)))?;
        Ok(())
    }
}

impl ServerConfig {
    /// Create a new config with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| DocsError::Config(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| DocsError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Fill the store section from the environment when the file left it empty
    pub fn with_store_from_env(mut self) -> Result<Self> {
        if self.store.url.is_empty() || self.store.service_role_key.is_empty() {
            let timeout_ms = self.store.timeout_ms;
            self.store = StoreConfig {
                timeout_ms,
                ..StoreConfig::from_env()?
            };
        } else {
            self.store.validate()?;
        }
        Ok(self)
    }

    /// Configuration for the document CRUD server
    pub fn docs() -> Self {
        Self::new("docbase-mcp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.tcp_port, 7040);
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.max_request_bytes, 1024 * 1024);
        assert!(!config.verbose);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
            name = "test-server"
            tcp_port = 9999
            verbose = true

            [store]
            url = "https://example.supabase.co"
            service_role_key = "service-key"
        "#;
        let config = ServerConfig::from_toml(toml).unwrap();
        assert_eq!(config.name, "test-server");
        assert_eq!(config.tcp_port, 9999);
        assert!(config.verbose);
        assert_eq!(config.store.url, "https://example.supabase.co");
        assert_eq!(config.store.timeout_ms, 30000);
    }

    #[test]
    fn test_store_config_validation() {
        assert!(StoreConfig::new("https://example.supabase.co", "key")
            .validate()
            .is_ok());

        let missing_key = StoreConfig::new("https://example.supabase.co", "");
        assert!(matches!(
            missing_key.validate(),
            Err(DocsError::Config(_))
        ));

        let bad_url = StoreConfig::new("not a url", "key");
        assert!(matches!(bad_url.validate(), Err(DocsError::Config(_))));
    }

    #[test]
    fn test_store_defaults() {
        let config = StoreConfig::default();
        assert!(config.url.is_empty());
        assert_eq!(config.timeout_ms, 30000);
    }
}

//! Tool Registry
//!
//! Maps tool names to their description, input schema and category, and
//! validates raw call arguments against the declared schema before a handler
//! ever sees them. Declared defaults are applied to missing optional fields.

use crate::error::{DocsError, Result};
use crate::MAX_TOOLS_PER_SERVER;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Tool definition with schema metadata
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    /// Tool name (must be unique within registry)
    pub name: String,
    /// Short description for MCP discovery
    pub description: String,
    /// Category for organization
    pub category: String,
    /// Input schema for the tool
    pub input_schema: ToolInputSchema,
}

/// JSON Schema for tool input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    /// Schema type (always "object" for tool inputs)
    #[serde(rename = "type")]
    pub schema_type: String,
    /// Property definitions
    #[serde(default)]
    pub properties: HashMap<String, PropertySchema>,
    /// Required property names
    #[serde(default)]
    pub required: Vec<String>,
    /// Additional properties allowed
    #[serde(default)]
    #[serde(rename = "additionalProperties")]
    pub additional_properties: bool,
}

/// Property schema within tool input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    /// JSON Schema type
    #[serde(rename = "type")]
    pub prop_type: String,
    /// Description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Default value applied when the caller omits the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,
}

impl PropertySchema {
    /// Create a string property
    pub fn string(description: &str) -> Self {
        Self {
            prop_type: "string".to_string(),
            description: Some(description.to_string()),
            default: None,
        }
    }

    /// Create an integer property
    pub fn integer(description: &str) -> Self {
        Self {
            prop_type: "integer".to_string(),
            description: Some(description.to_string()),
            default: None,
        }
    }

    /// Create a number property
    pub fn number(description: &str) -> Self {
        Self {
            prop_type: "number".to_string(),
            description: Some(description.to_string()),
            default: None,
        }
    }

    /// Create a boolean property
    pub fn boolean(description: &str) -> Self {
        Self {
            prop_type: "boolean".to_string(),
            description: Some(description.to_string()),
            default: None,
        }
    }

    /// Add a default value
    pub fn with_default<T: Into<serde_json::Value>>(mut self, value: T) -> Self {
        self.default = Some(value.into());
        self
    }

    fn matches_type(&self, value: &serde_json::Value) -> bool {
        match self.prop_type.as_str() {
            "string" => value.is_string(),
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        }
    }
}

impl ToolInputSchema {
    /// Create an empty schema (no parameters)
    pub fn empty() -> Self {
        Self {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: Vec::new(),
            additional_properties: false,
        }
    }

    /// Create an object schema from properties and a required list
    pub fn object(properties: HashMap<String, PropertySchema>, required: Vec<&str>) -> Self {
        Self {
            schema_type: "object".to_string(),
            properties,
            required: required.into_iter().map(String::from).collect(),
            additional_properties: false,
        }
    }

    /// Validate raw arguments against this schema and apply declared defaults.
    ///
    /// Every offending field is collected so the caller gets one actionable
    /// message rather than the first failure.
    ///
    /// # Errors
    /// Returns `InvalidParams` naming every missing required field, every
    /// type mismatch and every unknown field.
    pub fn validate(&self, raw: serde_json::Value) -> Result<serde_json::Value> {
        let mut args = match raw {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(DocsError::InvalidParams(format!(
                    "arguments must be an object, got {}",
                    json_type_name(&other)
                )))
            }
        };

        let mut offending = Vec::new();

        for name in &self.required {
            if !args.contains_key(name) {
                offending.push(format!("missing required field '{}'", name));
            }
        }

        for (name, value) in &args {
            match self.properties.get(name) {
                Some(prop) => {
                    if !prop.matches_type(value) {
                        offending.push(format!(
                            "field '{}' must be of type {}, got {}",
                            name,
                            prop.prop_type,
                            json_type_name(value)
                        ));
                    }
                }
                None => {
                    if !self.additional_properties {
                        offending.push(format!("unknown field '{}'", name));
                    }
                }
            }
        }

        if !offending.is_empty() {
            return Err(DocsError::InvalidParams(offending.join("; ")));
        }

        for (name, prop) in &self.properties {
            if let Some(default) = &prop.default {
                args.entry(name.clone()).or_insert_with(|| default.clone());
            }
        }

        Ok(serde_json::Value::Object(args))
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

impl ToolDefinition {
    /// Create a new tool definition
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
            input_schema: ToolInputSchema::empty(),
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: ToolInputSchema) -> Self {
        self.input_schema = schema;
        self
    }

    /// Convert to MCP tool schema format
    pub fn to_mcp_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema
        })
    }
}

/// Tool registry with count enforcement
#[derive(Debug, Default)]
pub struct ToolRegistry {
    /// Registered tools by name
    tools: HashMap<String, ToolDefinition>,
    /// Tools organized by category
    categories: HashMap<String, Vec<String>>,
    /// Maximum allowed tools
    max_tools: usize,
}

impl ToolRegistry {
    /// Create a new registry with default max tools
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            categories: HashMap::new(),
            max_tools: MAX_TOOLS_PER_SERVER,
        }
    }

    /// Create a registry with custom max tools limit
    pub fn with_max_tools(max_tools: usize) -> Self {
        Self {
            tools: HashMap::new(),
            categories: HashMap::new(),
            max_tools,
        }
    }

    /// Register a tool
    pub fn register(&mut self, tool: ToolDefinition) -> Result<()> {
        if self.tools.contains_key(&tool.name) {
            return Err(DocsError::DuplicateTool(tool.name));
        }

        if self.tools.len() >= self.max_tools {
            return Err(DocsError::ToolCountExceeded {
                count: self.tools.len() + 1,
                max: self.max_tools,
            });
        }

        self.categories
            .entry(tool.category.clone())
            .or_default()
            .push(tool.name.clone());

        self.tools.insert(tool.name.clone(), tool);

        Ok(())
    }

    /// Register multiple tools at once
    pub fn register_all(&mut self, tools: Vec<ToolDefinition>) -> Result<()> {
        let new_total = self.tools.len() + tools.len();
        if new_total > self.max_tools {
            return Err(DocsError::ToolCountExceeded {
                count: new_total,
                max: self.max_tools,
            });
        }

        for tool in tools {
            self.register(tool)?;
        }

        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Get all tools
    pub fn tools(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    /// Get tools by category
    pub fn by_category(&self, category: &str) -> Vec<&ToolDefinition> {
        self.categories
            .get(category)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| self.tools.get(name))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get all category names
    pub fn categories(&self) -> Vec<&str> {
        self.categories.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool count
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate registry (for CI/build checks)
    pub fn validate(&self) -> Result<()> {
        if self.tools.len() > self.max_tools {
            return Err(DocsError::ToolCountExceeded {
                count: self.tools.len(),
                max: self.max_tools,
            });
        }
        Ok(())
    }

    /// Export tool list for MCP discovery
    pub fn to_mcp_tools(&self) -> Vec<serde_json::Value> {
        self.tools.values().map(|t| t.to_mcp_schema()).collect()
    }

    /// Get summary for logging
    pub fn summary(&self) -> String {
        let mut cats: Vec<_> = self
            .categories
            .iter()
            .map(|(cat, tools)| format!("{}: {}", cat, tools.len()))
            .collect();
        cats.sort();
        format!(
            "{} tools registered ({}/{}): [{}]",
            self.tools.len(),
            self.tools.len(),
            self.max_tools,
            cats.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_schema() -> ToolInputSchema {
        let mut props = HashMap::new();
        props.insert(
            "documentId".to_string(),
            PropertySchema::string("The document id"),
        );
        props.insert(
            "tableName".to_string(),
            PropertySchema::string("The table name").with_default("companies"),
        );
        props.insert(
            "limit".to_string(),
            PropertySchema::integer("Max rows").with_default(25),
        );
        ToolInputSchema::object(props, vec!["documentId"])
    }

    #[test]
    fn test_registry_new() {
        let registry = ToolRegistry::new();
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_tool() {
        let mut registry = ToolRegistry::new();
        let tool = ToolDefinition::new("test_tool", "A test tool", "test");
        registry.register(tool).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("test_tool").is_some());
    }

    #[test]
    fn test_duplicate_tool_error() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("test_tool", "First", "test"))
            .unwrap();
        let result = registry.register(ToolDefinition::new("test_tool", "Second", "test"));
        assert!(matches!(result, Err(DocsError::DuplicateTool(_))));
    }

    #[test]
    fn test_max_tools_enforcement() {
        let mut registry = ToolRegistry::with_max_tools(3);
        for i in 0..3 {
            registry
                .register(ToolDefinition::new(format!("tool_{}", i), "desc", "test"))
                .unwrap();
        }
        let result = registry.register(ToolDefinition::new("overflow_tool", "desc", "test"));
        assert!(matches!(result, Err(DocsError::ToolCountExceeded { .. })));
    }

    #[test]
    fn test_categories() {
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDefinition::new("getDocument", "Get one", "documents"))
            .unwrap();
        registry
            .register(ToolDefinition::new("listDocuments", "List", "documents"))
            .unwrap();
        registry
            .register(ToolDefinition::new("mcp_version", "Version", "meta"))
            .unwrap();

        assert_eq!(registry.by_category("documents").len(), 2);
        assert!(registry.categories().contains(&"meta"));
    }

    #[test]
    fn test_to_mcp_schema() {
        let tool = ToolDefinition::new("test", "Test tool", "test");
        let schema = tool.to_mcp_schema();
        assert_eq!(schema["name"], "test");
        assert_eq!(schema["description"], "Test tool");
        assert_eq!(schema["inputSchema"]["type"], "object");
    }

    #[test]
    fn test_validate_applies_defaults() {
        let schema = sample_schema();
        let validated = schema.validate(json!({"documentId": "abc"})).unwrap();
        assert_eq!(validated["documentId"], "abc");
        assert_eq!(validated["tableName"], "companies");
        assert_eq!(validated["limit"], 25);
    }

    #[test]
    fn test_validate_keeps_caller_values_over_defaults() {
        let schema = sample_schema();
        let validated = schema
            .validate(json!({"documentId": "abc", "limit": 5, "tableName": "people"}))
            .unwrap();
        assert_eq!(validated["limit"], 5);
        assert_eq!(validated["tableName"], "people");
    }

    #[test]
    fn test_validate_missing_required() {
        let schema = sample_schema();
        let err = schema.validate(json!({})).unwrap_err();
        match err {
            DocsError::InvalidParams(msg) => {
                assert!(msg.contains("missing required field 'documentId'"))
            }
            other => panic!("expected InvalidParams, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_type_mismatch() {
        let schema = sample_schema();
        let err = schema
            .validate(json!({"documentId": 42, "limit": "ten"}))
            .unwrap_err();
        match err {
            DocsError::InvalidParams(msg) => {
                assert!(msg.contains("field 'documentId' must be of type string"));
                assert!(msg.contains("field 'limit' must be of type integer"));
            }
            other => panic!("expected InvalidParams, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_unknown_field() {
        let schema = sample_schema();
        let err = schema
            .validate(json!({"documentId": "abc", "bogus": true}))
            .unwrap_err();
        match err {
            DocsError::InvalidParams(msg) => assert!(msg.contains("unknown field 'bogus'")),
            other => panic!("expected InvalidParams, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_null_args_treated_as_empty() {
        let mut props = HashMap::new();
        props.insert(
            "confirm".to_string(),
            PropertySchema::boolean("Must be true").with_default(false),
        );
        let schema = ToolInputSchema::object(props, vec![]);
        let validated = schema.validate(serde_json::Value::Null).unwrap();
        assert_eq!(validated["confirm"], false);
    }

    #[test]
    fn test_validate_non_object_args_rejected() {
        let schema = sample_schema();
        assert!(matches!(
            schema.validate(json!([1, 2, 3])),
            Err(DocsError::InvalidParams(_))
        ));
    }
}

//! Tool Count Golden Snapshot Tests
//!
//! Guards the external tool surface: names, counts and declared defaults are
//! a contract with MCP clients and must not drift silently.

use docbase_mcp::{create_registry, EXPECTED_REGISTRY_COUNT, EXPECTED_TOOL_COUNT};

const DOCUMENT_TOOLS: [&str; 7] = [
    "getDocument",
    "listDocuments",
    "createDocument",
    "updateDocument",
    "deleteDocument",
    "upsertDocument",
    "clearCollection",
];

#[test]
fn registry_count_matches_golden() {
    let registry = create_registry().unwrap();
    assert_eq!(registry.len(), EXPECTED_REGISTRY_COUNT);
    // 3 shared meta tools are added by the server template
    assert_eq!(EXPECTED_TOOL_COUNT, EXPECTED_REGISTRY_COUNT + 3);
}

#[test]
fn category_counts_match_golden() {
    let registry = create_registry().unwrap();
    assert_eq!(registry.by_category("documents").len(), 7);
    assert_eq!(registry.by_category("info").len(), 1);
}

#[test]
fn every_document_tool_exists() {
    let registry = create_registry().unwrap();
    for name in DOCUMENT_TOOLS {
        assert!(registry.get(name).is_some(), "{} should exist", name);
    }
    assert!(registry.get("creatorInfo").is_some());
}

#[test]
fn declared_defaults_match_golden() {
    let registry = create_registry().unwrap();

    let list = &registry.get("listDocuments").unwrap().input_schema;
    assert_eq!(list.properties["limit"].default, Some(25.into()));
    assert_eq!(list.properties["offset"].default, Some(0.into()));
    assert_eq!(
        list.properties["orderBy"].default,
        Some("created_at".into())
    );
    assert_eq!(list.properties["ascending"].default, Some(false.into()));

    let clear = &registry.get("clearCollection").unwrap().input_schema;
    assert_eq!(clear.properties["confirm"].default, Some(false.into()));

    for name in DOCUMENT_TOOLS {
        let schema = &registry.get(name).unwrap().input_schema;
        assert_eq!(
            schema.properties["tableName"].default,
            Some("companies".into()),
            "{} must default tableName to companies",
            name
        );
    }
}

#[test]
fn mcp_schema_export_is_well_formed() {
    let registry = create_registry().unwrap();
    for tool in registry.to_mcp_tools() {
        assert!(tool["name"].is_string());
        assert!(tool["description"].is_string());
        assert_eq!(tool["inputSchema"]["type"], "object");
    }
}

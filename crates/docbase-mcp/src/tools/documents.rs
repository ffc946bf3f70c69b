//! Document tools for docbase-mcp
//!
//! 7 tools: getDocument, listDocuments, createDocument, updateDocument,
//!          deleteDocument, upsertDocument, clearCollection
//!
//! Reads, updates and deletes key on the storage id; upserts key on the
//! `company_id` business column. That asymmetry is deliberate and mirrored
//! in the tool descriptions.

use docbase_mcp_common::error::Result;
use docbase_mcp_common::registry::{PropertySchema, ToolDefinition, ToolInputSchema, ToolRegistry};
use docbase_mcp_common::store::DEFAULT_TABLE;
use std::collections::HashMap;

/// Register document tools (7 tools)
pub fn register(registry: &mut ToolRegistry) -> Result<()> {
    registry.register_all(vec![
        get_document(),
        list_documents(),
        create_document(),
        update_document(),
        delete_document(),
        upsert_document(),
        clear_collection(),
    ])
}

fn table_name_prop() -> PropertySchema {
    PropertySchema::string("The table name (defaults to 'companies')").with_default(DEFAULT_TABLE)
}

fn document_id_prop(action: &str) -> PropertySchema {
    PropertySchema::string(&format!("The unique ID (UUID) of the document to {}", action))
}

/// The mutable company columns shared by create, update and upsert
fn company_field_props() -> Vec<(&'static str, PropertySchema)> {
    vec![
        (
            "company_name",
            PropertySchema::string("The name of the company"),
        ),
        (
            "company_id",
            PropertySchema::integer("The unique identifier for the company (integer)"),
        ),
        ("description", PropertySchema::string("Company description")),
        ("website", PropertySchema::string("Company website URL")),
        (
            "employee_count",
            PropertySchema::integer("Number of employees"),
        ),
        (
            "founded_year",
            PropertySchema::integer("Year the company was founded"),
        ),
        ("industry", PropertySchema::string("Industry sector")),
    ]
}

fn props(entries: Vec<(&str, PropertySchema)>) -> HashMap<String, PropertySchema> {
    entries
        .into_iter()
        .map(|(name, prop)| (name.to_string(), prop))
        .collect()
}

fn get_document() -> ToolDefinition {
    let mut entries = vec![("documentId", document_id_prop("retrieve"))];
    entries.push(("tableName", table_name_prop()));

    ToolDefinition::new(
        "getDocument",
        "Get a document by its unique ID from the Supabase database",
        "documents",
    )
    .with_schema(ToolInputSchema::object(props(entries), vec!["documentId"]))
}

fn list_documents() -> ToolDefinition {
    let entries = vec![
        ("tableName", table_name_prop()),
        (
            "limit",
            PropertySchema::integer("Maximum number of documents to return (defaults to 25)")
                .with_default(25),
        ),
        (
            "offset",
            PropertySchema::integer("Number of records to skip (defaults to 0)").with_default(0),
        ),
        (
            "orderBy",
            PropertySchema::string("Column to order by (defaults to 'created_at')")
                .with_default("created_at"),
        ),
        (
            "ascending",
            PropertySchema::boolean(
                "Sort order - true for ascending, false for descending (defaults to false)",
            )
            .with_default(false),
        ),
    ];

    ToolDefinition::new(
        "listDocuments",
        "List documents from a Supabase table with pagination and sorting",
        "documents",
    )
    .with_schema(ToolInputSchema::object(props(entries), vec![]))
}

fn create_document() -> ToolDefinition {
    let mut entries = company_field_props();
    entries.push(("tableName", table_name_prop()));

    ToolDefinition::new(
        "createDocument",
        "Create a new document in the Supabase database",
        "documents",
    )
    .with_schema(ToolInputSchema::object(
        props(entries),
        vec!["company_name", "company_id"],
    ))
}

fn update_document() -> ToolDefinition {
    let mut entries = vec![("documentId", document_id_prop("update"))];
    entries.extend(company_field_props());
    entries.push(("tableName", table_name_prop()));

    ToolDefinition::new(
        "updateDocument",
        "Update an existing document in the Supabase database (only supplied fields are written)",
        "documents",
    )
    .with_schema(ToolInputSchema::object(props(entries), vec!["documentId"]))
}

fn delete_document() -> ToolDefinition {
    let mut entries = vec![("documentId", document_id_prop("delete"))];
    entries.push(("tableName", table_name_prop()));

    ToolDefinition::new(
        "deleteDocument",
        "Delete a document from the Supabase database",
        "documents",
    )
    .with_schema(ToolInputSchema::object(props(entries), vec!["documentId"]))
}

fn upsert_document() -> ToolDefinition {
    let mut entries = company_field_props();
    entries.push(("tableName", table_name_prop()));

    ToolDefinition::new(
        "upsertDocument",
        "Create or update a document in the Supabase database (upsert keyed on company_id)",
        "documents",
    )
    .with_schema(ToolInputSchema::object(
        props(entries),
        vec!["company_name", "company_id"],
    ))
}

fn clear_collection() -> ToolDefinition {
    let entries = vec![
        ("tableName", table_name_prop()),
        (
            "confirm",
            PropertySchema::boolean("Must be set to true to confirm deletion of all records")
                .with_default(false),
        ),
    ];

    ToolDefinition::new(
        "clearCollection",
        "Delete all documents from a Supabase table (use with caution!)",
        "documents",
    )
    .with_schema(ToolInputSchema::object(props(entries), vec![]))
}

//! Document tool handler
//!
//! Routes validated tool calls to the store client. Arguments arrive here
//! already schema-checked and defaulted, so the accessors below are a second
//! line of defense, not the primary validation.

use crate::tools::info::CREATOR_INFO;
use docbase_mcp_common::envelope::Reply;
use docbase_mcp_common::error::{DocsError, Result};
use docbase_mcp_common::server::ToolHandlerFn;
use docbase_mcp_common::store::{DocumentFields, ListQuery, StoreClient};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Columns a caller may write; everything else belongs to the store
const WRITABLE_COLUMNS: [&str; 7] = [
    "company_name",
    "company_id",
    "description",
    "website",
    "employee_count",
    "founded_year",
    "industry",
];

/// Conflict column for upserts: the business key, not the storage id
const UPSERT_CONFLICT_COLUMN: &str = "company_id";

/// Handler for all document and info tools
#[derive(Clone)]
pub struct DocToolHandler {
    store: Arc<StoreClient>,
}

impl DocToolHandler {
    /// Create a handler around a shared store client
    pub fn new(store: Arc<StoreClient>) -> Self {
        Self { store }
    }
}

impl ToolHandlerFn for DocToolHandler {
    fn handle(
        &self,
        name: String,
        args: Value,
    ) -> Pin<Box<dyn Future<Output = Result<Reply>> + Send + '_>> {
        let store = self.store.clone();
        Box::pin(async move {
            let started = Instant::now();

            let result = match name.as_str() {
                "creatorInfo" => Ok(Reply::text(CREATOR_INFO)),
                "getDocument" => get_document(&store, &args).await,
                "listDocuments" => list_documents(&store, &args).await,
                "createDocument" => create_document(&store, &args).await,
                "updateDocument" => update_document(&store, &args).await,
                "deleteDocument" => delete_document(&store, &args).await,
                "upsertDocument" => upsert_document(&store, &args).await,
                "clearCollection" => clear_collection(&store, &args).await,
                _ => Err(DocsError::ToolNotFound(name.clone())),
            };

            let duration_ms = started.elapsed().as_millis();
            match &result {
                Ok(_) => {
                    debug!(target: "docbase::handlers", tool = %name, duration_ms, "Tool call completed")
                }
                Err(e) => {
                    error!(target: "docbase::handlers", tool = %name, error = %e, duration_ms, "Tool call failed")
                }
            }

            result
        })
    }
}

async fn get_document(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let id = arg_str(args, "documentId")?;

    let document = store.get(table, id).await?;
    Ok(Reply::payload(vec![("document", document)]))
}

async fn list_documents(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let query = ListQuery {
        limit: arg_u64(args, "limit")?,
        offset: arg_u64(args, "offset")?,
        order_by: arg_str(args, "orderBy")?.to_string(),
        ascending: arg_bool(args, "ascending")?,
    };

    let page = store.list(table, &query).await?;
    Ok(Reply::payload(vec![
        ("total", json!(page.total)),
        ("count", json!(page.rows.len())),
        ("documents", json!(page.rows)),
    ]))
}

async fn create_document(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let fields = writable_fields(args);

    let document = store.insert(table, fields).await?;
    Ok(Reply::payload(vec![
        ("message", json!("Document created successfully")),
        ("document", document),
    ]))
}

async fn update_document(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let id = arg_str(args, "documentId")?;
    let fields = writable_fields(args);

    if fields.is_empty() {
        return Err(DocsError::NoFieldsProvided);
    }

    let document = store.update(table, id, fields).await?;
    Ok(Reply::payload(vec![
        ("message", json!("Document updated successfully")),
        ("document", document),
    ]))
}

async fn delete_document(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let id = arg_str(args, "documentId")?;

    store.delete(table, id).await?;
    Ok(Reply::payload(vec![
        ("message", json!("Document deleted successfully")),
        ("deletedDocumentId", json!(id)),
    ]))
}

async fn upsert_document(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let fields = writable_fields(args);

    let document = store.upsert(table, fields, UPSERT_CONFLICT_COLUMN).await?;
    Ok(Reply::payload(vec![
        ("message", json!("Document upserted successfully")),
        ("document", document),
    ]))
}

async fn clear_collection(store: &StoreClient, args: &Value) -> Result<Reply> {
    let table = arg_str(args, "tableName")?;
    let confirm = arg_bool(args, "confirm")?;

    if !confirm {
        return Err(DocsError::ConfirmationRequired);
    }

    store.clear(table).await?;
    Ok(Reply::payload(vec![(
        "message",
        json!(format!("All documents cleared from table: {}", table)),
    )]))
}

/// Sparse write payload: a column appears only when the caller supplied it
fn writable_fields(args: &Value) -> DocumentFields {
    let mut fields = DocumentFields::new();
    for column in WRITABLE_COLUMNS {
        fields.set(column, args.get(column).cloned());
    }
    fields
}

fn arg_str<'a>(args: &'a Value, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| DocsError::invalid_params(format!("Missing '{}'", key)))
}

fn arg_u64(args: &Value, key: &str) -> Result<u64> {
    args.get(key)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| DocsError::invalid_params(format!("'{}' must be a non-negative integer", key)))
}

fn arg_bool(args: &Value, key: &str) -> Result<bool> {
    args.get(key)
        .and_then(|v| v.as_bool())
        .ok_or_else(|| DocsError::invalid_params(format!("Missing '{}'", key)))
}

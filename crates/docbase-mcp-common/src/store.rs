//! Supabase (PostgREST) store client
//!
//! A thin client over the hosted table store. Every operation is a single
//! round trip: select, insert, update, delete and upsert with equality
//! filters, ordering and limit/offset pagination. The client holds no cache
//! and never retries; consistency is delegated entirely to the remote store.
//!
//! Write payloads are sparse: a column is serialized only when the caller
//! supplied a value. Absent optional fields are omitted, never written as
//! null, so partial writes cannot clobber columns the caller did not touch.

use crate::config::StoreConfig;
use crate::error::{DocsError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Default table targeted by every operation
pub const DEFAULT_TABLE: &str = "companies";

/// Sentinel used to match every row when clearing a table; PostgREST refuses
/// an unfiltered delete, so the original filters on `id != nil-uuid`.
const NIL_UUID: &str = "00000000-0000-0000-0000-000000000000";

/// Page request for list operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListQuery {
    /// Maximum number of rows to return
    pub limit: u64,
    /// Number of rows to skip
    pub offset: u64,
    /// Column to order by
    pub order_by: String,
    /// Sort order, true for ascending
    pub ascending: bool,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            limit: 25,
            offset: 0,
            order_by: "created_at".to_string(),
            ascending: false,
        }
    }
}

/// One page of rows plus the exact total row count
#[derive(Debug, Clone)]
pub struct ListPage {
    /// Rows in this page, in requested order
    pub rows: Vec<Value>,
    /// Total rows in the table (from Content-Range)
    pub total: u64,
}

/// Sparse write payload: only explicitly supplied columns are serialized
#[derive(Debug, Clone, Default)]
pub struct DocumentFields(Map<String, Value>);

impl DocumentFields {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Include a column only when the caller supplied a value
    pub fn set(&mut self, column: &str, value: Option<Value>) {
        if let Some(value) = value {
            self.0.insert(column.to_string(), value);
        }
    }

    /// Number of columns present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no column was supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume into the JSON body sent to the store
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// Client for the remote table store
#[derive(Debug, Clone)]
pub struct StoreClient {
    http: reqwest::Client,
    base: String,
}

impl StoreClient {
    /// Create a client from a validated store configuration
    ///
    /// # Errors
    /// Returns a `Config` error when the URL or key is unusable.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.service_role_key)
            .map_err(|_| DocsError::Config("service-role key is not a valid header".into()))?;
        headers.insert("apikey", key);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", config.service_role_key))
            .map_err(|_| DocsError::Config("service-role key is not a valid header".into()))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> Result<String> {
        validate_identifier(table, "table name")?;
        Ok(format!("{}/rest/v1/{}", self.base, table))
    }

    /// Fetch exactly one row by id
    ///
    /// # Errors
    /// `NotFound` when zero rows match; `Store` on any backend failure.
    pub async fn get(&self, table: &str, id: &str) -> Result<Value> {
        debug!(target: "docbase::store", table, id, "fetching document");
        let id_filter = format!("eq.{}", id);
        let response = self
            .http
            .get(self.table_url(table)?)
            .query(&[("select", "*"), ("id", id_filter.as_str()), ("limit", "1")])
            .send()
            .await?;

        let rows = read_rows(response).await?;
        single_row(rows, id)
    }

    /// Fetch a page of rows ordered by the given column, plus the exact total
    pub async fn list(&self, table: &str, query: &ListQuery) -> Result<ListPage> {
        validate_identifier(&query.order_by, "order column")?;
        debug!(
            target: "docbase::store",
            table,
            limit = query.limit,
            offset = query.offset,
            order_by = %query.order_by,
            "listing documents"
        );

        let direction = if query.ascending { "asc" } else { "desc" };
        let order = format!("{}.{}", query.order_by, direction);
        let limit = query.limit.to_string();
        let offset = query.offset.to_string();
        let response = self
            .http
            .get(self.table_url(table)?)
            .header("Prefer", "count=exact")
            .query(&[
                ("select", "*"),
                ("order", order.as_str()),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }

        let total = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);

        let rows: Vec<Value> = response.json().await?;
        let total = total.unwrap_or(rows.len() as u64);

        Ok(ListPage { rows, total })
    }

    /// Insert one row and return the stored representation
    pub async fn insert(&self, table: &str, fields: DocumentFields) -> Result<Value> {
        debug!(target: "docbase::store", table, columns = fields.len(), "inserting document");
        let response = self
            .http
            .post(self.table_url(table)?)
            .header("Prefer", "return=representation")
            .json(&fields.into_value())
            .send()
            .await?;

        let rows = read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DocsError::Store("store returned no representation".into()))
    }

    /// Apply the supplied columns to the row with the given id
    ///
    /// # Errors
    /// `NotFound` when the id matches zero rows.
    pub async fn update(&self, table: &str, id: &str, fields: DocumentFields) -> Result<Value> {
        debug!(target: "docbase::store", table, id, columns = fields.len(), "updating document");
        let response = self
            .http
            .patch(self.table_url(table)?)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .json(&fields.into_value())
            .send()
            .await?;

        let rows = read_rows(response).await?;
        single_row(rows, id)
    }

    /// Delete the row with the given id
    ///
    /// # Errors
    /// `NotFound` when the id matches zero rows.
    pub async fn delete(&self, table: &str, id: &str) -> Result<()> {
        debug!(target: "docbase::store", table, id, "deleting document");
        let response = self
            .http
            .delete(self.table_url(table)?)
            .header("Prefer", "return=representation")
            .query(&[("id", format!("eq.{}", id))])
            .send()
            .await?;

        let rows = read_rows(response).await?;
        single_row(rows, id)?;
        Ok(())
    }

    /// Insert or update keyed on the conflict column (not on `id`)
    pub async fn upsert(
        &self,
        table: &str,
        fields: DocumentFields,
        conflict_column: &str,
    ) -> Result<Value> {
        validate_identifier(conflict_column, "conflict column")?;
        debug!(
            target: "docbase::store",
            table,
            conflict_column,
            columns = fields.len(),
            "upserting document"
        );
        let response = self
            .http
            .post(self.table_url(table)?)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .query(&[("on_conflict", conflict_column)])
            .json(&fields.into_value())
            .send()
            .await?;

        let rows = read_rows(response).await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DocsError::Store("store returned no representation".into()))
    }

    /// Delete every row in the table
    pub async fn clear(&self, table: &str) -> Result<()> {
        debug!(target: "docbase::store", table, "clearing table");
        let response = self
            .http
            .delete(self.table_url(table)?)
            .query(&[("id", format!("neq.{}", NIL_UUID))])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        Ok(())
    }

    /// Probe the store without touching data (used by mcp_health)
    pub async fn ping(&self, table: &str) -> Result<()> {
        let response = self
            .http
            .head(self.table_url(table)?)
            .query(&[("select", "id"), ("limit", "1")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(read_error(response).await);
        }
        Ok(())
    }
}

/// Columns and order targets must be plain SQL identifiers
fn validate_identifier(name: &str, what: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(DocsError::InvalidParams(format!(
            "invalid {}: '{}'",
            what, name
        )))
    }
}

async fn read_rows(response: reqwest::Response) -> Result<Vec<Value>> {
    if !response.status().is_success() {
        return Err(read_error(response).await);
    }
    Ok(response.json().await?)
}

/// Surface the store's own message text when it sent one
async fn read_error(response: reqwest::Response) -> DocsError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("store returned HTTP {}", status.as_u16())
            } else {
                body.trim().to_string()
            }
        });

    DocsError::Store(message)
}

fn single_row(rows: Vec<Value>, id: &str) -> Result<Value> {
    rows.into_iter()
        .next()
        .ok_or_else(|| DocsError::NotFound(id.to_string()))
}

/// Parse the total from a Content-Range header such as `0-24/3573` or `*/0`
fn parse_content_range_total(header: &str) -> Option<u64> {
    header.rsplit('/').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, headers, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::new(&StoreConfig::new(server.uri(), "service-key")).unwrap()
    }

    #[test]
    fn test_parse_content_range_total() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn test_document_fields_omit_absent_columns() {
        let mut fields = DocumentFields::new();
        fields.set("company_name", Some(json!("Acme")));
        fields.set("company_id", Some(json!(1)));
        fields.set("description", None);
        fields.set("website", None);

        assert_eq!(fields.len(), 2);
        let body = fields.into_value();
        assert_eq!(body, json!({"company_name": "Acme", "company_id": 1}));
    }

    #[test]
    fn test_identifier_validation() {
        assert!(validate_identifier("companies", "table name").is_ok());
        assert!(validate_identifier("created_at", "order column").is_ok());
        assert!(validate_identifier("", "table name").is_err());
        assert!(validate_identifier("bad;drop", "table name").is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(StoreClient::new(&StoreConfig::new("", "key")).is_err());
        assert!(StoreClient::new(&StoreConfig::new("https://x.supabase.co", "")).is_err());
    }

    #[tokio::test]
    async fn test_get_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/companies"))
            .and(query_param("id", "eq.doc-1"))
            .and(query_param("select", "*"))
            .and(header("apikey", "service-key"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{"id": "doc-1", "company_name": "Acme"}])),
            )
            .mount(&server)
            .await;

        let row = client_for(&server).get("companies", "doc-1").await.unwrap();
        assert_eq!(row["company_name"], "Acme");
    }

    #[tokio::test]
    async fn test_get_missing_document_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/companies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get("companies", "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::NotFound(id) if id == "missing"));
    }

    #[tokio::test]
    async fn test_list_orders_and_paginates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/companies"))
            .and(query_param("order", "created_at.desc"))
            .and(query_param("limit", "10"))
            .and(query_param("offset", "20"))
            .and(header("Prefer", "count=exact"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Content-Range", "20-29/30")
                    .set_body_json(json!([{"id": "a"}, {"id": "b"}])),
            )
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list(
                "companies",
                &ListQuery {
                    limit: 10,
                    offset: 20,
                    ..ListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.rows.len(), 2);
        assert_eq!(page.total, 30);
    }

    #[tokio::test]
    async fn test_list_ascending_order_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/companies"))
            .and(query_param("order", "company_name.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let page = client_for(&server)
            .list(
                "companies",
                &ListQuery {
                    order_by: "company_name".to_string(),
                    ascending: true,
                    ..ListQuery::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_insert_sends_sparse_payload() {
        let server = MockServer::start().await;
        // Exact body match: optional columns the caller never set must be absent
        Mock::given(method("POST"))
            .and(path("/rest/v1/companies"))
            .and(header("Prefer", "return=representation"))
            .and(body_json(json!({"company_name": "Acme", "company_id": 1})))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!([{"id": "doc-1", "company_name": "Acme", "company_id": 1}]),
            ))
            .mount(&server)
            .await;

        let mut fields = DocumentFields::new();
        fields.set("company_name", Some(json!("Acme")));
        fields.set("company_id", Some(json!(1)));

        let row = client_for(&server)
            .insert("companies", fields)
            .await
            .unwrap();
        assert_eq!(row["id"], "doc-1");
    }

    #[tokio::test]
    async fn test_insert_surfaces_constraint_violation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/companies"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"companies_company_id_key\""
            })))
            .mount(&server)
            .await;

        let mut fields = DocumentFields::new();
        fields.set("company_id", Some(json!(1)));

        let err = client_for(&server)
            .insert("companies", fields)
            .await
            .unwrap_err();
        assert!(
            matches!(err, DocsError::Store(msg) if msg.contains("duplicate key value"))
        );
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/companies"))
            .and(query_param("id", "eq.absent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let mut fields = DocumentFields::new();
        fields.set("company_name", Some(json!("New")));

        let err = client_for(&server)
            .update("companies", "absent", fields)
            .await
            .unwrap_err();
        assert!(matches!(err, DocsError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_targets_conflict_column() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/companies"))
            .and(query_param("on_conflict", "company_id"))
            .and(headers(
                "Prefer",
                vec!["resolution=merge-duplicates", "return=representation"],
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(
                json!([{"id": "doc-5", "company_id": 5, "company_name": "B"}]),
            ))
            .mount(&server)
            .await;

        let mut fields = DocumentFields::new();
        fields.set("company_name", Some(json!("B")));
        fields.set("company_id", Some(json!(5)));

        let row = client_for(&server)
            .upsert("companies", fields, "company_id")
            .await
            .unwrap();
        assert_eq!(row["company_name"], "B");
    }

    #[tokio::test]
    async fn test_clear_filters_on_nil_uuid() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/companies"))
            .and(query_param("id", format!("neq.{}", NIL_UUID)))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server).clear("companies").await.unwrap();
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/rest/v1/companies"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = client_for(&server);
        client.ping("companies").await.unwrap();
    }
}

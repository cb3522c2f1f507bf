//! Generic CRUD execution against a registered table. One statement per operation.

use crate::config::{ColumnKind, TableDef, ID_COLUMN};
use crate::error::AppError;
use crate::service::RecordValidator;
use crate::sql::{count, delete, insert, select_by_id, select_recent, update, QueryBuf, MAX_LIST_ROWS};
use crate::store::{QueryResult, SqlClient};
use serde_json::{Map, Value};

/// Default page size when `page` is given without `limit`.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page of rows plus the table's total row count.
#[derive(Debug)]
pub struct Page {
    pub rows: Vec<Value>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

pub struct CrudService;

impl CrudService {
    /// Up to `MAX_LIST_ROWS` rows, newest first.
    pub async fn list(client: &dyn SqlClient, table: &TableDef) -> Result<Vec<Value>, AppError> {
        let q = select_recent(table, MAX_LIST_ROWS, 0);
        Ok(Self::run(client, &q).await?.rows)
    }

    /// One page (1-based), newest first. `limit` defaults to `DEFAULT_PAGE_SIZE` and is capped at `MAX_LIST_ROWS`.
    pub async fn list_page(
        client: &dyn SqlClient,
        table: &TableDef,
        page: u32,
        limit: Option<u32>,
    ) -> Result<Page, AppError> {
        let page = page.max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_LIST_ROWS);
        let offset = (page - 1).saturating_mul(limit);
        let rows = Self::run(client, &select_recent(table, limit, offset)).await?.rows;
        let total = Self::run(client, &count(table))
            .await?
            .into_first()
            .and_then(|v| v.get("total").and_then(Value::as_u64))
            .unwrap_or(0);
        Ok(Page {
            rows,
            page,
            limit,
            total,
        })
    }

    /// Fetch one row by id. Ids that cannot match the id column's type yield None without a query.
    pub async fn read(client: &dyn SqlClient, table: &TableDef, id: &str) -> Result<Option<Value>, AppError> {
        if !id_is_addressable(table, id) {
            return Ok(None);
        }
        Ok(Self::run(client, &select_by_id(table, id)).await?.into_first())
    }

    /// Insert one row and return it with generated fields.
    pub async fn create(client: &dyn SqlClient, table: &TableDef, record: &Map<String, Value>) -> Result<Value, AppError> {
        let assignments = RecordValidator::for_insert(table, record)?;
        Self::run(client, &insert(table, &assignments))
            .await?
            .into_first()
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Update one row by id and return it, or None when no row matched.
    pub async fn update(
        client: &dyn SqlClient,
        table: &TableDef,
        id: &str,
        record: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        let assignments = RecordValidator::for_update(table, record)?;
        if !id_is_addressable(table, id) {
            return Ok(None);
        }
        Ok(Self::run(client, &update(table, id, &assignments)).await?.into_first())
    }

    /// Delete one row by id. Returns the deleted row, or None when no row matched.
    pub async fn delete(client: &dyn SqlClient, table: &TableDef, id: &str) -> Result<Option<Value>, AppError> {
        if !id_is_addressable(table, id) {
            return Ok(None);
        }
        Ok(Self::run(client, &delete(table, id)).await?.into_first())
    }

    async fn run(client: &dyn SqlClient, q: &QueryBuf) -> Result<QueryResult, AppError> {
        Ok(client.query(&q.sql, &q.params).await?)
    }
}

/// UUID-keyed tables can only ever match a well-formed UUID.
fn id_is_addressable(table: &TableDef, id: &str) -> bool {
    match table.column(ID_COLUMN).map(|c| c.kind) {
        Some(ColumnKind::Uuid) => uuid::Uuid::parse_str(id).is_ok(),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup;
    use crate::testing::ScriptedClient;
    use serde_json::json;

    const ID: &str = "5f0c8d4e-1b2a-4c3d-8e9f-0a1b2c3d4e5f";

    #[tokio::test]
    async fn read_with_malformed_id_skips_the_database() {
        let client = ScriptedClient::new();
        let t = lookup("mood_entries").unwrap();
        assert!(CrudService::read(&client, t, "doesnotexist").await.unwrap().is_none());
        assert!(CrudService::delete(&client, t, "doesnotexist").await.unwrap().is_none());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn create_returns_the_inserted_row() {
        let client = ScriptedClient::new();
        client.push_rows(vec![json!({ "id": ID, "user_id": "u1", "mood_score": 7 })]);
        let t = lookup("mood_entries").unwrap();
        let body = json!({ "user_id": "u1", "mood_score": 7 });
        let row = CrudService::create(&client, t, body.as_object().unwrap()).await.unwrap();
        assert_eq!(row["mood_score"], 7);
        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].sql.starts_with("INSERT INTO \"mood_entries\""));
    }

    #[tokio::test]
    async fn invalid_body_fails_before_any_statement() {
        let client = ScriptedClient::new();
        let t = lookup("mood_entries").unwrap();
        let body = json!({ "mood_score": "very", "user_id": "u1" });
        assert!(CrudService::create(&client, t, body.as_object().unwrap()).await.is_err());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn update_with_no_match_is_none() {
        let client = ScriptedClient::new();
        client.push_rows(vec![]);
        let t = lookup("mood_entries").unwrap();
        let body = json!({ "mood_score": 3 });
        let out = CrudService::update(&client, t, ID, body.as_object().unwrap()).await.unwrap();
        assert!(out.is_none());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn list_page_runs_page_and_count() {
        let client = ScriptedClient::new();
        client.push_rows(vec![json!({ "id": ID })]);
        client.push_rows(vec![json!({ "total": 41 })]);
        let t = lookup("activities").unwrap();
        let page = CrudService::list_page(&client, t, 3, Some(500)).await.unwrap();
        assert_eq!(page.limit, MAX_LIST_ROWS);
        assert_eq!(page.total, 41);
        let calls = client.calls();
        assert!(calls[0].sql.ends_with("LIMIT 100 OFFSET 200"));
        assert!(calls[1].sql.contains("count(*)"));
    }

    #[tokio::test]
    async fn driver_errors_propagate() {
        let client = ScriptedClient::new();
        client.push_error("relation \"mood_entries\" does not exist");
        let t = lookup("mood_entries").unwrap();
        let err = CrudService::list(&client, t).await.unwrap_err();
        assert!(matches!(err, AppError::Db(_)));
        assert!(err.to_string().contains("does not exist"));
    }
}

//! SQL execution client over the connection pool, plus database bootstrap.

use crate::error::AppError;
use crate::sql::SqlParam;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;
use std::time::Instant;

/// Rows returned by one statement. Each row is the JSON object projected as `row`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
    pub rows: Vec<Value>,
    pub row_count: u64,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Value>) -> Self {
        let row_count = rows.len() as u64;
        QueryResult { rows, row_count }
    }

    /// First row, if any. Single-row statements return at most one.
    pub fn into_first(self) -> Option<Value> {
        self.rows.into_iter().next()
    }
}

/// Executes one parameterized statement. Statements must project a single JSON column named `row`.
#[async_trait]
pub trait SqlClient: Send + Sync {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, sqlx::Error>;
}

/// Pool-backed client. Logs duration and row count for every statement.
#[derive(Clone)]
pub struct PgClient {
    pool: PgPool,
}

impl PgClient {
    pub fn new(pool: PgPool) -> Self {
        PgClient { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl SqlClient for PgClient {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, sqlx::Error> {
        let started = Instant::now();
        let mut query = sqlx::query(sql);
        for p in params {
            query = query.bind(p.as_bind());
        }
        let rows = match query.fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::debug!(sql = %sql, params = ?params, elapsed_ms = started.elapsed().as_millis() as u64, error = %e, "query failed");
                return Err(e);
            }
        };
        let rows = rows
            .iter()
            .map(|r| r.try_get::<Value, _>("row"))
            .collect::<Result<Vec<_>, _>>()?;
        let result = QueryResult::from_rows(rows);
        tracing::debug!(
            sql = %sql,
            params = ?params,
            elapsed_ms = started.elapsed().as_millis() as u64,
            rows = result.row_count,
            "query"
        );
        Ok(result)
    }
}

/// Create the database named in `database_url` when it does not exist yet.
/// Connects to the `postgres` maintenance database on the same server to check and create.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let (db_name, query) = match path_and_query.split_once('?') {
        Some((name, q)) => (name.trim(), Some(q)),
        None => (path_and_query.trim(), None),
    };
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = match query {
        Some(q) => format!("{}postgres?{}", base, q),
        None => format!("{}postgres", base),
    };
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

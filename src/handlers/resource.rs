//! Table resource handlers: list and create on the collection, read/update/delete on one row.

use crate::config::{self, TableDef};
use crate::error::AppError;
use crate::response::{created, deleted, paginated, success};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Resolve an allow-listed table, or fail with the list of valid names.
pub fn resolve_table(name: &str) -> Result<&'static TableDef, AppError> {
    config::lookup(name).ok_or_else(|| AppError::InvalidTable {
        name: name.to_string(),
        valid: config::names(),
    })
}

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(m))) => Ok(m),
        Ok(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

fn record_field(body: &mut Map<String, Value>) -> Result<Map<String, Value>, AppError> {
    match body.remove("data") {
        Some(Value::Object(m)) => Ok(m),
        _ => Err(AppError::BadRequest("data must be a JSON object".into())),
    }
}

/// The `tableName` override (query or body) when present and non-empty, else the path module.
fn table_name<'a>(module: &'a str, explicit: Option<&'a str>) -> &'a str {
    explicit.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(module)
}

/// Optional positive integer query parameter; present but malformed is a bad request.
fn query_u32(params: &HashMap<String, String>, key: &str) -> Result<Option<u32>, AppError> {
    let Some(raw) = params.get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u32>() {
        Ok(n) if n > 0 => Ok(Some(n)),
        _ => Err(AppError::BadRequest(format!("{} must be a positive integer", key))),
    }
}

/// GET /api/:module?tableName=..[&page=..&limit=..]
pub async fn list(
    State(state): State<AppState>,
    Path(module): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<axum::response::Response, AppError> {
    let table = resolve_table(table_name(&module, params.get("tableName").map(String::as_str)))?;
    let limit = query_u32(&params, "limit")?;
    let Some(page) = query_u32(&params, "page")? else {
        let rows = CrudService::list(state.client.as_ref(), table).await?;
        return Ok(success(rows).into_response());
    };
    let p = CrudService::list_page(state.client.as_ref(), table, page, limit).await?;
    Ok(paginated(p.rows, p.page, p.limit, p.total).into_response())
}

/// POST /api/:module with `{ tableName, data }`
pub async fn create(
    State(state): State<AppState>,
    Path(module): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut body = json_body(body)?;
    let explicit = body.get("tableName").and_then(Value::as_str).map(str::to_string);
    let table = resolve_table(table_name(&module, explicit.as_deref()))?;
    let record = record_field(&mut body)?;
    let row = CrudService::create(state.client.as_ref(), table, &record).await?;
    tracing::debug!(table = table.name, "row created");
    Ok(created(row))
}

/// GET /api/:module/:id
pub async fn read(
    State(state): State<AppState>,
    Path((module, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let table = resolve_table(&module)?;
    let row = CrudService::read(state.client.as_ref(), table, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(success(row))
}

/// PUT /api/:module/:id with `{ data }`
pub async fn update(
    State(state): State<AppState>,
    Path((module, id)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let table = resolve_table(&module)?;
    let mut body = json_body(body)?;
    let record = record_field(&mut body)?;
    let row = CrudService::update(state.client.as_ref(), table, &id, &record)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(success(row))
}

/// DELETE /api/:module/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((module, id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let table = resolve_table(&module)?;
    CrudService::delete(state.client.as_ref(), table, &id)
        .await?
        .ok_or(AppError::NotFound)?;
    tracing::debug!(table = table.name, id = %id, "row deleted");
    Ok(deleted())
}

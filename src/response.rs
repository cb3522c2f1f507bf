//! Standard response envelope helpers: `{ data }`, `{ error }`, and the paginated form.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Success<T> {
    pub data: T,
}

#[derive(Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 { 0 } else { total.div_ceil(limit as u64) };
        Pagination {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

#[derive(Serialize)]
pub struct Deleted {
    pub success: bool,
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (StatusCode::OK, Json(Success { data }))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Success<T>>) {
    (StatusCode::CREATED, Json(Success { data }))
}

pub fn paginated<T: Serialize>(data: Vec<T>, page: u32, limit: u32, total: u64) -> (StatusCode, Json<Paginated<T>>) {
    (
        StatusCode::OK,
        Json(Paginated {
            data,
            pagination: Pagination::new(page, limit, total),
        }),
    )
}

pub fn deleted() -> (StatusCode, Json<Deleted>) {
    (StatusCode::OK, Json(Deleted { success: true }))
}

pub fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

//! Full create/read/update/delete against a live PostgreSQL.
//! Runs only when ORGANIC_TEST_DATABASE_URL is set; otherwise every test returns early.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use organic_os::{api_router, ensure_schema, AppState, PgClient};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn live_app() -> Option<Router> {
    let url = std::env::var("ORGANIC_TEST_DATABASE_URL").ok()?;
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect test database");
    ensure_schema(&pool).await.expect("ensure schema");
    Some(api_router(AppState::new(Arc::new(PgClient::new(pool))), 1024 * 1024))
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn mood_entry_lifecycle() {
    let Some(app) = live_app().await else {
        eprintln!("ORGANIC_TEST_DATABASE_URL not set; skipping");
        return;
    };

    let submitted = json!({ "user_id": "u1", "mood_score": 7, "emotions": ["calm", "hopeful"] });
    let (status, created) = call(
        &app,
        Method::POST,
        "/api/mood_entries",
        Some(json!({ "tableName": "mood_entries", "data": submitted })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["data"]["id"].as_str().expect("generated id").to_string();

    let (status, fetched) = call(&app, Method::GET, &format!("/api/mood_entries/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    for (k, v) in submitted.as_object().unwrap() {
        assert_eq!(&fetched["data"][k], v, "field {}", k);
    }
    assert!(fetched["data"]["created_at"].is_string());

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/mood_entries/{}", id),
        Some(json!({ "data": { "mood_score": 4 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, fetched) = call(&app, Method::GET, &format!("/api/mood_entries/{}", id), None).await;
    assert_eq!(fetched["data"]["mood_score"], 4);
    let created_at = chrono::DateTime::parse_from_rfc3339(fetched["data"]["created_at"].as_str().unwrap()).unwrap();
    let updated_at = chrono::DateTime::parse_from_rfc3339(fetched["data"]["updated_at"].as_str().unwrap()).unwrap();
    assert!(updated_at > created_at);

    let (status, body) = call(&app, Method::DELETE, &format!("/api/mood_entries/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    let (status, body) = call(&app, Method::GET, &format!("/api/mood_entries/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Not found" }));
}

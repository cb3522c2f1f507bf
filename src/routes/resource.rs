//! Table resource routes. `:module` is the table name; the collection route also honours `tableName`.

use crate::handlers::resource::{create, delete as delete_handler, list, read, update};
use crate::ratelimit::rate_limit;
use crate::routes::common_routes_with_ready;
use crate::state::AppState;
use axum::{middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

/// `/:module` and `/:module/:id`, rate limited when the state carries a limiter.
pub fn resource_routes(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/:module", get(list).post(create))
        .route("/:module/:id", get(read).put(update).delete(delete_handler));
    if let Some(limiter) = state.rate_limiter.clone() {
        router = router.layer(middleware::from_fn_with_state(limiter, rate_limit));
    }
    router.with_state(state)
}

/// Full application router: operational routes at the root, resources under `/api`.
pub fn api_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", resource_routes(state))
        .layer(RequestBodyLimitLayer::new(body_limit_bytes))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

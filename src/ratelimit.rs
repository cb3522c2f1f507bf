//! Fixed-window rate limiting with counters held in a shared store, so limits hold across
//! every process serving the API.

use crate::config::{RateLimitBackend, RateLimitSettings};
use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const RATE_LIMIT_TABLE: &str = "rate_limit_counters";

/// Atomic per-key counters bucketed by window start.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Increment the counter for `key` in the window starting at `window_start` and return the new count.
    async fn increment(&self, key: &str, window_start: DateTime<Utc>) -> Result<u64, AppError>;

    /// Drop counters for windows that started before `before`. Returns how many were removed.
    async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64, AppError>;
}

/// Counters in the `rate_limit_counters` table, incremented with a single upsert.
#[derive(Clone)]
pub struct PgCounterStore {
    pool: PgPool,
}

impl PgCounterStore {
    pub fn new(pool: PgPool) -> Self {
        PgCounterStore { pool }
    }
}

#[async_trait]
impl CounterStore for PgCounterStore {
    async fn increment(&self, key: &str, window_start: DateTime<Utc>) -> Result<u64, AppError> {
        let sql = format!(
            "INSERT INTO {t} (key, window_start, count) VALUES ($1, $2, 1) \
             ON CONFLICT (key, window_start) DO UPDATE SET count = {t}.count + 1 \
             RETURNING count",
            t = RATE_LIMIT_TABLE
        );
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(key)
            .bind(window_start)
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let sql = format!("DELETE FROM {} WHERE window_start < $1", RATE_LIMIT_TABLE);
        let done = sqlx::query(&sql).bind(before).execute(&self.pool).await?;
        Ok(done.rows_affected())
    }
}

/// Per-process counters.
#[derive(Default)]
pub struct MemoryCounterStore {
    counters: Mutex<HashMap<(String, DateTime<Utc>), u64>>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window_start: DateTime<Utc>) -> Result<u64, AppError> {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let n = counters.entry((key.to_string(), window_start)).or_insert(0);
        *n += 1;
        Ok(*n)
    }

    async fn purge_before(&self, before: DateTime<Utc>) -> Result<u64, AppError> {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        let len = counters.len();
        counters.retain(|(_, start), _| *start >= before);
        Ok((len - counters.len()) as u64)
    }
}

/// Outcome of counting one request.
#[derive(Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u64 },
    Limited { retry_after_secs: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    max_requests: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, max_requests: u64, window: Duration) -> Self {
        RateLimiter {
            store,
            max_requests,
            window: window.max(Duration::from_secs(1)),
        }
    }

    /// Limiter for `settings`, or None when limiting is disabled.
    pub fn from_settings(settings: &RateLimitSettings, pool: &PgPool) -> Option<Self> {
        if !settings.enabled() {
            return None;
        }
        let store: Arc<dyn CounterStore> = match settings.backend {
            RateLimitBackend::Postgres => Arc::new(PgCounterStore::new(pool.clone())),
            RateLimitBackend::Memory => Arc::new(MemoryCounterStore::new()),
        };
        Some(Self::new(store, settings.max_requests, settings.window))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn store(&self) -> &Arc<dyn CounterStore> {
        &self.store
    }

    /// Start of the window containing `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.window.as_secs() as i64;
        let start = now.timestamp().div_euclid(secs) * secs;
        Utc.timestamp_opt(start, 0).single().unwrap_or(now)
    }

    pub async fn check(&self, key: &str, now: DateTime<Utc>) -> Result<Decision, AppError> {
        let start = self.window_start(now);
        let count = self.store.increment(key, start).await?;
        if count > self.max_requests {
            let window_end = start.timestamp() + self.window.as_secs() as i64;
            let retry_after_secs = (window_end - now.timestamp()).max(1) as u64;
            return Ok(Decision::Limited { retry_after_secs });
        }
        Ok(Decision::Allowed {
            remaining: self.max_requests - count,
        })
    }

    /// Remove counters for windows that can no longer be hit.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        self.store.purge_before(self.window_start(now)).await
    }
}

/// Client key: first `X-Forwarded-For` hop, else `X-Real-IP`, else `anonymous`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    forwarded
        .or_else(real_ip)
        .unwrap_or("anonymous")
        .to_string()
}

/// Middleware: count the request and reject with 429 once the window's budget is spent.
/// A failing counter store lets the request through.
pub async fn rate_limit(State(limiter): State<RateLimiter>, request: Request, next: Next) -> Response {
    let key = client_key(request.headers());
    match limiter.check(&key, Utc::now()).await {
        Ok(Decision::Limited { retry_after_secs }) => {
            tracing::info!(client = %key, retry_after_secs, "rate limited");
            AppError::RateLimited { retry_after_secs }.into_response()
        }
        Ok(Decision::Allowed { .. }) => next.run(request).await,
        Err(e) => {
            tracing::warn!(error = %e, "rate limit store unavailable, allowing request");
            next.run(request).await
        }
    }
}

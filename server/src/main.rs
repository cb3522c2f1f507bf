//! Organic OS data API server: reads settings from the environment, ensures the database and
//! tables exist, then serves health routes at the root and table resources under /api.

use organic_os::{api_router, ensure_database_exists, ensure_schema, AppState, PgClient, RateLimiter, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("organic_os=info,organic_os_server=info")),
        )
        .init();

    if settings.create_database {
        ensure_database_exists(&settings.database_url).await?;
    }
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(&settings.database_url)
        .await?;
    ensure_schema(&pool).await?;

    let limiter = RateLimiter::from_settings(&settings.rate_limit, &pool);
    if let Some(limiter) = limiter.clone() {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(limiter.window());
            loop {
                tick.tick().await;
                match limiter.purge_expired(chrono::Utc::now()).await {
                    Ok(0) => {}
                    Ok(n) => tracing::debug!(removed = n, "purged rate limit windows"),
                    Err(e) => tracing::warn!(error = %e, "rate limit purge failed"),
                }
            }
        });
    }

    let state = AppState::new(Arc::new(PgClient::new(pool))).with_rate_limiter(limiter);
    let app = api_router(state, settings.body_limit_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}

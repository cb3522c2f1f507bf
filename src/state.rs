//! Shared application state for all routes.

use crate::ratelimit::RateLimiter;
use crate::store::SqlClient;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn SqlClient>,
    /// None when rate limiting is disabled.
    pub rate_limiter: Option<RateLimiter>,
}

impl AppState {
    pub fn new(client: Arc<dyn SqlClient>) -> Self {
        AppState {
            client,
            rate_limiter: None,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: Option<RateLimiter>) -> Self {
        self.rate_limiter = limiter;
        self
    }
}

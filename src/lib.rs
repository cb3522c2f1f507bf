//! Organic OS data API: allow-listed, table-driven CRUD over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod ratelimit;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod testing;

pub use config::{lookup, names, RateLimitBackend, Settings, TableDef, TABLES};
pub use error::{AppError, ConfigError};
pub use migration::ensure_schema;
pub use ratelimit::{CounterStore, MemoryCounterStore, PgCounterStore, RateLimiter};
pub use response::{created, error_body, paginated, success};
pub use routes::{api_router, common_routes_with_ready, resource_routes};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_database_exists, PgClient, QueryResult, SqlClient};

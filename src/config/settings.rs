//! Runtime settings read from the environment (optionally seeded from a `.env` file).

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/organic_os";

/// Backend holding rate-limit counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitBackend {
    /// Shared across every process pointed at the same database.
    Postgres,
    /// Per-process only.
    Memory,
}

impl FromStr for RateLimitBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(RateLimitBackend::Postgres),
            "memory" => Ok(RateLimitBackend::Memory),
            other => Err(ConfigError::Invalid {
                key: "ORGANIC_RATE_LIMIT_STORE",
                message: format!("unknown store '{}', expected postgres or memory", other),
            }),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RateLimitSettings {
    /// Requests allowed per window per client. Zero disables limiting.
    pub max_requests: u64,
    pub window: Duration,
    pub backend: RateLimitBackend,
}

impl RateLimitSettings {
    pub fn enabled(&self) -> bool {
        self.max_requests > 0
    }
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub create_database: bool,
    pub body_limit_bytes: usize,
    pub rate_limit: RateLimitSettings,
}

impl Settings {
    /// Load `.env` if present, then read settings from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Unset or blank keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = parse_or("ORGANIC_BIND_ADDR", get("ORGANIC_BIND_ADDR"), SocketAddr::from(([0, 0, 0, 0], 3000)))?;
        let max_connections = parse_or("ORGANIC_DB_MAX_CONNECTIONS", get("ORGANIC_DB_MAX_CONNECTIONS"), 5u32)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "ORGANIC_DB_MAX_CONNECTIONS",
                message: "must be at least 1".into(),
            });
        }
        let create_database = parse_bool("ORGANIC_CREATE_DATABASE", get("ORGANIC_CREATE_DATABASE"), true)?;
        let body_limit_bytes = parse_or("ORGANIC_BODY_LIMIT_BYTES", get("ORGANIC_BODY_LIMIT_BYTES"), 1024 * 1024usize)?;
        let max_requests = parse_or("ORGANIC_RATE_LIMIT_MAX", get("ORGANIC_RATE_LIMIT_MAX"), 100u64)?;
        let window_secs = parse_or("ORGANIC_RATE_LIMIT_WINDOW_SECS", get("ORGANIC_RATE_LIMIT_WINDOW_SECS"), 60u64)?;
        if window_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "ORGANIC_RATE_LIMIT_WINDOW_SECS",
                message: "must be at least 1".into(),
            });
        }
        let backend = match get("ORGANIC_RATE_LIMIT_STORE") {
            Some(v) => v.parse()?,
            None => RateLimitBackend::Postgres,
        };

        Ok(Settings {
            database_url,
            bind_addr,
            max_connections,
            create_database,
            body_limit_bytes,
            rate_limit: RateLimitSettings {
                max_requests,
                window: Duration::from_secs(window_secs),
                backend,
            },
        })
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: format!("'{}': {}", v, e),
        }),
    }
}

fn parse_bool(key: &'static str, raw: Option<String>, default: bool) -> Result<bool, ConfigError> {
    match raw.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::Invalid {
            key,
            message: format!("'{}' is not a boolean", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.bind_addr.port(), 3000);
        assert_eq!(s.max_connections, 5);
        assert!(s.create_database);
        assert_eq!(s.rate_limit.max_requests, 100);
        assert_eq!(s.rate_limit.window, Duration::from_secs(60));
        assert_eq!(s.rate_limit.backend, RateLimitBackend::Postgres);
        assert!(s.rate_limit.enabled());
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://db:5432/wellness"),
            ("ORGANIC_BIND_ADDR", "127.0.0.1:8080"),
            ("ORGANIC_CREATE_DATABASE", "no"),
            ("ORGANIC_RATE_LIMIT_MAX", "0"),
            ("ORGANIC_RATE_LIMIT_STORE", "Memory"),
        ])
        .unwrap();
        assert_eq!(s.database_url, "postgres://db:5432/wellness");
        assert_eq!(s.bind_addr.to_string(), "127.0.0.1:8080");
        assert!(!s.create_database);
        assert!(!s.rate_limit.enabled());
        assert_eq!(s.rate_limit.backend, RateLimitBackend::Memory);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let s = settings(&[("ORGANIC_DB_MAX_CONNECTIONS", "  ")]).unwrap();
        assert_eq!(s.max_connections, 5);
    }

    #[test]
    fn invalid_values_name_the_key() {
        let err = settings(&[("ORGANIC_DB_MAX_CONNECTIONS", "many")]).unwrap_err();
        assert!(err.to_string().contains("ORGANIC_DB_MAX_CONNECTIONS"));
        let err = settings(&[("ORGANIC_RATE_LIMIT_WINDOW_SECS", "0")]).unwrap_err();
        assert!(err.to_string().contains("ORGANIC_RATE_LIMIT_WINDOW_SECS"));
        assert!(settings(&[("ORGANIC_RATE_LIMIT_STORE", "redis")]).is_err());
        assert!(settings(&[("ORGANIC_CREATE_DATABASE", "maybe")]).is_err());
    }
}

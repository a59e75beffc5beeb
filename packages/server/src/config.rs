//! Server configuration from environment variables
//!
//! | Variable                     | Default                       |
//! |------------------------------|-------------------------------|
//! | `LEARNER_DB_PATH`            | `~/.learner/learner.db`       |
//! | `LEARNER_BIND`               | `127.0.0.1`                   |
//! | `LEARNER_PORT`               | `3001`                        |
//! | `LEARNER_CORS_ORIGINS`       | local Vite/React dev origins  |
//! | `LEARNER_REQUEST_TIMEOUT_MS` | `5000`                        |
//!
//! Logging verbosity is controlled separately through `RUST_LOG`.

use anyhow::{anyhow, Context};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5000;

const DEFAULT_CORS_ORIGINS: [&str; 3] = [
    "http://localhost:5173", // Vite default
    "http://localhost:3000", // React dev server
    "http://127.0.0.1:5173",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    /// Deadline applied to every tree operation
    pub request_timeout: Duration,
}

impl ServerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = match lookup("LEARNER_DB_PATH") {
            Some(path) => PathBuf::from(path),
            None => default_db_path()?,
        };

        let bind = lookup("LEARNER_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match lookup("LEARNER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("LEARNER_PORT must be a port number, got '{}'", raw))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = match lookup("LEARNER_CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let timeout_ms = match lookup("LEARNER_REQUEST_TIMEOUT_MS") {
            Some(raw) => raw.trim().parse::<u64>().with_context(|| {
                format!(
                    "LEARNER_REQUEST_TIMEOUT_MS must be a number of milliseconds, got '{}'",
                    raw
                )
            })?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };

        Ok(Self {
            db_path,
            bind,
            port,
            cors_origins,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

fn default_db_path() -> anyhow::Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Failed to get home directory"))?;
    Ok(home_dir.join(".learner").join("learner.db"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_explicit_values() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("LEARNER_DB_PATH", "/tmp/learner-test.db"),
            ("LEARNER_BIND", "0.0.0.0"),
            ("LEARNER_PORT", "8080"),
            ("LEARNER_CORS_ORIGINS", "http://a.test, http://b.test,,"),
            ("LEARNER_REQUEST_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert_eq!(config.db_path, PathBuf::from("/tmp/learner-test.db"));
        assert_eq!(config.socket_addr(), "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_defaults() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("LEARNER_DB_PATH", "learner.db")])).unwrap();

        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.bind, DEFAULT_BIND);
        assert_eq!(config.cors_origins.len(), DEFAULT_CORS_ORIGINS.len());
        assert_eq!(
            config.request_timeout,
            Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[
            ("LEARNER_DB_PATH", "learner.db"),
            ("LEARNER_PORT", "not-a-port"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("LEARNER_PORT"));
    }
}

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup aborts if a required variable is missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub auth_username: String,
    pub auth_password: String,
    pub port: u16,
    pub rust_log: String,
    pub session_ttl_hours: i64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let session_ttl_hours: i64 = optional_env("SESSION_TTL_HOURS", 12)?;
        anyhow::ensure!(
            session_ttl_hours > 0,
            "SESSION_TTL_HOURS must be a positive number of hours"
        );

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            auth_username: require_env("AUTH_USERNAME")?,
            auth_password: require_env("AUTH_PASSWORD")?,
            port: optional_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            session_ttl_hours,
            db_max_connections: optional_env("DB_MAX_CONNECTIONS", 10)?,
        })
    }

    pub fn credentials_match(&self, username: &str, password: &str) -> bool {
        self.auth_username == username && self.auth_password == password
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.session_ttl_hours)
    }
}

// Keeps the password out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_username", &self.auth_username)
            .field("auth_password", &"<redacted>")
            .field("port", &self.port)
            .field("rust_log", &self.rust_log)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("db_max_connections", &self.db_max_connections)
            .finish_non_exhaustive()
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_env_defaults_and_parses() {
        assert_eq!(optional_env("INTAKE_TEST_UNSET_PORT", 8080u16).unwrap(), 8080);

        std::env::set_var("INTAKE_TEST_MAX_CONN", " 25 ");
        assert_eq!(optional_env("INTAKE_TEST_MAX_CONN", 10u32).unwrap(), 25);

        std::env::set_var("INTAKE_TEST_BAD_PORT", "eighty");
        let err = optional_env("INTAKE_TEST_BAD_PORT", 8080u16).unwrap_err();
        assert!(err.to_string().contains("INTAKE_TEST_BAD_PORT"));
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config {
            database_url: "postgres://localhost/intake".into(),
            auth_username: "tecnico".into(),
            auth_password: "hunter2".into(),
            port: 8080,
            rust_log: "info".into(),
            session_ttl_hours: 12,
            db_max_connections: 10,
        };
        let shown = format!("{config:?}");
        assert!(!shown.contains("hunter2"));
        assert!(config.credentials_match("tecnico", "hunter2"));
        assert!(!config.credentials_match("tecnico", "Hunter2"));
    }
}

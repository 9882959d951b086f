// ============================================================================
// Database Configuration
// ============================================================================

use crate::constants::*;
use crate::{parse_var, require_var};

/// MySQL connection settings for the persistence collaborator
#[derive(Clone)]
pub struct DbConfig {
    /// `host[:port]` of the MySQL server
    pub host: String,
    pub name: String,
    pub user: String,
    pub password: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool (seconds)
    pub acquire_timeout_secs: u64,
    /// Timeout for idle connections before they are closed (seconds)
    pub idle_timeout_secs: u64,
}

impl DbConfig {
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("DB_HOST").unwrap_or_else(|_| DEFAULT_DB_HOST.to_string()),
            name: require_var("DB_NAME")?,
            user: require_var("DB_USER")?,
            password: require_var("DB_PASSWORD")?,
            max_connections: parse_var("DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                DEFAULT_DB_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", DEFAULT_DB_IDLE_TIMEOUT_SECS)?,
        })
    }

    /// Connection URL understood by the sqlx MySQL driver
    pub fn url(&self) -> String {
        format!(
            "mysql://{}:{}@{}/{}",
            self.user, self.password, self.host, self.name
        )
    }

    /// Same as [`DbConfig::url`] with the password masked, for logging
    pub fn url_safe(&self) -> String {
        format!("mysql://{}:***@{}/{}", self.user, self.host, self.name)
    }
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"***")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .finish()
    }
}

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::VirtcolError;

/// Connection settings for the backing store.
///
/// The SQLite backend only uses `database` (mapped to `<data_dir>/<database>.sqlite`);
/// the remaining options are accepted so the same file can target a server store.
#[derive(Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// TOML: `database.database`. Default: `virtcol_demo`.
    #[serde(default = "default_database")]
    pub database: String,

    /// Owner recorded when the database is created.
    /// TOML: `database.username`. Default: `postgres`.
    #[serde(default = "default_username")]
    pub username: String,

    /// TOML: `database.password`. Default: empty.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub password: String,

    /// TOML: `database.host`. Default: `localhost`.
    #[serde(default = "default_host")]
    pub host: String,

    /// TOML: `database.port`. Default: `5432`.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            username: default_username(),
            password: String::new(),
            host: default_host(),
            port: default_port(),
        }
    }
}

impl DatabaseConfig {
    /// Database names end up in a file path, so only `[A-Za-z0-9_-]` is allowed.
    pub fn validate(&self) -> Result<(), VirtcolError> {
        let valid = !self.database.is_empty()
            && self
                .database
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if valid {
            Ok(())
        } else {
            Err(VirtcolError::Config(format!(
                "database.database must be non-empty and match [A-Za-z0-9_-]+ (got `{}`)",
                self.database
            )))
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for database.password",
        )),
    }
}

fn default_database() -> String {
    "virtcol_demo".to_string()
}

fn default_username() -> String {
    "postgres".to_string()
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

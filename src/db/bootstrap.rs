//! Ensures the target database exists before any registry work runs.
//!
//! `connect_or_create` tries to connect; if the database is missing it creates it
//! out-of-band and connects exactly once more. There is no loop.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use super::store::Store;
use crate::config::DatabaseConfig;
use crate::error::{IsRetryable, VirtcolError};

/// Connection capability of a backing store.
#[async_trait]
pub trait Connector: Send + Sync {
    type Conn: Send;

    /// Fails with `DatabaseMissing` when the database does not exist, and with
    /// `Connectivity` for every other reason the store cannot be reached.
    async fn connect(&self, cfg: &DatabaseConfig) -> Result<Self::Conn, VirtcolError>;

    /// Creates the database, owned by `cfg.username`.
    async fn create_database(&self, cfg: &DatabaseConfig) -> Result<(), VirtcolError>;
}

/// Connects, creating the database once if it does not exist yet.
///
/// A failed creation or a failure after creation is reported as `Connectivity`;
/// failures other than a missing database on the first attempt propagate unchanged.
pub async fn connect_or_create<C>(
    cfg: &DatabaseConfig,
    connector: &C,
) -> Result<C::Conn, VirtcolError>
where
    C: Connector + ?Sized,
{
    match connector.connect(cfg).await {
        Ok(conn) => Ok(conn),
        Err(err) if err.is_retryable() => {
            warn!(database = %cfg.database, error = %err, "database does not exist, creating it");
            connector.create_database(cfg).await.map_err(|err| {
                VirtcolError::Connectivity(format!(
                    "database `{}` could not be created: {err}",
                    cfg.database
                ))
            })?;
            connector.connect(cfg).await.map_err(|err| {
                VirtcolError::Connectivity(format!(
                    "database `{}` unreachable after creation: {err}",
                    cfg.database
                ))
            })
        }
        Err(err) => Err(err),
    }
}

/// SQLite-file backend: database `name` lives at `<data_dir>/<name>.sqlite`.
///
/// Username, password, host and port are not used by SQLite; the owner is only logged.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    data_dir: PathBuf,
}

impl SqliteConnector {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn database_path(&self, cfg: &DatabaseConfig) -> PathBuf {
        self.data_dir.join(format!("{}.sqlite", cfg.database))
    }

    fn connect_options(&self, cfg: &DatabaseConfig, create: bool) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(self.database_path(cfg))
            .create_if_missing(create)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    type Conn = Store;

    async fn connect(&self, cfg: &DatabaseConfig) -> Result<Store, VirtcolError> {
        cfg.validate()?;
        let path = self.database_path(cfg);
        let exists = tokio::fs::try_exists(&path).await.map_err(|e| {
            VirtcolError::Connectivity(format!("cannot inspect {}: {e}", path.display()))
        })?;
        if !exists {
            return Err(VirtcolError::DatabaseMissing(cfg.database.clone()));
        }

        // One connection: schema changes and reads must see the same catalog.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(self.connect_options(cfg, false))
            .await
            .map_err(|e| {
                VirtcolError::Connectivity(format!("connect to {} failed: {e}", path.display()))
            })?;

        info!(
            database = %cfg.database,
            path = %path.display(),
            username = %cfg.username,
            host = %cfg.host,
            port = cfg.port,
            "database connected"
        );
        Ok(Store::new(pool))
    }

    async fn create_database(&self, cfg: &DatabaseConfig) -> Result<(), VirtcolError> {
        cfg.validate()?;
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let path = self.database_path(cfg);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(self.connect_options(cfg, true))
            .await
            .map_err(|e| {
                VirtcolError::Connectivity(format!("create {} failed: {e}", path.display()))
            })?;
        pool.close().await;

        info!(
            database = %cfg.database,
            owner = %cfg.username,
            path = %path.display(),
            "database created"
        );
        Ok(())
    }
}

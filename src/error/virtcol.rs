use thiserror::Error as ThisError;

use super::IsRetryable;

#[derive(Debug, ThisError)]
pub enum VirtcolError {
    /// The backing store could not be reached, or is still missing after creation.
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// The target database does not exist yet. Bootstrap recovers from this once.
    #[error("Database `{0}` does not exist")]
    DatabaseMissing(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{model} record not found for id={id}")]
    RecordNotFound { model: String, id: i64 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ractor error: {0}")]
    Actor(String),
}

impl VirtcolError {
    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        VirtcolError::Schema(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        VirtcolError::Validation(msg.into())
    }

    pub fn is_schema(&self) -> bool {
        matches!(self, VirtcolError::Schema(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, VirtcolError::Validation(_))
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, VirtcolError::Connectivity(_))
    }
}

// Transport and pool failures are connectivity errors; everything else is a query error.
impl From<sqlx::Error> for VirtcolError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => VirtcolError::Connectivity(err.to_string()),
            other => VirtcolError::Database(other),
        }
    }
}

impl From<figment::Error> for VirtcolError {
    fn from(err: figment::Error) -> Self {
        VirtcolError::Config(err.to_string())
    }
}

impl IsRetryable for VirtcolError {
    fn is_retryable(&self) -> bool {
        matches!(self, VirtcolError::DatabaseMissing(_))
    }
}

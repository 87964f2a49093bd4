//! Schema seam between the registry and whatever owns the connection.

use async_trait::async_trait;

use crate::error::VirtcolError;
use crate::model::ModelType;

/// Applies the additive schema a finalized model needs.
///
/// Implementations create the table if absent and add every missing column. They
/// never drop a column or change its type, so running twice is harmless.
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    async fn apply_schema(&self, model: &ModelType) -> Result<SchemaReport, VirtcolError>;
}

/// What `apply_schema` actually changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub created_table: bool,
    pub added_columns: Vec<String>,
}

impl SchemaReport {
    /// True when the store already matched the model.
    pub fn is_noop(&self) -> bool {
        !self.created_table && self.added_columns.is_empty()
    }
}

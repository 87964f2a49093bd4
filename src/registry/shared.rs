use std::sync::Arc;
use tokio::sync::Mutex;

use super::{Catalog, ModelBuilder, Registry, RedeclarePolicy};
use crate::db::SchemaMigrator;
use crate::error::VirtcolError;
use crate::model::{Access, ModelType, ValueType};

/// A `Registry` behind one lock, for declarers running on several tasks.
///
/// Every declaration and every finalize takes the same lock, so a finalize never
/// observes a half-declared model.
#[derive(Debug, Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl SharedRegistry {
    pub fn new(policy: RedeclarePolicy) -> Self {
        Self::from(Registry::new(policy))
    }

    /// Registers `model` and runs `declare` against its builder under the lock.
    pub async fn declare<F>(&self, model: &str, declare: F) -> Result<(), VirtcolError>
    where
        F: for<'a> FnOnce(ModelBuilder<'a>) -> Result<ModelBuilder<'a>, VirtcolError>,
    {
        let mut registry = self.inner.lock().await;
        declare(registry.register(model)?)?;
        Ok(())
    }

    pub async fn declare_column(
        &self,
        model: &str,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<(), VirtcolError> {
        self.inner
            .lock()
            .await
            .declare_column(model, name, ty, access)
    }

    pub async fn declare_property(
        &self,
        model: &str,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<(), VirtcolError> {
        self.inner
            .lock()
            .await
            .declare_property(model, name, ty, access)
    }

    pub async fn is_finalized(&self, model: &str) -> bool {
        self.inner.lock().await.is_finalized(model)
    }

    pub async fn finalize<M>(
        &self,
        model: &str,
        migrator: &M,
    ) -> Result<Arc<ModelType>, VirtcolError>
    where
        M: SchemaMigrator + ?Sized,
    {
        self.inner.lock().await.finalize(model, migrator).await
    }

    pub async fn finalize_all<M>(&self, migrator: &M) -> Result<Catalog, VirtcolError>
    where
        M: SchemaMigrator + ?Sized,
    {
        self.inner.lock().await.finalize_all(migrator).await
    }
}

impl From<Registry> for SharedRegistry {
    fn from(registry: Registry) -> Self {
        Self {
            inner: Arc::new(Mutex::new(registry)),
        }
    }
}

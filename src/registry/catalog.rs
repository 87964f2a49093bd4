use std::collections::HashMap;
use std::sync::Arc;

use crate::error::VirtcolError;
use crate::model::ModelType;

/// Immutable set of finalized models, in registration order.
/// Produced once by `Registry::finalize_all`.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Name-to-index lookup.
    name_to_index: HashMap<String, usize>,
    /// Models in registration order.
    models: Vec<Arc<ModelType>>,
}

impl Catalog {
    pub(crate) fn new(models: Vec<Arc<ModelType>>) -> Self {
        let name_to_index = models
            .iter()
            .enumerate()
            .map(|(idx, model)| (model.name().to_string(), idx))
            .collect();

        Self {
            name_to_index,
            models,
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ModelType>> {
        self.name_to_index.get(name).map(|&idx| &self.models[idx])
    }

    /// Like `get`, but an unknown name is a schema error.
    pub fn model(&self, name: &str) -> Result<Arc<ModelType>, VirtcolError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| VirtcolError::schema(format!("model `{name}` is not registered")))
    }

    pub fn get_index(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelType>> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

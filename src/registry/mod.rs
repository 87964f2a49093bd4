//! Attribute registry: collects model declarations and finalizes them once.
//!
//! Layout:
//! - `builder.rs`: declaration-phase state and the chained `ModelBuilder`
//! - `catalog.rs`: the immutable set of finalized models
//! - `shared.rs`: mutex-guarded registry for concurrent declarers

mod builder;
mod catalog;
mod shared;

pub use builder::ModelBuilder;
pub use catalog::Catalog;
pub use shared::SharedRegistry;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{FieldConfig, FieldKindConfig, ModelConfig};
use crate::db::SchemaMigrator;
use crate::error::VirtcolError;
use crate::model::{Access, FieldDeclaration, ModelType, ValueType};
use builder::ModelDecl;

/// What happens when a field name is declared twice with the same kind.
/// Declaring a name as both a column and a property is always rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedeclarePolicy {
    /// Last declaration wins.
    #[default]
    Overwrite,
    /// Second declaration is a schema error.
    Reject,
}

#[derive(Debug)]
enum Slot {
    Pending(ModelDecl),
    Finalized(Arc<ModelType>),
}

impl Slot {
    fn name(&self) -> &str {
        match self {
            Slot::Pending(decl) => decl.name(),
            Slot::Finalized(model) => model.name(),
        }
    }
}

/// Models opted into the container-column convention, in registration order.
///
/// Declarations are collected first; `finalize` installs accessors and applies the
/// additive schema changes for one model, `finalize_all` does it for every model.
/// A finalized model accepts no further declarations.
#[derive(Debug, Default)]
pub struct Registry {
    policy: RedeclarePolicy,
    slots: Vec<Slot>,
}

impl Registry {
    pub fn new(policy: RedeclarePolicy) -> Self {
        Self {
            policy,
            slots: Vec::new(),
        }
    }

    /// Opts a model in and returns its builder.
    ///
    /// Registering the same name again returns the existing declaration; the implicit
    /// container and timestamp fields are only added once.
    pub fn register(&mut self, name: &str) -> Result<ModelBuilder<'_>, VirtcolError> {
        let policy = self.policy;
        let idx = match self.position(name) {
            Some(idx) => {
                debug!(model = name, "model already registered");
                idx
            }
            None => {
                let decl = ModelDecl::new(name)?;
                info!(model = name, "model registered");
                self.slots.push(Slot::Pending(decl));
                self.slots.len() - 1
            }
        };

        match &mut self.slots[idx] {
            Slot::Pending(decl) => Ok(ModelBuilder::new(decl, policy)),
            Slot::Finalized(_) => Err(already_finalized(name)),
        }
    }

    pub fn declare_column(
        &mut self,
        model: &str,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<(), VirtcolError> {
        let policy = self.policy;
        self.pending_mut(model)?
            .declare(FieldDeclaration::column(name, ty, access.into()), policy)
    }

    pub fn declare_property(
        &mut self,
        model: &str,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<(), VirtcolError> {
        let policy = self.policy;
        self.pending_mut(model)?
            .declare(FieldDeclaration::property(name, ty, access.into()), policy)
    }

    /// Declaration with a textual type name; unknown names fail here, not at finalize.
    pub fn declare_field(&mut self, model: &str, field: &FieldConfig) -> Result<(), VirtcolError> {
        let ty: ValueType = field.ty.parse().map_err(|err| {
            VirtcolError::schema(format!("`{}` on {model}: {err}", field.name))
        })?;
        match field.kind {
            FieldKindConfig::Column => {
                self.declare_column(model, &field.name, ty, field.accessible)
            }
            FieldKindConfig::Prop => {
                self.declare_property(model, &field.name, ty, field.accessible)
            }
        }
    }

    /// Registers a model described in configuration together with its fields.
    pub fn declare_model(&mut self, cfg: &ModelConfig) -> Result<(), VirtcolError> {
        let builder = self.register(&cfg.name)?;
        if let Some(table) = cfg.table.as_deref() {
            builder.table(table)?;
        }
        for field in &cfg.fields {
            self.declare_field(&cfg.name, field)?;
        }
        Ok(())
    }

    pub fn is_registered(&self, model: &str) -> bool {
        self.position(model).is_some()
    }

    pub fn is_finalized(&self, model: &str) -> bool {
        self.position(model)
            .is_some_and(|idx| matches!(self.slots[idx], Slot::Finalized(_)))
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(Slot::name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Installs property accessors and applies pending schema changes for one model.
    ///
    /// If the schema cannot be applied the model stays pending, so the call can be
    /// repeated once the store is reachable. Finalizing twice returns the same model.
    pub async fn finalize<M>(
        &mut self,
        model: &str,
        migrator: &M,
    ) -> Result<Arc<ModelType>, VirtcolError>
    where
        M: SchemaMigrator + ?Sized,
    {
        let idx = self
            .position(model)
            .ok_or_else(|| not_registered(model))?;

        let built = match &self.slots[idx] {
            Slot::Finalized(existing) => {
                debug!(model, "model already finalized");
                return Ok(Arc::clone(existing));
            }
            Slot::Pending(decl) => decl.build(),
        };

        let report = migrator.apply_schema(&built).await?;
        let built = Arc::new(built);
        self.slots[idx] = Slot::Finalized(Arc::clone(&built));

        info!(
            model,
            table = built.table(),
            properties = built.properties().count(),
            created_table = report.created_table,
            added_columns = ?report.added_columns,
            "model finalized"
        );
        Ok(built)
    }

    /// Finalizes every model in registration order and hands back the catalog.
    ///
    /// Models finalized earlier are kept as they are. Stops at the first failure,
    /// leaving the remaining models pending.
    pub async fn finalize_all<M>(&mut self, migrator: &M) -> Result<Catalog, VirtcolError>
    where
        M: SchemaMigrator + ?Sized,
    {
        let names: Vec<String> = self.model_names().map(str::to_string).collect();
        let mut models = Vec::with_capacity(names.len());
        for name in &names {
            models.push(self.finalize(name, migrator).await?);
        }
        Ok(Catalog::new(models))
    }

    fn position(&self, model: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.name() == model)
    }

    fn pending_mut(&mut self, model: &str) -> Result<&mut ModelDecl, VirtcolError> {
        let idx = self.position(model).ok_or_else(|| not_registered(model))?;
        match &mut self.slots[idx] {
            Slot::Pending(decl) => Ok(decl),
            Slot::Finalized(_) => Err(already_finalized(model)),
        }
    }
}

fn not_registered(model: &str) -> VirtcolError {
    VirtcolError::schema(format!("model `{model}` is not registered"))
}

fn already_finalized(model: &str) -> VirtcolError {
    VirtcolError::schema(format!(
        "model `{model}` is already finalized; declarations are closed"
    ))
}

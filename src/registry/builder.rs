use tracing::debug;

use super::RedeclarePolicy;
use crate::error::VirtcolError;
use crate::model::{Access, FieldDeclaration, ModelType, ValueType, is_reserved};
use crate::utils::naming::{is_valid_identifier, table_name_for};

/// Declaration-phase state of one model.
#[derive(Debug, Clone)]
pub(crate) struct ModelDecl {
    name: String,
    table: String,
    fields: Vec<FieldDeclaration>,
}

impl ModelDecl {
    pub(crate) fn new(name: &str) -> Result<Self, VirtcolError> {
        if !is_valid_identifier(name) {
            return Err(VirtcolError::schema(format!(
                "`{name}` is not a valid model name"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            table: table_name_for(name),
            fields: FieldDeclaration::implicit().to_vec(),
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_table(&mut self, table: &str) -> Result<(), VirtcolError> {
        if !is_valid_identifier(table) {
            return Err(VirtcolError::schema(format!(
                "`{table}` is not a valid table name for {}",
                self.name
            )));
        }
        self.table = table.to_string();
        Ok(())
    }

    pub(crate) fn declare(
        &mut self,
        decl: FieldDeclaration,
        policy: RedeclarePolicy,
    ) -> Result<(), VirtcolError> {
        let name = decl.name.as_str();
        if !is_valid_identifier(name) {
            return Err(VirtcolError::schema(format!(
                "`{name}` is not a valid field name on {}",
                self.name
            )));
        }
        if is_reserved(name) {
            return Err(VirtcolError::schema(format!(
                "`{name}` is reserved on {}",
                self.name
            )));
        }
        if decl.ty == ValueType::KeyValue {
            return Err(VirtcolError::schema(format!(
                "`{name}` on {}: {} is reserved for the container column",
                self.name, decl.ty
            )));
        }

        let position = self.fields.iter().position(|f| f.name == decl.name);
        let Some(idx) = position else {
            debug!(
                model = %self.name,
                field = %decl.name,
                kind = %decl.kind,
                ty = %decl.ty,
                "field declared"
            );
            self.fields.push(decl);
            return Ok(());
        };
        let existing = &mut self.fields[idx];

        if existing.kind != decl.kind {
            return Err(VirtcolError::schema(format!(
                "`{}` on {} is already declared as a {}; cannot redeclare it as a {}",
                decl.name, self.name, existing.kind, decl.kind
            )));
        }

        match policy {
            RedeclarePolicy::Reject => Err(VirtcolError::schema(format!(
                "`{}` on {} is already declared",
                decl.name, self.name
            ))),
            RedeclarePolicy::Overwrite => {
                debug!(
                    model = %self.name,
                    field = %decl.name,
                    old_ty = %existing.ty,
                    new_ty = %decl.ty,
                    "field redeclared, last declaration wins"
                );
                *existing = decl;
                Ok(())
            }
        }
    }

    /// Freezes the declaration and installs one accessor per virtual property.
    pub(crate) fn build(&self) -> ModelType {
        ModelType::new(self.name.clone(), self.table.clone(), self.fields.clone())
    }
}

/// Chained declarations for one model, valid only until the registry finalizes it.
///
/// ```ignore
/// registry
///     .register("User")?
///     .column("name", ValueType::String, Access::Accessible)?
///     .prop("happiness", ValueType::Integer, Access::Accessible)?;
/// ```
pub struct ModelBuilder<'a> {
    decl: &'a mut ModelDecl,
    policy: RedeclarePolicy,
}

impl<'a> ModelBuilder<'a> {
    pub(crate) fn new(decl: &'a mut ModelDecl, policy: RedeclarePolicy) -> Self {
        Self { decl, policy }
    }

    pub fn name(&self) -> &str {
        self.decl.name()
    }

    /// Declares a field stored in its own column.
    pub fn column(
        self,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<Self, VirtcolError> {
        self.decl
            .declare(FieldDeclaration::column(name, ty, access.into()), self.policy)?;
        Ok(self)
    }

    /// Declares a field stored inside the container column.
    pub fn prop(
        self,
        name: &str,
        ty: ValueType,
        access: impl Into<Access>,
    ) -> Result<Self, VirtcolError> {
        self.decl
            .declare(FieldDeclaration::property(name, ty, access.into()), self.policy)?;
        Ok(self)
    }

    /// Overrides the derived table name.
    pub fn table(self, table: &str) -> Result<Self, VirtcolError> {
        self.decl.set_table(table)?;
        Ok(self)
    }
}

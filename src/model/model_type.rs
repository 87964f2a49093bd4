use std::collections::BTreeMap;

use super::container::Container;
use super::field::{FieldDeclaration, FieldKind};
use super::value::{Value, ValueType};
use crate::error::VirtcolError;

/// Typed accessor for one virtual property, backed by the container column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAccessor {
    name: String,
    ty: ValueType,
}

impl PropertyAccessor {
    pub(crate) fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.ty
    }

    /// Looks up the property and decodes it; absent keys read as `Null`.
    pub fn read(&self, container: &Container) -> Result<Value, VirtcolError> {
        match container.get(&self.name) {
            None => Ok(Value::Null),
            Some(raw) => Value::from(raw).coerce(self.ty).map_err(|err| {
                VirtcolError::validation(format!(
                    "stored property `{}` is unreadable: {err}",
                    self.name
                ))
            }),
        }
    }

    /// Coerces `value` and stores its encoding; `Null` removes the key.
    pub fn write(&self, container: &mut Container, value: Value) -> Result<(), VirtcolError> {
        let value = value.coerce(self.ty)?;
        match value.encode() {
            Some(encoded) => container.insert(self.name.clone(), encoded),
            None => {
                container.remove(&self.name);
            }
        }
        Ok(())
    }
}

/// A finalized model: its table, fields and installed property accessors.
///
/// Immutable once built; shared as `Arc<ModelType>` by records and stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelType {
    name: String,
    table: String,
    fields: Vec<FieldDeclaration>,
    accessors: BTreeMap<String, PropertyAccessor>,
}

impl ModelType {
    pub(crate) fn new(name: String, table: String, fields: Vec<FieldDeclaration>) -> Self {
        let accessors = fields
            .iter()
            .filter(|f| f.kind == FieldKind::VirtualProperty)
            .map(|f| (f.name.clone(), PropertyAccessor::new(f.name.clone(), f.ty)))
            .collect();

        Self {
            name,
            table,
            fields,
            accessors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// All declared fields, implicit ones first.
    pub fn fields(&self) -> &[FieldDeclaration] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDeclaration> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Every persisted column except the primary key, implicit ones included.
    pub fn columns(&self) -> impl Iterator<Item = &FieldDeclaration> {
        self.fields
            .iter()
            .filter(|f| f.kind == FieldKind::DirectColumn)
    }

    pub fn properties(&self) -> impl Iterator<Item = &PropertyAccessor> {
        self.accessors.values()
    }

    pub fn accessor(&self, name: &str) -> Option<&PropertyAccessor> {
        self.accessors.get(name)
    }

    pub fn is_accessible(&self, name: &str) -> bool {
        self.field(name).is_some_and(FieldDeclaration::is_accessible)
    }
}

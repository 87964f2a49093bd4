use serde::{Deserialize, Serialize};
use std::fmt;

use super::value::ValueType;

/// Primary key column every table gets.
pub const PRIMARY_KEY: &str = "id";
/// Container column holding every virtual property of a record.
pub const CONTAINER_COLUMN: &str = "properties";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

const RESERVED: [&str; 4] = [PRIMARY_KEY, CONTAINER_COLUMN, CREATED_AT, UPDATED_AT];

/// True for names managed by the model layer itself.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Stored as its own column.
    DirectColumn,
    /// Stored as a key inside the container column.
    VirtualProperty,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::DirectColumn => f.write_str("column"),
            FieldKind::VirtualProperty => f.write_str("property"),
        }
    }
}

/// Whether a field may be set through bulk assignment of untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Accessible,
    #[default]
    Protected,
}

impl From<bool> for Access {
    fn from(accessible: bool) -> Self {
        if accessible {
            Access::Accessible
        } else {
            Access::Protected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: FieldKind,
    pub ty: ValueType,
    pub access: Access,
}

impl FieldDeclaration {
    pub fn column(name: impl Into<String>, ty: ValueType, access: Access) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::DirectColumn,
            ty,
            access,
        }
    }

    pub fn property(name: impl Into<String>, ty: ValueType, access: Access) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::VirtualProperty,
            ty,
            access,
        }
    }

    /// Container plus creation/update timestamps, added to every registered model.
    pub fn implicit() -> [FieldDeclaration; 3] {
        [
            FieldDeclaration::column(CONTAINER_COLUMN, ValueType::KeyValue, Access::Protected),
            FieldDeclaration::column(CREATED_AT, ValueType::DateTime, Access::Protected),
            FieldDeclaration::column(UPDATED_AT, ValueType::DateTime, Access::Protected),
        ]
    }

    pub fn is_accessible(&self) -> bool {
        self.access == Access::Accessible
    }

    pub fn is_implicit(&self) -> bool {
        is_reserved(&self.name)
    }
}

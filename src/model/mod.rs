//! Model layer: value types, field declarations, finalized models and records.
//!
//! Layout:
//! - `value.rs`: closed set of attribute types and their string encoding
//! - `field.rs`: field declarations and the reserved implicit columns
//! - `container.rs`: decoded contents of the container column
//! - `model_type.rs`: finalized model with its property accessors
//! - `record.rs`: one instance of a model

pub mod container;
pub mod field;
pub mod model_type;
pub mod record;
pub mod value;

pub use container::Container;
pub use field::{
    Access, CONTAINER_COLUMN, CREATED_AT, FieldDeclaration, FieldKind, PRIMARY_KEY, UPDATED_AT,
    is_reserved,
};
pub use model_type::{ModelType, PropertyAccessor};
pub use record::Record;
pub use value::{Value, ValueType};

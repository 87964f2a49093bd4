use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::container::Container;
use super::field::{
    CONTAINER_COLUMN, CREATED_AT, FieldDeclaration, FieldKind, PRIMARY_KEY, UPDATED_AT,
};
use super::model_type::ModelType;
use super::value::Value;
use crate::error::VirtcolError;

/// One instance of a finalized model.
///
/// Direct columns live in `columns`; virtual properties live encoded in `container`
/// and are decoded on every read through the model's accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    model: Arc<ModelType>,
    id: Option<i64>,
    columns: BTreeMap<String, Value>,
    container: Container,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Record {
    pub fn new(model: Arc<ModelType>) -> Self {
        Self {
            model,
            id: None,
            columns: BTreeMap::new(),
            container: Container::new(),
            created_at: None,
            updated_at: None,
        }
    }

    pub fn model(&self) -> &Arc<ModelType> {
        &self.model
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Reads any attribute by name, implicit ones included.
    pub fn get(&self, name: &str) -> Result<Value, VirtcolError> {
        match name {
            PRIMARY_KEY => Ok(self.id.into()),
            CREATED_AT => Ok(self.created_at.into()),
            UPDATED_AT => Ok(self.updated_at.into()),
            CONTAINER_COLUMN => Ok(Value::KeyValue(self.container.as_map().clone())),
            _ => {
                let field = self.declared(name)?;
                match field.kind {
                    FieldKind::DirectColumn => {
                        Ok(self.columns.get(name).cloned().unwrap_or(Value::Null))
                    }
                    FieldKind::VirtualProperty => self.accessor_read(name),
                }
            }
        }
    }

    /// Writes a declared attribute, coercing to its type.
    ///
    /// Implicit attributes are managed by the store and cannot be set.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), VirtcolError> {
        let value = value.into();
        let (kind, ty) = {
            let field = self.declared(name)?;
            if field.is_implicit() {
                return Err(VirtcolError::validation(format!(
                    "`{name}` is managed by {} and cannot be assigned",
                    self.model.name()
                )));
            }
            (field.kind, field.ty)
        };

        match kind {
            FieldKind::DirectColumn => {
                let coerced = value.coerce(ty)?;
                self.columns.insert(name.to_string(), coerced);
                Ok(())
            }
            FieldKind::VirtualProperty => {
                let accessor = self.model.accessor(name).ok_or_else(|| {
                    VirtcolError::schema(format!(
                        "{} has no accessor for `{name}`",
                        self.model.name()
                    ))
                })?;
                accessor.write(&mut self.container, value)
            }
        }
    }

    /// Bulk assignment from an untrusted JSON object.
    ///
    /// Every key is checked before anything is written: unknown, implicit or protected
    /// keys and uncoercible values reject the whole map.
    pub fn assign(&mut self, attrs: &serde_json::Value) -> Result<(), VirtcolError> {
        let obj = attrs.as_object().ok_or_else(|| {
            VirtcolError::validation("bulk assignment expects a JSON object")
        })?;

        let mut staged = Vec::with_capacity(obj.len());
        for (key, raw) in obj {
            let field = self.model.field(key).ok_or_else(|| {
                VirtcolError::validation(format!(
                    "unknown attribute `{key}` for {}",
                    self.model.name()
                ))
            })?;
            if field.is_implicit() || !field.is_accessible() {
                return Err(VirtcolError::validation(format!(
                    "attribute `{key}` of {} is not mass-assignable",
                    self.model.name()
                )));
            }
            staged.push((key.as_str(), Value::from_json(field.ty, raw)?));
        }

        for (key, value) in staged {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Typed view of every attribute, for logs and APIs.
    pub fn to_json(&self) -> Result<serde_json::Value, VirtcolError> {
        let mut out = serde_json::Map::new();
        out.insert(PRIMARY_KEY.to_string(), Value::from(self.id).to_json());
        for field in self.model.fields() {
            if field.name == CONTAINER_COLUMN {
                continue;
            }
            out.insert(field.name.clone(), self.get(&field.name)?.to_json());
        }
        Ok(serde_json::Value::Object(out))
    }

    /// Value bound for a column when the record is written.
    pub(crate) fn persisted_value(&self, field: &FieldDeclaration) -> Result<Value, VirtcolError> {
        match field.name.as_str() {
            CONTAINER_COLUMN => Ok(Value::String(self.container.encode()?)),
            CREATED_AT => Ok(self.created_at.into()),
            UPDATED_AT => Ok(self.updated_at.into()),
            name => Ok(self.columns.get(name).cloned().unwrap_or(Value::Null)),
        }
    }

    pub(crate) fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        if self.created_at.is_none() {
            self.created_at = Some(now);
        }
        self.updated_at = Some(now);
    }

    /// Rebuilds a record from stored cells.
    pub(crate) fn hydrate(
        model: Arc<ModelType>,
        id: i64,
        columns: BTreeMap<String, Value>,
        container: Container,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            model,
            id: Some(id),
            columns,
            container,
            created_at,
            updated_at,
        }
    }

    fn declared(&self, name: &str) -> Result<&FieldDeclaration, VirtcolError> {
        self.model.field(name).ok_or_else(|| {
            VirtcolError::validation(format!(
                "unknown attribute `{name}` for {}",
                self.model.name()
            ))
        })
    }

    fn accessor_read(&self, name: &str) -> Result<Value, VirtcolError> {
        match self.model.accessor(name) {
            Some(accessor) => accessor.read(&self.container),
            None => Err(VirtcolError::schema(format!(
                "{} has no accessor for `{name}`",
                self.model.name()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Access, ValueType};
    use serde_json::json;

    fn user() -> Arc<ModelType> {
        let mut fields = FieldDeclaration::implicit().to_vec();
        fields.push(FieldDeclaration::column(
            "name",
            ValueType::String,
            Access::Accessible,
        ));
        fields.push(FieldDeclaration::column(
            "admin",
            ValueType::Boolean,
            Access::Protected,
        ));
        fields.push(FieldDeclaration::property(
            "happiness",
            ValueType::Integer,
            Access::Accessible,
        ));
        fields.push(FieldDeclaration::property(
            "ratio",
            ValueType::Float,
            Access::Accessible,
        ));
        fields.push(FieldDeclaration::property(
            "nickname",
            ValueType::String,
            Access::Protected,
        ));
        Arc::new(ModelType::new("User".into(), "users".into(), fields))
    }

    #[test]
    fn property_write_then_read_holds_for_boundaries() {
        let mut record = Record::new(user());
        for v in [0, -1, i64::MAX, i64::MIN] {
            record.set("happiness", v).unwrap();
            assert_eq!(record.get("happiness").unwrap(), Value::Integer(v));
        }
        for v in [0.0, f64::MAX, f64::MIN, 0.5] {
            record.set("ratio", v).unwrap();
            assert_eq!(record.get("ratio").unwrap(), Value::Float(v));
        }
        record.set("nickname", "").unwrap();
        assert_eq!(record.get("nickname").unwrap(), Value::from(""));
    }

    #[test]
    fn properties_are_stored_as_strings_in_container() {
        let mut record = Record::new(user());
        record.set("happiness", 1).unwrap();
        assert_eq!(record.container().get("happiness"), Some("1"));
        assert!(record.columns.is_empty());
    }

    #[test]
    fn writing_null_removes_property() {
        let mut record = Record::new(user());
        record.set("happiness", 3).unwrap();
        record.set("happiness", Value::Null).unwrap();
        assert!(record.container().is_empty());
        assert_eq!(record.get("happiness").unwrap(), Value::Null);
    }

    #[test]
    fn implicit_fields_cannot_be_set() {
        let mut record = Record::new(user());
        for name in ["properties", "created_at", "updated_at"] {
            let err = record.set(name, "x").unwrap_err();
            assert!(err.is_validation(), "{name}: {err:?}");
        }
    }

    #[test]
    fn bulk_assignment_rejects_protected_fields_atomically() {
        let mut record = Record::new(user());
        let err = record
            .assign(&json!({"name": "Stef", "admin": true}))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(record.get("name").unwrap(), Value::Null);

        let err = record.assign(&json!({"nickname": "s"})).unwrap_err();
        assert!(err.is_validation());
        assert!(record.container().is_empty());
    }

    #[test]
    fn bulk_assignment_rejects_unknown_and_implicit_keys() {
        let mut record = Record::new(user());
        assert!(record.assign(&json!({"shoe_size": 44})).is_err());
        assert!(record.assign(&json!({"created_at": "2024-01-01T00:00:00Z"})).is_err());
        assert!(record.assign(&json!(["name"])).is_err());
    }

    #[test]
    fn bulk_assignment_fills_columns_and_properties() {
        let mut record = Record::new(user());
        record
            .assign(&json!({"name": "Stef", "happiness": 1, "ratio": "0.25"}))
            .unwrap();
        assert_eq!(record.get("name").unwrap(), Value::from("Stef"));
        assert_eq!(record.get("happiness").unwrap(), Value::Integer(1));
        assert_eq!(record.get("ratio").unwrap(), Value::Float(0.25));
    }

    #[test]
    fn to_json_exposes_typed_properties() {
        let mut record = Record::new(user());
        record.assign(&json!({"name": "Stef", "happiness": 1})).unwrap();
        let json = record.to_json().unwrap();
        assert_eq!(json["name"], json!("Stef"));
        assert_eq!(json["happiness"], json!(1));
        assert_eq!(json["id"], json!(null));
        assert!(json.get("properties").is_none());
    }
}

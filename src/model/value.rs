//! Closed set of attribute types and the values they hold.
//!
//! Every stored value has a canonical string encoding (`Value::encode`) that is what
//! ends up inside the container column. `Value::coerce` is the inverse: it turns a raw
//! string (or a compatible scalar) back into the declared type.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::VirtcolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ValueType {
    String,
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    /// Opaque string-to-string map; only used for the container column.
    KeyValue,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Text => "text",
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::Boolean => "boolean",
            ValueType::Date => "date",
            ValueType::DateTime => "datetime",
            ValueType::KeyValue => "key_value",
        }
    }

    /// SQLite column type used when the column is added.
    pub fn sql_type(self) -> &'static str {
        match self {
            ValueType::Integer | ValueType::Boolean => "INTEGER",
            ValueType::Float => "REAL",
            ValueType::String
            | ValueType::Text
            | ValueType::Date
            | ValueType::DateTime
            | ValueType::KeyValue => "TEXT",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = VirtcolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ty = match s.trim().to_ascii_lowercase().as_str() {
            "string" => ValueType::String,
            "text" => ValueType::Text,
            "integer" | "int" => ValueType::Integer,
            "float" | "double" => ValueType::Float,
            "boolean" | "bool" => ValueType::Boolean,
            "date" => ValueType::Date,
            "datetime" | "timestamp" => ValueType::DateTime,
            "hstore" | "key_value" => ValueType::KeyValue,
            other => {
                return Err(VirtcolError::schema(format!(
                    "unrecognized value type `{other}`"
                )));
            }
        };
        Ok(ty)
    }
}

impl TryFrom<String> for ValueType {
    type Error = VirtcolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ValueType> for String {
    fn from(ty: ValueType) -> Self {
        ty.name().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    KeyValue(BTreeMap<String, String>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Boolean(_) => "boolean",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::KeyValue(_) => "key_value",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Converts `self` into a value of type `ty`.
    ///
    /// Strings are parsed, integers widen to floats, scalars stringify into string
    /// types. `Null` passes through unchanged.
    pub fn coerce(self, ty: ValueType) -> Result<Value, VirtcolError> {
        let mismatch = |v: &Value| {
            VirtcolError::validation(format!("cannot coerce {} into {ty}", v.type_name()))
        };

        match (ty, self) {
            (_, Value::Null) => Ok(Value::Null),

            (ValueType::String | ValueType::Text, Value::String(s)) => Ok(Value::String(s)),
            (ValueType::String | ValueType::Text, v @ Value::KeyValue(_)) => Err(mismatch(&v)),
            (ValueType::String | ValueType::Text, v) => match v.encode() {
                Some(s) => Ok(Value::String(s)),
                None => Ok(Value::Null),
            },

            (ValueType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
            (ValueType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| VirtcolError::validation(format!("`{s}` is not an integer: {e}"))),

            (ValueType::Float, Value::Float(f)) => Ok(Value::Float(f)),
            #[allow(clippy::cast_precision_loss)]
            (ValueType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
            (ValueType::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| VirtcolError::validation(format!("`{s}` is not a float: {e}"))),

            (ValueType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
            (ValueType::Boolean, Value::Integer(0)) => Ok(Value::Boolean(false)),
            (ValueType::Boolean, Value::Integer(1)) => Ok(Value::Boolean(true)),
            (ValueType::Boolean, Value::String(s)) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" | "yes" => Ok(Value::Boolean(true)),
                    "false" | "f" | "0" | "no" => Ok(Value::Boolean(false)),
                    _ => Err(VirtcolError::validation(format!("`{s}` is not a boolean"))),
                }
            }

            (ValueType::Date, Value::Date(d)) => Ok(Value::Date(d)),
            (ValueType::Date, Value::DateTime(dt)) => Ok(Value::Date(dt.date_naive())),
            (ValueType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|e| VirtcolError::validation(format!("`{s}` is not a date: {e}"))),

            (ValueType::DateTime, Value::DateTime(dt)) => Ok(Value::DateTime(dt)),
            (ValueType::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| VirtcolError::validation(format!("`{s}` is not a datetime: {e}"))),

            (ValueType::KeyValue, Value::KeyValue(map)) => Ok(Value::KeyValue(map)),
            (ValueType::KeyValue, Value::String(s)) => serde_json::from_str(&s)
                .map(Value::KeyValue)
                .map_err(|e| {
                    VirtcolError::validation(format!("`{s}` is not a key-value map: {e}"))
                }),

            (_, v) => Err(mismatch(&v)),
        }
    }

    /// Coerces an untrusted JSON value into `ty`.
    pub fn from_json(ty: ValueType, json: &serde_json::Value) -> Result<Value, VirtcolError> {
        let raw = match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Object(obj) => {
                let mut map = BTreeMap::new();
                for (k, v) in obj {
                    let encoded = match v {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => continue,
                        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                            return Err(VirtcolError::validation(format!(
                                "key `{k}` holds a nested value; only scalars are allowed"
                            )));
                        }
                        other => other.to_string(),
                    };
                    map.insert(k.clone(), encoded);
                }
                Value::KeyValue(map)
            }
            serde_json::Value::Array(_) => {
                return Err(VirtcolError::validation(format!(
                    "arrays cannot be assigned to a {ty} field"
                )));
            }
        };
        raw.coerce(ty)
    }

    /// Canonical string form; `None` for `Null`.
    pub fn encode(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(f) => Some(f.to_string()),
            Value::Boolean(b) => Some(b.to_string()),
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::DateTime(dt) => Some(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            // BTreeMap<String, String> always serializes.
            Value::KeyValue(map) => serde_json::to_string(map).ok(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Date(_) | Value::DateTime(_) => {
                self.encode().map_or(serde_json::Value::Null, serde_json::Value::String)
            }
            Value::KeyValue(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(s) => f.write_str(&s),
            None => f.write_str("NULL"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

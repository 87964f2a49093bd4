use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::VirtcolError;

/// Decoded contents of the container column: property name to encoded value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Container(BTreeMap<String, String>);

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// Serializes into the text stored in the container cell.
    pub fn encode(&self) -> Result<String, VirtcolError> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Parses a stored cell. `NULL`/empty cells decode as an empty container;
    /// non-string scalars written by other tools are stringified.
    pub fn decode(raw: Option<&str>) -> Result<Self, VirtcolError> {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::default());
        };

        let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut map = BTreeMap::new();
        for (key, value) in parsed {
            match value {
                serde_json::Value::Null => {}
                serde_json::Value::String(s) => {
                    map.insert(key, s);
                }
                other => {
                    map.insert(key, other.to_string());
                }
            }
        }
        Ok(Self(map))
    }
}

impl From<BTreeMap<String, String>> for Container {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cells_decode_to_empty_container() {
        assert!(Container::decode(None).unwrap().is_empty());
        assert!(Container::decode(Some("  ")).unwrap().is_empty());
        assert!(Container::decode(Some("{}")).unwrap().is_empty());
    }

    #[test]
    fn foreign_scalars_are_stringified() {
        let c = Container::decode(Some(r#"{"a":1,"b":"two","c":null,"d":true}"#)).unwrap();
        assert_eq!(c.get("a"), Some("1"));
        assert_eq!(c.get("b"), Some("two"));
        assert_eq!(c.get("c"), None);
        assert_eq!(c.get("d"), Some("true"));
    }

    #[test]
    fn malformed_cell_is_json_error() {
        let err = Container::decode(Some("[1,2]")).unwrap_err();
        assert!(matches!(err, VirtcolError::Json(_)));
    }
}

use serde::{Deserialize, Serialize};

/// A model declared in `config.toml` instead of code.
///
/// ```toml
/// [[models]]
/// name = "Note"
/// fields = [
///     { name = "title", kind = "column", type = "string", accessible = true },
///     { name = "stars", kind = "prop", type = "integer" },
/// ]
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,

    /// Overrides the derived table name.
    #[serde(default)]
    pub table: Option<String>,

    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FieldConfig {
    pub name: String,

    pub kind: FieldKindConfig,

    /// Kept as a raw name so unknown types surface as schema errors at declaration.
    #[serde(rename = "type")]
    pub ty: String,

    #[serde(default)]
    pub accessible: bool,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FieldKindConfig {
    #[serde(alias = "col")]
    Column,
    #[serde(alias = "property")]
    Prop,
}

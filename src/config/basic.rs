use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::registry::RedeclarePolicy;

/// Basic (core) configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BasicConfig {
    /// Log level for tracing subscriber initialization ("error" through "trace").
    /// TOML: `basic.loglevel`. Default: `info`.
    #[serde(default = "default_loglevel")]
    pub loglevel: String,

    /// Directory holding the SQLite database files.
    /// TOML: `basic.data_dir`. Default: `./data`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// What to do when a field name is declared twice with the same kind.
    /// TOML: `basic.redeclare` (`"overwrite"` | `"reject"`). Default: `overwrite`.
    #[serde(default)]
    pub redeclare: RedeclarePolicy,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            loglevel: default_loglevel(),
            data_dir: default_data_dir(),
            redeclare: RedeclarePolicy::default(),
        }
    }
}

fn default_loglevel() -> String {
    "info".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

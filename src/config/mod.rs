mod basic;
mod database;
mod models;

pub use basic::BasicConfig;
pub use database::DatabaseConfig;
pub use models::{FieldConfig, FieldKindConfig, ModelConfig};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::VirtcolError;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core settings (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Backing store connection (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Extra models declared without code (see `[[models]]` in config.toml).
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const ENV_PREFIX: &str = "VIRTCOL_";

impl Config {
    /// Builds a Figment that merges defaults, the config TOML file if present, and
    /// `VIRTCOL_`-prefixed environment variables (`__` separates nested keys).
    pub fn figment_from(path: impl AsRef<Path>) -> Figment {
        let path = path.as_ref();
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let figment = if path.is_file() {
            figment.merge(Toml::file(path))
        } else {
            figment
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn figment() -> Figment {
        Self::figment_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads and validates configuration from `config.toml` (optional) and the environment.
    pub fn load() -> Result<Self, VirtcolError> {
        Self::from_figment(&Self::figment())
    }

    pub fn from_figment(figment: &Figment) -> Result<Self, VirtcolError> {
        let cfg: Self = figment.extract()?;
        cfg.database.validate()?;
        Ok(cfg)
    }
}

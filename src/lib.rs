pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod registry;
pub mod utils;

pub use config::Config;
pub use error::VirtcolError;
pub use model::{Access, ModelType, Record, Value, ValueType};
pub use registry::{Catalog, RedeclarePolicy, Registry, SharedRegistry};

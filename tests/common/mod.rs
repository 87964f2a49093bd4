#![allow(dead_code)]

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::SystemTime;

use virtcol::config::DatabaseConfig;
use virtcol::db::{SqliteConnector, Store, connect_or_create};
use virtcol::{Access, Registry, RedeclarePolicy, ValueType};

static COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh, empty data directory under the system temp dir.
pub fn temp_data_dir(tag: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    SystemTime::now().hash(&mut hasher);
    std::process::id().hash(&mut hasher);
    COUNTER.fetch_add(1, Ordering::SeqCst).hash(&mut hasher);
    std::env::temp_dir().join(format!("virtcol_{tag}_{:016x}", hasher.finish()))
}

pub fn database_config(name: &str) -> DatabaseConfig {
    DatabaseConfig {
        database: name.to_string(),
        ..DatabaseConfig::default()
    }
}

/// Bootstraps a brand-new SQLite database in its own directory.
pub async fn fresh_store(tag: &str) -> (Store, PathBuf) {
    let dir = temp_data_dir(tag);
    let connector = SqliteConnector::new(&dir);
    let store = connect_or_create(&database_config("test"), &connector)
        .await
        .unwrap();
    (store, dir)
}

pub async fn cleanup(store: Store, dir: PathBuf) {
    store.close().await;
    let _ = tokio::fs::remove_dir_all(&dir).await;
}

/// `User` (name column, happiness property) and `Idea` as in the demo binary.
pub fn demo_registry() -> Registry {
    let mut registry = Registry::new(RedeclarePolicy::Overwrite);
    registry
        .register("User")
        .unwrap()
        .column("name", ValueType::String, Access::Accessible)
        .unwrap()
        .prop("happiness", ValueType::Integer, Access::Accessible)
        .unwrap();
    registry
        .register("Idea")
        .unwrap()
        .column("name", ValueType::String, Access::Accessible)
        .unwrap()
        .column("user_id", ValueType::Integer, Access::Accessible)
        .unwrap()
        .prop("silliness", ValueType::Integer, Access::Accessible)
        .unwrap()
        .prop("originality", ValueType::Float, Access::Accessible)
        .unwrap();
    registry
}

//! Database module: bootstrap, additive schema and record persistence.
//!
//! Layout:
//! - `bootstrap.rs`: connect, creating the database once if missing
//! - `migrator.rs`: schema seam used by the registry at finalize
//! - `schema.rs`: SQL DDL for tables and added columns (SQLite-first)
//! - `store.rs`: record CRUD over a `SqlitePool`
//! - `actor.rs`: store actor serializing access through a cloneable handle

pub mod actor;
pub mod bootstrap;
pub mod migrator;
pub mod schema;
pub mod store;

pub use actor::{StoreHandle, StoreMessage, spawn};
pub use bootstrap::{Connector, SqliteConnector, connect_or_create};
pub use migrator::{SchemaMigrator, SchemaReport};
pub use store::Store;

//! Catalog metadata the binder resolves names against.

pub mod catalog;
pub mod dialect;
pub mod entry;

pub use catalog::{CatalogSnapshot, DatabaseEntry, SchemaEntry};
pub use dialect::Dialect;
pub use entry::{ColumnEntry, TableEntry, TableKind};

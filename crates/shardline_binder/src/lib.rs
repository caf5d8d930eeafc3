//! Statement binding for the shardline SQL middleware.
//!
//! Binding takes a parsed statement and resolves every table and column it
//! references against a read only catalog snapshot, producing a new statement
//! of the same shape with the resolution filled in.

pub mod binder;
pub mod config;
pub mod database;

#[cfg(test)]
mod testutil;

pub use binder::bind_statement::{BoundStatement, StatementBinder};
pub use config::BinderConfig;
pub use database::{CatalogSnapshot, Dialect};

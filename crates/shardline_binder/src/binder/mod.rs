//! Binding of raw statements against a catalog snapshot.
//!
//! Every statement kind has its own binder. Binders share a `BindContext`
//! holding the scopes for one bind call, and a `ResolveContext` holding the
//! catalog, the config, and statement wide settings.

pub mod bind_context;
pub mod bind_from;
pub mod bind_select;
pub mod expr_binder;
pub mod nested;
pub mod reconstruct;
pub mod resolve_context;
pub mod table_columns;
pub mod table_resolver;

pub mod bind_alter_table;
pub mod bind_comment;
pub mod bind_create_table;
pub mod bind_cursor;
pub mod bind_delete;
pub mod bind_drop;
pub mod bind_index;
pub mod bind_insert;
pub mod bind_prepare;
pub mod bind_rename;
pub mod bind_statement;
pub mod bind_update;
pub mod bind_view;

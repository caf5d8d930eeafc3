use std::sync::Arc;

use shardline_ast::ast::{Ident, StatementAttributes};

use crate::{
    config::BinderConfig,
    database::{CatalogSnapshot, Dialect},
};

/// Everything a binder needs besides the scopes: the catalog, the config, and
/// statement wide settings.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    pub catalog: &'a CatalogSnapshot,
    pub config: &'a BinderConfig,
    /// Existence checks on DDL targets are skipped when set.
    pub skip_metadata_validate: bool,
    /// Variables declared by the statement.
    pub variables: Arc<[Ident]>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(
        catalog: &'a CatalogSnapshot,
        config: &'a BinderConfig,
        attributes: &StatementAttributes,
    ) -> Self {
        ResolveContext {
            catalog,
            config,
            skip_metadata_validate: config.skip_metadata_validate
                || attributes.skip_metadata_validate(),
            variables: attributes.variable_names.clone(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.catalog.dialect()
    }

    pub fn canonical(&self, ident: &Ident) -> String {
        self.catalog.dialect().canonical(ident)
    }

    pub fn is_variable(&self, name: &str) -> bool {
        self.variables.iter().any(|v| v.matches(name))
    }
}

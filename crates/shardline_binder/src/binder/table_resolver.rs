use std::sync::Arc;

use shardline_ast::ast::{
    ColumnBinding, ColumnBindingKind, SimpleTable, TableBinding, TableSourceType,
};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::trace;

use super::{
    bind_context::{ScopeColumn, TableBindingContext, TableSource},
    resolve_context::ResolveContext,
};
use crate::database::TableEntry;

/// Catalog location of a table name after qualification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    pub database: String,
    pub schema: String,
    pub table: String,
}

impl QualifiedName {
    pub fn binding(&self, source: TableSourceType) -> TableBinding {
        TableBinding {
            database: self.database.clone(),
            schema: self.schema.clone(),
            table: self.table.clone(),
            source,
        }
    }
}

/// Resolves simple table names against the catalog.
#[derive(Debug)]
pub struct TableResolver<'a> {
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> TableResolver<'a> {
    pub const fn new(resolve_context: &'a ResolveContext<'a>) -> Self {
        TableResolver { resolve_context }
    }

    /// Determine the database and schema a table name lives in.
    ///
    /// With schemas, `a.b.t` is database `a`, schema `b`. Without, `a.t` is
    /// database `a`. Missing parts come from the session database and the
    /// dialect's default (or system) schema. The database and schema must
    /// exist unless they are one of the dialect's system schemas. The table
    /// doesn't have to exist.
    pub fn qualify(&self, table: &SimpleTable) -> Result<QualifiedName> {
        let dialect = self.resolve_context.dialect();
        let reference = &table.reference;
        let max_parts = if dialect.has_schemas() { 3 } else { 2 };
        if reference.0.len() > max_parts {
            return Err(BindError::new(
                BindErrorKind::DialectMismatch,
                format!("Too many qualifiers for a {dialect} table name: {reference}"),
            )
            .with_position(table.span.start, table.span.stop));
        }

        let base = self.resolve_context.canonical(reference.base()?);

        let (database, schema) = if dialect.has_schemas() {
            (
                reference.owner_of_owner().map(|d| self.resolve_context.canonical(d)),
                reference.owner().map(|s| self.resolve_context.canonical(s)),
            )
        } else {
            (
                reference.owner().map(|d| self.resolve_context.canonical(d)),
                None,
            )
        };

        let database = match database {
            Some(database) => database,
            None => match self.resolve_context.catalog.current_database() {
                Some(database) => database.to_string(),
                None => {
                    return Err(BindError::new(
                        BindErrorKind::NoDatabaseSelected,
                        "No database selected",
                    )
                    .with_position(table.span.start, table.span.stop))
                }
            },
        };

        let system_database = !dialect.has_schemas() && dialect.is_system_schema(&database);
        let db_entry = match self.resolve_context.catalog.get_database(&database) {
            Some(db_entry) => db_entry,
            None if system_database => {
                return Ok(QualifiedName {
                    schema: database.clone(),
                    database,
                    table: base,
                })
            }
            None => {
                return Err(BindError::new(
                    BindErrorKind::UnknownDatabase,
                    format!("Unknown database '{database}'"),
                )
                .with_name(database.clone())
                .with_position(table.span.start, table.span.stop))
            }
        };

        let schema = match schema {
            Some(schema) => schema,
            None => match dialect.system_schema_for_table(&base) {
                Some(system) => system.to_string(),
                None => self
                    .resolve_context
                    .catalog
                    .default_schema_name(&db_entry.name)
                    .to_string(),
            },
        };

        let schema = match db_entry.get_schema(&schema) {
            Some(schema_entry) => schema_entry.name.clone(),
            None if dialect.is_system_schema(&schema) => schema,
            None => {
                return Err(BindError::new(
                    BindErrorKind::UnknownSchema,
                    format!("Schema '{schema}' does not exist in database '{database}'"),
                )
                .with_name(schema.clone())
                .with_position(table.span.start, table.span.stop))
            }
        };

        Ok(QualifiedName {
            database: db_entry.name.clone(),
            schema,
            table: base,
        })
    }

    /// Look up a qualified name in the catalog.
    pub fn find(&self, name: &QualifiedName) -> Option<Arc<TableEntry>> {
        self.resolve_context
            .catalog
            .get_database(&name.database)
            .and_then(|db| db.get_schema(&name.schema))
            .and_then(|schema| schema.get_table(&name.table))
            .cloned()
    }

    /// Resolve a table that must exist.
    ///
    /// Tables in a system schema always resolve. Those missing from the
    /// catalog bind without known columns.
    pub fn resolve_existing(
        &self,
        table: &SimpleTable,
    ) -> Result<(SimpleTable, TableBindingContext)> {
        let name = self.qualify(table)?;
        match self.find(&name) {
            Some(entry) => Ok(self.bind_entry(table, &name, entry)),
            None if self.resolve_context.dialect().is_system_schema(&name.schema) => {
                trace!(schema = %name.schema, table = %name.table, "binding system table");
                let binding = name.binding(TableSourceType::TemporaryTable);
                Ok((
                    table.with_binding(binding.clone()),
                    TableBindingContext {
                        source: TableSource::System,
                        table: Some(binding),
                        columns: Vec::new(),
                    },
                ))
            }
            None => Err(BindError::unknown_table(table.reference.to_string())
                .with_position(table.span.start, table.span.stop)),
        }
    }

    /// Resolve the target of a drop.
    ///
    /// Missing targets bind as absent only when `if_exists` is set. Skipping
    /// metadata validation doesn't apply to drops.
    pub fn resolve_droppable(
        &self,
        table: &SimpleTable,
        if_exists: bool,
    ) -> Result<(SimpleTable, TableBindingContext)> {
        let name = self.qualify(table)?;
        match self.find(&name) {
            Some(entry) => Ok(self.bind_entry(table, &name, entry)),
            None if if_exists => {
                trace!(table = %name.table, "binding missing drop target as absent");
                let binding = name.binding(TableSourceType::Absent);
                Ok((
                    table.with_binding(binding.clone()),
                    TableBindingContext {
                        source: TableSource::Absent,
                        table: Some(binding),
                        columns: Vec::new(),
                    },
                ))
            }
            None => Err(BindError::unknown_table(table.reference.to_string())
                .with_position(table.span.start, table.span.stop)),
        }
    }

    /// Bind a name for a table that's about to be created (or renamed to).
    ///
    /// Errors with `TableExists` if the name is taken, unless `allow_existing`
    /// is set or metadata validation is skipped. The binding is the literal
    /// name, the catalog is only consulted for the existence check.
    pub fn bind_new_name(&self, table: &SimpleTable, allow_existing: bool) -> Result<SimpleTable> {
        let name = self.qualify(table)?;
        if !allow_existing && !self.resolve_context.skip_metadata_validate {
            if let Some(existing) = self.find(&name) {
                return Err(BindError::new(
                    BindErrorKind::TableExists,
                    format!("Table '{}' already exists", existing.name),
                )
                .with_name(existing.name.clone())
                .with_position(table.span.start, table.span.stop));
            }
        }
        Ok(table.with_binding(name.binding(TableSourceType::TemporaryTable)))
    }

    fn bind_entry(
        &self,
        table: &SimpleTable,
        name: &QualifiedName,
        entry: Arc<TableEntry>,
    ) -> (SimpleTable, TableBindingContext) {
        let source = if entry.is_view() {
            TableSourceType::View
        } else {
            TableSourceType::PhysicalTable
        };
        let binding = TableBinding {
            database: name.database.clone(),
            schema: name.schema.clone(),
            table: entry.name.clone(),
            source,
        };

        let columns = entry
            .columns
            .iter()
            .map(|column| ScopeColumn {
                name: column.name.clone(),
                binding: ColumnBinding {
                    database: Some(binding.database.clone()),
                    schema: Some(binding.schema.clone()),
                    table: Some(binding.table.clone()),
                    column: column.name.clone(),
                    source,
                    kind: ColumnBindingKind::Column,
                },
                visible: column.visible,
            })
            .collect();

        (
            table.with_binding(binding.clone()),
            TableBindingContext {
                source: TableSource::Catalog(entry),
                table: Some(binding),
                columns,
            },
        )
    }
}

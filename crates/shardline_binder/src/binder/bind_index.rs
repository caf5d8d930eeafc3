use std::sync::Arc;

use shardline_ast::ast::{
    AlterIndexStatement, CreateIndexStatement, DropIndexStatement, IndexBinding, IndexName,
    SimpleTable, StatementAttributes, TableBinding, TableSourceType,
};
use shardline_error::{BindError, BindErrorKind, OptionExt, Result};
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef},
    expr_binder::clause,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_columns::TableColumns,
    table_resolver::TableResolver,
};
use crate::database::{SchemaEntry, TableEntry};

/// Binds CREATE, ALTER and DROP INDEX.
///
/// Index names are unique per schema. When a statement doesn't name the
/// owning table, the owner is found by searching the session database's
/// default schema.
#[derive(Debug)]
pub struct IndexBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> IndexBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        IndexBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_create_index(
        &self,
        bind_context: &mut BindContext,
        create: &CreateIndexStatement,
    ) -> Result<CreateIndexStatement> {
        let (table, context) = TableResolver::new(self.resolve_context).resolve_existing(&create.table)?;
        let columns = TableColumns::from_context(&context)?;
        bind_context.register(
            self.current,
            self.resolve_context.canonical(create.table.reference.base()?),
            context,
        )?;

        let name = self.resolve_context.canonical(&create.index.name);
        let check = !create.if_not_exists && !self.resolve_context.skip_metadata_validate;
        if check && self.schema_of(&columns.table)?.find_index_owner(&name).is_some() {
            return Err(duplicate_index(&create.index, &name));
        }

        let index_columns = create
            .columns
            .iter()
            .map(|c| columns.resolve(c, clause::INDEX_DEFINITION))
            .collect::<Result<Vec<_>>>()?;

        let mut bound = CreateIndexStatement {
            attributes: StatementAttributes::default(),
            index: bind_index_name(&create.index, Some(columns.table.clone())),
            table,
            columns: index_columns,
            unique: create.unique,
            if_not_exists: create.if_not_exists,
        };
        copy_attributes(create, &mut bound);
        Ok(bound)
    }

    pub fn bind_alter_index(
        &self,
        bind_context: &mut BindContext,
        alter: &AlterIndexStatement,
    ) -> Result<AlterIndexStatement> {
        let table = self.bind_owner_table(bind_context, alter.table.as_ref())?;
        let owner = self.find_owner(&alter.index, table.as_ref(), false)?;

        if let (Some(rename_to), Some(owner)) = (&alter.rename_to, &owner) {
            let new_name = self.resolve_context.canonical(rename_to);
            if !self.resolve_context.skip_metadata_validate
                && self.schema_of(owner)?.find_index_owner(&new_name).is_some()
            {
                return Err(duplicate_index(&alter.index, &new_name));
            }
        }

        let mut bound = AlterIndexStatement {
            attributes: StatementAttributes::default(),
            index: bind_index_name(&alter.index, owner),
            table,
            rename_to: alter.rename_to.clone(),
        };
        copy_attributes(alter, &mut bound);
        Ok(bound)
    }

    pub fn bind_drop_index(
        &self,
        bind_context: &mut BindContext,
        drop: &DropIndexStatement,
    ) -> Result<DropIndexStatement> {
        let table = self.bind_owner_table(bind_context, drop.table.as_ref())?;
        let indexes = drop
            .indexes
            .iter()
            .map(|index| {
                let owner = self.find_owner(index, table.as_ref(), drop.if_exists)?;
                Ok(bind_index_name(index, owner))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut bound = DropIndexStatement {
            attributes: StatementAttributes::default(),
            indexes,
            table,
            if_exists: drop.if_exists,
        };
        copy_attributes(drop, &mut bound);
        Ok(bound)
    }

    fn bind_owner_table(
        &self,
        bind_context: &mut BindContext,
        table: Option<&SimpleTable>,
    ) -> Result<Option<SimpleTable>> {
        match table {
            Some(table) => {
                let (bound, context) =
                    TableResolver::new(self.resolve_context).resolve_existing(table)?;
                bind_context.register(
                    self.current,
                    self.resolve_context.canonical(table.reference.base()?),
                    context,
                )?;
                Ok(Some(bound))
            }
            None => Ok(None),
        }
    }

    /// Find the table owning an index.
    ///
    /// Returns `None` only when the index is missing and that's allowed.
    fn find_owner(
        &self,
        index: &IndexName,
        table: Option<&SimpleTable>,
        if_exists: bool,
    ) -> Result<Option<TableBinding>> {
        let name = self.resolve_context.canonical(&index.name);
        let allow_missing = if_exists || self.resolve_context.skip_metadata_validate;

        if let Some(table) = table {
            let binding = table
                .bound
                .clone()
                .required("binding for index owner")?;
            let exists = self
                .schema_of(&binding)?
                .get_table(&binding.table)
                .map(|t| t.has_index(&name))
                .unwrap_or(false);
            if !exists && !allow_missing {
                return Err(unknown_index(index, &name));
            }
            return Ok(Some(binding));
        }

        let catalog = self.resolve_context.catalog;
        let database = catalog.current_database().ok_or_else(|| {
            BindError::new(BindErrorKind::NoDatabaseSelected, "No database selected")
                .with_position(index.span.start, index.span.stop)
        })?;
        let owner = catalog.get_database(database).and_then(|db| {
            let schema = db.get_schema(catalog.default_schema_name(&db.name))?;
            schema.find_index_owner(&name).map(|t| (db, schema, t))
        });

        match owner {
            Some((db, schema, owner)) => {
                trace!(index = %name, table = %owner.name, "found index owner");
                Ok(Some(owner_binding(&db.name, schema, owner)))
            }
            None if allow_missing => Ok(None),
            None => Err(unknown_index(index, &name)),
        }
    }

    fn schema_of(&self, table: &TableBinding) -> Result<&'a SchemaEntry> {
        self.resolve_context
            .catalog
            .get_database(&table.database)
            .and_then(|db| db.get_schema(&table.schema))
            .ok_or_else(|| {
                BindError::internal(format!("Missing schema for bound table {table}"))
            })
    }
}

fn owner_binding(database: &str, schema: &SchemaEntry, owner: &Arc<TableEntry>) -> TableBinding {
    TableBinding {
        database: database.to_string(),
        schema: schema.name.clone(),
        table: owner.name.clone(),
        source: if owner.is_view() {
            TableSourceType::View
        } else {
            TableSourceType::PhysicalTable
        },
    }
}

fn bind_index_name(index: &IndexName, owner: Option<TableBinding>) -> IndexName {
    IndexName {
        name: index.name.clone(),
        span: index.span,
        bound: Some(IndexBinding { table: owner }),
    }
}

fn unknown_index(index: &IndexName, name: &str) -> BindError {
    BindError::new(
        BindErrorKind::UnknownIndex,
        format!("Index '{name}' does not exist"),
    )
    .with_name(name)
    .with_position(index.span.start, index.span.stop)
}

fn duplicate_index(index: &IndexName, name: &str) -> BindError {
    BindError::new(
        BindErrorKind::DuplicateIndex,
        format!("Duplicate key name '{name}'"),
    )
    .with_name(name)
    .with_position(index.span.start, index.span.stop)
}

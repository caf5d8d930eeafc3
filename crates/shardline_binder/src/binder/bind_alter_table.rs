use shardline_ast::ast::{
    AlterTableAction, AlterTableStatement, ColumnDefinition, ColumnRef, StatementAttributes,
};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef},
    bind_create_table::DefinitionBinder,
    expr_binder::clause,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_columns::TableColumns,
    table_resolver::TableResolver,
};

#[derive(Debug)]
pub struct AlterTableBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> AlterTableBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        AlterTableBinder {
            current,
            resolve_context,
        }
    }

    /// Bind an ALTER TABLE.
    ///
    /// Actions are applied in order to a working copy of the table's columns,
    /// so later actions see columns added or renamed by earlier ones.
    pub fn bind_alter_table(
        &self,
        bind_context: &mut BindContext,
        alter: &AlterTableStatement,
    ) -> Result<AlterTableStatement> {
        let resolver = TableResolver::new(self.resolve_context);
        let (table, context) = resolver.resolve_existing(&alter.table)?;
        let mut columns = TableColumns::from_context(&context)?;
        bind_context.register(
            self.current,
            self.resolve_context.canonical(alter.table.reference.base()?),
            context,
        )?;

        let skip = self.resolve_context.skip_metadata_validate;
        let definition_binder = DefinitionBinder::new(self.resolve_context);

        let mut actions = Vec::with_capacity(alter.actions.len());
        for action in &alter.actions {
            let bound = match action {
                AlterTableAction::AddColumn(def) => {
                    let name = self.resolve_context.canonical(&def.column.name);
                    let column = columns.define(&def.column, name, skip)?;
                    AlterTableAction::AddColumn(self.bind_definition(
                        &definition_binder,
                        def,
                        column,
                        &columns,
                    )?)
                }
                AlterTableAction::DropColumn { column, if_exists } => {
                    let bound = if columns.contains(column.name.as_str()) || !(*if_exists || skip)
                    {
                        columns.resolve(column, clause::TABLE_DEFINITION)?
                    } else {
                        columns.resolve_or_assume(column)
                    };
                    columns.remove(column.name.as_str());
                    AlterTableAction::DropColumn {
                        column: bound,
                        if_exists: *if_exists,
                    }
                }
                AlterTableAction::ModifyColumn(def) => {
                    let column = if skip {
                        columns.resolve_or_assume(&def.column)
                    } else {
                        columns.resolve(&def.column, clause::TABLE_DEFINITION)?
                    };
                    AlterTableAction::ModifyColumn(self.bind_definition(
                        &definition_binder,
                        def,
                        column,
                        &columns,
                    )?)
                }
                AlterTableAction::RenameColumn { from, to } => {
                    let bound = if skip {
                        columns.resolve_or_assume(from)
                    } else {
                        columns.resolve(from, clause::TABLE_DEFINITION)?
                    };
                    let to_name = self.resolve_context.canonical(to);
                    if columns.contains(&to_name) && !skip {
                        return Err(BindError::new(
                            BindErrorKind::DuplicateColumn,
                            format!("Duplicate column name '{to_name}'"),
                        )
                        .with_name(to_name));
                    }
                    if columns.contains(from.name.as_str()) {
                        columns.rename(from.name.as_str(), to_name)?;
                    }
                    AlterTableAction::RenameColumn {
                        from: bound,
                        to: to.clone(),
                    }
                }
                AlterTableAction::AddConstraint(constraint) => AlterTableAction::AddConstraint(
                    definition_binder.bind_constraint(constraint, &columns)?,
                ),
            };
            actions.push(bound);
        }

        let rename_to = match &alter.rename_to {
            Some(rename_to) => Some(resolver.bind_new_name(rename_to, false)?),
            None => None,
        };

        trace!(table = %columns.table, actions = actions.len(), "bound alter table");

        let mut bound = AlterTableStatement {
            attributes: StatementAttributes::default(),
            table,
            rename_to,
            actions,
        };
        copy_attributes(alter, &mut bound);

        Ok(bound)
    }

    fn bind_definition(
        &self,
        definition_binder: &DefinitionBinder,
        def: &ColumnDefinition,
        column: ColumnRef,
        columns: &TableColumns,
    ) -> Result<ColumnDefinition> {
        Ok(ColumnDefinition {
            column,
            data_type: def.data_type.clone(),
            primary_key: def.primary_key,
            not_null: def.not_null,
            references: match &def.references {
                Some(reference) => Some(definition_binder.bind_reference(reference, columns)?),
                None => None,
            },
        })
    }
}

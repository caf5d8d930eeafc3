use shardline_ast::ast::{
    ColumnDefinition, ColumnRef, CreateTableStatement, Ident, ReferenceDefinition,
    StatementAttributes, TableConstraint,
};
use shardline_error::{OptionExt, Result};
use tracing::trace;
use unicase::UniCase;

use super::{
    bind_context::{BindContext, BindScopeRef, TableSource},
    expr_binder::clause,
    nested::QueryBinder,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_columns::TableColumns,
    table_resolver::TableResolver,
};

#[derive(Debug)]
pub struct CreateTableBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> CreateTableBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        CreateTableBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_create_table(
        &self,
        bind_context: &mut BindContext,
        create: &CreateTableStatement,
    ) -> Result<CreateTableStatement> {
        let resolver = TableResolver::new(self.resolve_context);
        let table = resolver.bind_new_name(&create.table, create.if_not_exists)?;
        let binding = table
            .bound
            .clone()
            .required("binding for new table")?;
        let mut columns = TableColumns::new(binding);

        let like = match &create.like {
            Some(like) => {
                let (bound, context) = resolver.resolve_existing(like)?;
                for column in &context.columns {
                    let reference = ColumnRef::new(Ident::from_string(column.name.clone()), None);
                    columns.define(&reference, column.name.clone(), false)?;
                }
                Some(bound)
            }
            None => None,
        };

        // All columns are defined before anything refers to them.
        let mut defined = Vec::with_capacity(create.columns.len());
        for def in &create.columns {
            let name = self.resolve_context.canonical(&def.column.name);
            defined.push(columns.define(&def.column, name, false)?);
        }

        let as_select = match &create.as_select {
            Some(query) => {
                let (bound, outputs) = QueryBinder::new(self.current, self.resolve_context)
                    .bind_isolated(bind_context, query)?;
                // Explicit column definitions merge with the query's columns.
                let merge = !create.columns.is_empty();
                for output in &outputs {
                    let reference = ColumnRef::new(Ident::from_string(output.name.clone()), None);
                    columns.define(&reference, output.name.clone(), merge)?;
                }
                Some(Box::new(bound))
            }
            None => None,
        };

        let definition_binder = DefinitionBinder::new(self.resolve_context);
        let column_defs = create
            .columns
            .iter()
            .zip(defined)
            .map(|(def, column)| {
                Ok(ColumnDefinition {
                    column,
                    data_type: def.data_type.clone(),
                    primary_key: def.primary_key,
                    not_null: def.not_null,
                    references: match &def.references {
                        Some(reference) => {
                            Some(definition_binder.bind_reference(reference, &columns)?)
                        }
                        None => None,
                    },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let constraints = create
            .constraints
            .iter()
            .map(|constraint| definition_binder.bind_constraint(constraint, &columns))
            .collect::<Result<Vec<_>>>()?;

        trace!(table = %columns.table, columns = columns.columns.len(), "bound create table");

        let identity = columns.table.table.clone();
        bind_context.register(
            self.current,
            identity,
            columns.into_context(TableSource::Defined),
        )?;

        let mut bound = CreateTableStatement {
            attributes: StatementAttributes::default(),
            table,
            if_not_exists: create.if_not_exists,
            columns: column_defs,
            constraints,
            like,
            as_select,
        };
        copy_attributes(create, &mut bound);

        Ok(bound)
    }
}

/// Binds constraints and foreign key references against a table's columns.
#[derive(Debug)]
pub struct DefinitionBinder<'a> {
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> DefinitionBinder<'a> {
    pub const fn new(resolve_context: &'a ResolveContext<'a>) -> Self {
        DefinitionBinder { resolve_context }
    }

    pub fn bind_constraint(
        &self,
        constraint: &TableConstraint,
        columns: &TableColumns,
    ) -> Result<TableConstraint> {
        let bind_columns = |refs: &[ColumnRef]| -> Result<Vec<ColumnRef>> {
            refs.iter()
                .map(|c| columns.resolve(c, clause::TABLE_DEFINITION))
                .collect()
        };

        Ok(match constraint {
            TableConstraint::PrimaryKey(refs) => TableConstraint::PrimaryKey(bind_columns(refs)?),
            TableConstraint::Unique { name, columns: refs } => TableConstraint::Unique {
                name: name.clone(),
                columns: bind_columns(refs)?,
            },
            TableConstraint::ForeignKey {
                name,
                columns: refs,
                references,
            } => TableConstraint::ForeignKey {
                name: name.clone(),
                columns: bind_columns(refs)?,
                references: self.bind_reference(references, columns)?,
            },
        })
    }

    /// Bind the table and columns of a foreign key reference.
    ///
    /// A reference back to the table being defined resolves against `own`.
    pub fn bind_reference(
        &self,
        reference: &ReferenceDefinition,
        own: &TableColumns,
    ) -> Result<ReferenceDefinition> {
        let resolver = TableResolver::new(self.resolve_context);
        let name = resolver.qualify(&reference.table)?;

        let same = |a: &str, b: &str| UniCase::new(a) == UniCase::new(b);
        let is_self = same(&name.database, &own.table.database)
            && same(&name.schema, &own.table.schema)
            && same(&name.table, &own.table.table);

        let (table, target) = if is_self {
            (reference.table.with_binding(own.table.clone()), own.clone())
        } else {
            let (table, context) = resolver.resolve_existing(&reference.table)?;
            (table, TableColumns::from_context(&context)?)
        };

        let columns = reference
            .columns
            .iter()
            .map(|c| target.resolve(c, clause::TABLE_DEFINITION))
            .collect::<Result<Vec<_>>>()?;

        Ok(ReferenceDefinition { table, columns })
    }
}

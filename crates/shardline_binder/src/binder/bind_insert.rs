use shardline_ast::ast::{
    Assignment, InsertSource, InsertStatement, StatementAttributes,
};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef},
    expr_binder::{clause, ExpressionBinder},
    nested::QueryBinder,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_columns::TableColumns,
    table_resolver::TableResolver,
};

#[derive(Debug)]
pub struct InsertBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> InsertBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        InsertBinder {
            current,
            resolve_context,
        }
    }

    /// Bind an INSERT.
    ///
    /// Insert columns and `ON DUPLICATE KEY UPDATE` assignments resolve
    /// against the target. The rows being inserted can't see the target.
    pub fn bind_insert(
        &self,
        bind_context: &mut BindContext,
        insert: &InsertStatement,
    ) -> Result<InsertStatement> {
        let (table, context) = TableResolver::new(self.resolve_context).resolve_existing(&insert.table)?;
        let target = TableColumns::from_context(&context)?;
        let visible_count = context.columns.iter().filter(|c| c.visible).count();
        let identity = match &insert.table.alias {
            Some(alias) => self.resolve_context.canonical(alias),
            None => self.resolve_context.canonical(insert.table.reference.base()?),
        };
        bind_context.register(self.current, identity, context)?;

        let columns = insert
            .columns
            .iter()
            .map(|c| target.resolve(c, clause::FIELD_LIST))
            .collect::<Result<Vec<_>>>()?;
        let expected = if columns.is_empty() {
            visible_count
        } else {
            columns.len()
        };

        let source = match &insert.source {
            InsertSource::Values(rows) => {
                let scope = bind_context.new_orphan_scope();
                let binder = ExpressionBinder::new(scope, self.resolve_context);
                let rows = rows
                    .iter()
                    .enumerate()
                    .map(|(idx, row)| {
                        if row.len() != expected {
                            return Err(column_count_mismatch(idx + 1));
                        }
                        binder.bind_expressions(bind_context, row, clause::FIELD_LIST)
                    })
                    .collect::<Result<Vec<_>>>()?;
                InsertSource::Values(rows)
            }
            InsertSource::Select(query) => {
                let (bound, outputs) = QueryBinder::new(self.current, self.resolve_context)
                    .bind_nested(bind_context, query, false)?;
                if outputs.len() != expected {
                    return Err(column_count_mismatch(1));
                }
                InsertSource::Select(Box::new(bound))
            }
            InsertSource::DefaultValues => InsertSource::DefaultValues,
        };

        let binder = ExpressionBinder::new(self.current, self.resolve_context);
        let on_duplicate_update = insert
            .on_duplicate_update
            .iter()
            .map(|assignment| {
                Ok(Assignment {
                    column: binder.bind_column(bind_context, &assignment.column, clause::FIELD_LIST)?,
                    value: binder.bind_expression(bind_context, &assignment.value, clause::FIELD_LIST)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        trace!(table = %target.table, columns = columns.len(), "bound insert");

        let mut bound = InsertStatement {
            attributes: StatementAttributes::default(),
            table,
            columns,
            source,
            on_duplicate_update,
        };
        copy_attributes(insert, &mut bound);
        Ok(bound)
    }
}

fn column_count_mismatch(row: usize) -> BindError {
    BindError::new(
        BindErrorKind::DialectMismatch,
        format!("Column count doesn't match value count at row {row}"),
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{Expr, FunctionCall, Ident},
        builder::{col, number, param, table, with_parameters, SelectBuilder},
    };

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn insert(columns: &[&str], source: InsertSource) -> InsertStatement {
        InsertStatement {
            attributes: with_parameters(2),
            table: table("t_order"),
            columns: columns.iter().map(|c| col(c)).collect(),
            source,
            on_duplicate_update: Vec::new(),
        }
    }

    fn bind(stmt: &InsertStatement) -> Result<InsertStatement> {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        InsertBinder::new(root, &rc).bind_insert(&mut context, stmt)
    }

    #[test]
    fn values_with_parameters() {
        let stmt = insert(
            &["order_id", "user_id"],
            InsertSource::Values(vec![vec![param(0), param(1)]]),
        );
        let bound = bind(&stmt).unwrap();
        assert_eq!(
            Some("t_order".to_string()),
            bound.columns[1].bound.as_ref().unwrap().table
        );
        assert_eq!(InsertSource::Values(vec![vec![param(0), param(1)]]), bound.source);
        assert!(stmt.attributes.shares_with(&bound.attributes));
    }

    #[test]
    fn values_cannot_reference_target() {
        let stmt = insert(
            &["order_id"],
            InsertSource::Values(vec![vec![Expr::column("user_id")]]),
        );
        let err = bind(&stmt).unwrap_err();
        assert_eq!(BindErrorKind::UnknownColumn, err.kind());
    }

    #[test]
    fn column_count_checks() {
        let stmt = insert(&["order_id", "user_id"], InsertSource::Values(vec![vec![number(1)]]));
        assert_eq!(BindErrorKind::DialectMismatch, bind(&stmt).unwrap_err().kind());

        let stmt = insert(
            &[],
            InsertSource::Values(vec![vec![number(1), number(2), number(3)]]),
        );
        bind(&stmt).unwrap();

        let stmt = insert(&["missing"], InsertSource::DefaultValues);
        assert_eq!(BindErrorKind::UnknownColumn, bind(&stmt).unwrap_err().kind());
    }

    #[test]
    fn insert_select_and_on_duplicate() {
        let query = SelectBuilder::new()
            .project(Expr::column("order_id"))
            .project(Expr::column("user_id"))
            .from(table("t_order_item"))
            .build();
        let mut stmt = insert(&["order_id", "user_id"], InsertSource::Select(Box::new(query)));
        stmt.on_duplicate_update = vec![Assignment {
            column: col("status"),
            value: Expr::Function(FunctionCall {
                name: Ident::from_string("VALUES"),
                args: vec![Expr::column("status")],
                distinct: false,
                star: false,
            }),
        }];

        let bound = bind(&stmt).unwrap();
        let InsertSource::Select(query) = &bound.source else {
            panic!("expected select source")
        };
        assert_eq!(2, query.output_columns.as_ref().unwrap().len());
        assert_eq!(
            Some("t_order".to_string()),
            bound.on_duplicate_update[0].column.bound.as_ref().unwrap().table
        );
    }
}

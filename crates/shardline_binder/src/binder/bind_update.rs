use shardline_ast::ast::{Assignment, StatementAttributes, UpdateStatement};
use shardline_error::Result;

use super::{
    bind_context::{BindContext, BindScopeRef},
    bind_from::FromBinder,
    expr_binder::{clause, ExpressionBinder},
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
};

#[derive(Debug)]
pub struct UpdateBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> UpdateBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        UpdateBinder {
            current,
            resolve_context,
        }
    }

    /// Bind an UPDATE. The target may be a join, every table in it is
    /// visible to SET, WHERE and ORDER BY.
    pub fn bind_update(
        &self,
        bind_context: &mut BindContext,
        update: &UpdateStatement,
    ) -> Result<UpdateStatement> {
        let from =
            FromBinder::new(self.current, self.resolve_context).bind(bind_context, &update.table)?;

        let binder = ExpressionBinder::new(self.current, self.resolve_context);
        let assignments = update
            .assignments
            .iter()
            .map(|assignment| {
                Ok(Assignment {
                    column: binder.bind_column(bind_context, &assignment.column, clause::SET)?,
                    value: binder.bind_expression(bind_context, &assignment.value, clause::FIELD_LIST)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let where_expr = match &update.where_expr {
            Some(expr) => Some(binder.bind_expression(bind_context, expr, clause::WHERE)?),
            None => None,
        };
        let order_by = binder.bind_order_by(bind_context, &update.order_by)?;
        let limit = match &update.limit {
            Some(limit) => Some(binder.bind_limit(bind_context, limit)?),
            None => None,
        };

        let mut bound = UpdateStatement {
            attributes: StatementAttributes::default(),
            table: from.table,
            assignments,
            where_expr,
            order_by,
            limit,
        };
        copy_attributes(update, &mut bound);
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{BinaryOperator, ColumnBindingKind, Expr, JoinType},
        builder::{col, join, param, qcol, table, table_as, using, with_parameters, SelectBuilder},
    };
    use shardline_error::BindErrorKind;

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn bind(stmt: &UpdateStatement) -> Result<UpdateStatement> {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        UpdateBinder::new(root, &rc).bind_update(&mut context, stmt)
    }

    fn update(table: impl Into<shardline_ast::ast::TableReference>) -> UpdateStatement {
        UpdateStatement {
            attributes: with_parameters(2),
            table: table.into(),
            assignments: vec![Assignment {
                column: col("status"),
                value: param(0),
            }],
            where_expr: Some(Expr::binary(
                Expr::column("order_id"),
                BinaryOperator::Eq,
                param(1),
            )),
            order_by: Vec::new(),
            limit: None,
        }
    }

    #[test]
    fn simple_update() {
        let bound = bind(&update(table("t_order"))).unwrap();
        assert_eq!(
            Some("t_order".to_string()),
            bound.assignments[0].column.bound.as_ref().unwrap().table
        );
        assert_eq!(param(0), bound.assignments[0].value);
    }

    #[test]
    fn unknown_set_column() {
        let mut stmt = update(table("t_order"));
        stmt.assignments[0].column = col("missing");
        let err = bind(&stmt).unwrap_err();
        assert_eq!("Unknown column 'missing' in 'set clause'", err.get_msg());
    }

    #[test]
    fn joined_update_with_correlated_subquery() {
        let mut stmt = update(join(
            table_as("t_order", "o"),
            table_as("t_order_item", "i"),
            JoinType::Inner,
            using(&["order_id"]),
        ));
        stmt.where_expr = Some(Expr::binary(
            Expr::qualified_column("o", "order_id"),
            BinaryOperator::Eq,
            param(1),
        ));
        stmt.assignments = vec![Assignment {
            column: qcol("o", "status"),
            value: Expr::Subquery(Box::new(
                SelectBuilder::new()
                    .project(Expr::column("name"))
                    .from(table("t_user"))
                    .filter(Expr::binary(
                        Expr::qualified_column("t_user", "user_id"),
                        BinaryOperator::Eq,
                        Expr::qualified_column("o", "user_id"),
                    ))
                    .build(),
            )),
        }];

        let bound = bind(&stmt).unwrap();
        let Expr::Subquery(query) = &bound.assignments[0].value else {
            panic!("expected subquery")
        };
        let shardline_ast::ast::SetExpr::Select(body) = &query.body else {
            panic!("expected select")
        };
        let Some(Expr::BinaryOp { right, .. }) = &body.where_expr else {
            panic!("expected comparison")
        };
        let Expr::Column(outer) = right.as_ref() else {
            panic!("expected column")
        };
        assert_eq!(
            ColumnBindingKind::Correlated,
            outer.bound.as_ref().unwrap().kind
        );
    }

    #[test]
    fn ambiguous_where_column() {
        let mut stmt = update(join(
            table_as("t_order", "o"),
            table_as("t_order_item", "i"),
            JoinType::Inner,
            shardline_ast::ast::JoinCondition::None,
        ));
        stmt.assignments[0].column = qcol("o", "status");
        let err = bind(&stmt).unwrap_err();
        assert_eq!(BindErrorKind::AmbiguousReference, err.kind());
    }
}

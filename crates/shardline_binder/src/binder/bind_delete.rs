use shardline_ast::ast::{DeleteStatement, StatementAttributes};
use shardline_error::Result;

use super::{
    bind_context::{BindContext, BindScopeRef},
    bind_from::FromBinder,
    expr_binder::{clause, ExpressionBinder},
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
};

#[derive(Debug)]
pub struct DeleteBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> DeleteBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        DeleteBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_delete(
        &self,
        bind_context: &mut BindContext,
        delete: &DeleteStatement,
    ) -> Result<DeleteStatement> {
        let from =
            FromBinder::new(self.current, self.resolve_context).bind(bind_context, &delete.table)?;

        let binder = ExpressionBinder::new(self.current, self.resolve_context);
        let where_expr = match &delete.where_expr {
            Some(expr) => Some(binder.bind_expression(bind_context, expr, clause::WHERE)?),
            None => None,
        };
        let order_by = binder.bind_order_by(bind_context, &delete.order_by)?;
        let limit = match &delete.limit {
            Some(limit) => Some(binder.bind_limit(bind_context, limit)?),
            None => None,
        };

        let mut bound = DeleteStatement {
            attributes: StatementAttributes::default(),
            table: from.table,
            where_expr,
            order_by,
            limit,
        };
        copy_attributes(delete, &mut bound);
        Ok(bound)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{BinaryOperator, Expr, LimitClause, OrderByExpr, TableReference},
        builder::{param, table, table_as, with_parameters},
    };
    use shardline_error::BindErrorKind;

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn bind(stmt: &DeleteStatement) -> Result<DeleteStatement> {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        DeleteBinder::new(root, &rc).bind_delete(&mut context, stmt)
    }

    fn delete(table: impl Into<TableReference>, where_expr: Option<Expr>) -> DeleteStatement {
        DeleteStatement {
            attributes: with_parameters(2),
            table: table.into(),
            where_expr,
            order_by: Vec::new(),
            limit: None,
        }
    }

    #[test]
    fn delete_with_order_and_limit() {
        let mut stmt = delete(
            table_as("t_order", "o"),
            Some(Expr::binary(
                Expr::qualified_column("o", "user_id"),
                BinaryOperator::Eq,
                param(0),
            )),
        );
        stmt.order_by = vec![OrderByExpr {
            expr: Expr::column("order_id"),
            desc: true,
            nulls_first: None,
        }];
        stmt.limit = Some(LimitClause {
            limit: Some(param(1)),
            offset: None,
        });

        let bound = bind(&stmt).unwrap();
        assert_eq!(stmt.limit, bound.limit);
        let Expr::Column(column) = &bound.order_by[0].expr else {
            panic!("expected column")
        };
        assert_eq!(
            Some("t_order".to_string()),
            column.bound.as_ref().unwrap().table
        );
        assert!(stmt.attributes.shares_with(&bound.attributes));
    }

    #[test]
    fn alias_hides_table_name() {
        let stmt = delete(
            table_as("t_order", "o"),
            Some(Expr::binary(
                Expr::qualified_column("t_order", "user_id"),
                BinaryOperator::Eq,
                param(0),
            )),
        );
        let err = bind(&stmt).unwrap_err();
        assert_eq!(BindErrorKind::UnknownColumn, err.kind());
    }

    #[test]
    fn unknown_table() {
        let err = bind(&delete(table("t_missing"), None)).unwrap_err();
        assert_eq!(BindErrorKind::UnknownTable, err.kind());
        assert_eq!(Some("t_missing"), err.name());
    }
}

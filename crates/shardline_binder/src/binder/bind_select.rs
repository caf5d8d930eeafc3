use shardline_ast::ast::{
    ColumnBinding, ColumnBindingKind, ColumnRef, Expr, Ident, Projection, SelectBody,
    WildcardProjection,
};
use shardline_error::{BindError, BindErrorKind, Result};

use super::{
    bind_context::{BindContext, BindScopeRef, ScopeColumn},
    bind_from::FromBinder,
    expr_binder::{clause, AliasResolution, ExpressionBinder},
    resolve_context::ResolveContext,
};

/// Binds the body of a single `SELECT` (no set operations, no ORDER BY).
#[derive(Debug)]
pub struct SelectBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> SelectBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        SelectBinder {
            current,
            resolve_context,
        }
    }

    /// Bind the select, returning the bound body and its output columns.
    pub fn bind(
        &self,
        bind_context: &mut BindContext,
        select: &SelectBody,
    ) -> Result<(SelectBody, Vec<ScopeColumn>)> {
        // FROM is bound first so everything else can see its tables.
        let (from, from_columns) = match &select.from {
            Some(from) => {
                let bound = FromBinder::new(self.current, self.resolve_context)
                    .bind(bind_context, from)?;
                (Some(bound.table), Some(bound.columns))
            }
            None => (None, None),
        };

        let expr_binder = ExpressionBinder::new(self.current, self.resolve_context);

        let mut projections = Vec::with_capacity(select.projections.len());
        let mut outputs = Vec::with_capacity(select.projections.len());
        for projection in &select.projections {
            match projection {
                Projection::Wildcard(wildcard) => {
                    let expanded =
                        self.expand_wildcard(bind_context, wildcard, from_columns.as_deref())?;
                    outputs.extend(expanded.iter().cloned());
                    projections.push(Projection::Wildcard(WildcardProjection {
                        owner: wildcard.owner.clone(),
                        span: wildcard.span,
                        expanded: Some(
                            expanded
                                .into_iter()
                                .map(|c| {
                                    let mut column = ColumnRef::new(
                                        Ident::from_string(c.name),
                                        wildcard.owner.clone(),
                                    );
                                    column.bound = Some(c.binding);
                                    column
                                })
                                .collect(),
                        ),
                    }));
                }
                Projection::Expr { expr, alias } => {
                    let bound = expr_binder.bind_expression(bind_context, expr, clause::FIELD_LIST)?;
                    let name = match (alias, &bound) {
                        (Some(alias), _) => self.resolve_context.canonical(alias),
                        (None, Expr::Column(column)) => column.name.value.clone(),
                        (None, other) => other.to_string(),
                    };
                    let binding = match &bound {
                        Expr::Column(ColumnRef {
                            bound: Some(binding),
                            ..
                        }) => binding.clone(),
                        _ => ColumnBinding::unowned(name.clone(), ColumnBindingKind::Computed),
                    };
                    outputs.push(ScopeColumn::new(name, binding));
                    projections.push(Projection::Expr {
                        expr: bound,
                        alias: alias.clone(),
                    });
                }
            }
        }

        let where_expr = match &select.where_expr {
            Some(expr) => Some(expr_binder.bind_expression(bind_context, expr, clause::WHERE)?),
            None => None,
        };

        // GROUP BY and HAVING fall back to select list aliases.
        let alias_binder = ExpressionBinder::new(self.current, self.resolve_context)
            .with_aliases(&outputs, AliasResolution::Last);
        let group_by = alias_binder.bind_expressions(bind_context, &select.group_by, clause::GROUP_BY)?;
        let having = match &select.having {
            Some(expr) => Some(alias_binder.bind_expression(bind_context, expr, clause::HAVING)?),
            None => None,
        };

        Ok((
            SelectBody {
                distinct: select.distinct,
                projections,
                from,
                where_expr,
                group_by,
                having,
            },
            outputs,
        ))
    }

    fn expand_wildcard(
        &self,
        bind_context: &BindContext,
        wildcard: &WildcardProjection,
        from_columns: Option<&[ScopeColumn]>,
    ) -> Result<Vec<ScopeColumn>> {
        match &wildcard.owner {
            None => match from_columns {
                Some(columns) => Ok(columns.iter().filter(|c| c.visible).cloned().collect()),
                None => Err(BindError::new(BindErrorKind::DialectMismatch, "No tables used")
                    .with_position(wildcard.span.start, wildcard.span.stop)),
            },
            Some(owner) => {
                let identity = self.resolve_context.canonical(owner);
                match bind_context.lookup(self.current, &identity)? {
                    Some(entry) => Ok(entry
                        .context
                        .columns
                        .iter()
                        .filter(|c| c.visible)
                        .cloned()
                        .collect()),
                    None => Err(BindError::unknown_table(owner.as_str())
                        .with_position(wildcard.span.start, wildcard.span.stop)),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{FunctionCall, StatementAttributes},
        builder::{join, qcol, table, table_as, using, SelectBuilder},
        ast::{JoinType, SetExpr},
    };

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn body(select: shardline_ast::ast::SelectStatement) -> SelectBody {
        match select.body {
            SetExpr::Select(body) => *body,
            other => panic!("unexpected body: {other:?}"),
        }
    }

    fn output_names(outputs: &[ScopeColumn]) -> Vec<String> {
        outputs.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn wildcard_skips_hidden_columns() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let select = body(SelectBuilder::new().wildcard().from(table("t_user")).build());
        let (bound, outputs) = SelectBinder::new(root, &rc).bind(&mut context, &select).unwrap();

        assert_eq!(vec!["user_id", "name"], output_names(&outputs));
        let Projection::Wildcard(wildcard) = &bound.projections[0] else {
            panic!("expected wildcard")
        };
        assert_eq!(2, wildcard.expanded.as_ref().unwrap().len());
    }

    #[test]
    fn qualified_wildcard_in_join() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let select = body(
            SelectBuilder::new()
                .qualified_wildcard("i")
                .project(Expr::Column(qcol("o", "status")))
                .from(join(
                    table_as("t_order", "o"),
                    table_as("t_order_item", "i"),
                    JoinType::Inner,
                    using(&["order_id"]),
                ))
                .build(),
        );
        let (_, outputs) = SelectBinder::new(root, &rc).bind(&mut context, &select).unwrap();
        assert_eq!(
            vec!["item_id", "order_id", "user_id", "price", "status"],
            output_names(&outputs)
        );

        let select = body(SelectBuilder::new().qualified_wildcard("x").from(table("t_order")).build());
        let mut context = BindContext::new();
        let err = SelectBinder::new(root, &rc).bind(&mut context, &select).unwrap_err();
        assert_eq!(BindErrorKind::UnknownTable, err.kind());
    }

    #[test]
    fn computed_projection_names() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let count = Expr::Function(FunctionCall {
            name: Ident::from_string("count"),
            args: Vec::new(),
            distinct: false,
            star: true,
        });
        let select = body(
            SelectBuilder::new()
                .project(count.clone())
                .project_as(count, "cnt")
                .project(Expr::column("user_id"))
                .from(table("t_order"))
                .group_by(Expr::column("user_id"))
                .having(Expr::binary(
                    Expr::column("cnt"),
                    shardline_ast::ast::BinaryOperator::Gt,
                    shardline_ast::builder::number(1),
                ))
                .build(),
        );
        let (_, outputs) = SelectBinder::new(root, &rc).bind(&mut context, &select).unwrap();
        assert_eq!(vec!["count(*)", "cnt", "user_id"], output_names(&outputs));
        assert_eq!(ColumnBindingKind::Computed, outputs[1].binding.kind);
        assert_eq!(Some("t_order".to_string()), outputs[2].binding.table);
    }

    #[test]
    fn wildcard_without_from() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let select = body(SelectBuilder::new().wildcard().build());
        let err = SelectBinder::new(root, &rc).bind(&mut context, &select).unwrap_err();
        assert_eq!(BindErrorKind::DialectMismatch, err.kind());
    }
}

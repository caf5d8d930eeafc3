use shardline_ast::ast::{
    ColumnBinding, ColumnBindingKind, Cte, SelectStatement, SetExpr, StatementAttributes,
    WithClause,
};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef, CteBinding, ScopeColumn},
    bind_select::SelectBinder,
    expr_binder::{AliasResolution, ExpressionBinder},
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
};

/// Binds full queries: WITH clauses, set operations, ORDER BY and LIMIT.
#[derive(Debug)]
pub struct QueryBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> QueryBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        QueryBinder {
            current,
            resolve_context,
        }
    }

    /// Bind a query nested inside whatever is being bound in the current
    /// scope.
    ///
    /// A correlated query gets a child of the current scope. Otherwise the
    /// query gets a sibling of the current scope, seeing the same outer
    /// scopes but none of the tables at the current level.
    pub fn bind_nested(
        &self,
        bind_context: &mut BindContext,
        query: &SelectStatement,
        correlated: bool,
    ) -> Result<(SelectStatement, Vec<ScopeColumn>)> {
        bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
        trace!(depth = bind_context.depth(), correlated, "binding nested query");

        let scope = if correlated {
            bind_context.new_child_scope(self.current)
        } else {
            sibling_scope(bind_context, self.current)?
        };
        let result = QueryBinder::new(scope, self.resolve_context).bind(bind_context, query);

        bind_context.exit_nested();
        result
    }

    /// Bind a query that can't see any other scope (CTE bodies, view
    /// definitions).
    pub fn bind_isolated(
        &self,
        bind_context: &mut BindContext,
        query: &SelectStatement,
    ) -> Result<(SelectStatement, Vec<ScopeColumn>)> {
        bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
        trace!(depth = bind_context.depth(), "binding isolated query");

        let scope = bind_context.new_orphan_scope();
        let result = QueryBinder::new(scope, self.resolve_context).bind(bind_context, query);

        bind_context.exit_nested();
        result
    }

    /// Bind the query in the current scope.
    pub fn bind(
        &self,
        bind_context: &mut BindContext,
        query: &SelectStatement,
    ) -> Result<(SelectStatement, Vec<ScopeColumn>)> {
        let with = match &query.with {
            Some(with) => {
                bind_context.push_cte_frame();
                Some(self.bind_with(bind_context, with)?)
            }
            None => None,
        };

        let (body, outputs) = self.bind_set_expr(bind_context, &query.body, self.current)?;

        let order_by = match &query.body {
            SetExpr::Select(_) => ExpressionBinder::new(self.current, self.resolve_context)
                .with_aliases(&outputs, AliasResolution::First)
                .bind_order_by(bind_context, &query.order_by)?,
            SetExpr::SetOperation { .. } => {
                // Only the output names of a set operation are visible.
                let scope = bind_context.new_orphan_scope();
                ExpressionBinder::new(scope, self.resolve_context)
                    .with_aliases(&outputs, AliasResolution::First)
                    .bind_order_by(bind_context, &query.order_by)?
            }
        };

        let limit = match &query.limit {
            Some(limit) => Some(
                ExpressionBinder::new(self.current, self.resolve_context)
                    .bind_limit(bind_context, limit)?,
            ),
            None => None,
        };

        if with.is_some() {
            bind_context.pop_cte_frame()?;
        }

        let mut bound = SelectStatement {
            attributes: StatementAttributes::default(),
            with,
            body,
            order_by,
            limit,
            output_columns: Some(outputs.iter().map(|c| c.to_output()).collect()),
        };
        copy_attributes(query, &mut bound);

        Ok((bound, outputs))
    }

    fn bind_set_expr(
        &self,
        bind_context: &mut BindContext,
        expr: &SetExpr,
        scope: BindScopeRef,
    ) -> Result<(SetExpr, Vec<ScopeColumn>)> {
        match expr {
            SetExpr::Select(select) => {
                let (bound, outputs) =
                    SelectBinder::new(scope, self.resolve_context).bind(bind_context, select)?;
                Ok((SetExpr::Select(Box::new(bound)), outputs))
            }
            SetExpr::SetOperation { .. } => {
                // Walk the left spine so long `UNION` chains don't recurse.
                let mut spine = Vec::new();
                let mut leftmost = expr;
                while let SetExpr::SetOperation {
                    op,
                    all,
                    left,
                    right,
                } = leftmost
                {
                    spine.push((*op, *all, right.as_ref()));
                    leftmost = left.as_ref();
                }

                // Every arm gets its own scope.
                let left_scope = sibling_scope(bind_context, self.current)?;
                let (mut bound, outputs) = self.bind_set_arm(bind_context, leftmost, left_scope)?;

                for (op, all, right) in spine.into_iter().rev() {
                    let right_scope = sibling_scope(bind_context, self.current)?;
                    let (right, right_outputs) =
                        self.bind_set_arm(bind_context, right, right_scope)?;

                    if outputs.len() != right_outputs.len() {
                        return Err(BindError::new(
                            BindErrorKind::DialectMismatch,
                            format!(
                                "The used SELECT statements have a different number of columns ({} vs {})",
                                outputs.len(),
                                right_outputs.len()
                            ),
                        ));
                    }

                    bound = SetExpr::SetOperation {
                        op,
                        all,
                        left: Box::new(bound),
                        right: Box::new(right),
                    };
                }

                Ok((bound, outputs))
            }
        }
    }

    /// Bind one arm of a set operation. A parenthesized set operation as an
    /// arm counts as a nesting level.
    fn bind_set_arm(
        &self,
        bind_context: &mut BindContext,
        arm: &SetExpr,
        scope: BindScopeRef,
    ) -> Result<(SetExpr, Vec<ScopeColumn>)> {
        if matches!(arm, SetExpr::Select(_)) {
            return self.bind_set_expr(bind_context, arm, scope);
        }

        bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
        let result = self.bind_set_expr(bind_context, arm, scope);
        bind_context.exit_nested();
        result
    }

    fn bind_with(&self, bind_context: &mut BindContext, with: &WithClause) -> Result<WithClause> {
        let mut ctes = Vec::with_capacity(with.ctes.len());
        for cte in &with.ctes {
            ctes.push(self.bind_cte(bind_context, cte, with.recursive)?);
        }
        Ok(WithClause {
            recursive: with.recursive,
            ctes,
        })
    }

    fn bind_cte(&self, bind_context: &mut BindContext, cte: &Cte, recursive: bool) -> Result<Cte> {
        let name = self.resolve_context.canonical(&cte.alias);
        let with_position = |err: BindError| err.with_position(cte.span.start, cte.span.stop);

        // A recursive CTE needs its columns before its body can be bound.
        let preregistered = recursive && matches!(cte.query.body, SetExpr::SetOperation { .. });
        if preregistered {
            let columns = if cte.column_aliases.is_empty() {
                let anchor = SelectStatement {
                    attributes: cte.query.attributes.clone(),
                    with: None,
                    body: SetExpr::Select(Box::new(cte.query.body.leftmost_select().clone())),
                    order_by: Vec::new(),
                    limit: None,
                    output_columns: None,
                };
                let (_, columns) = self
                    .bind_isolated(bind_context, &anchor)
                    .map_err(with_position)?;
                columns
            } else {
                cte.column_aliases
                    .iter()
                    .map(|alias| {
                        let name = self.resolve_context.canonical(alias);
                        ScopeColumn::new(
                            name.clone(),
                            ColumnBinding::unowned(name, ColumnBindingKind::Computed),
                        )
                    })
                    .collect()
            };
            bind_context
                .register_cte(CteBinding {
                    name: name.clone(),
                    columns,
                })
                .map_err(with_position)?;
        }

        let (query, mut columns) = self
            .bind_isolated(bind_context, &cte.query)
            .map_err(with_position)?;

        if cte.column_aliases.len() > columns.len() {
            return Err(with_position(BindError::new(
                BindErrorKind::DialectMismatch,
                format!(
                    "CTE '{name}' specifies {} column aliases when only {} columns exist",
                    cte.column_aliases.len(),
                    columns.len()
                ),
            )));
        }
        for (column, alias) in columns.iter_mut().zip(&cte.column_aliases) {
            column.name = self.resolve_context.canonical(alias);
        }

        let binding = CteBinding {
            name: name.clone(),
            columns,
        };
        if preregistered {
            bind_context.replace_cte(binding)?;
        } else {
            bind_context.register_cte(binding).map_err(with_position)?;
        }

        trace!(%name, recursive = preregistered, "bound cte");

        Ok(Cte {
            alias: cte.alias.clone(),
            column_aliases: cte.column_aliases.clone(),
            query: Box::new(query),
            span: cte.span,
        })
    }
}

/// New scope sharing the parent of `scope`, or an orphan if `scope` has no
/// parent.
fn sibling_scope(bind_context: &mut BindContext, scope: BindScopeRef) -> Result<BindScopeRef> {
    Ok(match bind_context.get_parent_ref(scope)? {
        Some(parent) => bind_context.new_child_scope(parent),
        None => bind_context.new_orphan_scope(),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{BinaryOperator, Expr, OrderByExpr, SetOperator, StatementAttributes},
        builder::{number, param, qcol, set_operation, table, table_as, SelectBuilder},
    };

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn names(columns: &[ScopeColumn]) -> Vec<String> {
        columns.iter().map(|c| c.name.clone()).collect()
    }

    fn bind_top(
        query: &SelectStatement,
        config: &BinderConfig,
    ) -> Result<(SelectStatement, Vec<ScopeColumn>)> {
        let catalog = testutil::mysql_catalog();
        let rc = ResolveContext::new(&catalog, config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        QueryBinder::new(root, &rc).bind(&mut context, query)
    }

    fn select_column(column: &str, from: &str) -> SelectStatement {
        SelectBuilder::new()
            .project(Expr::column(column))
            .from(table(from))
            .build()
    }

    #[test]
    fn union_takes_left_names() {
        let mut query = set_operation(
            select_column("order_id", "t_order"),
            SetOperator::Union,
            true,
            select_column("item_id", "t_order_item"),
        );
        query.order_by.push(OrderByExpr {
            expr: Expr::column("order_id"),
            desc: true,
            nulls_first: None,
        });

        let (bound, outputs) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert_eq!(vec!["order_id"], names(&outputs));
        assert_eq!(1, bound.output_columns.unwrap().len());
    }

    #[test]
    fn union_order_by_sees_only_output_names() {
        let mut query = set_operation(
            select_column("order_id", "t_order"),
            SetOperator::Union,
            false,
            select_column("item_id", "t_order_item"),
        );
        query.order_by.push(OrderByExpr {
            expr: Expr::column("status"),
            desc: false,
            nulls_first: None,
        });

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::UnknownColumn, err.kind());
        assert_eq!("Unknown column 'status' in 'order clause'", err.get_msg());
    }

    #[test]
    fn union_arity_mismatch() {
        let left = SelectBuilder::new()
            .project(Expr::column("order_id"))
            .project(Expr::column("user_id"))
            .from(table("t_order"))
            .build();
        let query = set_operation(
            left,
            SetOperator::Union,
            false,
            select_column("item_id", "t_order_item"),
        );

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::DialectMismatch, err.kind());
    }

    #[test]
    fn union_arms_do_not_share_tables() {
        let left = SelectBuilder::new()
            .project(Expr::column("order_id"))
            .from(table_as("t_order", "o"))
            .build();
        let right = SelectBuilder::new()
            .project(Expr::Column(qcol("o", "order_id")))
            .from(table("t_order_item"))
            .build();
        let query = set_operation(left, SetOperator::Union, false, right);

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::UnknownColumn, err.kind());
    }

    #[test]
    fn order_by_alias_and_limit_parameters() {
        let query = SelectBuilder::new()
            .project_as(Expr::column("user_id"), "uid")
            .from(table("t_order"))
            .order_by(Expr::column("uid"), false)
            .limit(param(0), Some(param(1)))
            .build();

        let (bound, _) = bind_top(&query, &BinderConfig::default()).unwrap();
        let Expr::Column(column) = &bound.order_by[0].expr else {
            panic!("expected column")
        };
        assert_eq!(
            ColumnBindingKind::ProjectionAlias,
            column.bound.as_ref().unwrap().kind
        );
        assert_eq!(Some(param(0)), bound.limit.unwrap().limit);
    }

    #[test]
    fn cte_visible_to_body_and_later_ctes() {
        let first = SelectBuilder::new()
            .project(Expr::column("order_id"))
            .project(Expr::column("user_id"))
            .from(table("t_order"))
            .build();
        let second = select_column("oid", "a");
        let query = SelectBuilder::new()
            .cte("a", &["oid", "uid"], first)
            .cte("b", &[], second)
            .wildcard()
            .from(table("b"))
            .build();

        let (bound, outputs) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert_eq!(vec!["oid"], names(&outputs));
        assert_eq!(Some("t_order".to_string()), outputs[0].binding.table);
        assert_eq!(2, bound.with.unwrap().ctes.len());
    }

    #[test]
    fn cte_too_many_aliases() {
        let query = SelectBuilder::new()
            .cte("a", &["x", "y"], select_column("order_id", "t_order"))
            .wildcard()
            .from(table("a"))
            .build();

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::DialectMismatch, err.kind());
    }

    #[test]
    fn duplicate_cte_name() {
        let inner = || SelectBuilder::new().project(number(1)).build();
        let query = SelectBuilder::new()
            .cte("a", &[], inner())
            .cte("A", &[], inner())
            .project(number(1))
            .build();

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::DuplicateIdentity, err.kind());
    }

    #[test]
    fn cte_not_visible_after_query() {
        // The CTE of the derived table doesn't leak into the outer FROM.
        let inner = SelectBuilder::new()
            .cte("a", &[], select_column("order_id", "t_order"))
            .wildcard()
            .from(table("a"))
            .build();
        let query = SelectBuilder::new()
            .wildcard()
            .from(shardline_ast::builder::join(
                shardline_ast::builder::derived(inner, "d"),
                table("a"),
                shardline_ast::ast::JoinType::Cross,
                shardline_ast::ast::JoinCondition::None,
            ))
            .build();

        let err = bind_top(&query, &BinderConfig::default()).unwrap_err();
        assert_eq!(BindErrorKind::UnknownTable, err.kind());
    }

    #[test]
    fn recursive_cte_uses_anchor_columns() {
        let anchor = SelectBuilder::new().project_as(number(1), "n").build();
        let step = SelectBuilder::new()
            .project(Expr::binary(Expr::column("n"), BinaryOperator::Plus, number(1)))
            .from(table("r"))
            .filter(Expr::binary(Expr::column("n"), BinaryOperator::Lt, number(10)))
            .build();
        let body = set_operation(anchor, SetOperator::Union, true, step);
        let query = SelectBuilder::new()
            .cte("r", &[], body)
            .recursive()
            .wildcard()
            .from(table("r"))
            .build();

        let (_, outputs) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert_eq!(vec!["n"], names(&outputs));
    }

    #[test]
    fn recursive_cte_with_column_list() {
        let anchor = select_column("order_id", "t_order");
        let step = select_column("n", "r");
        let body = set_operation(anchor, SetOperator::Union, false, step);
        let query = SelectBuilder::new()
            .cte("r", &["n"], body)
            .recursive()
            .wildcard()
            .from(table("r"))
            .build();

        let (_, outputs) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert_eq!(vec!["n"], names(&outputs));
        assert_eq!(Some("t_order".to_string()), outputs[0].binding.table);
    }

    #[test]
    fn nesting_limit() {
        let mut query = SelectBuilder::new().project(number(1)).build();
        for _ in 0..4 {
            query = SelectBuilder::new()
                .project(Expr::Subquery(Box::new(query)))
                .build();
        }

        let config = BinderConfig {
            max_nesting_depth: 3,
            ..Default::default()
        };
        let err = bind_top(&query, &config).unwrap_err();
        assert_eq!(BindErrorKind::NestingTooDeep, err.kind());

        let config = BinderConfig {
            max_nesting_depth: 4,
            ..Default::default()
        };
        bind_top(&query, &config).unwrap();
    }

    #[test]
    fn long_union_chain_binds() {
        let mut query = select_column("order_id", "t_order");
        for _ in 0..1000 {
            query = set_operation(
                query,
                SetOperator::Union,
                true,
                select_column("order_id", "t_order"),
            );
        }

        let (_, outputs) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert_eq!(vec!["order_id"], names(&outputs));
    }

    #[test]
    fn parenthesized_set_operations_count_as_nesting() {
        let mut query = select_column("order_id", "t_order");
        for _ in 0..5 {
            query = set_operation(
                select_column("order_id", "t_order"),
                SetOperator::Union,
                false,
                query,
            );
        }

        let config = BinderConfig {
            max_nesting_depth: 3,
            ..Default::default()
        };
        let err = bind_top(&query, &config).unwrap_err();
        assert_eq!(BindErrorKind::NestingTooDeep, err.kind());

        let config = BinderConfig {
            max_nesting_depth: 4,
            ..Default::default()
        };
        bind_top(&query, &config).unwrap();
    }

    #[test]
    fn query_attributes_are_shared() {
        let mut query = select_column("order_id", "t_order");
        query.attributes = shardline_ast::builder::with_parameters(2);

        let (bound, _) = bind_top(&query, &BinderConfig::default()).unwrap();
        assert!(query.attributes.shares_with(&bound.attributes));
        assert_eq!(2, bound.attributes.parameter_count());
    }
}

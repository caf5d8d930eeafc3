use hashbrown::HashSet;
use once_cell::sync::Lazy;
use shardline_ast::ast::{
    ColumnBinding, ColumnBindingKind, ColumnRef, Expr, FunctionCall, LimitClause, OrderByExpr,
    WhenClause,
};
use shardline_error::{BindError, Result};
use unicase::UniCase;

use super::{
    bind_context::{
        correlated, BindContext, BindScopeRef, ScopeColumn, TableBindingContext, TableSource,
    },
    nested::QueryBinder,
    resolve_context::ResolveContext,
};

/// Dialect pseudo columns. Resolved only when nothing in scope provides a
/// column with the same name.
static PSEUDO_COLUMNS: Lazy<HashSet<UniCase<String>>> = Lazy::new(|| {
    [
        "ROWNUM",
        "ROW_NUMBER",
        "ROWNUM_",
        "ROWID",
        "SYSDATE",
        "SYSTIMESTAMP",
        "CURRENT_TIMESTAMP",
        "LOCALTIMESTAMP",
        "UID",
        "USER",
        "NEXTVAL",
        "LEVEL",
        "DAY",
    ]
    .into_iter()
    .map(|name| UniCase::new(name.to_string()))
    .collect()
});

pub fn is_pseudo_column(name: &str) -> bool {
    PSEUDO_COLUMNS.contains(&UniCase::new(name.to_string()))
}

/// Clause names used in unknown/ambiguous column messages.
pub mod clause {
    pub const FIELD_LIST: &str = "field list";
    pub const ON: &str = "on clause";
    pub const FROM: &str = "from clause";
    pub const WHERE: &str = "where clause";
    pub const GROUP_BY: &str = "group statement";
    pub const HAVING: &str = "having clause";
    pub const ORDER_BY: &str = "order clause";
    pub const LIMIT: &str = "limit clause";
    pub const SET: &str = "set clause";
    pub const TABLE_DEFINITION: &str = "table definition";
    pub const INDEX_DEFINITION: &str = "index definition";
    pub const COMMENT: &str = "comment";
}

/// When select list aliases are considered for unqualified names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasResolution {
    /// Aliases are checked before columns in scope (ORDER BY).
    First,
    /// Aliases are checked after columns in scope (GROUP BY, HAVING).
    Last,
}

#[derive(Debug)]
pub struct ExpressionBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
    aliases: Option<(&'a [ScopeColumn], AliasResolution)>,
}

impl<'a> ExpressionBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        ExpressionBinder {
            current,
            resolve_context,
            aliases: None,
        }
    }

    /// Allow unqualified names to resolve to select list outputs.
    pub fn with_aliases(
        mut self,
        aliases: &'a [ScopeColumn],
        resolution: AliasResolution,
    ) -> Self {
        self.aliases = Some((aliases, resolution));
        self
    }

    pub fn bind_expression(
        &self,
        bind_context: &mut BindContext,
        expr: &Expr,
        clause: &str,
    ) -> Result<Expr> {
        let bound = match expr {
            Expr::Column(column) => Expr::Column(self.bind_column(bind_context, column, clause)?),
            Expr::Literal(_) | Expr::Parameter(_) => expr.clone(),
            Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
                left: Box::new(self.bind_expression(bind_context, left, clause)?),
                op: *op,
                right: Box::new(self.bind_expression(bind_context, right, clause)?),
            },
            Expr::UnaryOp { op, expr } => Expr::UnaryOp {
                op: *op,
                expr: Box::new(self.bind_expression(bind_context, expr, clause)?),
            },
            Expr::Function(func) => Expr::Function(FunctionCall {
                name: func.name.clone(),
                args: self.bind_expressions(bind_context, &func.args, clause)?,
                distinct: func.distinct,
                star: func.star,
            }),
            Expr::IsNull { expr, negated } => Expr::IsNull {
                expr: Box::new(self.bind_expression(bind_context, expr, clause)?),
                negated: *negated,
            },
            Expr::InList {
                expr,
                list,
                negated,
            } => Expr::InList {
                expr: Box::new(self.bind_expression(bind_context, expr, clause)?),
                list: self.bind_expressions(bind_context, list, clause)?,
                negated: *negated,
            },
            Expr::Between {
                expr,
                negated,
                low,
                high,
            } => Expr::Between {
                expr: Box::new(self.bind_expression(bind_context, expr, clause)?),
                negated: *negated,
                low: Box::new(self.bind_expression(bind_context, low, clause)?),
                high: Box::new(self.bind_expression(bind_context, high, clause)?),
            },
            Expr::Case {
                operand,
                conditions,
                else_result,
            } => {
                let operand = match operand {
                    Some(operand) => {
                        Some(Box::new(self.bind_expression(bind_context, operand, clause)?))
                    }
                    None => None,
                };
                let conditions = conditions
                    .iter()
                    .map(|when| {
                        Ok(WhenClause {
                            condition: self.bind_expression(bind_context, &when.condition, clause)?,
                            result: self.bind_expression(bind_context, &when.result, clause)?,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                let else_result = match else_result {
                    Some(expr) => Some(Box::new(self.bind_expression(bind_context, expr, clause)?)),
                    None => None,
                };
                Expr::Case {
                    operand,
                    conditions,
                    else_result,
                }
            }
            Expr::Subquery(query) => {
                let (bound, _) = self.query_binder().bind_nested(bind_context, query, true)?;
                Expr::Subquery(Box::new(bound))
            }
            Expr::Exists { subquery, negated } => {
                let (bound, _) = self
                    .query_binder()
                    .bind_nested(bind_context, subquery, true)?;
                Expr::Exists {
                    subquery: Box::new(bound),
                    negated: *negated,
                }
            }
            Expr::InSubquery {
                expr,
                subquery,
                negated,
            } => {
                let expr = self.bind_expression(bind_context, expr, clause)?;
                let (bound, _) = self
                    .query_binder()
                    .bind_nested(bind_context, subquery, true)?;
                Expr::InSubquery {
                    expr: Box::new(expr),
                    subquery: Box::new(bound),
                    negated: *negated,
                }
            }
            Expr::Nested(expr) => {
                bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
                let result = self.bind_expression(bind_context, expr, clause);
                bind_context.exit_nested();
                Expr::Nested(Box::new(result?))
            }
        };

        Ok(bound)
    }

    pub fn bind_expressions(
        &self,
        bind_context: &mut BindContext,
        exprs: &[Expr],
        clause: &str,
    ) -> Result<Vec<Expr>> {
        exprs
            .iter()
            .map(|expr| self.bind_expression(bind_context, expr, clause))
            .collect()
    }

    pub fn bind_order_by(
        &self,
        bind_context: &mut BindContext,
        order_by: &[OrderByExpr],
    ) -> Result<Vec<OrderByExpr>> {
        order_by
            .iter()
            .map(|order| {
                Ok(OrderByExpr {
                    expr: self.bind_expression(bind_context, &order.expr, clause::ORDER_BY)?,
                    desc: order.desc,
                    nulls_first: order.nulls_first,
                })
            })
            .collect()
    }

    pub fn bind_limit(
        &self,
        bind_context: &mut BindContext,
        limit: &LimitClause,
    ) -> Result<LimitClause> {
        let mut bind = |expr: &Option<Expr>| match expr {
            Some(expr) => self
                .bind_expression(bind_context, expr, clause::LIMIT)
                .map(Some),
            None => Ok(None),
        };
        Ok(LimitClause {
            limit: bind(&limit.limit)?,
            offset: bind(&limit.offset)?,
        })
    }

    /// Resolve a single column reference.
    ///
    /// Qualified references look for the owner in the current scope, then in
    /// outer scopes. Unqualified references search the current scope, then
    /// outer scopes nearest first, then declared variables, then a system
    /// table without metadata, then pseudo columns.
    pub fn bind_column(
        &self,
        bind_context: &BindContext,
        column: &ColumnRef,
        clause: &str,
    ) -> Result<ColumnRef> {
        let name = column.name.as_str();
        let with_position = |err: BindError| err.with_position(column.span.start, column.span.stop);

        if let Some(owner) = &column.owner {
            let owner_name = self.resolve_context.canonical(owner);
            let found = bind_context
                .lookup_visible(self.current, &owner_name)?
                .and_then(|(scope, entry)| {
                    let binding = match entry.context.find_column(name) {
                        Some(c) => c.binding.clone(),
                        None => system_column(&entry.context, name)?,
                    };
                    Some(if scope == self.current {
                        binding
                    } else {
                        correlated(&binding)
                    })
                });

            return match found {
                Some(binding) => Ok(column.with_binding(binding)),
                None => Err(with_position(BindError::unknown_column(
                    format!("{}.{}", owner.as_str(), name),
                    clause,
                ))),
            };
        }

        if let Some(binding) = self.find_alias(name, AliasResolution::First) {
            return Ok(column.with_binding(binding));
        }

        let mut current = self.current;
        loop {
            let found = bind_context
                .find_column(current, name, clause)
                .map_err(with_position)?;
            if let Some(found) = found {
                let binding = if current == self.current {
                    found.binding
                } else {
                    correlated(&found.binding)
                };
                return Ok(column.with_binding(binding));
            }

            match bind_context.get_parent_ref(current)? {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if let Some(binding) = self.find_alias(name, AliasResolution::Last) {
            return Ok(column.with_binding(binding));
        }

        if self.resolve_context.is_variable(name) {
            return Ok(column.with_binding(ColumnBinding::unowned(
                name,
                ColumnBindingKind::Variable,
            )));
        }

        // A lone system table without metadata takes any remaining name.
        let mut system_tables = bind_context
            .iter_entries(self.current)?
            .filter(|entry| entry.context.source == TableSource::System);
        if let (Some(entry), None) = (system_tables.next(), system_tables.next()) {
            if let Some(binding) = system_column(&entry.context, name) {
                return Ok(column.with_binding(binding));
            }
        }

        if is_pseudo_column(name) {
            return Ok(column.with_binding(ColumnBinding::unowned(
                name,
                ColumnBindingKind::Pseudo,
            )));
        }

        Err(with_position(BindError::unknown_column(name, clause)))
    }

    fn find_alias(&self, name: &str, resolution: AliasResolution) -> Option<ColumnBinding> {
        let (aliases, configured) = self.aliases?;
        if configured != resolution {
            return None;
        }
        aliases
            .iter()
            .find(|a| UniCase::new(a.name.as_str()) == UniCase::new(name))
            .map(|a| a.binding.with_kind(ColumnBindingKind::ProjectionAlias))
    }

    fn query_binder(&self) -> QueryBinder<'a> {
        QueryBinder::new(self.current, self.resolve_context)
    }
}

/// Column of a system table missing from the catalog. Any name is accepted.
fn system_column(context: &TableBindingContext, name: &str) -> Option<ColumnBinding> {
    if context.source != TableSource::System {
        return None;
    }
    let table = context.table.as_ref()?;
    Some(ColumnBinding {
        database: Some(table.database.clone()),
        schema: Some(table.schema.clone()),
        table: Some(table.table.clone()),
        column: name.to_string(),
        source: table.source,
        kind: ColumnBindingKind::Column,
    })
}

/// Checks if an expression references anything that needs binding.
pub fn has_references(expr: &Expr) -> bool {
    match expr {
        Expr::Column(_) | Expr::Subquery(_) | Expr::Exists { .. } | Expr::InSubquery { .. } => {
            true
        }
        Expr::Literal(_) | Expr::Parameter(_) => false,
        Expr::BinaryOp { left, right, .. } => has_references(left) || has_references(right),
        Expr::UnaryOp { expr, .. } | Expr::IsNull { expr, .. } | Expr::Nested(expr) => {
            has_references(expr)
        }
        Expr::Function(func) => func.args.iter().any(has_references),
        Expr::InList { expr, list, .. } => has_references(expr) || list.iter().any(has_references),
        Expr::Between {
            expr, low, high, ..
        } => has_references(expr) || has_references(low) || has_references(high),
        Expr::Case {
            operand,
            conditions,
            else_result,
        } => {
            operand.as_deref().is_some_and(has_references)
                || conditions
                    .iter()
                    .any(|w| has_references(&w.condition) || has_references(&w.result))
                || else_result.as_deref().is_some_and(has_references)
        }
    }
}

use shardline_ast::ast::{
    ColumnBindingKind, JoinCondition, JoinTable, JoinType, OutputColumn,
    SimpleTable, SubqueryTable, TableBinding, TableReference, TableSourceType,
};
use shardline_error::{not_implemented, BindError, BindErrorKind, Result};
use unicase::UniCase;

use super::{
    bind_context::{
        BindContext, BindScopeRef, ScopeColumn, TableBindingContext, TableRef, TableSource,
        UsingColumn,
    },
    expr_binder::{clause, ExpressionBinder},
    nested::QueryBinder,
    resolve_context::ResolveContext,
    table_resolver::TableResolver,
};

/// A bound table reference along with what it contributes to the scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFrom {
    pub table: TableReference,
    /// Columns an unqualified `*` over this reference expands to.
    pub columns: Vec<ScopeColumn>,
    /// Every table registered while binding this reference.
    pub tables: Vec<TableRef>,
}

#[derive(Debug)]
pub struct FromBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> FromBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        FromBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind(&self, bind_context: &mut BindContext, from: &TableReference) -> Result<BoundFrom> {
        match from {
            TableReference::Simple(table) => self.bind_table(bind_context, table),
            TableReference::Subquery(subquery) => self.bind_subquery(bind_context, subquery),
            TableReference::Join(join) => self.bind_join_chain(bind_context, join),
        }
    }

    /// Bind a join and the joins on its left side.
    ///
    /// The left spine is walked without recursing. A join on the right side
    /// (`a JOIN (b JOIN c)`) counts as a nesting level.
    fn bind_join_chain(
        &self,
        bind_context: &mut BindContext,
        join: &JoinTable,
    ) -> Result<BoundFrom> {
        let mut spine = vec![join];
        let mut leftmost = &join.left;
        while let TableReference::Join(inner) = leftmost {
            spine.push(inner.as_ref());
            leftmost = &inner.left;
        }

        // Left is registered before right is bound so a lateral right side
        // can reference it.
        let mut left = self.bind(bind_context, leftmost)?;
        for join in spine.into_iter().rev() {
            let right = match &join.right {
                TableReference::Join(right) => {
                    bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
                    let result = self.bind_join_chain(bind_context, right);
                    bind_context.exit_nested();
                    result?
                }
                right => self.bind(bind_context, right)?,
            };
            left = self.bind_join(bind_context, join, left, right)?;
        }

        Ok(left)
    }

    /// Identity a simple table registers under.
    fn identity(&self, table: &SimpleTable) -> Result<String> {
        match &table.alias {
            Some(alias) => Ok(self.resolve_context.canonical(alias)),
            None => Ok(self.resolve_context.canonical(table.reference.base()?)),
        }
    }

    fn bind_table(&self, bind_context: &mut BindContext, table: &SimpleTable) -> Result<BoundFrom> {
        let identity = self.identity(table)?;
        let base = table.reference.base()?;
        let unqualified = table.reference.0.len() == 1;

        // CTEs shadow catalog tables.
        if unqualified {
            if let Some(cte) = bind_context.find_cte(&self.resolve_context.canonical(base)) {
                let cte_name = cte.name.clone();
                let columns = cte.columns.clone();
                let reference = bind_context
                    .register(
                        self.current,
                        identity,
                        TableBindingContext {
                            source: TableSource::Cte,
                            table: None,
                            columns: columns.clone(),
                        },
                    )
                    .map_err(|e| e.with_position(table.span.start, table.span.stop))?;

                let binding = TableBinding {
                    database: String::new(),
                    schema: String::new(),
                    table: cte_name,
                    source: TableSourceType::TemporaryTable,
                };
                return Ok(BoundFrom {
                    table: TableReference::Simple(table.with_binding(binding)),
                    columns,
                    tables: vec![reference],
                });
            }

            if self.resolve_context.dialect().supports_dual() && base.matches("dual") {
                let binding = TableBinding {
                    database: String::new(),
                    schema: String::new(),
                    table: "DUAL".to_string(),
                    source: TableSourceType::Dual,
                };
                let reference = bind_context.register(
                    self.current,
                    identity,
                    TableBindingContext {
                        source: TableSource::Dual,
                        table: Some(binding.clone()),
                        columns: Vec::new(),
                    },
                )?;
                return Ok(BoundFrom {
                    table: TableReference::Simple(table.with_binding(binding)),
                    columns: Vec::new(),
                    tables: vec![reference],
                });
            }
        }

        let (bound, context) = TableResolver::new(self.resolve_context).resolve_existing(table)?;
        let columns = context.columns.clone();
        let reference = bind_context
            .register(self.current, identity, context)
            .map_err(|e| e.with_position(table.span.start, table.span.stop))?;

        Ok(BoundFrom {
            table: TableReference::Simple(bound),
            columns,
            tables: vec![reference],
        })
    }

    fn bind_subquery(
        &self,
        bind_context: &mut BindContext,
        subquery: &SubqueryTable,
    ) -> Result<BoundFrom> {
        let alias = match &subquery.alias {
            Some(alias) => self.resolve_context.canonical(alias),
            None => {
                return Err(BindError::new(
                    BindErrorKind::DialectMismatch,
                    "Every derived table must have its own alias",
                )
                .with_position(subquery.span.start, subquery.span.stop))
            }
        };

        let dialect = self.resolve_context.dialect();
        if subquery.lateral && !dialect.supports_lateral() {
            not_implemented!("LATERAL derived tables for {dialect}");
        }

        // Only lateral subqueries may see tables to their left.
        let (query, mut columns) = QueryBinder::new(self.current, self.resolve_context)
            .bind_nested(bind_context, &subquery.query, subquery.lateral)?;

        if subquery.column_aliases.len() > columns.len() {
            return Err(BindError::new(
                BindErrorKind::DialectMismatch,
                format!(
                    "Specified {} column aliases when only {} columns exist",
                    subquery.column_aliases.len(),
                    columns.len()
                ),
            )
            .with_position(subquery.span.start, subquery.span.stop));
        }
        for (column, alias) in columns.iter_mut().zip(&subquery.column_aliases) {
            column.name = self.resolve_context.canonical(alias);
        }

        let reference = bind_context
            .register(
                self.current,
                alias,
                TableBindingContext {
                    source: TableSource::Derived,
                    table: None,
                    columns: columns.clone(),
                },
            )
            .map_err(|e| e.with_position(subquery.span.start, subquery.span.stop))?;

        Ok(BoundFrom {
            table: TableReference::Subquery(SubqueryTable {
                query: Box::new(query),
                alias: subquery.alias.clone(),
                column_aliases: subquery.column_aliases.clone(),
                lateral: subquery.lateral,
                span: subquery.span,
                columns: Some(columns.iter().map(|c| c.to_output()).collect()),
            }),
            columns,
            tables: vec![reference],
        })
    }

    /// Combine both bound sides of a join.
    fn bind_join(
        &self,
        bind_context: &mut BindContext,
        join: &JoinTable,
        left: BoundFrom,
        right: BoundFrom,
    ) -> Result<BoundFrom> {
        let mut tables = left.tables.clone();
        tables.extend_from_slice(&right.tables);

        let (condition, using_names) = match &join.condition {
            JoinCondition::On(expr) => {
                let expr = ExpressionBinder::new(self.current, self.resolve_context)
                    .bind_expression(bind_context, expr, clause::ON)?;
                (JoinCondition::On(expr), Vec::new())
            }
            JoinCondition::Using(columns) => {
                let names = columns
                    .iter()
                    .map(|c| self.resolve_context.canonical(&c.name))
                    .collect::<Vec<_>>();
                (JoinCondition::Using(columns.clone()), names)
            }
            JoinCondition::None if join.natural => {
                let names = left
                    .columns
                    .iter()
                    .filter(|l| l.visible && find_named(&right.columns, &l.name).is_some())
                    .map(|l| l.name.clone())
                    .collect();
                (JoinCondition::None, names)
            }
            JoinCondition::None => (JoinCondition::None, Vec::new()),
        };

        let mut merged = Vec::with_capacity(using_names.len());
        let mut bound_using = Vec::new();
        for (idx, name) in using_names.iter().enumerate() {
            let left_col = find_named(&left.columns, name)
                .ok_or_else(|| BindError::unknown_column(name.clone(), clause::FROM))?;
            let right_col = find_named(&right.columns, name)
                .ok_or_else(|| BindError::unknown_column(name.clone(), clause::FROM))?;

            let (preferred, other) = match join.join_type {
                JoinType::Right => (right_col, left_col),
                _ => (left_col, right_col),
            };
            let binding = preferred.binding.with_kind(ColumnBindingKind::Using {
                other: Box::new(other.binding.clone()),
            });

            if let JoinCondition::Using(columns) = &join.condition {
                bound_using.push(columns[idx].with_binding(binding.clone()));
            }

            bind_context.add_using_column(
                self.current,
                UsingColumn {
                    name: preferred.name.clone(),
                    binding: binding.clone(),
                    tables: tables.clone(),
                },
            )?;
            merged.push(ScopeColumn::new(preferred.name.clone(), binding));
        }

        let condition = match condition {
            JoinCondition::Using(_) => JoinCondition::Using(bound_using),
            other => other,
        };

        // Merged columns first, then what's left of each side.
        let is_merged = |c: &ScopeColumn| {
            using_names
                .iter()
                .any(|n| UniCase::new(n.as_str()) == UniCase::new(c.name.as_str()))
        };
        let mut columns = merged;
        columns.extend(left.columns.iter().filter(|c| !is_merged(c)).cloned());
        columns.extend(right.columns.iter().filter(|c| !is_merged(c)).cloned());

        let derived_columns: Vec<OutputColumn> = columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.to_output())
            .collect();

        Ok(BoundFrom {
            table: TableReference::from(JoinTable {
                left: left.table,
                right: right.table,
                join_type: join.join_type,
                natural: join.natural,
                condition,
                derived_columns: Some(derived_columns),
            }),
            columns,
            tables,
        })
    }
}

fn find_named<'b>(columns: &'b [ScopeColumn], name: &str) -> Option<&'b ScopeColumn> {
    columns
        .iter()
        .find(|c| UniCase::new(c.name.as_str()) == UniCase::new(name))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{BinaryOperator, Expr, StatementAttributes},
        builder::{derived, join, natural_join, qcol, table, table_as, using, SelectBuilder},
    };

    use super::*;
    use crate::{config::BinderConfig, database::CatalogSnapshot, testutil};

    fn names(columns: &[OutputColumn]) -> Vec<String> {
        columns
            .iter()
            .map(|c| format!("{}.{}", c.binding.table.clone().unwrap_or_default(), c.name))
            .collect()
    }

    fn derived_columns(bound: &BoundFrom) -> Vec<OutputColumn> {
        match &bound.table {
            TableReference::Join(join) => join.derived_columns.clone().unwrap(),
            other => panic!("not a join: {other:?}"),
        }
    }

    #[test]
    fn join_on_registers_both_sides() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let from = join(
            table_as("t_order", "o"),
            table_as("t_order_item", "i"),
            JoinType::Inner,
            JoinCondition::On(Expr::binary(
                Expr::Column(qcol("o", "order_id")),
                BinaryOperator::Eq,
                Expr::Column(qcol("i", "order_id")),
            )),
        );
        let bound = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();

        assert_eq!(
            vec![
                "t_order.order_id",
                "t_order.user_id",
                "t_order.status",
                "t_order_item.item_id",
                "t_order_item.order_id",
                "t_order_item.user_id",
                "t_order_item.price",
            ],
            names(&derived_columns(&bound))
        );
        let identities: Vec<_> = context
            .iter_entries(root)
            .unwrap()
            .map(|e| e.identity.clone())
            .collect();
        assert_eq!(vec!["o", "i"], identities);
    }

    #[test]
    fn right_join_using_prefers_right() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let from = join(
            table("t_order"),
            table("t_order_item"),
            JoinType::Right,
            using(&["order_id", "user_id"]),
        );
        let bound = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();

        assert_eq!(
            vec![
                "t_order_item.order_id",
                "t_order_item.user_id",
                "t_order.status",
                "t_order_item.item_id",
                "t_order_item.price",
            ],
            names(&derived_columns(&bound))
        );

        // Merged column is no longer ambiguous.
        let found = context
            .find_column(root, "order_id", clause::WHERE)
            .unwrap()
            .unwrap();
        assert_eq!(Some("t_order_item".to_string()), found.binding.table);
        assert!(matches!(found.binding.kind, ColumnBindingKind::Using { .. }));
    }

    #[test]
    fn natural_join_common_columns_once() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let from = natural_join(table("t_order"), table("t_user"), JoinType::Inner);
        let bound = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();

        // Hidden `pwd` isn't part of the derived columns.
        assert_eq!(
            vec![
                "t_order.user_id",
                "t_order.order_id",
                "t_order.status",
                "t_user.name",
            ],
            names(&derived_columns(&bound))
        );
    }

    #[test]
    fn using_column_missing_on_one_side() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let from = join(
            table("t_order"),
            table("t_user"),
            JoinType::Inner,
            using(&["status"]),
        );
        let err = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap_err();
        assert_eq!(BindErrorKind::UnknownColumn, err.kind());
        assert_eq!("Unknown column 'status' in 'from clause'", err.get_msg());
    }

    #[test]
    fn self_join_needs_distinct_aliases() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());

        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        let from = join(
            table("t_order"),
            table("T_ORDER"),
            JoinType::Cross,
            JoinCondition::None,
        );
        let err = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap_err();
        assert_eq!(BindErrorKind::DuplicateIdentity, err.kind());

        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        let from = join(
            table_as("t_order", "a"),
            table_as("t_order", "b"),
            JoinType::Cross,
            JoinCondition::None,
        );
        FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();
    }

    #[test]
    fn derived_table_column_aliases() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let inner = SelectBuilder::new()
            .project(Expr::column("order_id"))
            .project(Expr::column("status"))
            .from(table("t_order"))
            .build();
        let mut from = derived(inner, "x");
        if let TableReference::Subquery(subquery) = &mut from {
            subquery.column_aliases = vec![shardline_ast::builder::ident("oid")];
        }

        let bound = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();
        let names: Vec<_> = bound.columns.iter().map(|c| c.name.clone()).collect();
        assert_eq!(vec!["oid", "status"], names);
        // Origin is kept through the alias.
        assert_eq!("order_id", bound.columns[0].binding.column);

        let entry = context.lookup(root, "x").unwrap().unwrap();
        assert_eq!(TableSource::Derived, entry.context.source);
    }

    #[test]
    fn dual_for_mysql() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let bound = FromBinder::new(root, &rc)
            .bind(&mut context, &table("DUAL").into())
            .unwrap();
        let TableReference::Simple(table) = bound.table else {
            panic!("expected simple table")
        };
        assert_eq!(TableSourceType::Dual, table.bound.unwrap().source);
    }

    #[test]
    fn lateral_rejected_for_sqlserver() {
        let catalog = CatalogSnapshot::from_json(
            r#"{"dialect": "sqlserver", "current_database": "db", "databases": [{
                "name": "db",
                "schemas": [{"name": "dbo", "tables": [
                    {"name": "t", "columns": [{"name": "a"}]}
                ]}]
            }]}"#,
        )
        .unwrap();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let inner = SelectBuilder::new()
            .project(Expr::column("a"))
            .from(table("t"))
            .build();
        let mut from = derived(inner, "x");
        if let TableReference::Subquery(subquery) = &mut from {
            subquery.lateral = true;
        }

        let err = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap_err();
        assert_eq!(BindErrorKind::DialectMismatch, err.kind());
        assert_eq!(
            "Not yet implemented: LATERAL derived tables for SQLServer",
            err.get_msg()
        );
    }

    #[test]
    fn join_chains_and_nested_joins() {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig {
            max_nesting_depth: 2,
            ..Default::default()
        };
        let rc = ResolveContext::new(&catalog, &config, &StatementAttributes::default());

        // Left deep: t0 JOIN t1 JOIN t2 ...
        let mut from = TableReference::from(table_as("t_order", "t0"));
        for idx in 1..20 {
            from = join(
                from,
                table_as("t_order", &format!("t{idx}")),
                JoinType::Cross,
                JoinCondition::None,
            );
        }
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        let bound = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap();
        assert_eq!(20, bound.tables.len());
        assert_eq!(0, context.depth());

        // Right nested: t0 JOIN (t1 JOIN (t2 JOIN (t3 JOIN t4)))
        let mut from = TableReference::from(table_as("t_order", "t4"));
        for idx in (0..4).rev() {
            from = join(
                table_as("t_order", &format!("t{idx}")),
                from,
                JoinType::Cross,
                JoinCondition::None,
            );
        }
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        let err = FromBinder::new(root, &rc).bind(&mut context, &from).unwrap_err();
        assert_eq!(BindErrorKind::NestingTooDeep, err.kind());
    }
}

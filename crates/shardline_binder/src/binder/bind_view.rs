use shardline_ast::ast::{
    AlterViewStatement, CreateViewStatement, SelectStatement, SimpleTable, StatementAttributes,
    TableSourceType,
};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef, ScopeColumn, TableBindingContext, TableSource},
    nested::QueryBinder,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_resolver::TableResolver,
};

#[derive(Debug)]
pub struct ViewBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> ViewBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        ViewBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_create_view(
        &self,
        bind_context: &mut BindContext,
        create: &CreateViewStatement,
    ) -> Result<CreateViewStatement> {
        let view = TableResolver::new(self.resolve_context)
            .bind_new_name(&create.view, create.or_replace)?;

        let (query, mut columns) = self.bind_definition(bind_context, &create.query)?;
        if !create.column_aliases.is_empty() {
            if create.column_aliases.len() != columns.len() {
                return Err(BindError::new(
                    BindErrorKind::DialectMismatch,
                    format!(
                        "View's SELECT and view's field list have different column counts ({} vs {})",
                        columns.len(),
                        create.column_aliases.len()
                    ),
                )
                .with_position(create.view.span.start, create.view.span.stop));
            }
            for (column, alias) in columns.iter_mut().zip(&create.column_aliases) {
                column.name = self.resolve_context.canonical(alias);
            }
        }

        self.register_view(bind_context, &view, columns)?;

        let mut bound = CreateViewStatement {
            attributes: StatementAttributes::default(),
            view,
            or_replace: create.or_replace,
            column_aliases: create.column_aliases.clone(),
            query: Box::new(query),
        };
        copy_attributes(create, &mut bound);
        Ok(bound)
    }

    pub fn bind_alter_view(
        &self,
        bind_context: &mut BindContext,
        alter: &AlterViewStatement,
    ) -> Result<AlterViewStatement> {
        if alter.query.is_none() && alter.rename_to.is_none() {
            return Err(BindError::new(
                BindErrorKind::DialectMismatch,
                "ALTER VIEW requires a definition or a new name",
            ));
        }

        let resolver = TableResolver::new(self.resolve_context);
        let (view, context) = resolver.resolve_existing(&alter.view)?;
        if view.bound.as_ref().map(|b| b.source) != Some(TableSourceType::View) {
            return Err(BindError::new(
                BindErrorKind::DialectMismatch,
                format!("'{}' is not VIEW", alter.view.reference),
            )
            .with_name(alter.view.reference.to_string())
            .with_position(alter.view.span.start, alter.view.span.stop));
        }

        let rename_to = match &alter.rename_to {
            Some(rename_to) => Some(resolver.bind_new_name(rename_to, false)?),
            None => None,
        };

        let query = match &alter.query {
            Some(query) => {
                let (query, columns) = self.bind_definition(bind_context, query)?;
                let target = rename_to.as_ref().unwrap_or(&view);
                self.register_view(bind_context, target, columns)?;
                Some(Box::new(query))
            }
            None => {
                let target = rename_to.as_ref().unwrap_or(&view);
                self.register_view(bind_context, target, context.columns)?;
                None
            }
        };

        let mut bound = AlterViewStatement {
            attributes: StatementAttributes::default(),
            view,
            rename_to,
            query,
        };
        copy_attributes(alter, &mut bound);
        Ok(bound)
    }

    /// Bind a view's query. It sees nothing but the catalog.
    fn bind_definition(
        &self,
        bind_context: &mut BindContext,
        query: &SelectStatement,
    ) -> Result<(SelectStatement, Vec<ScopeColumn>)> {
        QueryBinder::new(self.current, self.resolve_context).bind_isolated(bind_context, query)
    }

    fn register_view(
        &self,
        bind_context: &mut BindContext,
        view: &SimpleTable,
        columns: Vec<ScopeColumn>,
    ) -> Result<()> {
        trace!(view = %view.reference, columns = columns.len(), "defining view");
        bind_context.register(
            self.current,
            self.resolve_context.canonical(view.reference.base()?),
            TableBindingContext {
                source: TableSource::Defined,
                table: view.bound.clone(),
                columns,
            },
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{
        ast::{ColumnBindingKind, Expr},
        builder::{derived, ident, qcol, table, table_as, SelectBuilder},
    };

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn create(name: &str, query: SelectStatement) -> CreateViewStatement {
        CreateViewStatement {
            attributes: StatementAttributes::default(),
            view: table(name),
            or_replace: false,
            column_aliases: Vec::new(),
            query: Box::new(query),
        }
    }

    fn bind_create(stmt: &CreateViewStatement) -> Result<CreateViewStatement> {
        let catalog = testutil::pg_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        ViewBinder::new(root, &rc).bind_create_view(&mut context, stmt)
    }

    fn bind_alter(stmt: &AlterViewStatement) -> Result<AlterViewStatement> {
        let catalog = testutil::pg_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        ViewBinder::new(root, &rc).bind_alter_view(&mut context, stmt)
    }

    #[test]
    fn create_view_binds_query() {
        let query = SelectBuilder::new()
            .project(Expr::Column(qcol("o", "id")))
            .from(table_as("orders", "o"))
            .build();
        let mut stmt = create("v_orders", query);
        stmt.column_aliases = vec![ident("order_id")];

        let bound = bind_create(&stmt).unwrap();
        let outputs = bound.query.output_columns.as_ref().unwrap();
        assert_eq!("id", outputs[0].name);
        assert_eq!(ColumnBindingKind::Column, outputs[0].binding.kind);
    }

    #[test]
    fn create_view_errors() {
        let query = || {
            SelectBuilder::new()
                .project(Expr::column("id"))
                .from(table("orders"))
                .build()
        };

        let err = bind_create(&create("v1", query())).unwrap_err();
        assert_eq!(BindErrorKind::TableExists, err.kind());

        let mut stmt = create("v1", query());
        stmt.or_replace = true;
        bind_create(&stmt).unwrap();

        let mut stmt = create("v2", query());
        stmt.column_aliases = vec![ident("a"), ident("b")];
        assert_eq!(BindErrorKind::DialectMismatch, bind_create(&stmt).unwrap_err().kind());
    }

    #[test]
    fn alter_view() {
        let query = SelectBuilder::new()
            .project(Expr::column("a"))
            .from(table("t1"))
            .build();
        let stmt = AlterViewStatement {
            attributes: StatementAttributes::default(),
            view: table("v1"),
            rename_to: None,
            query: Some(Box::new(query)),
        };
        let bound = bind_alter(&stmt).unwrap();
        assert_eq!(
            TableSourceType::View,
            bound.view.bound.as_ref().unwrap().source
        );

        let stmt = AlterViewStatement {
            view: table("t1"),
            ..stmt
        };
        assert_eq!(BindErrorKind::DialectMismatch, bind_alter(&stmt).unwrap_err().kind());
    }

    #[test]
    fn alter_view_rename() {
        let stmt = AlterViewStatement {
            attributes: StatementAttributes::default(),
            view: table("v1"),
            rename_to: Some(table("v9")),
            query: None,
        };
        let bound = bind_alter(&stmt).unwrap();
        assert_eq!("v9", bound.rename_to.unwrap().bound.unwrap().table);

        let stmt = AlterViewStatement {
            rename_to: None,
            ..stmt
        };
        assert_eq!(BindErrorKind::DialectMismatch, bind_alter(&stmt).unwrap_err().kind());
    }

    #[test]
    fn view_query_tables_stay_out_of_outer_scope() {
        let catalog = testutil::pg_catalog();
        let config = BinderConfig::default();
        let stmt = create(
            "v_new",
            SelectBuilder::new()
                .wildcard()
                .from(derived(
                    SelectBuilder::new().wildcard().from(table("t1")).build(),
                    "x",
                ))
                .build(),
        );
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();

        let bound = ViewBinder::new(root, &rc)
            .bind_create_view(&mut context, &stmt)
            .unwrap();
        let outputs: Vec<_> = bound
            .query
            .output_columns
            .as_ref()
            .unwrap()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(vec!["a", "b"], outputs);

        let identities: Vec<_> = context
            .iter_entries(root)
            .unwrap()
            .map(|entry| entry.identity.as_str())
            .collect();
        assert_eq!(vec!["v_new"], identities);
        assert!(context.lookup_visible(root, "x").unwrap().is_none());
        assert!(context.lookup_visible(root, "t1").unwrap().is_none());
        assert_eq!(0, context.depth());
    }
}

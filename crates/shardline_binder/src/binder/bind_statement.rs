use std::sync::Arc;

use shardline_ast::{
    ast::{Projection, SelectStatement, SetExpr, StatementAttributes},
    statement::{Statement, StatementKind},
};
use shardline_error::Result;
use tracing::{debug, trace_span};

use super::{
    bind_alter_table::AlterTableBinder,
    bind_comment::CommentBinder,
    bind_context::BindContext,
    bind_create_table::CreateTableBinder,
    bind_cursor::CursorBinder,
    bind_delete::DeleteBinder,
    bind_drop::DropBinder,
    bind_index::IndexBinder,
    bind_insert::InsertBinder,
    bind_prepare::PrepareBinder,
    bind_rename::RenameTableBinder,
    bind_update::UpdateBinder,
    bind_view::ViewBinder,
    expr_binder::has_references,
    nested::QueryBinder,
    resolve_context::ResolveContext,
};
use crate::{config::BinderConfig, database::CatalogSnapshot};

/// A statement with every table and column reference resolved.
///
/// When the raw statement had nothing to resolve, this holds the raw
/// statement itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundStatement {
    statement: Arc<Statement>,
}

impl BoundStatement {
    fn new(statement: Statement) -> Self {
        BoundStatement {
            statement: Arc::new(statement),
        }
    }

    pub fn unchanged(statement: &Arc<Statement>) -> Self {
        BoundStatement {
            statement: statement.clone(),
        }
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Checks if this is the raw statement handed back as is.
    pub fn shares_input(&self, raw: &Arc<Statement>) -> bool {
        Arc::ptr_eq(&self.statement, raw)
    }

    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    pub fn attributes(&self) -> &StatementAttributes {
        self.statement.attributes()
    }

    pub fn parameter_count(&self) -> usize {
        self.attributes().parameter_count()
    }

    pub fn into_inner(self) -> Arc<Statement> {
        self.statement
    }
}

/// Entry point for binding parsed statements against a catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StatementBinder<'a> {
    pub catalog: &'a CatalogSnapshot,
    pub config: &'a BinderConfig,
}

impl<'a> StatementBinder<'a> {
    pub const fn new(catalog: &'a CatalogSnapshot, config: &'a BinderConfig) -> Self {
        StatementBinder { catalog, config }
    }

    /// Bind a single statement.
    ///
    /// Each call gets its own scopes. On error nothing of the partially
    /// bound statement is kept.
    pub fn bind(&self, statement: &Arc<Statement>) -> Result<BoundStatement> {
        let span = trace_span!("bind_statement", kind = %statement.kind());
        let _guard = span.enter();

        if !needs_binding(statement) {
            debug!("nothing to bind");
            return Ok(BoundStatement::unchanged(statement));
        }

        let resolve_context =
            ResolveContext::new(self.catalog, self.config, statement.attributes());
        let rc = &resolve_context;
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        let ctx = &mut context;

        let bound = match statement.as_ref() {
            Statement::CreateTable(create) => Statement::CreateTable(
                CreateTableBinder::new(root, rc).bind_create_table(ctx, create)?,
            ),
            Statement::AlterTable(alter) => Statement::AlterTable(
                AlterTableBinder::new(root, rc).bind_alter_table(ctx, alter)?,
            ),
            Statement::DropTable(drop) => {
                Statement::DropTable(DropBinder::new(root, rc).bind_drop_table(ctx, drop)?)
            }
            Statement::RenameTable(rename) => Statement::RenameTable(
                RenameTableBinder::new(root, rc).bind_rename(ctx, rename)?,
            ),
            Statement::Truncate(truncate) => {
                Statement::Truncate(DropBinder::new(root, rc).bind_truncate(ctx, truncate)?)
            }
            Statement::CreateView(create) => {
                Statement::CreateView(ViewBinder::new(root, rc).bind_create_view(ctx, create)?)
            }
            Statement::AlterView(alter) => {
                Statement::AlterView(ViewBinder::new(root, rc).bind_alter_view(ctx, alter)?)
            }
            Statement::DropView(drop) => {
                Statement::DropView(DropBinder::new(root, rc).bind_drop_view(ctx, drop)?)
            }
            Statement::Comment(comment) => {
                Statement::Comment(CommentBinder::new(root, rc).bind_comment(ctx, comment)?)
            }
            Statement::CreateIndex(create) => {
                Statement::CreateIndex(IndexBinder::new(root, rc).bind_create_index(ctx, create)?)
            }
            Statement::AlterIndex(alter) => {
                Statement::AlterIndex(IndexBinder::new(root, rc).bind_alter_index(ctx, alter)?)
            }
            Statement::DropIndex(drop) => {
                Statement::DropIndex(IndexBinder::new(root, rc).bind_drop_index(ctx, drop)?)
            }
            Statement::DeclareCursor(cursor) => Statement::DeclareCursor(
                CursorBinder::new(root, rc).bind_declare_cursor(ctx, cursor)?,
            ),
            Statement::Prepare(prepare) => {
                Statement::Prepare(PrepareBinder::new(root, rc).bind_prepare(ctx, prepare)?)
            }
            Statement::Select(query) => {
                let (query, _) = QueryBinder::new(root, rc).bind(ctx, query)?;
                Statement::Select(query)
            }
            Statement::Insert(insert) => {
                Statement::Insert(InsertBinder::new(root, rc).bind_insert(ctx, insert)?)
            }
            Statement::Update(update) => {
                Statement::Update(UpdateBinder::new(root, rc).bind_update(ctx, update)?)
            }
            Statement::Delete(delete) => {
                Statement::Delete(DeleteBinder::new(root, rc).bind_delete(ctx, delete)?)
            }
        };

        debug!(tables = context.table_count(), "bound statement");

        Ok(BoundStatement::new(bound))
    }

    /// Bind every statement of a batch.
    ///
    /// Returns the first error if any statement fails to bind, in which case
    /// none of the batch is returned.
    pub fn bind_batch(&self, statements: &[Arc<Statement>]) -> Result<Vec<BoundStatement>> {
        statements.iter().map(|stmt| self.bind(stmt)).collect()
    }
}

/// Checks if a statement references anything in the catalog or in a scope.
fn needs_binding(statement: &Statement) -> bool {
    match statement {
        Statement::Select(query) => query_needs_binding(query),
        Statement::DeclareCursor(cursor) => query_needs_binding(&cursor.query),
        Statement::Prepare(prepare) => prepare.body.is_some(),
        _ => true,
    }
}

fn query_needs_binding(query: &SelectStatement) -> bool {
    let SetExpr::Select(body) = &query.body else {
        return true;
    };

    query.with.is_some()
        || body.from.is_some()
        || body.projections.iter().any(|projection| match projection {
            Projection::Wildcard(_) => true,
            Projection::Expr { expr, .. } => has_references(expr),
        })
        || body.where_expr.as_ref().is_some_and(has_references)
        || body.group_by.iter().any(has_references)
        || body.having.as_ref().is_some_and(has_references)
        || query.order_by.iter().any(|o| has_references(&o.expr))
        || query.limit.as_ref().is_some_and(|limit| {
            limit.limit.as_ref().is_some_and(has_references)
                || limit.offset.as_ref().is_some_and(has_references)
        })
}

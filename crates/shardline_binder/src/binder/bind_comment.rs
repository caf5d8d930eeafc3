use shardline_ast::ast::{CommentStatement, ObjectReference, SimpleTable, StatementAttributes};
use shardline_error::{BindError, BindErrorKind, Result};

use super::{
    bind_context::{BindContext, BindScopeRef},
    expr_binder::clause,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_columns::TableColumns,
    table_resolver::TableResolver,
};

#[derive(Debug)]
pub struct CommentBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> CommentBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        CommentBinder {
            current,
            resolve_context,
        }
    }

    /// Bind `COMMENT ON TABLE` or `COMMENT ON COLUMN`.
    ///
    /// A column comment without a separate table names the table through the
    /// column's qualifier.
    pub fn bind_comment(
        &self,
        bind_context: &mut BindContext,
        comment: &CommentStatement,
    ) -> Result<CommentStatement> {
        let target = match (&comment.table, &comment.column) {
            (Some(table), _) => table.clone(),
            (None, Some(column)) => match &column.owner {
                Some(owner) => SimpleTable {
                    span: column.span,
                    ..SimpleTable::new(ObjectReference(vec![owner.clone()]))
                },
                None => {
                    return Err(BindError::new(
                        BindErrorKind::DialectMismatch,
                        format!("Column comment on '{}' must name a table", column.name),
                    )
                    .with_position(column.span.start, column.span.stop))
                }
            },
            (None, None) => {
                return Err(BindError::new(
                    BindErrorKind::DialectMismatch,
                    "COMMENT requires a table or column",
                ))
            }
        };

        let (table, context) = TableResolver::new(self.resolve_context).resolve_existing(&target)?;
        let columns = TableColumns::from_context(&context)?;
        bind_context.register(
            self.current,
            self.resolve_context.canonical(target.reference.base()?),
            context,
        )?;

        let column = match &comment.column {
            Some(column) => Some(columns.resolve(column, clause::COMMENT)?),
            None => None,
        };

        let mut bound = CommentStatement {
            attributes: StatementAttributes::default(),
            // A table taken from the column qualifier stays implicit.
            table: comment.table.as_ref().map(|_| table),
            column,
            comment: comment.comment.clone(),
        };
        copy_attributes(comment, &mut bound);
        Ok(bound)
    }
}

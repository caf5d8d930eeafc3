use shardline_ast::ast::{DeclareCursorStatement, StatementAttributes};
use shardline_error::Result;

use super::{
    bind_context::{BindContext, BindScopeRef},
    nested::QueryBinder,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
};

#[derive(Debug)]
pub struct CursorBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> CursorBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        CursorBinder {
            current,
            resolve_context,
        }
    }

    /// Bind `DECLARE name CURSOR FOR ...`. The cursor name is kept as
    /// written.
    pub fn bind_declare_cursor(
        &self,
        bind_context: &mut BindContext,
        cursor: &DeclareCursorStatement,
    ) -> Result<DeclareCursorStatement> {
        let (query, _) = QueryBinder::new(self.current, self.resolve_context).bind_nested(
            bind_context,
            &cursor.query,
            false,
        )?;

        let mut bound = DeclareCursorStatement {
            attributes: StatementAttributes::default(),
            name: cursor.name.clone(),
            query: Box::new(query),
        };
        copy_attributes(cursor, &mut bound);
        Ok(bound)
    }
}

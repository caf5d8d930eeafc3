use shardline_ast::ast::{PrepareBody, PrepareStatement, StatementAttributes};
use shardline_error::Result;
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef},
    bind_delete::DeleteBinder,
    bind_insert::InsertBinder,
    bind_update::UpdateBinder,
    nested::QueryBinder,
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
};

#[derive(Debug)]
pub struct PrepareBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> PrepareBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        PrepareBinder {
            current,
            resolve_context,
        }
    }

    /// Bind `PREPARE name AS ...`. The prepared statement binds one level
    /// down in a scope of its own.
    pub fn bind_prepare(
        &self,
        bind_context: &mut BindContext,
        prepare: &PrepareStatement,
    ) -> Result<PrepareStatement> {
        let body = match &prepare.body {
            Some(body) => Some(self.bind_body(bind_context, body)?),
            None => None,
        };

        let mut bound = PrepareStatement {
            attributes: StatementAttributes::default(),
            name: prepare.name.clone(),
            body,
        };
        copy_attributes(prepare, &mut bound);
        Ok(bound)
    }

    fn bind_body(&self, bind_context: &mut BindContext, body: &PrepareBody) -> Result<PrepareBody> {
        let resolve_context = self.resolve_context;
        match body {
            PrepareBody::Select(query) => {
                let (query, _) = QueryBinder::new(self.current, resolve_context)
                    .bind_nested(bind_context, query, false)?;
                Ok(PrepareBody::Select(Box::new(query)))
            }
            PrepareBody::Insert(insert) => self.bind_in_own_scope(bind_context, |scope, ctx| {
                let bound = InsertBinder::new(scope, resolve_context).bind_insert(ctx, insert)?;
                Ok(PrepareBody::Insert(Box::new(bound)))
            }),
            PrepareBody::Update(update) => self.bind_in_own_scope(bind_context, |scope, ctx| {
                let bound = UpdateBinder::new(scope, resolve_context).bind_update(ctx, update)?;
                Ok(PrepareBody::Update(Box::new(bound)))
            }),
            PrepareBody::Delete(delete) => self.bind_in_own_scope(bind_context, |scope, ctx| {
                let bound = DeleteBinder::new(scope, resolve_context).bind_delete(ctx, delete)?;
                Ok(PrepareBody::Delete(Box::new(bound)))
            }),
        }
    }

    fn bind_in_own_scope<F>(&self, bind_context: &mut BindContext, bind: F) -> Result<PrepareBody>
    where
        F: FnOnce(BindScopeRef, &mut BindContext) -> Result<PrepareBody>,
    {
        bind_context.enter_nested(self.resolve_context.config.max_nesting_depth)?;
        trace!(depth = bind_context.depth(), "binding prepared statement");

        let scope = bind_context.new_orphan_scope();
        let result = bind(scope, bind_context);

        bind_context.exit_nested();
        result
    }
}

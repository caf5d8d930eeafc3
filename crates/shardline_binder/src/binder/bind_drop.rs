use shardline_ast::ast::{
    DropTableStatement, DropViewStatement, SimpleTable, StatementAttributes, TruncateStatement,
};
use shardline_error::Result;
use tracing::trace;

use super::{
    bind_context::{BindContext, BindScopeRef},
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_resolver::TableResolver,
};

/// Binds statements that take a flat list of existing tables: DROP TABLE,
/// DROP VIEW and TRUNCATE.
#[derive(Debug)]
pub struct DropBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> DropBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        DropBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_drop_table(
        &self,
        bind_context: &mut BindContext,
        drop: &DropTableStatement,
    ) -> Result<DropTableStatement> {
        let mut bound = DropTableStatement {
            attributes: StatementAttributes::default(),
            tables: self.bind_targets(bind_context, &drop.tables, drop.if_exists)?,
            if_exists: drop.if_exists,
            cascade: drop.cascade,
        };
        copy_attributes(drop, &mut bound);
        Ok(bound)
    }

    pub fn bind_drop_view(
        &self,
        bind_context: &mut BindContext,
        drop: &DropViewStatement,
    ) -> Result<DropViewStatement> {
        let mut bound = DropViewStatement {
            attributes: StatementAttributes::default(),
            views: self.bind_targets(bind_context, &drop.views, drop.if_exists)?,
            if_exists: drop.if_exists,
            cascade: drop.cascade,
        };
        copy_attributes(drop, &mut bound);
        Ok(bound)
    }

    pub fn bind_truncate(
        &self,
        bind_context: &mut BindContext,
        truncate: &TruncateStatement,
    ) -> Result<TruncateStatement> {
        let resolver = TableResolver::new(self.resolve_context);
        let tables = truncate
            .tables
            .iter()
            .map(|table| {
                let scope = bind_context.new_orphan_scope();
                let (bound, context) = resolver.resolve_existing(table)?;
                bind_context.register(scope, self.identity(table)?, context)?;
                Ok(bound)
            })
            .collect::<Result<Vec<_>>>()?;

        let mut bound = TruncateStatement {
            attributes: StatementAttributes::default(),
            tables,
        };
        copy_attributes(truncate, &mut bound);
        Ok(bound)
    }

    /// Each target resolves on its own, the same table may be listed twice.
    fn bind_targets(
        &self,
        bind_context: &mut BindContext,
        tables: &[SimpleTable],
        if_exists: bool,
    ) -> Result<Vec<SimpleTable>> {
        let resolver = TableResolver::new(self.resolve_context);
        tables
            .iter()
            .map(|table| {
                let scope = bind_context.new_orphan_scope();
                let (bound, context) = resolver.resolve_droppable(table, if_exists)?;
                trace!(table = %table.reference, "bound drop target");
                bind_context.register(scope, self.identity(table)?, context)?;
                Ok(bound)
            })
            .collect()
    }

    fn identity(&self, table: &SimpleTable) -> Result<String> {
        Ok(self.resolve_context.canonical(table.reference.base()?))
    }
}

use shardline_ast::ast::{
    RenameTableDefinition, RenameTableStatement, SimpleTable, StatementAttributes,
};
use shardline_error::{BindError, BindErrorKind, OptionExt, Result};
use tracing::debug;
use unicase::UniCase;

use super::{
    bind_context::{BindContext, BindScopeRef, TableBindingContext},
    reconstruct::copy_attributes,
    resolve_context::ResolveContext,
    table_resolver::{QualifiedName, TableResolver},
};

/// Binds `RENAME TABLE a TO b, c TO d, ...`.
///
/// Renames apply in order. The current scope acts as the statement frame:
/// every `to` is registered in it, so later pairs see earlier renames.
#[derive(Debug)]
pub struct RenameTableBinder<'a> {
    pub current: BindScopeRef,
    pub resolve_context: &'a ResolveContext<'a>,
}

impl<'a> RenameTableBinder<'a> {
    pub const fn new(current: BindScopeRef, resolve_context: &'a ResolveContext<'a>) -> Self {
        RenameTableBinder {
            current,
            resolve_context,
        }
    }

    pub fn bind_rename(
        &self,
        bind_context: &mut BindContext,
        rename: &RenameTableStatement,
    ) -> Result<RenameTableStatement> {
        // Catalog names renamed away by earlier pairs.
        let mut vacated: Vec<String> = Vec::new();

        let renames = rename
            .renames
            .iter()
            .map(|def| self.bind_definition(bind_context, def, &mut vacated))
            .collect::<Result<Vec<_>>>()?;

        let mut bound = RenameTableStatement {
            attributes: StatementAttributes::default(),
            renames,
        };
        copy_attributes(rename, &mut bound);
        Ok(bound)
    }

    fn bind_definition(
        &self,
        bind_context: &mut BindContext,
        def: &RenameTableDefinition,
        vacated: &mut Vec<String>,
    ) -> Result<RenameTableDefinition> {
        let resolver = TableResolver::new(self.resolve_context);

        let from_key = frame_key(&resolver.qualify(&def.from)?);
        let (from, context) = match bind_context.lookup(self.current, &from_key)? {
            Some(entry) => {
                let context = entry.context.clone();
                let binding = context
                    .table
                    .clone()
                    .required("binding for renamed table")?;
                (def.from.with_binding(binding), context)
            }
            None if contains(vacated, &from_key) => {
                return Err(unknown(&def.from));
            }
            None => resolver.resolve_droppable(&def.from, false)?,
        };
        bind_context.hide(self.current, &from_key)?;
        vacated.push(from_key.clone());

        let to_key = frame_key(&resolver.qualify(&def.to)?);
        if bind_context.lookup(self.current, &to_key)?.is_some()
            && !self.resolve_context.skip_metadata_validate
        {
            return Err(BindError::new(
                BindErrorKind::TableExists,
                format!("Table '{}' already exists", def.to.reference),
            )
            .with_name(def.to.reference.to_string())
            .with_position(def.to.span.start, def.to.span.stop));
        }
        let to = resolver.bind_new_name(&def.to, contains(vacated, &to_key))?;
        vacated.retain(|key| UniCase::new(key.as_str()) != UniCase::new(to_key.as_str()));

        debug!(from = %from_key, to = %to_key, "renaming table in statement frame");
        bind_context.register_replacing(
            self.current,
            to_key,
            TableBindingContext {
                source: context.source,
                table: to.bound.clone(),
                columns: context.columns,
            },
        )?;

        Ok(RenameTableDefinition { from, to })
    }
}

fn frame_key(name: &QualifiedName) -> String {
    format!("{}.{}.{}", name.database, name.schema, name.table)
}

fn contains(keys: &[String], key: &str) -> bool {
    keys.iter()
        .any(|k| UniCase::new(k.as_str()) == UniCase::new(key))
}

fn unknown(table: &SimpleTable) -> BindError {
    BindError::unknown_table(table.reference.to_string())
        .with_position(table.span.start, table.span.stop)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use shardline_ast::{ast::TableSourceType, builder::table};

    use super::*;
    use crate::{config::BinderConfig, testutil};

    fn rename(pairs: &[(&str, &str)]) -> RenameTableStatement {
        RenameTableStatement {
            attributes: StatementAttributes::default(),
            renames: pairs
                .iter()
                .map(|(from, to)| RenameTableDefinition {
                    from: table(from),
                    to: table(to),
                })
                .collect(),
        }
    }

    fn bind(stmt: &RenameTableStatement) -> Result<RenameTableStatement> {
        let catalog = testutil::mysql_catalog();
        let config = BinderConfig::default();
        let rc = ResolveContext::new(&catalog, &config, &stmt.attributes);
        let mut context = BindContext::new();
        let root = context.root_scope_ref();
        RenameTableBinder::new(root, &rc).bind_rename(&mut context, stmt)
    }

    #[test]
    fn chained_renames() {
        let bound = bind(&rename(&[("t_order", "t_tmp"), ("t_tmp", "t_final")])).unwrap();
        let second_from = bound.renames[1].from.bound.as_ref().unwrap();
        assert_eq!("t_tmp", second_from.table);
        assert_eq!(TableSourceType::TemporaryTable, second_from.source);
        assert_eq!("t_final", bound.renames[1].to.bound.as_ref().unwrap().table);
    }

    #[test]
    fn swap_through_temporary_name() {
        bind(&rename(&[
            ("t_order", "t_tmp"),
            ("t_user", "t_order"),
            ("t_tmp", "t_user"),
        ]))
        .unwrap();
    }

    #[test]
    fn rename_errors() {
        let err = bind(&rename(&[("t_order", "t_user")])).unwrap_err();
        assert_eq!(BindErrorKind::TableExists, err.kind());

        let err = bind(&rename(&[("t_order", "t_a"), ("t_order", "t_b")])).unwrap_err();
        assert_eq!(BindErrorKind::UnknownTable, err.kind());

        let err = bind(&rename(&[("t_order", "t_a"), ("t_user", "t_a")])).unwrap_err();
        assert_eq!(BindErrorKind::TableExists, err.kind());

        let err = bind(&rename(&[("t_missing", "t_a")])).unwrap_err();
        assert_eq!(BindErrorKind::UnknownTable, err.kind());
    }
}

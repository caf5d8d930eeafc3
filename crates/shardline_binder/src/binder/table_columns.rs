use shardline_ast::ast::{ColumnBinding, ColumnBindingKind, ColumnRef, TableBinding};
use shardline_error::{BindError, BindErrorKind, OptionExt, Result};
use unicase::UniCase;

use super::bind_context::{ScopeColumn, TableBindingContext, TableSource};

/// Columns of a DDL target as the statement defines or changes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumns {
    pub table: TableBinding,
    pub columns: Vec<ScopeColumn>,
}

impl TableColumns {
    /// Empty column set for a table being created.
    pub fn new(table: TableBinding) -> Self {
        TableColumns {
            table,
            columns: Vec::new(),
        }
    }

    /// Column set of a table resolved from the catalog.
    pub fn from_context(context: &TableBindingContext) -> Result<Self> {
        let table = context
            .table
            .clone()
            .required("table binding for DDL target")?;
        Ok(TableColumns {
            table,
            columns: context.columns.clone(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| UniCase::new(c.name.as_str()) == UniCase::new(name))
    }

    fn new_binding(&self, name: &str) -> ColumnBinding {
        ColumnBinding {
            database: Some(self.table.database.clone()),
            schema: Some(self.table.schema.clone()),
            table: Some(self.table.table.clone()),
            column: name.to_string(),
            source: self.table.source,
            kind: ColumnBindingKind::Column,
        }
    }

    /// Add a column named `name`, binding `column` to it.
    ///
    /// Errors with `DuplicateColumn` if the name is taken, unless
    /// `allow_existing` is set, in which case the existing column is kept.
    pub fn define(
        &mut self,
        column: &ColumnRef,
        name: String,
        allow_existing: bool,
    ) -> Result<ColumnRef> {
        if let Some(idx) = self.position(&name) {
            if !allow_existing {
                return Err(BindError::new(
                    BindErrorKind::DuplicateColumn,
                    format!("Duplicate column name '{name}'"),
                )
                .with_name(name)
                .with_position(column.span.start, column.span.stop));
            }
            return Ok(column.with_binding(self.columns[idx].binding.clone()));
        }

        let binding = self.new_binding(&name);
        self.columns.push(ScopeColumn::new(name, binding.clone()));
        Ok(column.with_binding(binding))
    }

    /// Bind a reference to an existing column.
    pub fn resolve(&self, column: &ColumnRef, clause: &str) -> Result<ColumnRef> {
        match self.position(column.name.as_str()) {
            Some(idx) => Ok(column.with_binding(self.columns[idx].binding.clone())),
            None => Err(BindError::unknown_column(column.name.as_str(), clause)
                .with_position(column.span.start, column.span.stop)),
        }
    }

    /// Bind a reference to a column that may not exist.
    ///
    /// Missing columns are bound as if they belonged to the table.
    pub fn resolve_or_assume(&self, column: &ColumnRef) -> ColumnRef {
        match self.position(column.name.as_str()) {
            Some(idx) => column.with_binding(self.columns[idx].binding.clone()),
            None => column.with_binding(self.new_binding(column.name.as_str())),
        }
    }

    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.columns.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Rename a column in place. The binding keeps pointing at the original
    /// column.
    pub fn rename(&mut self, from: &str, to: String) -> Result<()> {
        let idx = self.position(from).ok_or_else(|| {
            BindError::internal(format!("Renaming missing column '{from}'"))
        })?;
        self.columns[idx].name = to;
        Ok(())
    }

    pub fn into_context(self, source: TableSource) -> TableBindingContext {
        TableBindingContext {
            source,
            table: Some(self.table),
            columns: self.columns,
        }
    }
}

use std::sync::Arc;

use shardline_ast::ast::{ColumnBinding, ColumnBindingKind, OutputColumn, TableBinding};
use shardline_error::{BindError, BindErrorKind, Result};
use tracing::debug;
use unicase::UniCase;

use crate::database::TableEntry;

/// Reference to a scope in the bind context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindScopeRef {
    pub context_idx: usize,
}

/// Reference to a registered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    pub table_idx: usize,
}

/// Where the rows of a registered table come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Catalog(Arc<TableEntry>),
    /// Subquery in FROM.
    Derived,
    Cte,
    Dual,
    /// Table being created by the statement itself.
    Defined,
    /// `IF EXISTS` target that isn't in the catalog.
    Absent,
    /// System table the catalog has no metadata for. Columns are unknown.
    System,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeColumn {
    /// Name the column is visible under in this scope.
    pub name: String,
    pub binding: ColumnBinding,
    /// Hidden columns resolve by name but are skipped by `*`.
    pub visible: bool,
}

impl ScopeColumn {
    pub fn new(name: impl Into<String>, binding: ColumnBinding) -> Self {
        ScopeColumn {
            name: name.into(),
            binding,
            visible: true,
        }
    }

    pub fn to_output(&self) -> OutputColumn {
        OutputColumn::new(self.name.clone(), self.binding.clone())
    }
}

impl From<OutputColumn> for ScopeColumn {
    fn from(value: OutputColumn) -> Self {
        ScopeColumn::new(value.name, value.binding)
    }
}

/// Resolved columns and origin of one registered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableBindingContext {
    pub source: TableSource,
    /// Catalog identity. `None` for derived tables and CTEs.
    pub table: Option<TableBinding>,
    pub columns: Vec<ScopeColumn>,
}

impl TableBindingContext {
    pub fn find_column(&self, name: &str) -> Option<&ScopeColumn> {
        self.columns
            .iter()
            .find(|c| UniCase::new(c.name.as_str()) == UniCase::new(name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    pub reference: TableRef,
    /// Alias or table name the entry was registered under.
    pub identity: String,
    pub context: TableBindingContext,
}

/// A column merged by `USING` or `NATURAL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsingColumn {
    pub name: String,
    /// Binding unqualified references resolve to.
    pub binding: ColumnBinding,
    /// Tables whose copy of the column is covered by this merge.
    pub tables: Vec<TableRef>,
}

/// Result of searching for an unqualified column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMatch {
    /// Table the column was found in. `None` for merged `USING` columns.
    pub table: Option<TableRef>,
    pub binding: ColumnBinding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CteBinding {
    pub name: String,
    pub columns: Vec<ScopeColumn>,
}

#[derive(Debug, Default)]
struct Scope {
    /// Scope that's visible from this one for correlation.
    ///
    /// None for the root scope and orphan scopes.
    parent: Option<BindScopeRef>,
    /// Tables registered at this level, in registration order.
    tables: Vec<TableRef>,
    using_columns: Vec<UsingColumn>,
}

/// All scopes for a single bind call.
///
/// Created per call and dropped with it, partial registrations never outlive
/// a failed call.
#[derive(Debug)]
pub struct BindContext {
    /// Initialized with a single root scope.
    scopes: Vec<Scope>,
    /// All tables across all scopes.
    tables: Vec<ScopeEntry>,
    /// Stack of WITH clauses currently being bound, innermost last.
    cte_frames: Vec<Vec<CteBinding>>,
    /// Current nesting depth of nested statements.
    depth: usize,
}

impl Default for BindContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BindContext {
    pub fn new() -> Self {
        BindContext {
            scopes: vec![Scope::default()],
            tables: Vec::new(),
            cte_frames: Vec::new(),
            depth: 0,
        }
    }

    pub fn root_scope_ref(&self) -> BindScopeRef {
        BindScopeRef { context_idx: 0 }
    }

    /// Create a scope with no visibility into any other scope.
    pub fn new_orphan_scope(&mut self) -> BindScopeRef {
        self.push_scope(None)
    }

    /// Create a scope that can see `parent` and everything `parent` can see.
    pub fn new_child_scope(&mut self, parent: BindScopeRef) -> BindScopeRef {
        self.push_scope(Some(parent))
    }

    fn push_scope(&mut self, parent: Option<BindScopeRef>) -> BindScopeRef {
        let idx = self.scopes.len();
        self.scopes.push(Scope {
            parent,
            ..Default::default()
        });
        BindScopeRef { context_idx: idx }
    }

    pub fn get_parent_ref(&self, scope: BindScopeRef) -> Result<Option<BindScopeRef>> {
        Ok(self.get_scope(scope)?.parent)
    }

    /// Register a table under `identity`.
    ///
    /// Errors if the identity is already registered in this scope. Outer
    /// scopes may hold the same identity.
    pub fn register(
        &mut self,
        scope: BindScopeRef,
        identity: impl Into<String>,
        context: TableBindingContext,
    ) -> Result<TableRef> {
        let identity = identity.into();
        if self.lookup(scope, &identity)?.is_some() {
            return Err(BindError::duplicate_identity(identity));
        }
        self.push_table(scope, identity, context)
    }

    /// Register a table, replacing any existing registration with the same
    /// identity in this scope.
    pub fn register_replacing(
        &mut self,
        scope: BindScopeRef,
        identity: impl Into<String>,
        context: TableBindingContext,
    ) -> Result<TableRef> {
        let identity = identity.into();
        self.hide(scope, &identity)?;
        self.push_table(scope, identity, context)
    }

    fn push_table(
        &mut self,
        scope: BindScopeRef,
        identity: String,
        context: TableBindingContext,
    ) -> Result<TableRef> {
        let needs_columns = matches!(
            context.source,
            TableSource::Catalog(_) | TableSource::Derived | TableSource::Cte
        );
        if needs_columns && context.columns.is_empty() {
            return Err(BindError::internal(format!(
                "Table '{identity}' resolved without any columns"
            )));
        }

        debug!(%identity, scope = scope.context_idx, columns = context.columns.len(), "registering table");

        let reference = TableRef {
            table_idx: self.tables.len(),
        };
        self.tables.push(ScopeEntry {
            reference,
            identity,
            context,
        });
        self.get_scope_mut(scope)?.tables.push(reference);

        Ok(reference)
    }

    /// Remove visibility of `identity` in this scope.
    ///
    /// Returns true if something was hidden.
    pub fn hide(&mut self, scope: BindScopeRef, identity: &str) -> Result<bool> {
        let found = self
            .lookup(scope, identity)?
            .map(|entry| entry.reference);
        match found {
            Some(reference) => {
                self.get_scope_mut(scope)?
                    .tables
                    .retain(|table| *table != reference);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Look up a table in this scope only.
    pub fn lookup(&self, scope: BindScopeRef, identity: &str) -> Result<Option<&ScopeEntry>> {
        let identity = UniCase::new(identity);
        Ok(self
            .iter_entries(scope)?
            .find(|entry| UniCase::new(entry.identity.as_str()) == identity))
    }

    /// Look up a table in this scope, then in outer scopes nearest first.
    pub fn lookup_visible(
        &self,
        scope: BindScopeRef,
        identity: &str,
    ) -> Result<Option<(BindScopeRef, &ScopeEntry)>> {
        let mut current = scope;
        loop {
            if let Some(entry) = self.lookup(current, identity)? {
                return Ok(Some((current, entry)));
            }
            match self.get_parent_ref(current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Iterate tables registered in the given scope, in registration order.
    pub fn iter_entries(&self, scope: BindScopeRef) -> Result<impl Iterator<Item = &ScopeEntry>> {
        let scope = self.get_scope(scope)?;
        Ok(scope
            .tables
            .iter()
            .map(|table| &self.tables[table.table_idx]))
    }

    pub fn get_table(&self, table: TableRef) -> Result<&ScopeEntry> {
        self.tables
            .get(table.table_idx)
            .ok_or_else(|| BindError::internal("Missing table in bind context"))
    }

    pub fn add_using_column(&mut self, scope: BindScopeRef, column: UsingColumn) -> Result<()> {
        self.get_scope_mut(scope)?.using_columns.push(column);
        Ok(())
    }

    /// Find the table in this scope providing an unqualified column.
    ///
    /// Does not look at outer scopes. Errors if more than one table provides
    /// the column, unless the copies were merged by `USING`/`NATURAL`.
    pub fn find_column(
        &self,
        scope: BindScopeRef,
        name: &str,
        clause: &str,
    ) -> Result<Option<ColumnMatch>> {
        let name_key = UniCase::new(name);
        let using: Vec<_> = self
            .get_scope(scope)?
            .using_columns
            .iter()
            .filter(|u| UniCase::new(u.name.as_str()) == name_key)
            .collect();

        let mut matches: Vec<ColumnMatch> = Vec::new();
        for entry in self.iter_entries(scope)? {
            let covered = using.iter().any(|u| u.tables.contains(&entry.reference));
            if covered {
                continue;
            }
            if let Some(column) = entry.context.find_column(name) {
                matches.push(ColumnMatch {
                    table: Some(entry.reference),
                    binding: column.binding.clone(),
                });
            }
        }

        // Outermost merge wins when joins are nested.
        if let Some(merged) = using.last() {
            matches.push(ColumnMatch {
                table: None,
                binding: merged.binding.clone(),
            });
        }

        if matches.len() > 1 {
            return Err(BindError::ambiguous(name, clause));
        }

        Ok(matches.pop())
    }

    /// Push a new frame for the CTEs of a WITH clause.
    pub fn push_cte_frame(&mut self) {
        self.cte_frames.push(Vec::new());
    }

    pub fn pop_cte_frame(&mut self) -> Result<()> {
        self.cte_frames
            .pop()
            .map(|_| ())
            .ok_or_else(|| BindError::internal("No CTE frame to pop"))
    }

    /// Register a CTE in the innermost frame.
    pub fn register_cte(&mut self, cte: CteBinding) -> Result<()> {
        let frame = self
            .cte_frames
            .last_mut()
            .ok_or_else(|| BindError::internal("Registering CTE outside of a WITH clause"))?;
        if frame
            .iter()
            .any(|c| UniCase::new(c.name.as_str()) == UniCase::new(cte.name.as_str()))
        {
            return Err(BindError::duplicate_identity(cte.name));
        }
        debug!(name = %cte.name, columns = cte.columns.len(), "registering cte");
        frame.push(cte);
        Ok(())
    }

    /// Replace the columns of an already registered CTE in the innermost
    /// frame. Used once a recursive CTE's full body is bound.
    pub fn replace_cte(&mut self, cte: CteBinding) -> Result<()> {
        let frame = self
            .cte_frames
            .last_mut()
            .ok_or_else(|| BindError::internal("Replacing CTE outside of a WITH clause"))?;
        match frame
            .iter_mut()
            .find(|c| UniCase::new(c.name.as_str()) == UniCase::new(cte.name.as_str()))
        {
            Some(existing) => {
                *existing = cte;
                Ok(())
            }
            None => Err(BindError::internal(format!("Missing CTE '{}'", cte.name))),
        }
    }

    /// Find a CTE by name, innermost WITH clause first.
    pub fn find_cte(&self, name: &str) -> Option<&CteBinding> {
        let name = UniCase::new(name);
        self.cte_frames
            .iter()
            .rev()
            .flat_map(|frame| frame.iter())
            .find(|c| UniCase::new(c.name.as_str()) == name)
    }

    /// Enter a nested statement, erroring if that goes past `max_depth`.
    pub fn enter_nested(&mut self, max_depth: usize) -> Result<()> {
        if self.depth >= max_depth {
            return Err(BindError::new(
                BindErrorKind::NestingTooDeep,
                format!("Statement nesting exceeds maximum depth of {max_depth}"),
            ));
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit_nested(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of tables registered across all scopes.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    fn get_scope(&self, scope: BindScopeRef) -> Result<&Scope> {
        self.scopes
            .get(scope.context_idx)
            .ok_or_else(|| BindError::internal("Missing scope in bind context"))
    }

    fn get_scope_mut(&mut self, scope: BindScopeRef) -> Result<&mut Scope> {
        self.scopes
            .get_mut(scope.context_idx)
            .ok_or_else(|| BindError::internal("Missing scope in bind context"))
    }
}

/// Column binding for a column of a registered table, as seen from a
/// (possibly outer) scope.
pub fn correlated(binding: &ColumnBinding) -> ColumnBinding {
    match binding.kind {
        ColumnBindingKind::Column => binding.with_kind(ColumnBindingKind::Correlated),
        _ => binding.clone(),
    }
}

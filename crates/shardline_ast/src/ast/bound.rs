//! Binding information attached to segments by the binder.

use std::fmt;

/// Where the rows of a table segment come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableSourceType {
    /// A table stored in the catalog.
    PhysicalTable,
    /// A view stored in the catalog.
    View,
    /// Derived table, CTE, or a table that doesn't exist in the catalog yet
    /// (e.g. the target of `CREATE TABLE`).
    TemporaryTable,
    /// `DUAL` pseudo table.
    Dual,
    /// Target of an `IF EXISTS` drop that isn't in the catalog.
    Absent,
}

impl fmt::Display for TableSourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhysicalTable => write!(f, "physical"),
            Self::View => write!(f, "view"),
            Self::TemporaryTable => write!(f, "temporary"),
            Self::Dual => write!(f, "dual"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Catalog identity of a bound table segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableBinding {
    pub database: String,
    pub schema: String,
    /// Name of the table as stored in the catalog (or as it will be stored for
    /// tables being created/renamed).
    pub table: String,
    pub source: TableSourceType,
}

impl fmt::Display for TableBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{} ({})",
            self.database, self.schema, self.table, self.source
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnBindingKind {
    /// Column of a table in the current scope.
    Column,
    /// Column of a table in an outer scope.
    Correlated,
    /// Column named in a `USING` clause or merged by a `NATURAL` join. Holds
    /// the binding of the same column on the other side of the join.
    Using { other: Box<ColumnBinding> },
    /// Resolved to a declared variable.
    Variable,
    /// Dialect pseudo column (`ROWNUM`, `SYSDATE`, ...), never looked up.
    Pseudo,
    /// Reference to an output column of the select list (`ORDER BY alias`).
    ProjectionAlias,
    /// Output of a select list expression that isn't a plain column.
    Computed,
}

/// Origin of a bound column reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnBinding {
    pub database: Option<String>,
    pub schema: Option<String>,
    /// Originating table. `None` for computed projections.
    pub table: Option<String>,
    /// Originating column name.
    pub column: String,
    pub source: TableSourceType,
    pub kind: ColumnBindingKind,
}

impl ColumnBinding {
    /// A binding that doesn't originate from any table.
    pub fn unowned(column: impl Into<String>, kind: ColumnBindingKind) -> Self {
        ColumnBinding {
            database: None,
            schema: None,
            table: None,
            column: column.into(),
            source: TableSourceType::TemporaryTable,
            kind,
        }
    }

    pub fn with_kind(&self, kind: ColumnBindingKind) -> Self {
        ColumnBinding {
            kind,
            ..self.clone()
        }
    }
}

/// A named output column of a query, derived table or join.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutputColumn {
    pub name: String,
    pub binding: ColumnBinding,
}

impl OutputColumn {
    pub fn new(name: impl Into<String>, binding: ColumnBinding) -> Self {
        OutputColumn {
            name: name.into(),
            binding,
        }
    }
}

/// Binding for an index name, pointing at the table that owns the index.
///
/// `table` is `None` only for `IF EXISTS` drops of indexes that don't exist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexBinding {
    pub table: Option<TableBinding>,
}

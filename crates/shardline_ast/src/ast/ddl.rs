use super::{ColumnRef, Ident, IndexBinding, Literal, SelectStatement, SimpleTable, Span, StatementAttributes};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub column: ColumnRef,
    pub data_type: String,
    pub primary_key: bool,
    pub not_null: bool,
    /// Inline `REFERENCES other(col)`.
    pub references: Option<ReferenceDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceDefinition {
    pub table: SimpleTable,
    pub columns: Vec<ColumnRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableConstraint {
    PrimaryKey(Vec<ColumnRef>),
    Unique {
        name: Option<Ident>,
        columns: Vec<ColumnRef>,
    },
    ForeignKey {
        name: Option<Ident>,
        columns: Vec<ColumnRef>,
        references: ReferenceDefinition,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableStatement {
    pub attributes: StatementAttributes,
    pub table: SimpleTable,
    pub if_not_exists: bool,
    pub columns: Vec<ColumnDefinition>,
    pub constraints: Vec<TableConstraint>,
    /// `CREATE TABLE t LIKE other`
    pub like: Option<SimpleTable>,
    /// `CREATE TABLE t AS SELECT ...`
    pub as_select: Option<Box<SelectStatement>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlterTableAction {
    AddColumn(ColumnDefinition),
    DropColumn { column: ColumnRef, if_exists: bool },
    /// Change the definition of an existing column, keeping its name.
    ModifyColumn(ColumnDefinition),
    RenameColumn { from: ColumnRef, to: Ident },
    AddConstraint(TableConstraint),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableStatement {
    pub attributes: StatementAttributes,
    pub table: SimpleTable,
    pub rename_to: Option<SimpleTable>,
    pub actions: Vec<AlterTableAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableStatement {
    pub attributes: StatementAttributes,
    pub tables: Vec<SimpleTable>,
    pub if_exists: bool,
    pub cascade: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTableDefinition {
    pub from: SimpleTable,
    pub to: SimpleTable,
}

/// MySQL `RENAME TABLE a TO b, c TO d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameTableStatement {
    pub attributes: StatementAttributes,
    pub renames: Vec<RenameTableDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncateStatement {
    pub attributes: StatementAttributes,
    pub tables: Vec<SimpleTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateViewStatement {
    pub attributes: StatementAttributes,
    pub view: SimpleTable,
    pub or_replace: bool,
    pub column_aliases: Vec<Ident>,
    pub query: Box<SelectStatement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterViewStatement {
    pub attributes: StatementAttributes,
    pub view: SimpleTable,
    pub rename_to: Option<SimpleTable>,
    pub query: Option<Box<SelectStatement>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropViewStatement {
    pub attributes: StatementAttributes,
    pub views: Vec<SimpleTable>,
    pub if_exists: bool,
    pub cascade: bool,
}

/// `COMMENT ON TABLE t IS '...'`, `COMMENT ON COLUMN t.c IS '...'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentStatement {
    pub attributes: StatementAttributes,
    pub table: Option<SimpleTable>,
    pub column: Option<ColumnRef>,
    pub comment: Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexName {
    pub name: Ident,
    pub span: Span,
    pub bound: Option<IndexBinding>,
}

impl IndexName {
    pub fn new(name: Ident) -> Self {
        IndexName {
            name,
            span: Span::default(),
            bound: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIndexStatement {
    pub attributes: StatementAttributes,
    pub index: IndexName,
    pub table: SimpleTable,
    pub columns: Vec<ColumnRef>,
    pub unique: bool,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterIndexStatement {
    pub attributes: StatementAttributes,
    pub index: IndexName,
    /// Owning table, if the dialect names one.
    pub table: Option<SimpleTable>,
    pub rename_to: Option<Ident>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropIndexStatement {
    pub attributes: StatementAttributes,
    pub indexes: Vec<IndexName>,
    /// `DROP INDEX idx ON t` (MySQL).
    pub table: Option<SimpleTable>,
    pub if_exists: bool,
}

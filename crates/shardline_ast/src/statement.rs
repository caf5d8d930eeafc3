use std::fmt;

use crate::ast;

/// One parsed SQL statement.
///
/// Adding a statement shape means adding a variant here; binders match on
/// this exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// CREATE TABLE ...
    CreateTable(ast::CreateTableStatement),

    /// ALTER TABLE ...
    AlterTable(ast::AlterTableStatement),

    /// DROP TABLE a, b, ...
    DropTable(ast::DropTableStatement),

    /// RENAME TABLE a TO b, ...
    RenameTable(ast::RenameTableStatement),

    /// TRUNCATE [TABLE] a, b, ...
    Truncate(ast::TruncateStatement),

    /// CREATE [OR REPLACE] VIEW ...
    CreateView(ast::CreateViewStatement),

    /// ALTER VIEW ...
    AlterView(ast::AlterViewStatement),

    /// DROP VIEW a, b, ...
    DropView(ast::DropViewStatement),

    /// COMMENT ON ...
    Comment(ast::CommentStatement),

    CreateIndex(ast::CreateIndexStatement),
    AlterIndex(ast::AlterIndexStatement),
    DropIndex(ast::DropIndexStatement),

    /// DECLARE name CURSOR FOR ...
    DeclareCursor(ast::DeclareCursorStatement),

    /// PREPARE name [AS|FROM] ...
    Prepare(ast::PrepareStatement),

    /// SELECT, VALUES-less queries, set operations.
    Select(ast::SelectStatement),

    Insert(ast::InsertStatement),
    Update(ast::UpdateStatement),
    Delete(ast::DeleteStatement),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    CreateTable,
    AlterTable,
    DropTable,
    RenameTable,
    Truncate,
    CreateView,
    AlterView,
    DropView,
    Comment,
    CreateIndex,
    AlterIndex,
    DropIndex,
    DeclareCursor,
    Prepare,
    Select,
    Insert,
    Update,
    Delete,
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CreateTable => "create_table",
            Self::AlterTable => "alter_table",
            Self::DropTable => "drop_table",
            Self::RenameTable => "rename_table",
            Self::Truncate => "truncate",
            Self::CreateView => "create_view",
            Self::AlterView => "alter_view",
            Self::DropView => "drop_view",
            Self::Comment => "comment",
            Self::CreateIndex => "create_index",
            Self::AlterIndex => "alter_index",
            Self::DropIndex => "drop_index",
            Self::DeclareCursor => "declare_cursor",
            Self::Prepare => "prepare",
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        };
        write!(f, "{s}")
    }
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::CreateTable(_) => StatementKind::CreateTable,
            Self::AlterTable(_) => StatementKind::AlterTable,
            Self::DropTable(_) => StatementKind::DropTable,
            Self::RenameTable(_) => StatementKind::RenameTable,
            Self::Truncate(_) => StatementKind::Truncate,
            Self::CreateView(_) => StatementKind::CreateView,
            Self::AlterView(_) => StatementKind::AlterView,
            Self::DropView(_) => StatementKind::DropView,
            Self::Comment(_) => StatementKind::Comment,
            Self::CreateIndex(_) => StatementKind::CreateIndex,
            Self::AlterIndex(_) => StatementKind::AlterIndex,
            Self::DropIndex(_) => StatementKind::DropIndex,
            Self::DeclareCursor(_) => StatementKind::DeclareCursor,
            Self::Prepare(_) => StatementKind::Prepare,
            Self::Select(_) => StatementKind::Select,
            Self::Insert(_) => StatementKind::Insert,
            Self::Update(_) => StatementKind::Update,
            Self::Delete(_) => StatementKind::Delete,
        }
    }

    /// Attributes of the statement that binding carries over untouched.
    pub fn attributes(&self) -> &ast::StatementAttributes {
        match self {
            Self::CreateTable(s) => &s.attributes,
            Self::AlterTable(s) => &s.attributes,
            Self::DropTable(s) => &s.attributes,
            Self::RenameTable(s) => &s.attributes,
            Self::Truncate(s) => &s.attributes,
            Self::CreateView(s) => &s.attributes,
            Self::AlterView(s) => &s.attributes,
            Self::DropView(s) => &s.attributes,
            Self::Comment(s) => &s.attributes,
            Self::CreateIndex(s) => &s.attributes,
            Self::AlterIndex(s) => &s.attributes,
            Self::DropIndex(s) => &s.attributes,
            Self::DeclareCursor(s) => &s.attributes,
            Self::Prepare(s) => &s.attributes,
            Self::Select(s) => &s.attributes,
            Self::Insert(s) => &s.attributes,
            Self::Update(s) => &s.attributes,
            Self::Delete(s) => &s.attributes,
        }
    }
}

use super::{
    DeleteStatement, Ident, InsertStatement, SelectStatement, StatementAttributes,
    UpdateStatement,
};

/// `DECLARE name CURSOR FOR SELECT ...`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclareCursorStatement {
    pub attributes: StatementAttributes,
    pub name: Ident,
    pub query: Box<SelectStatement>,
}

/// The statement a `PREPARE` wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrepareBody {
    Select(Box<SelectStatement>),
    Insert(Box<InsertStatement>),
    Update(Box<UpdateStatement>),
    Delete(Box<DeleteStatement>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrepareStatement {
    pub attributes: StatementAttributes,
    pub name: Ident,
    pub body: Option<PrepareBody>,
}

use super::{
    ColumnRef, Expr, Ident, ObjectReference, OutputColumn, SelectStatement, Span, TableBinding,
};

/// A table reference appearing in FROM, or as the target of a DML/DDL
/// statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableReference {
    Simple(SimpleTable),
    Subquery(SubqueryTable),
    Join(Box<JoinTable>),
}

impl From<SimpleTable> for TableReference {
    fn from(value: SimpleTable) -> Self {
        TableReference::Simple(value)
    }
}

impl From<SubqueryTable> for TableReference {
    fn from(value: SubqueryTable) -> Self {
        TableReference::Subquery(value)
    }
}

impl From<JoinTable> for TableReference {
    fn from(value: JoinTable) -> Self {
        TableReference::Join(Box::new(value))
    }
}

/// A (possibly qualified) table or view name with an optional alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTable {
    pub reference: ObjectReference,
    pub alias: Option<Ident>,
    pub span: Span,
    pub bound: Option<TableBinding>,
}

impl SimpleTable {
    pub fn new(reference: ObjectReference) -> Self {
        SimpleTable {
            reference,
            alias: None,
            span: Span::default(),
            bound: None,
        }
    }

    /// Copy of the segment with the binding attached.
    pub fn with_binding(&self, binding: TableBinding) -> Self {
        SimpleTable {
            reference: self.reference.clone(),
            alias: self.alias.clone(),
            span: self.span,
            bound: Some(binding),
        }
    }
}

/// `(SELECT ...) AS alias (c1, c2)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubqueryTable {
    pub query: Box<SelectStatement>,
    pub alias: Option<Ident>,
    pub column_aliases: Vec<Ident>,
    pub lateral: bool,
    pub span: Span,
    /// Output columns of the derived table, filled in by the binder.
    pub columns: Option<Vec<OutputColumn>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinCondition {
    On(Expr),
    Using(Vec<ColumnRef>),
    None,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTable {
    pub left: TableReference,
    pub right: TableReference,
    pub join_type: JoinType,
    pub natural: bool,
    pub condition: JoinCondition,
    /// Columns produced by the join (with `USING`/`NATURAL` columns merged),
    /// filled in by the binder.
    pub derived_columns: Option<Vec<OutputColumn>>,
}

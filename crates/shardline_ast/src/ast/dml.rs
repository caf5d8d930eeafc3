use super::{
    ColumnRef, Expr, LimitClause, OrderByExpr, SelectStatement, SimpleTable, StatementAttributes,
    TableReference,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub column: ColumnRef,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertSource {
    Values(Vec<Vec<Expr>>),
    Select(Box<SelectStatement>),
    DefaultValues,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub attributes: StatementAttributes,
    pub table: SimpleTable,
    pub columns: Vec<ColumnRef>,
    pub source: InsertSource,
    /// MySQL `ON DUPLICATE KEY UPDATE`.
    pub on_duplicate_update: Vec<Assignment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateStatement {
    pub attributes: StatementAttributes,
    pub table: TableReference,
    pub assignments: Vec<Assignment>,
    pub where_expr: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<LimitClause>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    pub attributes: StatementAttributes,
    pub table: TableReference,
    pub where_expr: Option<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<LimitClause>,
}

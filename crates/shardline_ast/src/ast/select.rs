use super::{ColumnRef, Expr, Ident, OutputColumn, Span, StatementAttributes, TableReference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub attributes: StatementAttributes,
    pub with: Option<WithClause>,
    pub body: SetExpr,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<LimitClause>,
    /// Output columns, filled in by the binder.
    pub output_columns: Option<Vec<OutputColumn>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetExpr {
    Select(Box<SelectBody>),
    SetOperation {
        op: SetOperator,
        all: bool,
        left: Box<SetExpr>,
        right: Box<SetExpr>,
    },
}

impl SetExpr {
    /// Left-most plain select in a (possibly nested) set operation.
    pub fn leftmost_select(&self) -> &SelectBody {
        match self {
            Self::Select(select) => select,
            Self::SetOperation { left, .. } => left.leftmost_select(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectBody {
    pub distinct: bool,
    pub projections: Vec<Projection>,
    pub from: Option<TableReference>,
    pub where_expr: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*` or `t.*`
    Wildcard(WildcardProjection),
    Expr { expr: Expr, alias: Option<Ident> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardProjection {
    pub owner: Option<Ident>,
    pub span: Span,
    /// Columns the wildcard expands to, filled in by the binder.
    pub expanded: Option<Vec<ColumnRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub desc: bool,
    pub nulls_first: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitClause {
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithClause {
    pub recursive: bool,
    pub ctes: Vec<Cte>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cte {
    pub alias: Ident,
    pub column_aliases: Vec<Ident>,
    pub query: Box<SelectStatement>,
    pub span: Span,
}

use std::fmt;

use super::{ColumnBinding, Ident, ParameterMarker, SelectStatement, Span};

/// A reference to a column, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub name: Ident,
    pub owner: Option<Ident>,
    pub span: Span,
    pub bound: Option<ColumnBinding>,
}

impl ColumnRef {
    pub fn new(name: Ident, owner: Option<Ident>) -> Self {
        ColumnRef {
            name,
            owner,
            span: Span::default(),
            bound: None,
        }
    }

    /// Copy of this reference with the given binding attached.
    pub fn with_binding(&self, binding: ColumnBinding) -> Self {
        ColumnRef {
            name: self.name.clone(),
            owner: self.owner.clone(),
            span: self.span,
            bound: Some(binding),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{owner}.{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Number(String),
    String(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "'{s}'"),
            Self::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::Null => write!(f, "NULL"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    Like,
    NotLike,
    StringConcat,
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::StringConcat => "||",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Minus,
    Plus,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Not => write!(f, "NOT "),
            Self::Minus => write!(f, "-"),
            Self::Plus => write!(f, "+"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub name: Ident,
    pub args: Vec<Expr>,
    pub distinct: bool,
    /// `count(*)`
    pub star: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhenClause {
    pub condition: Expr,
    pub result: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Column(ColumnRef),
    Literal(Literal),
    Parameter(ParameterMarker),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Function(FunctionCall),
    IsNull {
        expr: Box<Expr>,
        negated: bool,
    },
    InList {
        expr: Box<Expr>,
        list: Vec<Expr>,
        negated: bool,
    },
    Between {
        expr: Box<Expr>,
        negated: bool,
        low: Box<Expr>,
        high: Box<Expr>,
    },
    Case {
        operand: Option<Box<Expr>>,
        conditions: Vec<WhenClause>,
        else_result: Option<Box<Expr>>,
    },
    /// Scalar subquery.
    Subquery(Box<SelectStatement>),
    Exists {
        subquery: Box<SelectStatement>,
        negated: bool,
    },
    InSubquery {
        expr: Box<Expr>,
        subquery: Box<SelectStatement>,
        negated: bool,
    },
    /// Parenthesized expression.
    Nested(Box<Expr>),
}

impl Expr {
    pub fn column(name: &str) -> Self {
        Expr::Column(ColumnRef::new(Ident::from_string(name), None))
    }

    pub fn qualified_column(owner: &str, name: &str) -> Self {
        Expr::Column(ColumnRef::new(
            Ident::from_string(name),
            Some(Ident::from_string(owner)),
        ))
    }

    pub fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Self {
        Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Collects every parameter marker in this expression (not descending
    /// into subqueries) in source order.
    pub fn collect_parameters(&self, out: &mut Vec<ParameterMarker>) {
        match self {
            Self::Parameter(p) => out.push(*p),
            Self::Column(_) | Self::Literal(_) | Self::Subquery(_) | Self::Exists { .. } => (),
            Self::BinaryOp { left, right, .. } => {
                left.collect_parameters(out);
                right.collect_parameters(out);
            }
            Self::UnaryOp { expr, .. } | Self::IsNull { expr, .. } | Self::Nested(expr) => {
                expr.collect_parameters(out)
            }
            Self::Function(func) => func.args.iter().for_each(|a| a.collect_parameters(out)),
            Self::InList { expr, list, .. } => {
                expr.collect_parameters(out);
                list.iter().for_each(|e| e.collect_parameters(out));
            }
            Self::Between {
                expr, low, high, ..
            } => {
                expr.collect_parameters(out);
                low.collect_parameters(out);
                high.collect_parameters(out);
            }
            Self::Case {
                operand,
                conditions,
                else_result,
            } => {
                if let Some(operand) = operand {
                    operand.collect_parameters(out);
                }
                for when in conditions {
                    when.condition.collect_parameters(out);
                    when.result.collect_parameters(out);
                }
                if let Some(else_result) = else_result {
                    else_result.collect_parameters(out);
                }
            }
            Self::InSubquery { expr, .. } => expr.collect_parameters(out),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, exprs: &[Expr]) -> fmt::Result {
    for (idx, expr) in exprs.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{expr}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(col) => write!(f, "{col}"),
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Parameter(_) => write!(f, "?"),
            Self::BinaryOp { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::UnaryOp { op, expr } => write!(f, "{op}{expr}"),
            Self::Function(func) => {
                write!(f, "{}(", func.name)?;
                if func.distinct {
                    write!(f, "DISTINCT ")?;
                }
                if func.star {
                    write!(f, "*")?;
                } else {
                    write_list(f, &func.args)?;
                }
                write!(f, ")")
            }
            Self::IsNull { expr, negated } => {
                write!(f, "{expr} IS {}NULL", if *negated { "NOT " } else { "" })
            }
            Self::InList {
                expr,
                list,
                negated,
            } => {
                write!(f, "{expr} {}IN (", if *negated { "NOT " } else { "" })?;
                write_list(f, list)?;
                write!(f, ")")
            }
            Self::Between {
                expr,
                negated,
                low,
                high,
            } => write!(
                f,
                "{expr} {}BETWEEN {low} AND {high}",
                if *negated { "NOT " } else { "" }
            ),
            Self::Case {
                operand,
                conditions,
                else_result,
            } => {
                write!(f, "CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for when in conditions {
                    write!(f, " WHEN {} THEN {}", when.condition, when.result)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {else_result}")?;
                }
                write!(f, " END")
            }
            Self::Subquery(_) => write!(f, "(<subquery>)"),
            Self::Exists { negated, .. } => {
                write!(f, "{}EXISTS (<subquery>)", if *negated { "NOT " } else { "" })
            }
            Self::InSubquery { expr, negated, .. } => write!(
                f,
                "{expr} {}IN (<subquery>)",
                if *negated { "NOT " } else { "" }
            ),
            Self::Nested(expr) => write!(f, "({expr})"),
        }
    }
}

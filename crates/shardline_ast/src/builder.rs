//! Helpers for constructing statement trees directly.
//!
//! Used by callers that build statements without going through the SQL
//! parser, and by tests.

use crate::ast::{
    Cte, Expr, Ident, JoinCondition, JoinTable, JoinType, LimitClause, Literal, ObjectReference,
    OrderByExpr, ParameterMarker, Projection, QuoteStyle, SelectBody, SelectStatement, SetExpr,
    SetOperator, SimpleTable, Span, StatementAttributes, SubqueryTable, TableReference,
    WildcardProjection, WithClause,
};
use crate::ast::ColumnRef;

/// Parse a single identifier, honoring surrounding quotes.
pub fn ident(s: &str) -> Ident {
    let quoted = |open: char, close: char, style: QuoteStyle| {
        if s.len() >= 2 && s.starts_with(open) && s.ends_with(close) {
            Some(Ident::quoted(&s[1..s.len() - 1], style))
        } else {
            None
        }
    };

    quoted('"', '"', QuoteStyle::DoubleQuote)
        .or_else(|| quoted('`', '`', QuoteStyle::Backtick))
        .or_else(|| quoted('[', ']', QuoteStyle::Bracket))
        .unwrap_or_else(|| Ident::from_string(s))
}

/// Dotted object name, e.g. `db.schema.t`. Quoted parts must not contain dots.
pub fn object(name: &str) -> ObjectReference {
    ObjectReference(name.split('.').map(ident).collect())
}

pub fn table(name: &str) -> SimpleTable {
    SimpleTable::new(object(name))
}

pub fn table_as(name: &str, alias: &str) -> SimpleTable {
    SimpleTable {
        alias: Some(ident(alias)),
        ..table(name)
    }
}

pub fn col(name: &str) -> ColumnRef {
    ColumnRef::new(ident(name), None)
}

pub fn qcol(owner: &str, name: &str) -> ColumnRef {
    ColumnRef::new(ident(name), Some(ident(owner)))
}

pub fn number(n: i64) -> Expr {
    Expr::Literal(Literal::Number(n.to_string()))
}

/// Parameter marker at the given position. The span is synthesized from the
/// index so markers stay ordered.
pub fn param(index: usize) -> Expr {
    Expr::Parameter(marker(index))
}

pub fn marker(index: usize) -> ParameterMarker {
    ParameterMarker {
        index,
        span: Span::new(index * 2, index * 2),
    }
}

/// Attributes carrying `count` parameter markers.
pub fn with_parameters(count: usize) -> StatementAttributes {
    StatementAttributes {
        parameter_markers: (0..count).map(marker).collect::<Vec<_>>().into(),
        ..Default::default()
    }
}

pub fn join(
    left: impl Into<TableReference>,
    right: impl Into<TableReference>,
    join_type: JoinType,
    condition: JoinCondition,
) -> TableReference {
    TableReference::from(JoinTable {
        left: left.into(),
        right: right.into(),
        join_type,
        natural: false,
        condition,
        derived_columns: None,
    })
}

pub fn natural_join(
    left: impl Into<TableReference>,
    right: impl Into<TableReference>,
    join_type: JoinType,
) -> TableReference {
    TableReference::from(JoinTable {
        left: left.into(),
        right: right.into(),
        join_type,
        natural: true,
        condition: JoinCondition::None,
        derived_columns: None,
    })
}

pub fn using(columns: &[&str]) -> JoinCondition {
    JoinCondition::Using(columns.iter().map(|c| col(c)).collect())
}

pub fn derived(query: SelectStatement, alias: &str) -> TableReference {
    TableReference::from(SubqueryTable {
        query: Box::new(query),
        alias: Some(ident(alias)),
        column_aliases: Vec::new(),
        lateral: false,
        span: Span::default(),
        columns: None,
    })
}

/// Combine two queries with a set operator. Attributes are taken from the left
/// query.
pub fn set_operation(
    left: SelectStatement,
    op: SetOperator,
    all: bool,
    right: SelectStatement,
) -> SelectStatement {
    SelectStatement {
        attributes: left.attributes,
        with: None,
        body: SetExpr::SetOperation {
            op,
            all,
            left: Box::new(left.body),
            right: Box::new(right.body),
        },
        order_by: Vec::new(),
        limit: None,
        output_columns: None,
    }
}

#[derive(Debug, Default)]
pub struct SelectBuilder {
    attributes: StatementAttributes,
    with: Option<WithClause>,
    distinct: bool,
    projections: Vec<Projection>,
    from: Option<TableReference>,
    where_expr: Option<Expr>,
    group_by: Vec<Expr>,
    having: Option<Expr>,
    order_by: Vec<OrderByExpr>,
    limit: Option<LimitClause>,
}

impl SelectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attributes(mut self, attributes: StatementAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn wildcard(mut self) -> Self {
        self.projections.push(Projection::Wildcard(WildcardProjection {
            owner: None,
            span: Span::default(),
            expanded: None,
        }));
        self
    }

    pub fn qualified_wildcard(mut self, owner: &str) -> Self {
        self.projections.push(Projection::Wildcard(WildcardProjection {
            owner: Some(ident(owner)),
            span: Span::default(),
            expanded: None,
        }));
        self
    }

    pub fn project(mut self, expr: Expr) -> Self {
        self.projections.push(Projection::Expr { expr, alias: None });
        self
    }

    pub fn project_as(mut self, expr: Expr, alias: &str) -> Self {
        self.projections.push(Projection::Expr {
            expr,
            alias: Some(ident(alias)),
        });
        self
    }

    pub fn from(mut self, table: impl Into<TableReference>) -> Self {
        self.from = Some(table.into());
        self
    }

    pub fn filter(mut self, expr: Expr) -> Self {
        self.where_expr = Some(expr);
        self
    }

    pub fn group_by(mut self, expr: Expr) -> Self {
        self.group_by.push(expr);
        self
    }

    pub fn having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn order_by(mut self, expr: Expr, desc: bool) -> Self {
        self.order_by.push(OrderByExpr {
            expr,
            desc,
            nulls_first: None,
        });
        self
    }

    pub fn limit(mut self, limit: Expr, offset: Option<Expr>) -> Self {
        self.limit = Some(LimitClause {
            limit: Some(limit),
            offset,
        });
        self
    }

    pub fn cte(mut self, alias: &str, column_aliases: &[&str], query: SelectStatement) -> Self {
        let cte = Cte {
            alias: ident(alias),
            column_aliases: column_aliases.iter().map(|c| ident(c)).collect(),
            query: Box::new(query),
            span: Span::default(),
        };
        self.with
            .get_or_insert_with(|| WithClause {
                recursive: false,
                ctes: Vec::new(),
            })
            .ctes
            .push(cte);
        self
    }

    pub fn recursive(mut self) -> Self {
        if let Some(with) = self.with.as_mut() {
            with.recursive = true;
        }
        self
    }

    pub fn build(self) -> SelectStatement {
        SelectStatement {
            attributes: self.attributes,
            with: self.with,
            body: SetExpr::Select(Box::new(SelectBody {
                distinct: self.distinct,
                projections: self.projections,
                from: self.from,
                where_expr: self.where_expr,
                group_by: self.group_by,
                having: self.having,
            })),
            order_by: self.order_by,
            limit: self.limit,
            output_columns: None,
        }
    }
}

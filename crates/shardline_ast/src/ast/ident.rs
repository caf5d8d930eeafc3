use std::fmt;

use shardline_error::{BindError, BindErrorKind, Result};
use unicase::UniCase;

/// Start and stop offsets of a segment in the original SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub stop: usize,
}

impl Span {
    pub const fn new(start: usize, stop: usize) -> Self {
        Span { start, stop }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStyle {
    /// `"ident"`
    DoubleQuote,
    /// `` `ident` ``
    Backtick,
    /// `[ident]`
    Bracket,
}

impl QuoteStyle {
    fn delimiters(&self) -> (char, char) {
        match self {
            Self::DoubleQuote => ('"', '"'),
            Self::Backtick => ('`', '`'),
            Self::Bracket => ('[', ']'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub value: String,
    pub quote: Option<QuoteStyle>,
}

impl Ident {
    pub fn from_string(s: impl Into<String>) -> Self {
        Ident {
            value: s.into(),
            quote: None,
        }
    }

    pub fn quoted(s: impl Into<String>, quote: QuoteStyle) -> Self {
        Ident {
            value: s.into(),
            quote: Some(quote),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn is_quoted(&self) -> bool {
        self.quote.is_some()
    }

    /// Case insensitive comparison of the identifier values, ignoring quotes.
    pub fn matches(&self, other: &str) -> bool {
        UniCase::new(self.value.as_str()) == UniCase::new(other)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.quote {
            Some(quote) => {
                let (open, close) = quote.delimiters();
                write!(f, "{open}{}{close}", self.value)
            }
            None => write!(f, "{}", self.value),
        }
    }
}

/// A possibly qualified object name, e.g. `db.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectReference(pub Vec<Ident>);

impl ObjectReference {
    pub fn from_strings<S>(strings: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        ObjectReference(strings.into_iter().map(Ident::from_string).collect())
    }

    /// The unqualified name (last part).
    pub fn base(&self) -> Result<&Ident> {
        self.0.last().ok_or_else(|| {
            BindError::new(BindErrorKind::Internal, "Empty object reference")
        })
    }

    /// Everything but the base name, outermost first.
    pub fn qualifiers(&self) -> &[Ident] {
        match self.0.len() {
            0 => &[],
            n => &self.0[..n - 1],
        }
    }

    /// The immediate qualifier of the base name, if any.
    pub fn owner(&self) -> Option<&Ident> {
        self.qualifiers().last()
    }

    /// The qualifier of the owner, if any.
    pub fn owner_of_owner(&self) -> Option<&Ident> {
        let qualifiers = self.qualifiers();
        match qualifiers.len() {
            0 | 1 => None,
            n => Some(&qualifiers[n - 2]),
        }
    }
}

impl fmt::Display for ObjectReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strings: Vec<_> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", strings.join("."))
    }
}

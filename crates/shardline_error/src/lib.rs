use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

use serde::{Deserialize, Serialize};

pub type Result<T, E = BindError> = std::result::Result<T, E>;

/// Returns a `DialectMismatch` error for a construct the binder doesn't
/// support.
#[macro_export]
macro_rules! not_implemented {
    ($($arg:tt)+) => {{
        let msg = format!($($arg)+);
        return Err($crate::BindError::new(
            $crate::BindErrorKind::DialectMismatch,
            format!("Not yet implemented: {msg}"),
        ));
    }};
}

/// Kinds of errors that may come out of binding.
///
/// The calling layer maps these onto protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindErrorKind {
    UnknownTable,
    UnknownColumn,
    AmbiguousReference,
    DuplicateIdentity,
    DialectMismatch,
    NestingTooDeep,
    UnknownDatabase,
    NoDatabaseSelected,
    UnknownSchema,
    TableExists,
    DuplicateColumn,
    UnknownIndex,
    DuplicateIndex,
    /// Broken invariant inside the binder itself.
    Internal,
}

impl fmt::Display for BindErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::UnknownTable => "unknown table",
            Self::UnknownColumn => "unknown column",
            Self::AmbiguousReference => "ambiguous reference",
            Self::DuplicateIdentity => "duplicate identity",
            Self::DialectMismatch => "dialect mismatch",
            Self::NestingTooDeep => "nesting too deep",
            Self::UnknownDatabase => "unknown database",
            Self::NoDatabaseSelected => "no database selected",
            Self::UnknownSchema => "unknown schema",
            Self::TableExists => "table exists",
            Self::DuplicateColumn => "duplicate column",
            Self::UnknownIndex => "unknown index",
            Self::DuplicateIndex => "duplicate index",
            Self::Internal => "internal",
        };
        write!(f, "{s}")
    }
}

/// Position of a segment in the original SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ErrorPosition {
    pub start: usize,
    pub stop: usize,
}

#[derive(Debug)]
pub struct BindError {
    inner: Box<BindErrorInner>,
}

#[derive(Debug)]
struct BindErrorInner {
    kind: BindErrorKind,
    msg: String,
    /// Name the error is about, if any (table, column, alias, index).
    name: Option<String>,
    position: Option<ErrorPosition>,
    source: Option<Box<dyn Error + Send + Sync>>,
    backtrace: Backtrace,
}

impl BindError {
    pub fn new(kind: BindErrorKind, msg: impl Into<String>) -> Self {
        BindError {
            inner: Box::new(BindErrorInner {
                kind,
                msg: msg.into(),
                name: None,
                position: None,
                source: None,
                backtrace: Backtrace::capture(),
            }),
        }
    }

    pub fn with_source(
        kind: BindErrorKind,
        msg: impl Into<String>,
        source: Box<dyn Error + Send + Sync>,
    ) -> Self {
        let mut err = Self::new(kind, msg);
        err.inner.source = Some(source);
        err
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(BindErrorKind::Internal, msg)
    }

    pub fn unknown_table(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            BindErrorKind::UnknownTable,
            format!("Table or view '{name}' does not exist"),
        )
        .with_name(name)
    }

    pub fn unknown_column(name: impl Into<String>, clause: &str) -> Self {
        let name = name.into();
        Self::new(
            BindErrorKind::UnknownColumn,
            format!("Unknown column '{name}' in '{clause}'"),
        )
        .with_name(name)
    }

    pub fn ambiguous(name: impl Into<String>, clause: &str) -> Self {
        let name = name.into();
        Self::new(
            BindErrorKind::AmbiguousReference,
            format!("Column '{name}' in {clause} is ambiguous"),
        )
        .with_name(name)
    }

    pub fn duplicate_identity(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(
            BindErrorKind::DuplicateIdentity,
            format!("Not unique table/alias: '{name}'"),
        )
        .with_name(name)
    }

    /// Attach the name this error is about.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = Some(name.into());
        self
    }

    /// Attach a source position. Keeps an already set position since the
    /// innermost segment is the most precise.
    pub fn with_position(mut self, start: usize, stop: usize) -> Self {
        if self.inner.position.is_none() {
            self.inner.position = Some(ErrorPosition { start, stop });
        }
        self
    }

    pub fn kind(&self) -> BindErrorKind {
        self.inner.kind
    }

    pub fn get_msg(&self) -> &str {
        self.inner.msg.as_str()
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn position(&self) -> Option<ErrorPosition> {
        self.inner.position
    }

    pub fn get_backtrace(&self) -> Option<&Backtrace> {
        if self.inner.backtrace.status() == BacktraceStatus::Captured {
            Some(&self.inner.backtrace)
        } else {
            None
        }
    }
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.msg)?;
        if let Some(position) = &self.inner.position {
            write!(f, " (at {}..{})", position.start, position.stop)?;
        }
        if let Some(source) = &self.inner.source {
            write!(f, " Error source: {source}")?;
        }
        Ok(())
    }
}

impl Error for BindError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.inner.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl From<fmt::Error> for BindError {
    fn from(value: fmt::Error) -> Self {
        Self::with_source(BindErrorKind::Internal, "Format error", Box::new(value))
    }
}

pub trait ResultExt<T, E> {
    /// Wrap an error with a message, keeping the original as the source.
    fn context(self, kind: BindErrorKind, msg: &'static str) -> Result<T>;
}

impl<T, E: Error + Send + Sync + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn context(self, kind: BindErrorKind, msg: &'static str) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(BindError::with_source(kind, msg, Box::new(e))),
        }
    }
}

pub trait OptionExt<T> {
    /// Turn `None` into an internal error.
    fn required(self, what: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn required(self, what: &'static str) -> Result<T> {
        match self {
            Some(v) => Ok(v),
            None => Err(BindError::internal(format!("Missing {what}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unsupported() -> Result<()> {
        not_implemented!("binding {}", "LOCK TABLES")
    }

    #[test]
    fn not_implemented_is_dialect_mismatch() {
        let err = unsupported().unwrap_err();
        assert_eq!(BindErrorKind::DialectMismatch, err.kind());
        assert_eq!("Not yet implemented: binding LOCK TABLES", err.get_msg());
    }

    #[test]
    fn position_keeps_innermost() {
        let err = BindError::unknown_table("t2")
            .with_position(10, 11)
            .with_position(0, 40);
        assert_eq!(Some(ErrorPosition { start: 10, stop: 11 }), err.position());
        assert_eq!(Some("t2"), err.name());
        assert_eq!("Table or view 't2' does not exist (at 10..11)", err.to_string());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let kind = serde_json::to_string(&BindErrorKind::NestingTooDeep).unwrap();
        assert_eq!("\"nesting_too_deep\"", kind);
    }

    #[test]
    fn backtrace_only_when_captured() {
        let err = BindError::internal("missing scope");
        if let Some(backtrace) = err.get_backtrace() {
            assert_eq!(BacktraceStatus::Captured, backtrace.status());
        }
    }
}

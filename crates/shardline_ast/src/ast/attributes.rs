use std::sync::Arc;

use super::{Ident, Span};

/// A `?` (or `$n`) placeholder in the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterMarker {
    /// Zero based position among all markers in the statement text.
    pub index: usize,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentSegment {
    pub text: String,
    pub span: Span,
}

/// Dialect specific hint or pragma, e.g. `/* SHARDLINE_HINT: ... */`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintSegment {
    pub text: String,
    pub span: Span,
}

impl HintSegment {
    const SKIP_METADATA_VALIDATE: &'static str = "SKIP_METADATA_VALIDATE";

    /// Checks if this hint turns off the "object must (not) exist" checks.
    pub fn skip_metadata_validate(&self) -> bool {
        let text = self.text.trim();
        let body = match text.split_once(':') {
            Some((_prefix, body)) => body,
            None => text,
        };

        body.split(|c| c == ',' || c == ';')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| {
                key.trim().eq_ignore_ascii_case(Self::SKIP_METADATA_VALIDATE)
                    && value.trim().eq_ignore_ascii_case("true")
            })
    }
}

/// Statement level attributes that binding never changes.
///
/// All lists are reference counted so a bound statement can share them with
/// the raw statement it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementAttributes {
    pub parameter_markers: Arc<[ParameterMarker]>,
    pub comments: Arc<[CommentSegment]>,
    /// Names declared as variables (e.g. procedure parameters) that column
    /// references may resolve to.
    pub variable_names: Arc<[Ident]>,
    pub hints: Arc<[HintSegment]>,
}

impl Default for StatementAttributes {
    fn default() -> Self {
        StatementAttributes {
            parameter_markers: Vec::new().into(),
            comments: Vec::new().into(),
            variable_names: Vec::new().into(),
            hints: Vec::new().into(),
        }
    }
}

impl StatementAttributes {
    pub fn parameter_count(&self) -> usize {
        self.parameter_markers.len()
    }

    pub fn skip_metadata_validate(&self) -> bool {
        self.hints.iter().any(|h| h.skip_metadata_validate())
    }

    /// Checks if both sets of attributes point to the same underlying lists.
    pub fn shares_with(&self, other: &StatementAttributes) -> bool {
        Arc::ptr_eq(&self.parameter_markers, &other.parameter_markers)
            && Arc::ptr_eq(&self.comments, &other.comments)
            && Arc::ptr_eq(&self.variable_names, &other.variable_names)
            && Arc::ptr_eq(&self.hints, &other.hints)
    }
}

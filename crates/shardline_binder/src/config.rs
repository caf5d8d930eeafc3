use serde::Deserialize;

/// Knobs for a statement binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BinderConfig {
    /// Maximum depth of nested statements (subqueries, CTEs, derived tables)
    /// before binding fails with `NestingTooDeep`.
    pub max_nesting_depth: usize,
    /// Skip the "object must (not) exist" checks for DDL targets.
    ///
    /// A statement may also turn this on through a hint.
    pub skip_metadata_validate: bool,
}

impl Default for BinderConfig {
    fn default() -> Self {
        BinderConfig {
            max_nesting_depth: 64,
            skip_metadata_validate: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_uses_defaults() {
        let config: BinderConfig = serde_json::from_str(r#"{"max_nesting_depth": 8}"#).unwrap();
        assert_eq!(
            BinderConfig {
                max_nesting_depth: 8,
                skip_metadata_validate: false,
            },
            config
        );
    }
}

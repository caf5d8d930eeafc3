use serde::{Deserialize, Serialize};
use unicase::UniCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    #[default]
    Table,
    View,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    /// Hidden columns are resolvable by name but not part of `*` expansion.
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ColumnEntry {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        ColumnEntry {
            name: name.into(),
            data_type: data_type.into(),
            visible: true,
        }
    }
}

/// A table or view as stored in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    pub name: String,
    #[serde(default)]
    pub kind: TableKind,
    pub columns: Vec<ColumnEntry>,
    #[serde(default)]
    pub indexes: Vec<String>,
}

impl TableEntry {
    pub fn is_view(&self) -> bool {
        self.kind == TableKind::View
    }

    pub fn find_column(&self, name: &str) -> Option<&ColumnEntry> {
        self.columns
            .iter()
            .find(|c| UniCase::new(c.name.as_str()) == UniCase::new(name))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes
            .iter()
            .any(|i| UniCase::new(i.as_str()) == UniCase::new(name))
    }
}

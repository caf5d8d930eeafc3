use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shardline_error::{BindError, BindErrorKind, Result, ResultExt};
use unicase::UniCase;

use super::{dialect::Dialect, entry::TableEntry};

/// Serializable description of a catalog, the form snapshots are loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDefinition {
    pub dialect: Dialect,
    /// Database selected by the session, if any.
    #[serde(default)]
    pub current_database: Option<String>,
    pub databases: Vec<DatabaseDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseDefinition {
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<SchemaDefinition>,
    /// Tables of a dialect without schemas. Placed in a schema named after
    /// the database.
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableEntry>,
}

/// Read only view of catalog metadata for the duration of a bind call.
///
/// All lookups are case insensitive.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    dialect: Dialect,
    current_database: Option<String>,
    databases: IndexMap<UniCase<String>, DatabaseEntry>,
}

#[derive(Debug, Clone)]
pub struct DatabaseEntry {
    pub name: String,
    schemas: IndexMap<UniCase<String>, SchemaEntry>,
}

#[derive(Debug, Clone)]
pub struct SchemaEntry {
    pub name: String,
    tables: IndexMap<UniCase<String>, Arc<TableEntry>>,
}

impl CatalogSnapshot {
    pub fn new(dialect: Dialect, current_database: Option<String>) -> Self {
        CatalogSnapshot {
            dialect,
            current_database,
            databases: IndexMap::new(),
        }
    }

    pub fn try_from_definition(def: CatalogDefinition) -> Result<Self> {
        let mut snapshot = CatalogSnapshot::new(def.dialect, def.current_database);
        for db in def.databases {
            let mut database = DatabaseEntry::new(db.name);
            if !db.tables.is_empty() {
                let mut schema = SchemaEntry::new(database.name.clone());
                for table in db.tables {
                    schema.add_table(table)?;
                }
                database.add_schema(schema)?;
            }
            for schema_def in db.schemas {
                let mut schema = SchemaEntry::new(schema_def.name);
                for table in schema_def.tables {
                    schema.add_table(table)?;
                }
                database.add_schema(schema)?;
            }
            snapshot.add_database(database)?;
        }

        Ok(snapshot)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let def: CatalogDefinition =
            serde_json::from_str(s).context(BindErrorKind::Internal, "Failed to parse catalog")?;
        Self::try_from_definition(def)
    }

    pub fn add_database(&mut self, database: DatabaseEntry) -> Result<()> {
        let key = UniCase::new(database.name.clone());
        if self.databases.contains_key(&key) {
            return Err(BindError::internal(format!(
                "Duplicate database in catalog: {}",
                database.name
            )));
        }
        self.databases.insert(key, database);
        Ok(())
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn current_database(&self) -> Option<&str> {
        self.current_database.as_deref()
    }

    pub fn get_database(&self, name: &str) -> Option<&DatabaseEntry> {
        self.databases.get(&UniCase::new(name.to_string()))
    }

    /// Name of the schema unqualified names resolve to in `database`.
    pub fn default_schema_name<'a>(&self, database: &'a str) -> &'a str {
        match self.dialect.default_schema() {
            Some(schema) => schema,
            None => database,
        }
    }
}

impl DatabaseEntry {
    pub fn new(name: impl Into<String>) -> Self {
        DatabaseEntry {
            name: name.into(),
            schemas: IndexMap::new(),
        }
    }

    pub fn add_schema(&mut self, schema: SchemaEntry) -> Result<()> {
        let key = UniCase::new(schema.name.clone());
        if self.schemas.contains_key(&key) {
            return Err(BindError::internal(format!(
                "Duplicate schema in database '{}': {}",
                self.name, schema.name
            )));
        }
        self.schemas.insert(key, schema);
        Ok(())
    }

    pub fn get_schema(&self, name: &str) -> Option<&SchemaEntry> {
        self.schemas.get(&UniCase::new(name.to_string()))
    }
}

impl SchemaEntry {
    pub fn new(name: impl Into<String>) -> Self {
        SchemaEntry {
            name: name.into(),
            tables: IndexMap::new(),
        }
    }

    pub fn add_table(&mut self, table: TableEntry) -> Result<()> {
        let key = UniCase::new(table.name.clone());
        if self.tables.contains_key(&key) {
            return Err(BindError::new(
                BindErrorKind::TableExists,
                format!("Duplicate table in schema '{}': {}", self.name, table.name),
            ));
        }
        self.tables.insert(key, Arc::new(table));
        Ok(())
    }

    pub fn get_table(&self, name: &str) -> Option<&Arc<TableEntry>> {
        self.tables.get(&UniCase::new(name.to_string()))
    }

    /// Finds the table owning an index with the given name.
    pub fn find_index_owner(&self, index: &str) -> Option<&Arc<TableEntry>> {
        self.tables.values().find(|t| t.has_index(index))
    }
}

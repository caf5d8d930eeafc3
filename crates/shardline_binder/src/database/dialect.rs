use std::fmt;

use serde::{Deserialize, Serialize};
use shardline_ast::ast::Ident;
use unicase::UniCase;

/// How unquoted identifiers are normalized before they're stored or compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierFolding {
    Lower,
    Upper,
    /// Keep the identifier as written, compare case insensitively.
    Preserve,
}

/// The SQL dialect of the connection a statement came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    MySql,
    PostgreSql,
    OpenGauss,
    Oracle,
    SqlServer,
    Sql92,
}

const PG_SYSTEM_SCHEMAS: &[&str] = &["information_schema", "pg_catalog"];
const OPENGAUSS_SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "pg_catalog",
    "dbe_perf",
    "blockchain",
    "sqladvisor",
];
const MYSQL_SYSTEM_SCHEMAS: &[&str] = &["information_schema", "performance_schema", "mysql", "sys"];

/// Tables that resolve to `pg_catalog` when written without a schema.
const PG_CATALOG_TABLES: &[&str] = &[
    "pg_class",
    "pg_namespace",
    "pg_database",
    "pg_tables",
    "pg_tablespace",
    "pg_roles",
    "pg_type",
    "pg_attribute",
    "pg_index",
    "pg_settings",
];

impl Dialect {
    pub fn folding(&self) -> IdentifierFolding {
        match self {
            Self::PostgreSql | Self::OpenGauss => IdentifierFolding::Lower,
            Self::Oracle => IdentifierFolding::Upper,
            Self::MySql | Self::SqlServer | Self::Sql92 => IdentifierFolding::Preserve,
        }
    }

    /// Whether names may carry a schema between the database and the table.
    ///
    /// When false, `a.b` means database `a`, table `b`.
    pub fn has_schemas(&self) -> bool {
        matches!(
            self,
            Self::PostgreSql | Self::OpenGauss | Self::Oracle | Self::SqlServer
        )
    }

    /// Schema used for unqualified names. `None` means the schema is named
    /// after the database.
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Self::PostgreSql | Self::OpenGauss => Some("public"),
            Self::SqlServer => Some("dbo"),
            Self::MySql | Self::Oracle | Self::Sql92 => None,
        }
    }

    pub fn supports_dual(&self) -> bool {
        matches!(self, Self::MySql | Self::Oracle)
    }

    /// SQL Server spells lateral joins as `APPLY`.
    pub fn supports_lateral(&self) -> bool {
        !matches!(self, Self::SqlServer)
    }

    pub fn system_schemas(&self) -> &'static [&'static str] {
        match self {
            Self::PostgreSql => PG_SYSTEM_SCHEMAS,
            Self::OpenGauss => OPENGAUSS_SYSTEM_SCHEMAS,
            Self::MySql => MYSQL_SYSTEM_SCHEMAS,
            Self::Oracle | Self::SqlServer | Self::Sql92 => &[],
        }
    }

    pub fn is_system_schema(&self, name: &str) -> bool {
        self.system_schemas()
            .iter()
            .any(|s| UniCase::new(*s) == UniCase::new(name))
    }

    /// Schema an unqualified system table lives in, if `table` is one.
    pub fn system_schema_for_table(&self, table: &str) -> Option<&'static str> {
        match self {
            Self::PostgreSql | Self::OpenGauss => PG_CATALOG_TABLES
                .iter()
                .any(|t| UniCase::new(*t) == UniCase::new(table))
                .then_some("pg_catalog"),
            _ => None,
        }
    }

    /// Canonical form of an identifier.
    ///
    /// Quoted identifiers are kept as written. Unquoted identifiers are folded.
    pub fn canonical(&self, ident: &Ident) -> String {
        if ident.is_quoted() {
            return ident.value.clone();
        }
        match self.folding() {
            IdentifierFolding::Lower => ident.value.to_lowercase(),
            IdentifierFolding::Upper => ident.value.to_uppercase(),
            IdentifierFolding::Preserve => ident.value.clone(),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MySql => "MySQL",
            Self::PostgreSql => "PostgreSQL",
            Self::OpenGauss => "openGauss",
            Self::Oracle => "Oracle",
            Self::SqlServer => "SQLServer",
            Self::Sql92 => "SQL92",
        };
        write!(f, "{s}")
    }
}

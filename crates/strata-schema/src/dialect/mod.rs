//! Dialect-specific DDL rendering.
//!
//! A [`DdlDialect`] turns validated metadata into SQL text. It performs no
//! I/O: version-dependent syntax is decided by the caller, which passes a
//! `guard` flag once it knows whether the server accepts `IF EXISTS`.
//!
//! Every renderer returns whole statements. Operations that need more than
//! one statement on a dialect return them in execution order.

mod mysql;
mod postgres;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use serde::{Deserialize, Serialize};
use strata_core::metadata::{Column, ColumnType, ForeignKey};

use crate::error::{Result, SchemaError};
use crate::version::{DatabaseVersion, Flavor};

/// How one semantic column type is spelled by a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    /// Semantic type.
    pub column_type: ColumnType,
    /// SQL type keyword.
    pub sql: &'static str,
    /// Whether the column length is rendered as `SQL(length)`.
    pub sized: bool,
    /// Base type name the engine reports on introspection.
    pub base: &'static str,
}

impl TypeMapping {
    pub(crate) const fn new(
        column_type: ColumnType,
        sql: &'static str,
        sized: bool,
        base: &'static str,
    ) -> Self {
        Self {
            column_type,
            sql,
            sized,
            base,
        }
    }
}

/// Secondary index flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    /// UNIQUE index.
    Unique,
    /// FULLTEXT index.
    Fulltext,
    /// SPATIAL index.
    Spatial,
}

impl IndexKind {
    /// Keyword placed before `INDEX`.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Unique => "UNIQUE",
            Self::Fulltext => "FULLTEXT",
            Self::Spatial => "SPATIAL",
        }
    }
}

/// Object kinds whose DROP can carry an `IF EXISTS` guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardedObject {
    /// `DROP TABLE`.
    Table,
    /// `DROP COLUMN`.
    Column,
    /// `DROP INDEX`.
    Index,
    /// Dropping a unique key.
    UniqueKey,
    /// Dropping a foreign key.
    ForeignKey,
}

impl GuardedObject {
    /// Human-readable name for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Column => "column",
            Self::Index => "index",
            Self::UniqueKey => "unique key",
            Self::ForeignKey => "foreign key",
        }
    }
}

/// Name given to an index declared without one: `idx_<col1>_<col2>...`.
#[must_use]
pub fn index_name(columns: &[&str]) -> String {
    format!("idx_{}", columns.join("_"))
}

/// Name given to a unique key declared without one: `uniq_<col1>_<col2>...`.
#[must_use]
pub fn unique_key_name(columns: &[&str]) -> String {
    format!("uniq_{}", columns.join("_"))
}

fn if_exists(guard: bool) -> &'static str {
    if guard {
        "IF EXISTS "
    } else {
        ""
    }
}

/// Trait for dialect-specific DDL generation.
pub trait DdlDialect {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn quote_char(&self) -> char;

    /// Quotes an identifier. Names are validated before they get here.
    fn quote_identifier(&self, name: &str) -> String {
        let q = self.quote_char();
        format!("{q}{name}{q}")
    }

    /// Quotes and joins a column list.
    fn quote_list(&self, names: &[&str]) -> String {
        names
            .iter()
            .map(|n| self.quote_identifier(n))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The closed type table of this dialect.
    fn type_mapping(&self) -> &'static [TypeMapping];

    /// Looks up `column_type`, failing loudly when the table lacks it.
    fn mapping(&self, column_type: ColumnType) -> Result<&'static TypeMapping> {
        self.type_mapping()
            .iter()
            .find(|m| m.column_type == column_type)
            .ok_or_else(|| SchemaError::UnsupportedType {
                dialect: self.name(),
                column_type: column_type.to_string(),
            })
    }

    /// Full SQL type of `column`, with its length when the type is sized.
    fn normalize_type(&self, column: &Column) -> Result<String> {
        let mapping = self.mapping(column.column_type())?;
        let sql = match (mapping.sized, column.length(), column.scale()) {
            (true, Some(length), Some(scale)) if column.column_type() == ColumnType::Decimal => {
                format!("{}({length},{scale})", mapping.sql)
            }
            (true, Some(length), _) => format!("{}({length})", mapping.sql),
            _ => mapping.sql.to_string(),
        };
        Ok(sql)
    }

    /// Base type name the engine reports for `column_type`.
    fn base_type(&self, column_type: ColumnType) -> Result<&'static str> {
        Ok(self.mapping(column_type)?.base)
    }

    /// Renders one column definition. `inline_keys` adds PRIMARY KEY and
    /// UNIQUE to the definition itself, as ADD COLUMN needs.
    fn column_definition(&self, column: &Column, inline_keys: bool) -> Result<String>;

    /// First server version whose DROP of `object` accepts `IF EXISTS`, or
    /// `None` if the flavor never does.
    fn existence_guard_since(&self, object: GuardedObject, flavor: Flavor)
        -> Option<DatabaseVersion>;

    /// Whether `version` accepts `IF EXISTS` when dropping `object`.
    fn supports_guard(&self, object: GuardedObject, version: &DatabaseVersion) -> bool {
        self.existence_guard_since(object, version.flavor)
            .is_some_and(|since| version.at_least(&since))
    }

    /// Whether DDL on this dialect can run inside a transaction. Multi-statement
    /// operations are then applied atomically.
    fn transactional_ddl(&self) -> bool {
        false
    }

    /// Table-level UNIQUE constraint for a single unique column.
    fn column_unique_constraint(&self, table: &str, column: &str) -> String;

    /// Extra statements that attach comments to `columns`. Empty where
    /// comments are part of the column definition.
    fn column_comments(&self, _table: &str, _columns: &[&Column]) -> Vec<String> {
        Vec::new()
    }

    /// Generates CREATE TABLE plus any follow-up statements.
    fn create_table(&self, table: &str, columns: &[Column]) -> Result<Vec<String>> {
        if columns.is_empty() {
            return Err(SchemaError::NoColumns(table.to_string()));
        }

        let mut defs = Vec::with_capacity(columns.len() + 1);
        for column in columns {
            defs.push(format!("    {}", self.column_definition(column, false)?));
        }

        let primary: Vec<&str> = columns
            .iter()
            .filter(|c| c.is_primary())
            .map(Column::name)
            .collect();
        if !primary.is_empty() {
            defs.push(format!("    PRIMARY KEY ({})", self.quote_list(&primary)));
        }

        for column in columns.iter().filter(|c| c.is_unique()) {
            defs.push(format!(
                "    {}",
                self.column_unique_constraint(table, column.name())
            ));
        }

        let mut statements = vec![format!(
            "CREATE TABLE {} (\n{}\n)",
            self.quote_identifier(table),
            defs.join(",\n")
        )];
        let all: Vec<&Column> = columns.iter().collect();
        statements.extend(self.column_comments(table, &all));
        Ok(statements)
    }

    /// Generates DROP TABLE.
    fn drop_table(&self, table: &str, guard: bool) -> String {
        format!("DROP TABLE {}{}", if_exists(guard), self.quote_identifier(table))
    }

    /// Generates ADD COLUMN plus any follow-up statements.
    fn add_column(&self, table: &str, column: &Column) -> Result<Vec<String>> {
        let mut statements = vec![format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.quote_identifier(table),
            self.column_definition(column, true)?
        )];
        statements.extend(self.column_comments(table, &[column]));
        Ok(statements)
    }

    /// Generates DROP COLUMN.
    fn drop_column(&self, table: &str, column: &str, guard: bool) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}{}",
            self.quote_identifier(table),
            if_exists(guard),
            self.quote_identifier(column)
        )
    }

    /// Renames `old` to `column.name()` and applies the full definition.
    fn rename_column(&self, table: &str, old: &str, column: &Column) -> Result<Vec<String>>;

    /// Applies the full definition of `column` to the existing column of
    /// the same name (or its declared previous name).
    fn alter_column(&self, table: &str, column: &Column) -> Result<Vec<String>>;

    /// Keyword for `kind` in CREATE INDEX.
    fn index_keyword(&self, kind: IndexKind) -> Result<&'static str> {
        match kind {
            IndexKind::Unique => Ok(kind.keyword()),
            IndexKind::Fulltext => Err(SchemaError::Unsupported {
                dialect: self.name(),
                operation: "FULLTEXT indexes",
            }),
            IndexKind::Spatial => Err(SchemaError::Unsupported {
                dialect: self.name(),
                operation: "SPATIAL indexes",
            }),
        }
    }

    /// Generates CREATE INDEX.
    fn create_index(
        &self,
        table: &str,
        name: &str,
        columns: &[&str],
        kind: Option<IndexKind>,
    ) -> Result<String> {
        if columns.is_empty() {
            return Err(SchemaError::NoIndexColumns(table.to_string()));
        }
        let mut sql = String::from("CREATE ");
        if let Some(kind) = kind {
            sql.push_str(self.index_keyword(kind)?);
            sql.push(' ');
        }
        sql.push_str("INDEX ");
        sql.push_str(&self.quote_identifier(name));
        sql.push_str(" ON ");
        sql.push_str(&self.quote_identifier(table));
        sql.push_str(" (");
        sql.push_str(&self.quote_list(columns));
        sql.push(')');
        Ok(sql)
    }

    /// Generates DROP INDEX.
    fn drop_index(&self, table: &str, name: &str, guard: bool) -> String;

    /// Generates ADD UNIQUE.
    fn add_unique_key(&self, table: &str, name: &str, columns: &[&str]) -> Result<String> {
        if columns.is_empty() {
            return Err(SchemaError::NoIndexColumns(table.to_string()));
        }
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({})",
            self.quote_identifier(table),
            self.quote_identifier(name),
            self.quote_list(columns)
        ))
    }

    /// Generates the statement dropping a unique key.
    fn drop_unique_key(&self, table: &str, name: &str, guard: bool) -> String;

    /// Generates ADD FOREIGN KEY.
    fn add_foreign_key(&self, fk: &ForeignKey) -> String {
        let columns: Vec<&str> = fk.columns().iter().map(String::as_str).collect();
        let referenced: Vec<&str> = fk.referenced_columns().iter().map(String::as_str).collect();

        let mut sql = format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            self.quote_identifier(fk.table()),
            self.quote_identifier(&fk.name()),
            self.quote_list(&columns),
            self.quote_identifier(fk.referenced_table()),
            self.quote_list(&referenced)
        );
        if let Some(action) = fk.on_delete() {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = fk.on_update() {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        sql
    }

    /// Generates the statement dropping a foreign key.
    fn drop_foreign_key(&self, table: &str, name: &str, guard: bool) -> String;
}

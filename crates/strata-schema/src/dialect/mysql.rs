//! MySQL and MariaDB dialect.

use strata_core::metadata::{Column, ColumnType};

use super::{if_exists, DdlDialect, GuardedObject, IndexKind, TypeMapping};
use crate::error::Result;
use crate::version::{DatabaseVersion, Flavor};

const TYPES: &[TypeMapping] = &[
    TypeMapping::new(ColumnType::Integer, "INT", true, "int"),
    TypeMapping::new(ColumnType::BigInteger, "BIGINT", true, "bigint"),
    TypeMapping::new(ColumnType::Decimal, "DECIMAL", true, "decimal"),
    TypeMapping::new(ColumnType::Float, "FLOAT", true, "float"),
    TypeMapping::new(ColumnType::Double, "DOUBLE", false, "double"),
    TypeMapping::new(ColumnType::VarChar, "VARCHAR", true, "varchar"),
    TypeMapping::new(ColumnType::Char, "CHAR", true, "char"),
    TypeMapping::new(ColumnType::Text, "TEXT", false, "text"),
    TypeMapping::new(ColumnType::Date, "DATE", false, "date"),
    TypeMapping::new(ColumnType::DateTime, "DATETIME", false, "datetime"),
    TypeMapping::new(ColumnType::Timestamp, "TIMESTAMP", false, "timestamp"),
    TypeMapping::new(ColumnType::Boolean, "TINYINT", true, "tinyint"),
    TypeMapping::new(ColumnType::Blob, "BLOB", false, "blob"),
    TypeMapping::new(ColumnType::Json, "JSON", false, "json"),
    TypeMapping::new(ColumnType::Uuid, "CHAR", true, "char"),
];

/// MySQL dialect. MariaDB servers are handled by the same dialect; only the
/// `IF EXISTS` support differs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Creates a new MySQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DdlDialect for MySqlDialect {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn type_mapping(&self) -> &'static [TypeMapping] {
        TYPES
    }

    fn column_definition(&self, column: &Column, inline_keys: bool) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(column.name()),
            self.normalize_type(column)?
        );

        sql.push_str(if column.is_nullable() { " NULL" } else { " NOT NULL" });

        if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }

        if column.is_auto_increment() {
            sql.push_str(" AUTO_INCREMENT");
        }

        if inline_keys {
            if column.is_primary() {
                sql.push_str(" PRIMARY KEY");
            }
            if column.is_unique() {
                sql.push_str(" UNIQUE");
            }
        }

        if let Some(comment) = column.comment() {
            sql.push_str(&format!(" COMMENT '{}'", comment.replace('\'', "''")));
        }

        if let Some(definition) = column.definition() {
            sql.push(' ');
            sql.push_str(definition);
        }

        Ok(sql)
    }

    fn existence_guard_since(
        &self,
        object: GuardedObject,
        flavor: Flavor,
    ) -> Option<DatabaseVersion> {
        match (flavor, object) {
            (Flavor::MySql, GuardedObject::Table) => Some(DatabaseVersion::new(flavor, 3, 23, 0)),
            (Flavor::MariaDb, GuardedObject::Table) => Some(DatabaseVersion::new(flavor, 5, 0, 0)),
            (Flavor::MariaDb, GuardedObject::Column | GuardedObject::ForeignKey) => {
                Some(DatabaseVersion::new(flavor, 10, 0, 2))
            }
            (Flavor::MariaDb, GuardedObject::Index | GuardedObject::UniqueKey) => {
                Some(DatabaseVersion::new(flavor, 10, 1, 4))
            }
            _ => None,
        }
    }

    fn column_unique_constraint(&self, _table: &str, column: &str) -> String {
        format!(
            "UNIQUE KEY {} ({})",
            self.quote_identifier(&format!("uniq_{column}")),
            self.quote_identifier(column)
        )
    }

    // Keys stay out of CHANGE COLUMN; the live column already carries them.
    fn rename_column(&self, table: &str, old: &str, column: &Column) -> Result<Vec<String>> {
        Ok(vec![format!(
            "ALTER TABLE {} CHANGE COLUMN {} {}",
            self.quote_identifier(table),
            self.quote_identifier(old),
            self.column_definition(column, false)?
        )])
    }

    fn alter_column(&self, table: &str, column: &Column) -> Result<Vec<String>> {
        let old = column.previous_name().unwrap_or_else(|| column.name());
        self.rename_column(table, old, column)
    }

    fn index_keyword(&self, kind: IndexKind) -> Result<&'static str> {
        Ok(kind.keyword())
    }

    fn drop_index(&self, table: &str, name: &str, guard: bool) -> String {
        format!(
            "ALTER TABLE {} DROP INDEX {}{}",
            self.quote_identifier(table),
            if_exists(guard),
            self.quote_identifier(name)
        )
    }

    fn drop_unique_key(&self, table: &str, name: &str, guard: bool) -> String {
        self.drop_index(table, name, guard)
    }

    fn drop_foreign_key(&self, table: &str, name: &str, guard: bool) -> String {
        format!(
            "ALTER TABLE {} DROP FOREIGN KEY {}{}",
            self.quote_identifier(table),
            if_exists(guard),
            self.quote_identifier(name)
        )
    }
}

//! PostgreSQL dialect.

use strata_core::metadata::{Column, ColumnType};

use super::{if_exists, DdlDialect, GuardedObject, TypeMapping};
use crate::error::Result;
use crate::version::{DatabaseVersion, Flavor};

const TYPES: &[TypeMapping] = &[
    TypeMapping::new(ColumnType::Integer, "INTEGER", false, "int4"),
    TypeMapping::new(ColumnType::BigInteger, "BIGINT", false, "int8"),
    TypeMapping::new(ColumnType::Decimal, "NUMERIC", true, "numeric"),
    TypeMapping::new(ColumnType::Float, "REAL", false, "float4"),
    TypeMapping::new(ColumnType::Double, "DOUBLE PRECISION", false, "float8"),
    TypeMapping::new(ColumnType::VarChar, "VARCHAR", true, "varchar"),
    TypeMapping::new(ColumnType::Char, "CHAR", true, "bpchar"),
    TypeMapping::new(ColumnType::Text, "TEXT", false, "text"),
    TypeMapping::new(ColumnType::Date, "DATE", false, "date"),
    TypeMapping::new(ColumnType::DateTime, "TIMESTAMP", false, "timestamp"),
    TypeMapping::new(ColumnType::Timestamp, "TIMESTAMPTZ", false, "timestamptz"),
    TypeMapping::new(ColumnType::Boolean, "BOOLEAN", false, "bool"),
    TypeMapping::new(ColumnType::Blob, "BYTEA", false, "bytea"),
    TypeMapping::new(ColumnType::Json, "JSONB", false, "jsonb"),
    TypeMapping::new(ColumnType::Uuid, "UUID", false, "uuid"),
];

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    // SERIAL is only valid in column definitions, not in ALTER COLUMN TYPE.
    fn definition_type(&self, column: &Column) -> Result<String> {
        if column.is_auto_increment() {
            match column.column_type() {
                ColumnType::Integer => return Ok(String::from("SERIAL")),
                ColumnType::BigInteger => return Ok(String::from("BIGSERIAL")),
                _ => {}
            }
        }
        self.normalize_type(column)
    }

    fn comment_on(&self, table: &str, column: &str, comment: Option<&str>) -> String {
        let text = comment.map_or_else(
            || String::from("NULL"),
            |c| format!("'{}'", c.replace('\'', "''")),
        );
        format!(
            "COMMENT ON COLUMN {}.{} IS {text}",
            self.quote_identifier(table),
            self.quote_identifier(column)
        )
    }
}

impl DdlDialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn type_mapping(&self) -> &'static [TypeMapping] {
        TYPES
    }

    fn column_definition(&self, column: &Column, inline_keys: bool) -> Result<String> {
        let mut sql = format!(
            "{} {}",
            self.quote_identifier(column.name()),
            self.definition_type(column)?
        );

        sql.push_str(if column.is_nullable() { " NULL" } else { " NOT NULL" });

        if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }

        if inline_keys {
            if column.is_primary() {
                sql.push_str(" PRIMARY KEY");
            }
            if column.is_unique() {
                sql.push_str(" UNIQUE");
            }
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
        if flavor != Flavor::Postgres {
            return None;
        }
        let since = match object {
            GuardedObject::Table | GuardedObject::Index => DatabaseVersion::new(flavor, 8, 2, 0),
            GuardedObject::Column | GuardedObject::UniqueKey | GuardedObject::ForeignKey => {
                DatabaseVersion::new(flavor, 9, 0, 0)
            }
        };
        Some(since)
    }

    fn transactional_ddl(&self) -> bool {
        true
    }

    fn column_unique_constraint(&self, table: &str, column: &str) -> String {
        format!(
            "CONSTRAINT {} UNIQUE ({})",
            self.quote_identifier(&format!("{table}_{column}_key")),
            self.quote_identifier(column)
        )
    }

    fn column_comments(&self, table: &str, columns: &[&Column]) -> Vec<String> {
        columns
            .iter()
            .filter_map(|c| c.comment().map(|text| self.comment_on(table, c.name(), Some(text))))
            .collect()
    }

    fn rename_column(&self, table: &str, old: &str, column: &Column) -> Result<Vec<String>> {
        let mut statements = Vec::new();
        if old != column.name() {
            statements.push(format!(
                "ALTER TABLE {} RENAME COLUMN {} TO {}",
                self.quote_identifier(table),
                self.quote_identifier(old),
                self.quote_identifier(column.name())
            ));
        }
        statements.extend(self.alter_column_in_place(table, column)?);
        Ok(statements)
    }

    fn alter_column(&self, table: &str, column: &Column) -> Result<Vec<String>> {
        let old = column.previous_name().unwrap_or_else(|| column.name());
        self.rename_column(table, old, column)
    }

    fn drop_index(&self, _table: &str, name: &str, guard: bool) -> String {
        format!("DROP INDEX {}{}", if_exists(guard), self.quote_identifier(name))
    }

    fn drop_unique_key(&self, table: &str, name: &str, guard: bool) -> String {
        format!(
            "ALTER TABLE {} DROP CONSTRAINT {}{}",
            self.quote_identifier(table),
            if_exists(guard),
            self.quote_identifier(name)
        )
    }

    fn drop_foreign_key(&self, table: &str, name: &str, guard: bool) -> String {
        self.drop_unique_key(table, name, guard)
    }
}

impl PostgresDialect {
    fn alter_column_in_place(&self, table: &str, column: &Column) -> Result<Vec<String>> {
        let target = format!("ALTER COLUMN {}", self.quote_identifier(column.name()));
        let mut actions = vec![format!("{target} TYPE {}", self.normalize_type(column)?)];
        actions.push(if column.is_nullable() {
            format!("{target} DROP NOT NULL")
        } else {
            format!("{target} SET NOT NULL")
        });
        // SERIAL columns own their sequence default.
        if !column.is_auto_increment() {
            actions.push(match column.default_value() {
                Some(default) => format!("{target} SET DEFAULT {}", default.to_sql()),
                None => format!("{target} DROP DEFAULT"),
            });
        }
        Ok(vec![
            format!(
                "ALTER TABLE {} {}",
                self.quote_identifier(table),
                actions.join(", ")
            ),
            self.comment_on(table, column.name(), column.comment()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::IndexKind;
    use crate::error::SchemaError;
    use strata_core::metadata::{ColumnOptions, DefaultValue};

    fn column(options: ColumnOptions) -> Column {
        Column::new(options).unwrap()
    }

    #[test]
    fn test_serial_primary_key() {
        let d = PostgresDialect::new();
        let columns = [
            column(ColumnOptions::new("id", ColumnType::BigInteger).primary().auto_increment()),
            column(
                ColumnOptions::new("slug", ColumnType::VarChar)
                    .length(64)
                    .not_null()
                    .unique()
                    .comment("URL key"),
            ),
        ];
        let sql = d.create_table("posts", &columns).unwrap();
        assert_eq!(
            sql,
            vec![
                "CREATE TABLE \"posts\" (\n    \
                 \"id\" BIGSERIAL NOT NULL,\n    \
                 \"slug\" VARCHAR(64) NOT NULL,\n    \
                 PRIMARY KEY (\"id\"),\n    \
                 CONSTRAINT \"posts_slug_key\" UNIQUE (\"slug\")\n)"
                    .to_string(),
                "COMMENT ON COLUMN \"posts\".\"slug\" IS 'URL key'".to_string(),
            ]
        );
    }

    #[test]
    fn test_alter_column_statements() {
        let d = PostgresDialect::new();
        let col = column(
            ColumnOptions::new("active", ColumnType::Boolean)
                .not_null()
                .default(DefaultValue::Boolean(true))
                .previous_name("enabled"),
        );
        assert_eq!(
            d.alter_column("users", &col).unwrap(),
            vec![
                "ALTER TABLE \"users\" RENAME COLUMN \"enabled\" TO \"active\"",
                "ALTER TABLE \"users\" ALTER COLUMN \"active\" TYPE BOOLEAN, \
                 ALTER COLUMN \"active\" SET NOT NULL, \
                 ALTER COLUMN \"active\" SET DEFAULT TRUE",
                "COMMENT ON COLUMN \"users\".\"active\" IS NULL",
            ]
        );
    }

    #[test]
    fn test_serial_alter_keeps_sequence_default() {
        let d = PostgresDialect::new();
        let col = column(ColumnOptions::new("id", ColumnType::BigInteger).primary().auto_increment());
        assert_eq!(
            d.alter_column("users", &col).unwrap(),
            vec![
                "ALTER TABLE \"users\" ALTER COLUMN \"id\" TYPE BIGINT, \
                 ALTER COLUMN \"id\" SET NOT NULL",
                "COMMENT ON COLUMN \"users\".\"id\" IS NULL",
            ]
        );
        assert!(d.transactional_ddl());
    }

    #[test]
    fn test_fulltext_is_unsupported() {
        let d = PostgresDialect::new();
        let err = d
            .create_index("posts", "idx_body", &["body"], Some(IndexKind::Fulltext))
            .unwrap_err();
        assert!(matches!(err, SchemaError::Unsupported { dialect: "postgresql", .. }));
        assert_eq!(
            d.create_index("posts", "uniq_slug", &["slug"], Some(IndexKind::Unique))
                .unwrap(),
            "CREATE UNIQUE INDEX \"uniq_slug\" ON \"posts\" (\"slug\")"
        );
    }

    #[test]
    fn test_guards() {
        let d = PostgresDialect::new();
        let old = DatabaseVersion::new(Flavor::Postgres, 8, 4, 0);
        assert!(d.supports_guard(GuardedObject::Index, &old));
        assert!(!d.supports_guard(GuardedObject::Column, &old));
        assert_eq!(
            d.drop_column("users", "bio", true),
            "ALTER TABLE \"users\" DROP COLUMN IF EXISTS \"bio\""
        );
        assert_eq!(d.drop_index("users", "idx_bio", true), "DROP INDEX IF EXISTS \"idx_bio\"");
    }
}

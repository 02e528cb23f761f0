//! MySQL / MariaDB schema builder.

use std::sync::LazyLock;

use regex::Regex;
use strata_core::builder::{JoinCondition, Order, QueryBuilder};

use super::{fetch, required_text, validate_name, SchemaBuilder};
use crate::dialect::{DdlDialect, MySqlDialect};
use crate::error::{Result, SchemaError};
use crate::executor::{QueryExecutor, Row};
use crate::introspect::{ColumnInfo, ForeignKeyInfo, IndexInfo, UniqueConstraintInfo};
use crate::version::DatabaseVersion;

static TYPE_LENGTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+)").expect("length pattern is valid"));

/// Schema builder for MySQL and MariaDB servers.
#[derive(Debug, Clone)]
pub struct MySqlSchemaBuilder<E> {
    executor: E,
    dialect: MySqlDialect,
}

impl<E: QueryExecutor> MySqlSchemaBuilder<E> {
    /// Creates a builder sending statements to `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self {
            executor,
            dialect: MySqlDialect::new(),
        }
    }

    /// Consumes the builder, returning its executor.
    pub fn into_executor(self) -> E {
        self.executor
    }

    async fn select(&self, qb: &QueryBuilder, what: &str, table: &str) -> Result<Vec<Row>> {
        let sql = qb.get_query()?;
        fetch(&self.executor, &sql, || format!("reading {what} of '{table}'")).await
    }
}

fn column_length(row: &Row) -> Option<u32> {
    if let Some(length) = row.get_i64("CHARACTER_MAXIMUM_LENGTH") {
        return u32::try_from(length).ok();
    }
    let column_type = row.get_string("COLUMN_TYPE")?;
    TYPE_LENGTH
        .captures(&column_type)
        .and_then(|caps| caps[1].parse().ok())
}

fn column_info(row: &Row) -> Result<ColumnInfo> {
    let key = row.get_string("COLUMN_KEY").unwrap_or_default();
    let extra = row.get_string("EXTRA").unwrap_or_default();
    Ok(ColumnInfo {
        name: required_text(row, "COLUMN_NAME")?,
        data_type: required_text(row, "DATA_TYPE")?,
        column_type: required_text(row, "COLUMN_TYPE")?,
        nullable: row.get_bool("IS_NULLABLE").unwrap_or(true),
        default: row.get_string("COLUMN_DEFAULT"),
        primary: key.eq_ignore_ascii_case("PRI"),
        unique: key.eq_ignore_ascii_case("UNI"),
        auto_increment: extra.to_ascii_lowercase().contains("auto_increment"),
        length: column_length(row),
    })
}

impl<E: QueryExecutor> SchemaBuilder for MySqlSchemaBuilder<E> {
    type Dialect = MySqlDialect;
    type Executor = E;

    fn dialect(&self) -> &MySqlDialect {
        &self.dialect
    }

    fn executor(&self) -> &E {
        &self.executor
    }

    async fn get_tables(&self) -> Result<Vec<String>> {
        let mut qb = QueryBuilder::new();
        qb.select(&["TABLE_NAME"])
            .from("information_schema.TABLES", None)?
            .where_("TABLE_SCHEMA = DATABASE()")?
            .and_where("TABLE_TYPE = 'BASE TABLE'")?
            .order_by("TABLE_NAME", Order::Asc);
        let sql = qb.get_query()?;
        fetch(&self.executor, &sql, || String::from("listing tables"))
            .await?
            .iter()
            .map(|row| required_text(row, "TABLE_NAME"))
            .collect()
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "COLUMN_NAME",
            "DATA_TYPE",
            "COLUMN_TYPE",
            "IS_NULLABLE",
            "COLUMN_DEFAULT",
            "COLUMN_KEY",
            "EXTRA",
            "CHARACTER_MAXIMUM_LENGTH",
        ])
        .from("information_schema.COLUMNS", None)?
        .where_("TABLE_SCHEMA = DATABASE()")?
        .and_where("TABLE_NAME = :table")?
        .order_by("ORDINAL_POSITION", Order::Asc)
        .set_parameter("table", table)?;
        self.select(&qb, "columns", table)
            .await?
            .iter()
            .map(column_info)
            .collect()
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "CONSTRAINT_NAME",
            "COLUMN_NAME",
            "REFERENCED_TABLE_NAME",
            "REFERENCED_COLUMN_NAME",
        ])
        .from("information_schema.KEY_COLUMN_USAGE", None)?
        .where_("TABLE_SCHEMA = DATABASE()")?
        .and_where("TABLE_NAME = :table")?
        .and_where("REFERENCED_TABLE_NAME IS NOT NULL")?
        .order_by("CONSTRAINT_NAME", Order::Asc)
        .add_order_by("ORDINAL_POSITION", Order::Asc)
        .set_parameter("table", table)?;
        self.select(&qb, "foreign keys", table)
            .await?
            .iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    constraint_name: required_text(row, "CONSTRAINT_NAME")?,
                    column: required_text(row, "COLUMN_NAME")?,
                    referenced_table: required_text(row, "REFERENCED_TABLE_NAME")?,
                    referenced_column: required_text(row, "REFERENCED_COLUMN_NAME")?,
                })
            })
            .collect()
    }

    async fn get_table_indexes(&self, table: &str) -> Result<Vec<IndexInfo>> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&["INDEX_NAME", "COLUMN_NAME", "NON_UNIQUE", "INDEX_TYPE"])
            .from("information_schema.STATISTICS", None)?
            .where_("TABLE_SCHEMA = DATABASE()")?
            .and_where("TABLE_NAME = :table")?
            .order_by("INDEX_NAME", Order::Asc)
            .add_order_by("SEQ_IN_INDEX", Order::Asc)
            .set_parameter("table", table)?;
        self.select(&qb, "indexes", table)
            .await?
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: required_text(row, "INDEX_NAME")?,
                    column: required_text(row, "COLUMN_NAME")?,
                    unique: !row.get_bool("NON_UNIQUE").unwrap_or(true),
                    kind: row.get_string("INDEX_TYPE").unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn get_unique_constraints(&self, table: &str) -> Result<Vec<UniqueConstraintInfo>> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "kcu.CONSTRAINT_NAME AS CONSTRAINT_NAME",
            "kcu.COLUMN_NAME AS COLUMN_NAME",
        ])
        .from("information_schema.TABLE_CONSTRAINTS", Some("tc"))?
        .inner_join(
            "information_schema.KEY_COLUMN_USAGE",
            Some("kcu"),
            JoinCondition::on(
                "kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                 AND kcu.TABLE_SCHEMA = tc.TABLE_SCHEMA \
                 AND kcu.TABLE_NAME = tc.TABLE_NAME",
            ),
        )?
        .where_("tc.TABLE_SCHEMA = DATABASE()")?
        .and_where("tc.TABLE_NAME = :table")?
        .and_where("tc.CONSTRAINT_TYPE = 'UNIQUE'")?
        .order_by("kcu.CONSTRAINT_NAME", Order::Asc)
        .add_order_by("kcu.ORDINAL_POSITION", Order::Asc)
        .set_parameter("table", table)?;
        self.select(&qb, "unique constraints", table)
            .await?
            .iter()
            .map(|row| {
                Ok(UniqueConstraintInfo {
                    constraint_name: required_text(row, "CONSTRAINT_NAME")?,
                    column: required_text(row, "COLUMN_NAME")?,
                })
            })
            .collect()
    }

    async fn get_table_definition(&self, table: &str) -> Result<String> {
        validate_name("table", table)?;
        let sql = format!("SHOW CREATE TABLE {}", self.dialect.quote_identifier(table));
        let rows = fetch(&self.executor, &sql, || {
            format!("reading definition of '{table}'")
        })
        .await?;
        let row = rows
            .first()
            .ok_or_else(|| SchemaError::UnexpectedRow(format!("no definition for '{table}'")))?;
        row.get_string("Create Table")
            .or_else(|| row.get_index(1).and_then(strata_core::SqlValue::to_text))
            .ok_or_else(|| SchemaError::UnexpectedRow(String::from("missing 'Create Table'")))
    }

    async fn get_database_version(&self) -> Result<DatabaseVersion> {
        let rows = fetch(&self.executor, "SELECT VERSION() AS version", || {
            String::from("reading server version")
        })
        .await?;
        let raw = rows
            .first()
            .map(|row| required_text(row, "version"))
            .transpose()?
            .ok_or_else(|| SchemaError::UnexpectedRow(String::from("empty version result")))?;
        DatabaseVersion::parse_mysql(&raw)
    }

    async fn has_table(&self, table: &str) -> Result<bool> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&["COUNT(*) AS total"])
            .from("information_schema.TABLES", None)?
            .where_("TABLE_SCHEMA = DATABASE()")?
            .and_where("TABLE_NAME = :table")?
            .set_parameter("table", table)?;
        let rows = self.select(&qb, "existence", table).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_i64("total"))
            .is_some_and(|n| n > 0))
    }
}

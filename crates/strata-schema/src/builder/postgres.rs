//! PostgreSQL schema builder.

use std::collections::HashMap;

use strata_core::builder::{JoinCondition, Order, QueryBuilder};

use super::{fetch, required_text, validate_name, SchemaBuilder};
use crate::dialect::PostgresDialect;
use crate::error::{Result, SchemaError};
use crate::executor::{QueryExecutor, Row};
use crate::introspect::{ColumnInfo, ForeignKeyInfo, IndexInfo, UniqueConstraintInfo};
use crate::version::DatabaseVersion;

/// Schema builder for PostgreSQL servers. Introspection is limited to the
/// connection's `current_schema()`.
#[derive(Debug, Clone)]
pub struct PostgresSchemaBuilder<E> {
    executor: E,
    dialect: PostgresDialect,
}

#[derive(Debug, Default, Clone, Copy)]
struct KeyFlags {
    primary: bool,
    unique: bool,
}

impl<E: QueryExecutor> PostgresSchemaBuilder<E> {
    /// Creates a builder sending statements to `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self {
            executor,
            dialect: PostgresDialect::new(),
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

    /// Key-column usage of `table` for the given constraint types.
    fn key_usage(table: &str, types: &str) -> Result<QueryBuilder> {
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "tc.constraint_name::text AS constraint_name",
            "tc.constraint_type::text AS constraint_type",
            "kcu.column_name::text AS column_name",
        ])
        .from("information_schema.table_constraints", Some("tc"))?
        .inner_join(
            "information_schema.key_column_usage",
            Some("kcu"),
            JoinCondition::on(
                "kcu.constraint_name = tc.constraint_name \
                 AND kcu.table_schema = tc.table_schema \
                 AND kcu.table_name = tc.table_name",
            ),
        )?
        .where_("tc.table_schema = current_schema()")?
        .and_where("tc.table_name = :table")?
        .and_where(&format!("tc.constraint_type IN ({types})"))?
        .order_by("tc.constraint_name", Order::Asc)
        .add_order_by("kcu.ordinal_position", Order::Asc)
        .set_parameter("table", table)?;
        Ok(qb)
    }

    async fn key_flags(&self, table: &str) -> Result<HashMap<String, KeyFlags>> {
        let qb = Self::key_usage(table, "'PRIMARY KEY', 'UNIQUE'")?;
        let mut flags: HashMap<String, KeyFlags> = HashMap::new();
        for row in self.select(&qb, "key columns", table).await? {
            let entry = flags.entry(required_text(&row, "column_name")?).or_default();
            match required_text(&row, "constraint_type")?.as_str() {
                "PRIMARY KEY" => entry.primary = true,
                _ => entry.unique = true,
            }
        }
        Ok(flags)
    }
}

fn column_info(row: &Row, flags: &HashMap<String, KeyFlags>) -> Result<ColumnInfo> {
    let name = required_text(row, "column_name")?;
    let default = row.get_string("column_default");
    let identity = row.get_bool("is_identity").unwrap_or(false);
    let keys = flags.get(&name).copied().unwrap_or_default();
    let data_type = required_text(row, "udt_name")?;
    // Integer types report a binary precision too; only NUMERIC's is a length.
    let length = row.get_i64("character_maximum_length").or_else(|| {
        (data_type == "numeric")
            .then(|| row.get_i64("numeric_precision"))
            .flatten()
    });
    Ok(ColumnInfo {
        data_type,
        column_type: required_text(row, "data_type")?,
        nullable: row.get_bool("is_nullable").unwrap_or(true),
        auto_increment: identity
            || default.as_deref().is_some_and(|d| d.starts_with("nextval(")),
        default,
        primary: keys.primary,
        unique: keys.unique,
        length: length.and_then(|n| u32::try_from(n).ok()),
        name,
    })
}

impl<E: QueryExecutor> SchemaBuilder for PostgresSchemaBuilder<E> {
    type Dialect = PostgresDialect;
    type Executor = E;

    fn dialect(&self) -> &PostgresDialect {
        &self.dialect
    }

    fn executor(&self) -> &E {
        &self.executor
    }

    async fn get_tables(&self) -> Result<Vec<String>> {
        let mut qb = QueryBuilder::new();
        qb.select(&["table_name::text AS table_name"])
            .from("information_schema.tables", None)?
            .where_("table_schema = current_schema()")?
            .and_where("table_type = 'BASE TABLE'")?
            .order_by("table_name", Order::Asc);
        let sql = qb.get_query()?;
        fetch(&self.executor, &sql, || String::from("listing tables"))
            .await?
            .iter()
            .map(|row| required_text(row, "table_name"))
            .collect()
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        validate_name("table", table)?;
        let flags = self.key_flags(table).await?;
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "column_name::text AS column_name",
            "udt_name::text AS udt_name",
            "data_type::text AS data_type",
            "is_nullable::text AS is_nullable",
            "column_default::text AS column_default",
            "is_identity::text AS is_identity",
            "character_maximum_length::bigint AS character_maximum_length",
            "numeric_precision::bigint AS numeric_precision",
        ])
        .from("information_schema.columns", None)?
        .where_("table_schema = current_schema()")?
        .and_where("table_name = :table")?
        .order_by("ordinal_position", Order::Asc)
        .set_parameter("table", table)?;
        self.select(&qb, "columns", table)
            .await?
            .iter()
            .map(|row| column_info(row, &flags))
            .collect()
    }

    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>> {
        validate_name("table", table)?;
        let mut qb = Self::key_usage(table, "'FOREIGN KEY'")?;
        // Referenced columns pair up with local ones by position in the
        // referenced unique constraint.
        qb.add_columns(&[
            "rku.table_name::text AS referenced_table",
            "rku.column_name::text AS referenced_column",
        ])
        .inner_join(
            "information_schema.referential_constraints",
            Some("rc"),
            JoinCondition::on(
                "rc.constraint_name = tc.constraint_name \
                 AND rc.constraint_schema = tc.table_schema",
            ),
        )?
        .inner_join(
            "information_schema.key_column_usage",
            Some("rku"),
            JoinCondition::on(
                "rku.constraint_name = rc.unique_constraint_name \
                 AND rku.constraint_schema = rc.unique_constraint_schema \
                 AND rku.ordinal_position = kcu.position_in_unique_constraint",
            ),
        )?;
        self.select(&qb, "foreign keys", table)
            .await?
            .iter()
            .map(|row| {
                Ok(ForeignKeyInfo {
                    constraint_name: required_text(row, "constraint_name")?,
                    column: required_text(row, "column_name")?,
                    referenced_table: required_text(row, "referenced_table")?,
                    referenced_column: required_text(row, "referenced_column")?,
                })
            })
            .collect()
    }

    async fn get_table_indexes(&self, table: &str) -> Result<Vec<IndexInfo>> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&[
            "i.relname::text AS index_name",
            "a.attname::text AS column_name",
            "ix.indisunique AS is_unique",
            "am.amname::text AS index_type",
        ])
        .from("pg_class", Some("t"))?
        .inner_join("pg_index", Some("ix"), JoinCondition::on("ix.indrelid = t.oid"))?
        .inner_join("pg_class", Some("i"), JoinCondition::on("i.oid = ix.indexrelid"))?
        .inner_join("pg_am", Some("am"), JoinCondition::on("am.oid = i.relam"))?
        .inner_join(
            "pg_attribute",
            Some("a"),
            JoinCondition::on("a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)"),
        )?
        .inner_join(
            "pg_namespace",
            Some("n"),
            JoinCondition::on("n.oid = t.relnamespace"),
        )?
        .where_("n.nspname = current_schema()")?
        .and_where("t.relkind = 'r'")?
        .and_where("t.relname = :table")?
        .order_by("i.relname", Order::Asc)
        .add_order_by("a.attnum", Order::Asc)
        .set_parameter("table", table)?;
        self.select(&qb, "indexes", table)
            .await?
            .iter()
            .map(|row| {
                Ok(IndexInfo {
                    name: required_text(row, "index_name")?,
                    column: required_text(row, "column_name")?,
                    unique: row.get_bool("is_unique").unwrap_or(false),
                    kind: row.get_string("index_type").unwrap_or_default(),
                })
            })
            .collect()
    }

    async fn get_unique_constraints(&self, table: &str) -> Result<Vec<UniqueConstraintInfo>> {
        validate_name("table", table)?;
        let qb = Self::key_usage(table, "'UNIQUE'")?;
        self.select(&qb, "unique constraints", table)
            .await?
            .iter()
            .map(|row| {
                Ok(UniqueConstraintInfo {
                    constraint_name: required_text(row, "constraint_name")?,
                    column: required_text(row, "column_name")?,
                })
            })
            .collect()
    }

    async fn get_table_definition(&self, table: &str) -> Result<String> {
        validate_name("table", table)?;
        Err(SchemaError::Unsupported {
            dialect: "postgresql",
            operation: "get_table_definition",
        })
    }

    async fn get_database_version(&self) -> Result<DatabaseVersion> {
        let rows = fetch(
            &self.executor,
            "SELECT current_setting('server_version') AS version",
            || String::from("reading server version"),
        )
        .await?;
        let raw = rows
            .first()
            .map(|row| required_text(row, "version"))
            .transpose()?
            .ok_or_else(|| SchemaError::UnexpectedRow(String::from("empty version result")))?;
        DatabaseVersion::parse_postgres(&raw)
    }

    async fn has_table(&self, table: &str) -> Result<bool> {
        validate_name("table", table)?;
        let mut qb = QueryBuilder::new();
        qb.select(&["COUNT(*) AS total"])
            .from("information_schema.tables", None)?
            .where_("table_schema = current_schema()")?
            .and_where("table_name = :table")?
            .set_parameter("table", table)?;
        let rows = self.select(&qb, "existence", table).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_i64("total"))
            .is_some_and(|n| n > 0))
    }
}

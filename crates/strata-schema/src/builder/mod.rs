//! Schema builders: DDL execution and live introspection per dialect.
//!
//! A [`SchemaBuilder`] pairs a [`DdlDialect`] with a [`QueryExecutor`].
//! Mutating operations validate every name, render through the dialect and
//! run one statement per executor call. Operations needing several
//! statements run in one transaction where the dialect allows it. Drop
//! operations first read the server version to decide whether `IF EXISTS`
//! may be used.

mod mysql;
mod postgres;

pub use mysql::MySqlSchemaBuilder;
pub use postgres::PostgresSchemaBuilder;

use strata_core::ident::is_valid_identifier;
use strata_core::metadata::{Column, ForeignKey};
use tracing::{debug, info, warn};

use crate::dialect::{index_name, unique_key_name, DdlDialect, GuardedObject, IndexKind};
use crate::diff::changed_columns;
use crate::error::{Result, SchemaError};
use crate::executor::{QueryExecutor, QueryResult, Row};
use crate::introspect::{
    ChangedColumn, ColumnInfo, ForeignKeyInfo, IndexInfo, UniqueConstraintInfo,
};
use crate::version::DatabaseVersion;

/// Fails with [`SchemaError::InvalidName`] unless `name` is an identifier.
pub(crate) fn validate_name(role: &'static str, name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidName {
            role,
            name: name.to_string(),
        })
    }
}

fn validate_names(role: &'static str, names: &[&str]) -> Result<()> {
    names.iter().try_for_each(|name| validate_name(role, name))
}

/// Runs one statement, wrapping any driver failure with `context`.
pub(crate) async fn run<E: QueryExecutor>(
    executor: &E,
    sql: &str,
    context: impl FnOnce() -> String,
) -> Result<QueryResult> {
    debug!(sql = %sql, "Executing SQL");
    executor
        .execute(sql)
        .await
        .map_err(|source| SchemaError::QueryFailed {
            context: context(),
            source,
        })
}

/// Runs the statements of one operation. On a transactional dialect a
/// multi-statement operation is applied atomically.
async fn run_all<D: DdlDialect, E: QueryExecutor>(
    dialect: &D,
    executor: &E,
    statements: &[String],
    context: &dyn Fn() -> String,
) -> Result<u64> {
    if statements.len() > 1 && dialect.transactional_ddl() {
        for sql in statements {
            debug!(sql = %sql, "Executing SQL in transaction");
        }
        return executor
            .execute_atomic(statements)
            .await
            .map_err(|source| SchemaError::QueryFailed {
                context: context(),
                source,
            });
    }
    let mut affected = 0;
    for sql in statements {
        affected += run(executor, sql, context).await?.rows_affected;
    }
    Ok(affected)
}

/// Runs a read query and returns its rows.
pub(crate) async fn fetch<E: QueryExecutor>(
    executor: &E,
    sql: &str,
    context: impl FnOnce() -> String,
) -> Result<Vec<Row>> {
    Ok(run(executor, sql, context).await?.rows)
}

/// Text value of `column`, failing when the row lacks it.
pub(crate) fn required_text(row: &Row, column: &str) -> Result<String> {
    row.get_string(column)
        .ok_or_else(|| SchemaError::UnexpectedRow(format!("missing '{column}'")))
}

/// Schema operations against a live database.
///
/// Implementors supply the dialect, the executor and the introspection
/// queries; DDL operations are provided.
#[allow(async_fn_in_trait)]
pub trait SchemaBuilder {
    /// Dialect used to render DDL.
    type Dialect: DdlDialect;
    /// Executor statements are sent to.
    type Executor: QueryExecutor;

    /// The dialect.
    fn dialect(&self) -> &Self::Dialect;

    /// The executor.
    fn executor(&self) -> &Self::Executor;

    /// Creates `table` with `columns`.
    async fn create_table(&self, table: &str, columns: &[Column]) -> Result<()> {
        validate_name("table", table)?;
        let statements = self.dialect().create_table(table, columns)?;
        info!(table = %table, columns = columns.len(), "Creating table");
        run_all(self.dialect(), self.executor(), &statements, &|| {
            format!("creating table '{table}'")
        })
        .await?;
        Ok(())
    }

    /// Drops `table`. Returns whether anything was affected.
    async fn drop_table(&self, table: &str) -> Result<bool> {
        validate_name("table", table)?;
        let guard = self.guard(GuardedObject::Table, table).await?;
        let sql = self.dialect().drop_table(table, guard);
        info!(table = %table, "Dropping table");
        let result = run(self.executor(), &sql, || format!("dropping table '{table}'")).await?;
        Ok(result.rows_affected > 0)
    }

    /// Adds `column` to `table`.
    async fn add_column(&self, table: &str, column: &Column) -> Result<()> {
        validate_name("table", table)?;
        let statements = self.dialect().add_column(table, column)?;
        info!(table = %table, column = %column.name(), "Adding column");
        run_all(self.dialect(), self.executor(), &statements, &|| {
            format!("adding column '{}' to '{table}'", column.name())
        })
        .await?;
        Ok(())
    }

    /// Renames `old` to `column.name()`, applying the full definition.
    async fn rename_column(&self, table: &str, old: &str, column: &Column) -> Result<()> {
        validate_name("table", table)?;
        validate_name("column", old)?;
        let statements = self.dialect().rename_column(table, old, column)?;
        info!(table = %table, from = %old, to = %column.name(), "Renaming column");
        run_all(self.dialect(), self.executor(), &statements, &|| {
            format!("renaming column '{old}' of '{table}'")
        })
        .await?;
        Ok(())
    }

    /// Applies the full definition of `column` to its live counterpart.
    async fn alter_column(&self, table: &str, column: &Column) -> Result<()> {
        validate_name("table", table)?;
        let statements = self.dialect().alter_column(table, column)?;
        info!(table = %table, column = %column.name(), "Altering column");
        run_all(self.dialect(), self.executor(), &statements, &|| {
            format!("altering column '{}' of '{table}'", column.name())
        })
        .await?;
        Ok(())
    }

    /// Drops `column` from `table`. Returns whether anything was affected.
    async fn drop_column(&self, table: &str, column: &str) -> Result<bool> {
        validate_name("table", table)?;
        validate_name("column", column)?;
        let guard = self.guard(GuardedObject::Column, table).await?;
        let sql = self.dialect().drop_column(table, column, guard);
        info!(table = %table, column = %column, "Dropping column");
        let result = run(self.executor(), &sql, || {
            format!("dropping column '{column}' from '{table}'")
        })
        .await?;
        Ok(result.rows_affected > 0)
    }

    /// Creates an index, named `idx_<columns>` unless `name` is given.
    async fn create_index(
        &self,
        table: &str,
        name: Option<&str>,
        columns: &[&str],
        kind: Option<IndexKind>,
    ) -> Result<()> {
        validate_name("table", table)?;
        validate_names("column", columns)?;
        let name = name.map_or_else(|| index_name(columns), str::to_string);
        validate_name("index", &name)?;
        let sql = self.dialect().create_index(table, &name, columns, kind)?;
        info!(table = %table, index = %name, "Creating index");
        run(self.executor(), &sql, || format!("creating index '{name}' on '{table}'")).await?;
        Ok(())
    }

    /// Drops index `name`. Returns whether anything was affected.
    async fn drop_index(&self, table: &str, name: &str) -> Result<bool> {
        validate_name("table", table)?;
        validate_name("index", name)?;
        let guard = self.guard(GuardedObject::Index, table).await?;
        let sql = self.dialect().drop_index(table, name, guard);
        info!(table = %table, index = %name, "Dropping index");
        let result = run(self.executor(), &sql, || {
            format!("dropping index '{name}' from '{table}'")
        })
        .await?;
        Ok(result.rows_affected > 0)
    }

    /// Adds a unique key, named `uniq_<columns>` unless `name` is given.
    async fn add_unique_key(&self, table: &str, name: Option<&str>, columns: &[&str]) -> Result<()> {
        validate_name("table", table)?;
        validate_names("column", columns)?;
        let name = name.map_or_else(|| unique_key_name(columns), str::to_string);
        validate_name("unique key", &name)?;
        let sql = self.dialect().add_unique_key(table, &name, columns)?;
        info!(table = %table, key = %name, "Adding unique key");
        run(self.executor(), &sql, || {
            format!("adding unique key '{name}' to '{table}'")
        })
        .await?;
        Ok(())
    }

    /// Drops unique key `name`. Returns whether anything was affected.
    async fn drop_unique_key(&self, table: &str, name: &str) -> Result<bool> {
        validate_name("table", table)?;
        validate_name("unique key", name)?;
        let guard = self.guard(GuardedObject::UniqueKey, table).await?;
        let sql = self.dialect().drop_unique_key(table, name, guard);
        info!(table = %table, key = %name, "Dropping unique key");
        let result = run(self.executor(), &sql, || {
            format!("dropping unique key '{name}' from '{table}'")
        })
        .await?;
        Ok(result.rows_affected > 0)
    }

    /// Adds `fk`. The key is validated again, since deserialized keys skip
    /// constructor validation.
    async fn add_foreign_key(&self, fk: &ForeignKey) -> Result<()> {
        fk.validate()?;
        let name = fk.name();
        validate_name("foreign key", &name)?;
        let sql = self.dialect().add_foreign_key(fk);
        info!(table = %fk.table(), key = %name, "Adding foreign key");
        run(self.executor(), &sql, || {
            format!("adding foreign key '{name}' to '{}'", fk.table())
        })
        .await?;
        Ok(())
    }

    /// Drops foreign key `name`. Returns whether anything was affected.
    async fn drop_foreign_key(&self, table: &str, name: &str) -> Result<bool> {
        validate_name("table", table)?;
        validate_name("foreign key", name)?;
        let guard = self.guard(GuardedObject::ForeignKey, table).await?;
        let sql = self.dialect().drop_foreign_key(table, name, guard);
        info!(table = %table, key = %name, "Dropping foreign key");
        let result = run(self.executor(), &sql, || {
            format!("dropping foreign key '{name}' from '{table}'")
        })
        .await?;
        Ok(result.rows_affected > 0)
    }

    /// Declared columns of `table` whose live definition differs.
    async fn get_changed_columns(&self, table: &str, columns: &[Column]) -> Result<Vec<ChangedColumn>> {
        let live = self.get_table_columns(table).await?;
        let dialect = self.dialect();
        changed_columns(columns, &live, |ty| dialect.base_type(ty))
    }

    /// Base table names of the current schema.
    async fn get_tables(&self) -> Result<Vec<String>>;

    /// Live columns of `table`, in ordinal order.
    async fn get_table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>>;

    /// Live foreign keys of `table`, one record per column pair.
    async fn get_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyInfo>>;

    /// Live indexes of `table`, one record per indexed column.
    async fn get_table_indexes(&self, table: &str) -> Result<Vec<IndexInfo>>;

    /// Live unique constraints of `table`, one record per column.
    async fn get_unique_constraints(&self, table: &str) -> Result<Vec<UniqueConstraintInfo>>;

    /// Distinct unique constraint names of `table`.
    async fn get_unique_constraint_names(&self, table: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for constraint in self.get_unique_constraints(table).await? {
            if !names.contains(&constraint.constraint_name) {
                names.push(constraint.constraint_name);
            }
        }
        Ok(names)
    }

    /// Live definition of one column.
    async fn get_column_definition(&self, table: &str, column: &str) -> Result<Option<ColumnInfo>> {
        validate_name("column", column)?;
        Ok(self
            .get_table_columns(table)
            .await?
            .into_iter()
            .find(|c| c.name == column))
    }

    /// Primary key columns of `table`, in ordinal order.
    async fn get_primary_key(&self, table: &str) -> Result<Vec<String>> {
        Ok(self
            .get_table_columns(table)
            .await?
            .into_iter()
            .filter(|c| c.primary)
            .map(|c| c.name)
            .collect())
    }

    /// The server's own CREATE TABLE text for `table`.
    async fn get_table_definition(&self, table: &str) -> Result<String>;

    /// The connected server's version.
    async fn get_database_version(&self) -> Result<DatabaseVersion>;

    /// Whether `table` exists in the current schema.
    async fn has_table(&self, table: &str) -> Result<bool>;

    /// Reads the server version and decides whether dropping `object` may
    /// use `IF EXISTS`.
    async fn guard(&self, object: GuardedObject, table: &str) -> Result<bool> {
        let version = self.get_database_version().await?;
        let supported = self.dialect().supports_guard(object, &version);
        if !supported {
            warn!(
                table = %table,
                object = object.label(),
                version = %version,
                "IF EXISTS unavailable, dropping without guard"
            );
        }
        Ok(supported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("table", "users").is_ok());
        assert!(matches!(
            validate_name("table", "users; DROP"),
            Err(SchemaError::InvalidName { role: "table", .. })
        ));
        assert!(validate_names("column", &["a", "b_2"]).is_ok());
        assert!(validate_names("column", &["a", ""]).is_err());
    }
}

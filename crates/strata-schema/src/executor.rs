//! Query execution.
//!
//! Schema builders never talk to a driver directly. They hand SQL text to a
//! [`QueryExecutor`], one statement per call, and read back [`QueryResult`]s.
//! Operations spanning several statements on a transactional dialect go
//! through [`QueryExecutor::execute_atomic`] instead.
//! [`AnyExecutor`] is the `sqlx`-backed implementation used by the CLI.

use std::error::Error;

use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::AnyPool;
use sqlx::{Column as _, Row as _};
use strata_core::{SqlValue, ToSqlValue};
use tracing::{debug, warn};

/// Boxed driver error carried by [`SchemaError::QueryFailed`](crate::SchemaError::QueryFailed).
pub type BoxError = Box<dyn Error + Send + Sync>;

/// Runs SQL statements, one per call.
#[allow(async_fn_in_trait)]
pub trait QueryExecutor {
    /// Executes `sql` and returns its rows and affected-row count.
    async fn execute(&self, sql: &str) -> Result<QueryResult, BoxError>;

    /// Executes `statements` in one transaction and returns the summed
    /// affected-row count. Nothing stays applied when any statement fails.
    ///
    /// The default sends `BEGIN`, `COMMIT` and `ROLLBACK` through
    /// [`execute`](Self::execute), which is only correct for executors bound
    /// to a single connection.
    async fn execute_atomic(&self, statements: &[String]) -> Result<u64, BoxError> {
        self.execute("BEGIN").await?;
        let mut affected = 0;
        for sql in statements {
            match self.execute(sql).await {
                Ok(result) => affected += result.rows_affected,
                Err(err) => {
                    if let Err(rollback) = self.execute("ROLLBACK").await {
                        warn!(error = %rollback, "Rollback failed");
                    }
                    return Err(err);
                }
            }
        }
        self.execute("COMMIT").await?;
        Ok(affected)
    }
}

impl<E: QueryExecutor + ?Sized> QueryExecutor for &E {
    async fn execute(&self, sql: &str) -> Result<QueryResult, BoxError> {
        (**self).execute(sql).await
    }

    async fn execute_atomic(&self, statements: &[String]) -> Result<u64, BoxError> {
        (**self).execute_atomic(statements).await
    }
}

/// Rows returned by a statement plus the affected-row count.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Result rows, in server order.
    pub rows: Vec<Row>,
    /// Rows (or objects) affected by a mutating statement.
    pub rows_affected: u64,
}

impl QueryResult {
    /// A result carrying only rows.
    #[must_use]
    pub fn with_rows(rows: Vec<Row>) -> Self {
        Self {
            rows,
            rows_affected: 0,
        }
    }

    /// A result carrying only an affected-row count.
    #[must_use]
    pub const fn affected(rows_affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            rows_affected,
        }
    }

    /// First row, if any.
    #[must_use]
    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }
}

/// An ordered record of column name to value.
///
/// Lookups by name ignore ASCII case, since engines disagree on the case of
/// `information_schema` column labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl ToSqlValue) -> Self {
        self.push(column, value);
        self
    }

    /// Appends a column in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl ToSqlValue) {
        self.columns.push(column.into());
        self.values.push(value.to_sql_value());
    }

    /// Column names, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(column))
            .map(|i| &self.values[i])
    }

    /// Value at `index`.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Non-NULL textual value of `column`.
    #[must_use]
    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get(column).and_then(SqlValue::to_text)
    }

    /// Integer value of `column`.
    #[must_use]
    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    /// Boolean value of `column`. `YES`/`NO` are accepted.
    #[must_use]
    pub fn get_bool(&self, column: &str) -> Option<bool> {
        self.get(column).and_then(SqlValue::as_bool)
    }
}

/// Executes statements on a `sqlx` [`AnyPool`].
///
/// `sqlx::any::install_default_drivers` must have been called before
/// [`AnyExecutor::connect`].
#[derive(Debug, Clone)]
pub struct AnyExecutor {
    pool: AnyPool,
}

impl AnyExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Connects to `url` with a small pool.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = AnyPoolOptions::new().max_connections(2).connect(url).await?;
        Ok(Self { pool })
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

fn returns_rows(sql: &str) -> bool {
    let head = sql.trim_start();
    let keyword = head
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default();
    ["SELECT", "SHOW", "WITH", "DESCRIBE", "EXPLAIN"]
        .iter()
        .any(|k| keyword.eq_ignore_ascii_case(k))
}

fn decode_value(row: &AnyRow, index: usize) -> SqlValue {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Int);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map_or(SqlValue::Null, |n| SqlValue::Int(i64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(index) {
        return v.map_or(SqlValue::Null, |n| SqlValue::Int(i64::from(n)));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Bool);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Float);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Text);
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(index) {
        return v.map_or(SqlValue::Null, SqlValue::Blob);
    }
    SqlValue::Null
}

fn convert_row(row: &AnyRow) -> Row {
    let mut converted = Row::new();
    for column in row.columns() {
        converted.push(column.name(), decode_value(row, column.ordinal()));
    }
    converted
}

impl QueryExecutor for AnyExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, BoxError> {
        if returns_rows(sql) {
            let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
            debug!(rows = rows.len(), "Fetched rows");
            Ok(QueryResult::with_rows(rows.iter().map(convert_row).collect()))
        } else {
            let result = sqlx::query(sql).execute(&self.pool).await?;
            debug!(rows_affected = result.rows_affected(), "Executed statement");
            Ok(QueryResult::affected(result.rows_affected()))
        }
    }

    // Pooled: every statement must run on the transaction's connection.
    async fn execute_atomic(&self, statements: &[String]) -> Result<u64, BoxError> {
        let mut tx = self.pool.begin().await?;
        let mut affected = 0;
        for sql in statements {
            // Dropping `tx` on error rolls back.
            affected += sqlx::query(sql).execute(&mut *tx).await?.rows_affected();
        }
        tx.commit().await?;
        debug!(statements = statements.len(), rows_affected = affected, "Committed transaction");
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_lookup_ignores_case() {
        let row = Row::new()
            .with("COLUMN_NAME", SqlValue::Text("id".into()))
            .with("IS_NULLABLE", SqlValue::Text("NO".into()))
            .with("CHARACTER_MAXIMUM_LENGTH", SqlValue::Null);
        assert_eq!(row.get_string("column_name").as_deref(), Some("id"));
        assert_eq!(row.get_bool("is_nullable"), Some(false));
        assert_eq!(row.get_i64("character_maximum_length"), None);
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.columns().len(), 3);
    }

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("SELECT 1"));
        assert!(returns_rows("  select version() AS version"));
        assert!(returns_rows("SHOW CREATE TABLE `users`"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!returns_rows("DROP TABLE users"));
        assert!(!returns_rows("ALTER TABLE users ADD COLUMN x INT"));
        assert!(!returns_rows("SELECTED"));
    }
}

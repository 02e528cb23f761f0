#![allow(dead_code)]

use std::sync::Mutex;

use strata_schema::executor::{BoxError, QueryExecutor, QueryResult, Row};

enum Response {
    Rows(QueryResult),
    Fail(String),
}

/// Records every statement and answers from canned responses.
///
/// A response applies to any statement containing its needle; the first
/// match wins. Unmatched statements get the default result.
pub struct MockExecutor {
    executed: Mutex<Vec<String>>,
    responses: Vec<(String, Response)>,
    default: QueryResult,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            executed: Mutex::new(Vec::new()),
            responses: Vec::new(),
            default: QueryResult::affected(0),
        }
    }

    /// A MySQL-family server reporting `version`.
    pub fn mysql(version: &str) -> Self {
        Self::new().respond("SELECT VERSION()", version_row(version))
    }

    /// A PostgreSQL server reporting `version`.
    pub fn postgres(version: &str) -> Self {
        Self::new().respond("current_setting('server_version')", version_row(version))
    }

    pub fn respond(mut self, needle: &str, result: QueryResult) -> Self {
        self.responses.push((needle.to_string(), Response::Rows(result)));
        self
    }

    pub fn fail_on(mut self, needle: &str, message: &str) -> Self {
        self.responses
            .push((needle.to_string(), Response::Fail(message.to_string())));
        self
    }

    pub fn with_default(mut self, result: QueryResult) -> Self {
        self.default = result;
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }

    /// Executed statements other than reads.
    pub fn ddl(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|sql| !sql.starts_with("SELECT"))
            .collect()
    }
}

impl QueryExecutor for MockExecutor {
    async fn execute(&self, sql: &str) -> Result<QueryResult, BoxError> {
        self.executed.lock().unwrap().push(sql.to_string());
        match self.responses.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            Some((_, Response::Rows(result))) => Ok(result.clone()),
            Some((_, Response::Fail(message))) => Err(message.clone().into()),
            None => Ok(self.default.clone()),
        }
    }
}

pub fn version_row(version: &str) -> QueryResult {
    QueryResult::with_rows(vec![Row::new().with("version", version)])
}

/// An `information_schema.COLUMNS` row as MySQL reports it.
pub fn mysql_column(
    name: &str,
    data_type: &str,
    column_type: &str,
    nullable: bool,
    key: &str,
    length: Option<i64>,
) -> Row {
    Row::new()
        .with("COLUMN_NAME", name)
        .with("DATA_TYPE", data_type)
        .with("COLUMN_TYPE", column_type)
        .with("IS_NULLABLE", if nullable { "YES" } else { "NO" })
        .with("COLUMN_DEFAULT", None::<String>)
        .with("COLUMN_KEY", key)
        .with("EXTRA", if key == "PRI" { "auto_increment" } else { "" })
        .with("CHARACTER_MAXIMUM_LENGTH", length)
}

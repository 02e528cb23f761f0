//! Error types for schema operations.

use strata_core::{MetadataError, QueryError};

use crate::executor::BoxError;

/// Errors that can occur while generating or executing DDL.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// A table, column, index or constraint name is not a valid identifier.
    #[error("Invalid {role} name: '{name}'")]
    InvalidName {
        /// What the name identifies.
        role: &'static str,
        /// The offending name.
        name: String,
    },

    /// CREATE TABLE was requested without columns.
    #[error("Table '{0}' must have at least one column")]
    NoColumns(String),

    /// An index or unique key was requested without columns.
    #[error("Index on '{0}' must have at least one column")]
    NoIndexColumns(String),

    /// The dialect has no mapping for a column type.
    #[error("{dialect} does not support column type {column_type}")]
    UnsupportedType {
        /// Dialect name.
        dialect: &'static str,
        /// Semantic column type.
        column_type: String,
    },

    /// The dialect does not implement an operation.
    #[error("{dialect} does not support {operation}")]
    Unsupported {
        /// Dialect name.
        dialect: &'static str,
        /// Operation name.
        operation: &'static str,
    },

    /// A statement failed to execute.
    #[error("Query failed while {context}: {source}")]
    QueryFailed {
        /// What was being done.
        context: String,
        /// Underlying driver error.
        #[source]
        source: BoxError,
    },

    /// An introspection row lacked an expected field.
    #[error("Unexpected result row: {0}")]
    UnexpectedRow(String),

    /// The server version string could not be parsed.
    #[error("Unrecognized server version: '{0}'")]
    UnknownVersion(String),

    /// A schema declaration file is not valid JSON for the expected shape.
    #[error("Invalid schema declaration: {0}")]
    Declaration(#[from] serde_json::Error),

    /// Metadata failed validation.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// An introspection query could not be built.
    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Result type for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;

//! Error types for the metadata model and the query builder.

use thiserror::Error;

/// Errors raised while constructing table, column, foreign key or relation
/// metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// A name is not a valid SQL identifier.
    #[error("invalid {role} name: '{name}'")]
    InvalidName {
        /// What the name identifies (table, column, ...).
        role: &'static str,
        /// The offending name.
        name: String,
    },

    /// A type name does not map to any known column type.
    #[error("unsupported column type: '{0}'")]
    UnsupportedType(String),

    /// A column length is zero or required but missing.
    #[error("invalid length for column '{column}': {reason}")]
    InvalidLength {
        /// Column name.
        column: String,
        /// Why the length was rejected.
        reason: &'static str,
    },

    /// A primary key column was declared nullable.
    #[error("primary key column '{0}' cannot be nullable")]
    NullablePrimaryKey(String),

    /// Auto-increment was requested on a non-integer column.
    #[error("column '{column}' of type {column_type} cannot auto-increment")]
    InvalidAutoIncrement {
        /// Column name.
        column: String,
        /// Declared type.
        column_type: String,
    },

    /// The table target is not a nameable type.
    #[error("invalid table target: '{0}' is not a named type")]
    InvalidTarget(String),

    /// A foreign key was declared without local columns.
    #[error("foreign key on '{0}' has no columns")]
    EmptyForeignKey(String),

    /// Local and referenced column lists differ in length.
    #[error("foreign key column count mismatch: {columns} column(s) reference {referenced} column(s)")]
    CardinalityMismatch {
        /// Number of local columns.
        columns: usize,
        /// Number of referenced columns.
        referenced: usize,
    },

    /// A relation asked for both an inner and a left join.
    #[error("relation '{0}' cannot be both always-inner and always-left joined")]
    ConflictingJoinHints(String),
}

/// Errors raised while assembling or rendering a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// `from()` was called with an empty target.
    #[error("invalid FROM target")]
    InvalidFrom,

    /// A join was given an empty target.
    #[error("invalid JOIN target")]
    InvalidJoinTarget,

    /// An ON or USING join was given empty criteria.
    #[error("{0} join requires criteria")]
    JoinRequiresCriteria(&'static str),

    /// A WHERE or HAVING condition was empty.
    #[error("condition cannot be empty")]
    EmptyCondition,

    /// A parameter name is not an identifier.
    #[error("invalid parameter name: '{0}'")]
    InvalidParameterName(String),

    /// A projected column is neither aggregated nor grouped.
    #[error("column '{0}' must appear in the GROUP BY clause or be used in an aggregate function")]
    MissingGroupBy(String),

    /// The query has no FROM clause.
    #[error("FROM clause required")]
    MissingFrom,

    /// An entity target was used without an entity resolver.
    #[error("entity '{0}' requires an entity resolver")]
    MissingResolver(String),

    /// The resolver does not know the entity.
    #[error("entity '{0}' could not be resolved to a table name")]
    UnresolvedEntity(String),
}

/// Result type alias for metadata construction.
pub type Result<T> = std::result::Result<T, MetadataError>;

//! Dialect-aware DDL generation and live schema diffing.
//!
//! `strata-schema` turns [`strata_core`] column and foreign key metadata
//! into DDL for MySQL/MariaDB and PostgreSQL, runs it through a
//! [`QueryExecutor`](executor::QueryExecutor), and reads the live schema
//! back so declared and actual columns can be compared.
//!
//! # Architecture
//!
//! - **Dialect** - Pure DDL rendering (`CREATE TABLE`, `ALTER TABLE`, ...)
//! - **Builder** - Executes DDL and introspection queries per dialect
//! - **Executor** - The one-statement-per-call execution contract
//! - **Diff** - Declared-versus-live column comparison
//! - **Declaration** - JSON table declarations for the CLI
//!
//! # Example
//!
//! ```rust
//! use strata_core::metadata::{Column, ColumnOptions, ColumnType};
//! use strata_schema::dialect::{DdlDialect, MySqlDialect};
//!
//! let columns = [
//!     Column::new(ColumnOptions::new("id", ColumnType::Integer).primary().auto_increment()).unwrap(),
//!     Column::new(ColumnOptions::new("name", ColumnType::VarChar).length(64)).unwrap(),
//! ];
//! let sql = MySqlDialect::new().create_table("users", &columns).unwrap();
//! assert!(sql[0].starts_with("CREATE TABLE `users` ("));
//! assert!(sql[0].contains("`name` VARCHAR(64) NULL"));
//! ```
//!
//! # CLI Usage
//!
//! ```bash
//! # List tables
//! strata --database mysql://root@localhost/app tables
//!
//! # Compare a declaration file with the live schema
//! strata diff --schema schema.json
//!
//! # Render CREATE TABLE statements without a connection
//! strata --dialect postgres ddl --schema schema.json
//! ```

pub mod builder;
pub mod declaration;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod executor;
pub mod introspect;
pub mod version;

pub use error::{Result, SchemaError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::builder::{MySqlSchemaBuilder, PostgresSchemaBuilder, SchemaBuilder};
    pub use crate::declaration::{parse_schema, TableDeclaration};
    pub use crate::dialect::{
        DdlDialect, GuardedObject, IndexKind, MySqlDialect, PostgresDialect,
    };
    pub use crate::diff::{changed_columns, missing_columns};
    pub use crate::error::{Result, SchemaError};
    pub use crate::executor::{AnyExecutor, QueryExecutor, QueryResult, Row};
    pub use crate::introspect::{
        ChangedColumn, ColumnInfo, ForeignKeyInfo, IndexInfo, UniqueConstraintInfo,
    };
    pub use crate::version::{DatabaseVersion, Flavor};
}

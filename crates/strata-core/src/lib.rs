//! # strata-core
//!
//! Metadata model and query builder for relational databases.
//!
//! - [`metadata`]: validated table, column, foreign key and relation
//!   descriptions.
//! - [`builder`]: a chainable SELECT builder with named parameters and
//!   entity-to-table resolution.
//!
//! ## Example
//!
//! ```rust
//! use strata_core::builder::QueryBuilder;
//!
//! let mut qb = QueryBuilder::new();
//! qb.select(&["id", "name"])
//!     .from("users", None)
//!     .unwrap()
//!     .where_("id = :id")
//!     .unwrap()
//!     .set_parameter("id", 42)
//!     .unwrap();
//!
//! assert_eq!(qb.get_query().unwrap(), "SELECT id, name FROM users WHERE id = 42");
//! ```

pub mod builder;
pub mod error;
pub mod ident;
pub mod metadata;

pub use builder::{QueryBuilder, SqlValue, ToSqlValue};
pub use error::{MetadataError, QueryError, Result};
pub use metadata::{Column, ColumnType, EntityType, ForeignKey, Table};

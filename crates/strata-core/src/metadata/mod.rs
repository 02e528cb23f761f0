//! Metadata model: tables, columns, foreign keys and relations.
//!
//! Every type here validates itself at construction and is immutable
//! afterwards. Constructors take an `*Options` struct holding the raw
//! declaration and return a [`MetadataError`](crate::MetadataError) on the
//! first violated rule.
//!
//! ```rust
//! use strata_core::metadata::{Column, ColumnOptions, ColumnType};
//!
//! let email = Column::new(ColumnOptions::new("email", ColumnType::VarChar).unique()).unwrap();
//! assert_eq!(email.length(), Some(255));
//! ```

mod column;
mod entity;
mod foreign_key;
mod naming;
mod relation;
mod table;

pub use column::{Column, ColumnOptions, ColumnType, DefaultValue};
pub use entity::EntityType;
pub use foreign_key::{ForeignKey, ForeignKeyAction, ForeignKeyOptions};
pub use naming::{DefaultNamingStrategy, NamingStrategy, SnakeCaseNamingStrategy};
pub use relation::{
    EntityProperties, InverseSide, JoinHint, Relation, RelationKind, RelationOptions,
};
pub use table::{Table, TableOptions, TableRegistry};

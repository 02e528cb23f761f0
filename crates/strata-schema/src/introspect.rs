//! Records read back from a live database.

use serde::Serialize;

/// A live column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Base type name as the engine reports it (`varchar`, `int4`, ...).
    pub data_type: String,
    /// Full type text including length (`varchar(255)`, `int(11)`, ...).
    pub column_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
    /// Default expression text, if any.
    pub default: Option<String>,
    /// Part of the primary key.
    pub primary: bool,
    /// Carries a single-column unique constraint.
    pub unique: bool,
    /// Auto-incrementing.
    pub auto_increment: bool,
    /// Character or numeric length, when the engine reports one.
    pub length: Option<u32>,
}

/// One column of a live index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexInfo {
    /// Index name.
    pub name: String,
    /// Indexed column.
    pub column: String,
    /// Whether the index is unique.
    pub unique: bool,
    /// Engine index method (`BTREE`, `FULLTEXT`, `btree`, ...).
    pub kind: String,
}

/// One column pair of a live foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyInfo {
    /// Constraint name.
    pub constraint_name: String,
    /// Local column.
    pub column: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
}

/// One column of a live unique constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueConstraintInfo {
    /// Constraint name.
    pub constraint_name: String,
    /// Constrained column.
    pub column: String,
}

/// A declared column whose live definition differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedColumn {
    /// Column name.
    pub name: String,
    /// Whether the live column is currently part of the primary key.
    pub is_primary: bool,
}

//! JSON table declarations.
//!
//! A declaration file lists the tables an application expects:
//!
//! ```json
//! {
//!   "tables": [
//!     {
//!       "name": "users",
//!       "columns": [
//!         { "name": "id", "type": "integer", "primary": true, "auto_increment": true },
//!         { "name": "email", "type": "string", "unique": true, "nullable": false }
//!       ],
//!       "foreign_keys": []
//!     }
//!   ]
//! }
//! ```
//!
//! Parsing validates everything up front: table names, every column and
//! every foreign key.

use serde::Deserialize;
use strata_core::metadata::{Column, ColumnOptions, ForeignKey};

use crate::builder::validate_name;
use crate::error::Result;

#[derive(Debug, Deserialize)]
struct SchemaFile {
    tables: Vec<TableEntry>,
}

#[derive(Debug, Deserialize)]
struct TableEntry {
    name: String,
    columns: Vec<ColumnOptions>,
    #[serde(default)]
    foreign_keys: Vec<ForeignKey>,
}

/// A validated table declaration.
#[derive(Debug, Clone)]
pub struct TableDeclaration {
    /// Table name.
    pub name: String,
    /// Columns, in declaration order.
    pub columns: Vec<Column>,
    /// Foreign keys owned by the table.
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableDeclaration {
    /// The declared column named `name`.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }
}

fn convert(entry: TableEntry) -> Result<TableDeclaration> {
    validate_name("table", &entry.name)?;
    let columns = entry
        .columns
        .into_iter()
        .map(Column::new)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    for fk in &entry.foreign_keys {
        fk.validate()?;
    }
    Ok(TableDeclaration {
        name: entry.name,
        columns,
        foreign_keys: entry.foreign_keys,
    })
}

/// Parses and validates a declaration document.
pub fn parse_schema(json: &str) -> Result<Vec<TableDeclaration>> {
    let file: SchemaFile = serde_json::from_str(json)?;
    file.tables.into_iter().map(convert).collect()
}

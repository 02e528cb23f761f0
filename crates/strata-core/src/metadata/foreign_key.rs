//! Foreign key metadata.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{MetadataError, Result};
use crate::ident::validate_identifier;

/// Foreign key referential action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Declared options for a foreign key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForeignKeyOptions {
    /// Owning table.
    pub table: String,
    /// Local columns, in order.
    pub columns: Vec<String>,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced columns, in the same order as `columns`.
    pub referenced_columns: Vec<String>,
    /// Explicit constraint name.
    pub name: Option<String>,
    /// ON DELETE action.
    pub on_delete: Option<ForeignKeyAction>,
    /// ON UPDATE action.
    pub on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyOptions {
    /// Options for `table(columns) REFERENCES referenced_table(referenced_columns)`.
    #[must_use]
    pub fn new<C, R>(
        table: impl Into<String>,
        columns: C,
        referenced_table: impl Into<String>,
        referenced_columns: R,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            referenced_table: referenced_table.into(),
            referenced_columns: referenced_columns.into_iter().map(Into::into).collect(),
            name: None,
            on_delete: None,
            on_update: None,
        }
    }

    /// Sets an explicit constraint name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the ON DELETE action.
    #[must_use]
    pub const fn on_delete(mut self, action: ForeignKeyAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    #[must_use]
    pub const fn on_update(mut self, action: ForeignKeyAction) -> Self {
        self.on_update = Some(action);
        self
    }
}

/// Foreign key metadata.
///
/// [`ForeignKey::new`] validates every name and the column cardinality.
/// Deserialized values skip that validation, so consumers that emit DDL
/// call [`ForeignKey::validate`] again before use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    table: String,
    columns: Vec<String>,
    referenced_table: String,
    referenced_columns: Vec<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    on_delete: Option<ForeignKeyAction>,
    #[serde(default)]
    on_update: Option<ForeignKeyAction>,
}

impl ForeignKey {
    /// Validates `options` and builds the foreign key.
    pub fn new(options: ForeignKeyOptions) -> Result<Self> {
        let fk = Self {
            table: options.table,
            columns: options.columns,
            referenced_table: options.referenced_table,
            referenced_columns: options.referenced_columns,
            name: options.name,
            on_delete: options.on_delete,
            on_update: options.on_update,
        };
        fk.validate()?;
        Ok(fk)
    }

    /// Checks names and cardinality.
    pub fn validate(&self) -> Result<()> {
        validate_identifier("table", &self.table)?;
        validate_identifier("referenced table", &self.referenced_table)?;
        if self.columns.is_empty() {
            return Err(MetadataError::EmptyForeignKey(self.table.clone()));
        }
        if self.columns.len() != self.referenced_columns.len() {
            return Err(MetadataError::CardinalityMismatch {
                columns: self.columns.len(),
                referenced: self.referenced_columns.len(),
            });
        }
        for column in &self.columns {
            validate_identifier("column", column)?;
        }
        for column in &self.referenced_columns {
            validate_identifier("referenced column", column)?;
        }
        if let Some(name) = &self.name {
            validate_identifier("foreign key", name)?;
        }
        Ok(())
    }

    /// Constraint name: the explicit one, or a generated `fk_xxxxxxxx`.
    #[must_use]
    pub fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.generated_name())
    }

    /// Deterministic name derived from the key's tables and columns.
    ///
    /// SHA-256 over the concatenation of table name, local columns,
    /// referenced table and referenced columns; the first 8 hex digits are
    /// kept.
    #[must_use]
    pub fn generated_name(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.table.as_bytes());
        hasher.update(self.columns.concat().as_bytes());
        hasher.update(self.referenced_table.as_bytes());
        hasher.update(self.referenced_columns.concat().as_bytes());
        let digest = hasher.finalize();
        let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
        format!("fk_{hex}")
    }

    /// Explicit name, if one was declared.
    #[must_use]
    pub fn explicit_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Owning table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Local columns.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Referenced table.
    #[must_use]
    pub fn referenced_table(&self) -> &str {
        &self.referenced_table
    }

    /// Referenced columns.
    #[must_use]
    pub fn referenced_columns(&self) -> &[String] {
        &self.referenced_columns
    }

    /// ON DELETE action.
    #[must_use]
    pub const fn on_delete(&self) -> Option<ForeignKeyAction> {
        self.on_delete
    }

    /// ON UPDATE action.
    #[must_use]
    pub const fn on_update(&self) -> Option<ForeignKeyAction> {
        self.on_update
    }
}

impl TryFrom<ForeignKeyOptions> for ForeignKey {
    type Error = MetadataError;

    fn try_from(options: ForeignKeyOptions) -> Result<Self> {
        Self::new(options)
    }
}

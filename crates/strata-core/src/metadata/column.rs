//! Column metadata.
//!
//! A [`Column`] is built once from [`ColumnOptions`] and never changes
//! afterwards. All validation happens in [`Column::new`], so a `Column`
//! value is always internally consistent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MetadataError, Result};
use crate::ident::validate_identifier;

use super::naming::NamingStrategy;

/// Semantic column types.
///
/// Dialects translate each variant into exactly one database type; see the
/// type tables in `strata-schema`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 32-bit integer.
    #[serde(alias = "int")]
    Integer,
    /// 64-bit integer.
    #[serde(alias = "bigint")]
    BigInteger,
    /// Fixed-point decimal.
    #[serde(alias = "numeric")]
    Decimal,
    /// Single precision float.
    Float,
    /// Double precision float.
    Double,
    /// Variable-length string.
    #[serde(alias = "varchar", alias = "string")]
    VarChar,
    /// Fixed-length string.
    Char,
    /// Unbounded text.
    Text,
    /// Calendar date.
    Date,
    /// Date and time without zone.
    #[serde(alias = "datetime")]
    DateTime,
    /// Timestamp.
    Timestamp,
    /// Boolean.
    #[serde(alias = "bool")]
    Boolean,
    /// Binary large object.
    #[serde(alias = "binary")]
    Blob,
    /// JSON document.
    Json,
    /// UUID.
    Uuid,
}

impl ColumnType {
    /// Every column type, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::Integer,
        Self::BigInteger,
        Self::Decimal,
        Self::Float,
        Self::Double,
        Self::VarChar,
        Self::Char,
        Self::Text,
        Self::Date,
        Self::DateTime,
        Self::Timestamp,
        Self::Boolean,
        Self::Blob,
        Self::Json,
        Self::Uuid,
    ];

    /// Canonical name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::BigInteger => "big_integer",
            Self::Decimal => "decimal",
            Self::Float => "float",
            Self::Double => "double",
            Self::VarChar => "var_char",
            Self::Char => "char",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "date_time",
            Self::Timestamp => "timestamp",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
            Self::Json => "json",
            Self::Uuid => "uuid",
        }
    }

    /// Length used when a column of this type declares none.
    #[must_use]
    pub const fn default_length(self) -> Option<u32> {
        match self {
            Self::Integer => Some(11),
            Self::BigInteger => Some(20),
            Self::Decimal | Self::Float => Some(10),
            Self::VarChar => Some(255),
            Self::Char | Self::Boolean => Some(1),
            Self::Uuid => Some(36),
            Self::Double
            | Self::Text
            | Self::Date
            | Self::DateTime
            | Self::Timestamp
            | Self::Blob
            | Self::Json => None,
        }
    }

    /// Whether a column of this type must carry a positive length.
    #[must_use]
    pub const fn requires_length(self) -> bool {
        matches!(self, Self::VarChar | Self::Char)
    }

    /// Whether the type can back an auto-increment column.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::Integer | Self::BigInteger)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self> {
        let ty = match s.to_ascii_lowercase().as_str() {
            "integer" | "int" => Self::Integer,
            "big_integer" | "biginteger" | "bigint" => Self::BigInteger,
            "decimal" | "numeric" => Self::Decimal,
            "float" => Self::Float,
            "double" => Self::Double,
            "var_char" | "varchar" | "string" => Self::VarChar,
            "char" => Self::Char,
            "text" => Self::Text,
            "date" => Self::Date,
            "date_time" | "datetime" => Self::DateTime,
            "timestamp" => Self::Timestamp,
            "boolean" | "bool" => Self::Boolean,
            "blob" | "binary" => Self::Blob,
            "json" => Self::Json,
            "uuid" => Self::Uuid,
            _ => return Err(MetadataError::UnsupportedType(s.to_string())),
        };
        Ok(ty)
    }
}

/// Default value for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultValue {
    /// NULL default.
    Null,
    /// Boolean default.
    Boolean(bool),
    /// Integer default.
    Integer(i64),
    /// Float default.
    Float(f64),
    /// String default.
    String(String),
    /// Raw SQL expression (e.g., CURRENT_TIMESTAMP).
    Expression {
        /// Expression text, emitted verbatim.
        expression: String,
    },
}

impl DefaultValue {
    /// Creates a raw SQL expression default.
    #[must_use]
    pub fn expression(expr: impl Into<String>) -> Self {
        Self::Expression {
            expression: expr.into(),
        }
    }

    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Boolean(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Integer(i) => i.to_string(),
            Self::Float(f) if f.is_finite() => f.to_string(),
            Self::Float(_) => String::from("NULL"),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Expression { expression } => expression.clone(),
        }
    }
}

/// Declared options for a column, before validation.
///
/// Unset flags default to `false`. An unset `nullable` means nullable for
/// ordinary columns and NOT NULL for primary key columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ColumnOptions {
    /// Column (or property) name.
    pub name: String,
    /// Semantic type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Explicit length; falls back to [`ColumnType::default_length`].
    #[serde(default)]
    pub length: Option<u32>,
    /// Decimal scale.
    #[serde(default)]
    pub scale: Option<u32>,
    /// Part of the primary key.
    #[serde(default)]
    pub primary: bool,
    /// Auto-incrementing.
    #[serde(default)]
    pub auto_increment: bool,
    /// Carries a UNIQUE constraint.
    #[serde(default)]
    pub unique: bool,
    /// Accepts NULL.
    #[serde(default)]
    pub nullable: Option<bool>,
    /// Raw definition text appended to the generated column definition.
    #[serde(default)]
    pub definition: Option<String>,
    /// Column comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Name the column had before a rename.
    #[serde(default)]
    pub previous_name: Option<String>,
    /// Default value.
    #[serde(default)]
    pub default: Option<DefaultValue>,
}

impl ColumnOptions {
    /// Creates options for a column with no constraints.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            length: None,
            scale: None,
            primary: false,
            auto_increment: false,
            unique: false,
            nullable: None,
            definition: None,
            comment: None,
            previous_name: None,
            default: None,
        }
    }

    /// Sets an explicit length.
    #[must_use]
    pub const fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Sets the decimal scale.
    #[must_use]
    pub const fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Marks the column as primary key. Primary keys are implicitly NOT NULL.
    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    /// Marks the column as auto-incrementing.
    #[must_use]
    pub const fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Marks the column as UNIQUE.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as NOT NULL.
    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.nullable = Some(false);
        self
    }

    /// Marks the column as nullable.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    /// Appends raw definition text.
    #[must_use]
    pub fn definition(mut self, definition: impl Into<String>) -> Self {
        self.definition = Some(definition.into());
        self
    }

    /// Sets the column comment.
    #[must_use]
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Records the name this column had before being renamed.
    #[must_use]
    pub fn previous_name(mut self, name: impl Into<String>) -> Self {
        self.previous_name = Some(name.into());
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default(mut self, value: DefaultValue) -> Self {
        self.default = Some(value);
        self
    }
}

/// Validated, immutable column metadata.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::struct_excessive_bools)]
pub struct Column {
    name: String,
    column_type: ColumnType,
    length: Option<u32>,
    scale: Option<u32>,
    primary: bool,
    auto_increment: bool,
    unique: bool,
    nullable: bool,
    definition: Option<String>,
    comment: Option<String>,
    previous_name: Option<String>,
    default: Option<DefaultValue>,
}

impl Column {
    /// Validates `options` and builds the column.
    pub fn new(options: ColumnOptions) -> Result<Self> {
        validate_identifier("column", &options.name)?;
        if let Some(previous) = &options.previous_name {
            validate_identifier("previous column", previous)?;
        }

        let length = options.length.or_else(|| options.column_type.default_length());
        match length {
            Some(0) => {
                return Err(MetadataError::InvalidLength {
                    column: options.name,
                    reason: "length must be greater than zero",
                })
            }
            None if options.column_type.requires_length() => {
                return Err(MetadataError::InvalidLength {
                    column: options.name,
                    reason: "type requires a length",
                })
            }
            _ => {}
        }

        let nullable = options.nullable.unwrap_or(!options.primary);
        if options.primary && nullable {
            return Err(MetadataError::NullablePrimaryKey(options.name));
        }
        if options.auto_increment && !options.column_type.is_integer() {
            return Err(MetadataError::InvalidAutoIncrement {
                column: options.name,
                column_type: options.column_type.to_string(),
            });
        }

        Ok(Self {
            name: options.name,
            column_type: options.column_type,
            length,
            scale: options.scale,
            primary: options.primary,
            auto_increment: options.auto_increment,
            unique: options.unique,
            nullable,
            definition: options.definition,
            comment: options.comment,
            previous_name: options.previous_name,
            default: options.default,
        })
    }

    /// Builds the column after passing its name through `naming`.
    pub fn with_naming(mut options: ColumnOptions, naming: &dyn NamingStrategy) -> Result<Self> {
        options.name = naming.column_name(&options.name);
        options.previous_name = options.previous_name.map(|p| naming.column_name(&p));
        Self::new(options)
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Semantic type.
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Declared or defaulted length.
    #[must_use]
    pub const fn length(&self) -> Option<u32> {
        self.length
    }

    /// Decimal scale.
    #[must_use]
    pub const fn scale(&self) -> Option<u32> {
        self.scale
    }

    /// Whether the column is part of the primary key.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    /// Whether the column auto-increments.
    #[must_use]
    pub const fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Whether the column carries a UNIQUE constraint.
    #[must_use]
    pub const fn is_unique(&self) -> bool {
        self.unique
    }

    /// Whether the column accepts NULL.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Raw definition override.
    #[must_use]
    pub fn definition(&self) -> Option<&str> {
        self.definition.as_deref()
    }

    /// Column comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Name before the most recent rename.
    #[must_use]
    pub fn previous_name(&self) -> Option<&str> {
        self.previous_name.as_deref()
    }

    /// Default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }
}

impl TryFrom<ColumnOptions> for Column {
    type Error = MetadataError;

    fn try_from(options: ColumnOptions) -> Result<Self> {
        Self::new(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn varchar_defaults_to_255() {
        let col = Column::new(ColumnOptions::new("email", ColumnType::VarChar)).unwrap();
        assert_eq!(col.column_type(), ColumnType::VarChar);
        assert_eq!(col.length(), Some(255));
        assert!(col.is_nullable());
    }

    #[test]
    fn default_lengths() {
        let length = ColumnType::default_length;
        assert_eq!(length(ColumnType::Char), Some(1));
        assert_eq!(length(ColumnType::Boolean), Some(1));
        assert_eq!(length(ColumnType::Integer), Some(11));
        assert_eq!(length(ColumnType::Float), Some(10));
        assert_eq!(length(ColumnType::Text), None);
        assert_eq!(length(ColumnType::Json), None);
        assert_eq!(length(ColumnType::Date), None);
        assert_eq!(length(ColumnType::Timestamp), None);
    }

    #[test]
    fn explicit_length_wins() {
        let col = Column::new(ColumnOptions::new("code", ColumnType::Char).length(3)).unwrap();
        assert_eq!(col.length(), Some(3));
    }

    #[test]
    fn zero_length_is_rejected() {
        let err = Column::new(ColumnOptions::new("code", ColumnType::VarChar).length(0));
        assert!(matches!(err, Err(MetadataError::InvalidLength { .. })));
    }

    #[test]
    fn nullable_primary_key_is_rejected() {
        let err = Column::new(ColumnOptions::new("id", ColumnType::Integer).primary().nullable());
        assert_eq!(err, Err(MetadataError::NullablePrimaryKey("id".to_string())));
    }

    #[test]
    fn primary_implies_not_null() {
        let col = Column::new(ColumnOptions::new("id", ColumnType::Integer).primary()).unwrap();
        assert!(col.is_primary());
        assert!(!col.is_nullable());
    }

    #[test]
    fn auto_increment_requires_integer() {
        let err = Column::new(ColumnOptions::new("slug", ColumnType::VarChar).auto_increment());
        assert!(matches!(
            err,
            Err(MetadataError::InvalidAutoIncrement { .. })
        ));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let err = Column::new(ColumnOptions::new("first name", ColumnType::Text));
        assert!(matches!(
            err,
            Err(MetadataError::InvalidName { role: "column", .. })
        ));

        let err = Column::new(ColumnOptions::new("name", ColumnType::Text).previous_name("1st"));
        assert!(matches!(
            err,
            Err(MetadataError::InvalidName {
                role: "previous column",
                ..
            })
        ));
    }

    #[test]
    fn type_names_parse() {
        assert_eq!("string".parse::<ColumnType>(), Ok(ColumnType::VarChar));
        assert_eq!("BIGINT".parse::<ColumnType>(), Ok(ColumnType::BigInteger));
        assert_eq!("bool".parse::<ColumnType>(), Ok(ColumnType::Boolean));
        assert_eq!(
            "money".parse::<ColumnType>(),
            Err(MetadataError::UnsupportedType("money".to_string()))
        );
        for ty in ColumnType::ALL {
            assert_eq!(ty.as_str().parse::<ColumnType>(), Ok(ty));
        }
    }

    #[test]
    fn default_value_sql() {
        assert_eq!(DefaultValue::Null.to_sql(), "NULL");
        assert_eq!(DefaultValue::Boolean(true).to_sql(), "TRUE");
        assert_eq!(DefaultValue::Integer(-3).to_sql(), "-3");
        assert_eq!(DefaultValue::Float(0.25).to_sql(), "0.25");
        assert_eq!(DefaultValue::Float(f64::NAN).to_sql(), "NULL");
        assert_eq!(DefaultValue::Float(f64::INFINITY).to_sql(), "NULL");
        assert_eq!(DefaultValue::String("it's".into()).to_sql(), "'it''s'");
        assert_eq!(
            DefaultValue::expression("CURRENT_TIMESTAMP").to_sql(),
            "CURRENT_TIMESTAMP"
        );
    }
}

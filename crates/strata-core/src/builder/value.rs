//! SQL values and parameter handling.
//!
//! Values bound to named query parameters are rendered inline through
//! [`SqlValue::to_sql_inline`], which escapes text so that bound input can
//! never terminate a string literal.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// A SQL value that can be used as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Calendar date.
    Date(NaiveDate),
    /// Point in time.
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Dates and timestamps render as quoted ISO-8601.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) if f.is_finite() => format!("{f}"),
            // NaN and infinity have no SQL literal
            Self::Float(_) => String::from("NULL"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::Timestamp(ts) => {
                format!("'{}'", ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
        }
    }

    /// Whether the value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Borrowed text, for `Text` values only.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form of any non-NULL value. Blobs are decoded as UTF-8.
    #[must_use]
    pub fn to_text(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(b) => Some(b.to_string()),
            Self::Int(n) => Some(n.to_string()),
            Self::Float(f) => Some(f.to_string()),
            Self::Text(s) => Some(s.clone()),
            Self::Blob(b) => Some(String::from_utf8_lossy(b).into_owned()),
            Self::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Self::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// Integer view of the value; numeric text is parsed.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(_) | Self::Blob(_) => self.to_text()?.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view of the value; `0`/`1` and `true`/`false` text are
    /// accepted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(n) => Some(*n != 0),
            Self::Text(_) | Self::Blob(_) => {
                match self.to_text()?.trim().to_ascii_lowercase().as_str() {
                    "1" | "true" | "t" | "yes" => Some(true),
                    "0" | "false" | "f" | "no" => Some(false),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

impl ToSqlValue for i64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(self)
    }
}

impl ToSqlValue for i32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for i16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u16 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for u8 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Int(i64::from(self))
    }
}

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Date(self)
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_sql_value_inline_null() {
        assert_eq!(SqlValue::Null.to_sql_inline(), "NULL");
    }

    #[test]
    fn test_sql_value_inline_bool() {
        assert_eq!(SqlValue::Bool(true).to_sql_inline(), "TRUE");
        assert_eq!(SqlValue::Bool(false).to_sql_inline(), "FALSE");
    }

    #[test]
    fn test_sql_value_inline_text_escaping() {
        assert_eq!(
            SqlValue::Text(String::from("O'Brien")).to_sql_inline(),
            "'O''Brien'"
        );
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious = "'; DROP TABLE users; --";
        let escaped = SqlValue::Text(String::from(malicious)).to_sql_inline();
        assert_eq!(escaped, "'''; DROP TABLE users; --'");
    }

    #[test]
    fn test_non_finite_floats_render_null() {
        assert_eq!(SqlValue::Float(1.5).to_sql_inline(), "1.5");
        assert_eq!(SqlValue::Float(f64::NAN).to_sql_inline(), "NULL");
        assert_eq!(SqlValue::Float(f64::INFINITY).to_sql_inline(), "NULL");
        assert_eq!(SqlValue::Float(f64::NEG_INFINITY).to_sql_inline(), "NULL");
    }

    #[test]
    fn test_dates_render_iso_8601() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(date.to_sql_value().to_sql_inline(), "'2024-03-09'");

        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();
        assert_eq!(
            ts.to_sql_value().to_sql_inline(),
            "'2024-03-09T14:05:00.000Z'"
        );
    }

    #[test]
    fn test_lenient_accessors() {
        assert_eq!(SqlValue::Text("42".into()).as_i64(), Some(42));
        assert_eq!(SqlValue::Blob(b"7".to_vec()).as_i64(), Some(7));
        assert_eq!(SqlValue::Int(0).as_bool(), Some(false));
        assert_eq!(SqlValue::Text("YES".into()).as_bool(), Some(true));
        assert_eq!(SqlValue::Null.to_text(), None);
        assert_eq!(SqlValue::Blob(b"varchar".to_vec()).to_text().as_deref(), Some("varchar"));
    }

    #[test]
    fn test_to_sql_value_conversions() {
        assert_eq!(true.to_sql_value(), SqlValue::Bool(true));
        assert_eq!(42_i32.to_sql_value(), SqlValue::Int(42));
        assert_eq!(2.5_f64.to_sql_value(), SqlValue::Float(2.5));
        assert_eq!("hello".to_sql_value(), SqlValue::Text(String::from("hello")));
        assert_eq!(None::<i32>.to_sql_value(), SqlValue::Null);
    }
}

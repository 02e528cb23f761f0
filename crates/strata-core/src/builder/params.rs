//! Named parameter normalization and substitution.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::QueryError;

use super::value::SqlValue;

/// Leading marker of a named parameter.
pub const PARAMETER_MARKER: char = ':';

static PARAMETER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:[A-Za-z_][A-Za-z0-9_]*$").expect("parameter pattern is valid")
});

/// Adds the leading marker if missing and validates the result.
pub(crate) fn normalize_name(name: &str) -> Result<String, QueryError> {
    let name = name.trim();
    let normalized = if name.starts_with(PARAMETER_MARKER) {
        name.to_string()
    } else {
        format!("{PARAMETER_MARKER}{name}")
    };
    if PARAMETER_NAME.is_match(&normalized) {
        Ok(normalized)
    } else {
        Err(QueryError::InvalidParameterName(name.to_string()))
    }
}

const fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Replaces every `:name` token found in `params` with its inline value.
///
/// The scan is single-pass: a token is the marker followed by the longest
/// run of identifier characters, so `:id` never matches inside `:identity`,
/// and substituted text is never rescanned. Single-quoted literals and `::`
/// casts are copied through untouched, and so are double-quoted and
/// backtick-quoted identifiers.
pub(crate) fn substitute(sql: &str, params: &BTreeMap<String, SqlValue>) -> String {
    if params.is_empty() {
        return sql.to_string();
    }

    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len());
    // Closing quote of the literal or quoted identifier being copied.
    let mut quoted: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if let Some(close) = quoted {
            out.push(c);
            if c == close {
                quoted = None;
            }
            i += 1;
            continue;
        }

        if matches!(c, '\'' | '"' | '`') {
            quoted = Some(c);
            out.push(c);
            i += 1;
            continue;
        }

        if c == PARAMETER_MARKER {
            // `::type` casts
            if chars.get(i + 1) == Some(&PARAMETER_MARKER) {
                out.push_str("::");
                i += 2;
                continue;
            }
            let start = i + 1;
            let mut end = start;
            while end < chars.len() && is_name_char(chars[end]) {
                end += 1;
            }
            if end > start {
                let token: String = chars[i..end].iter().collect();
                if let Some(value) = params.get(&token) {
                    out.push_str(&value.to_sql_inline());
                    i = end;
                    continue;
                }
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

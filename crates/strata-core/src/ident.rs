//! SQL identifier validation.
//!
//! Every table, column, index and constraint name that ends up in generated
//! SQL passes through [`validate_identifier`] first. Identifiers are never
//! escaped, only accepted or rejected.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MetadataError, Result};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
});

/// Returns `true` if `name` starts with a letter or underscore and contains
/// only ASCII alphanumerics and underscores.
#[must_use]
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name)
}

/// Validates `name`, reporting `role` (e.g. `"table"`) in the error.
pub fn validate_identifier(role: &'static str, name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(MetadataError::InvalidName {
            role,
            name: name.to_string(),
        })
    }
}

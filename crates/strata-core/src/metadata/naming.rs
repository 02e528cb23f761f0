//! Naming strategies.
//!
//! A strategy turns declared identity names (type names, property names)
//! into physical names. Metadata constructors consult it when one is
//! supplied; otherwise names are used unmodified.

use heck::ToSnakeCase;

/// Maps declared names to physical table, column and relation names.
pub trait NamingStrategy: Send + Sync {
    /// Physical table name for an entity name.
    fn table_name(&self, identity: &str) -> String;

    /// Physical column name for a property name.
    fn column_name(&self, identity: &str) -> String;

    /// Physical name for a relation property.
    fn relation_name(&self, identity: &str) -> String;
}

/// Uses declared names unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamingStrategy;

impl NamingStrategy for DefaultNamingStrategy {
    fn table_name(&self, identity: &str) -> String {
        identity.to_string()
    }

    fn column_name(&self, identity: &str) -> String {
        identity.to_string()
    }

    fn relation_name(&self, identity: &str) -> String {
        identity.to_string()
    }
}

/// Converts every name to `snake_case` (`OrderItem` becomes `order_item`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakeCaseNamingStrategy;

impl NamingStrategy for SnakeCaseNamingStrategy {
    fn table_name(&self, identity: &str) -> String {
        identity.to_snake_case()
    }

    fn column_name(&self, identity: &str) -> String {
        identity.to_snake_case()
    }

    fn relation_name(&self, identity: &str) -> String {
        identity.to_snake_case()
    }
}

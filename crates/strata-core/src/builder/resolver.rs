//! Entity-to-table name resolution.

use crate::metadata::{EntityType, TableRegistry};

/// Maps an entity reference to its physical table name.
///
/// Closures of type `Fn(&EntityType) -> String` implement this trait, as
/// does [`TableRegistry`].
pub trait EntityResolver: Send + Sync {
    /// Returns the table name for `entity`, or `None` if it is unknown.
    fn resolve(&self, entity: &EntityType) -> Option<String>;
}

impl<F> EntityResolver for F
where
    F: Fn(&EntityType) -> String + Send + Sync,
{
    fn resolve(&self, entity: &EntityType) -> Option<String> {
        Some(self(entity))
    }
}

impl EntityResolver for TableRegistry {
    fn resolve(&self, entity: &EntityType) -> Option<String> {
        self.table_name(entity).map(str::to_string)
    }
}

//! Opaque entity identities.

use std::any::{type_name, TypeId};
use std::fmt;

/// Identity of a Rust type that backs a table.
///
/// This is the handle the query builder accepts instead of a literal table
/// name; it is resolved to a name only at render time.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityType {
    id: TypeId,
    type_name: &'static str,
}

impl EntityType {
    /// The identity of `T`.
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// The underlying [`TypeId`].
    #[must_use]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, e.g. `app::models::User`.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Unqualified type name without generic arguments, e.g. `User`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        let base = self.type_name.split('<').next().unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityType").field(&self.type_name).finish()
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

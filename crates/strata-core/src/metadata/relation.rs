//! Relation metadata between entities.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{MetadataError, Result};
use crate::ident::validate_identifier;

use super::entity::EntityType;
use super::naming::NamingStrategy;

/// Cardinality of a relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// One-to-one.
    OneToOne,
    /// One-to-many.
    OneToMany,
    /// Many-to-one.
    ManyToOne,
    /// Many-to-many.
    ManyToMany,
}

/// Join the relation should always be loaded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinHint {
    /// Always INNER JOIN.
    Inner,
    /// Always LEFT JOIN.
    Left,
}

/// Property names of an entity, keyed by property and mapped to the
/// physical column or relation name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityProperties {
    properties: BTreeMap<String, String>,
}

impl EntityProperties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a property whose physical name equals its declared name.
    #[must_use]
    pub fn with(mut self, property: impl Into<String>) -> Self {
        let property = property.into();
        self.properties.insert(property.clone(), property);
        self
    }

    /// Adds a property with an explicit physical name.
    #[must_use]
    pub fn with_mapped(mut self, property: impl Into<String>, name: impl Into<String>) -> Self {
        self.properties.insert(property.into(), name.into());
        self
    }

    /// Physical name of `property`.
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    /// Declared property names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }
}

/// How the inverse side of a relation is found.
#[derive(Clone)]
pub enum InverseSide {
    /// A literal property name on the related entity.
    Named(String),
    /// Computed from the related entity's properties.
    Resolver(fn(&EntityProperties) -> String),
}

impl fmt::Debug for InverseSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Declared options for a relation.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RelationOptions {
    /// Property name on the owning entity.
    pub property: String,
    /// Cardinality.
    pub kind: RelationKind,
    /// Resolves the related entity lazily, so entities may refer to each
    /// other.
    pub target: fn() -> EntityType,
    /// Inverse side, if the relation is bidirectional.
    pub inverse: Option<InverseSide>,
    /// Whether this side owns the foreign key.
    pub owner: bool,
    /// Cascade inserts to the related entity.
    pub cascade_insert: bool,
    /// Cascade updates to the related entity.
    pub cascade_update: bool,
    /// Cascade removals to the related entity.
    pub cascade_remove: bool,
    /// Whether the relation may be absent.
    pub nullable: bool,
    /// Join to use when loading the relation.
    pub join: Option<JoinHint>,
}

impl RelationOptions {
    /// Options for a nullable, non-owning, non-cascading relation.
    #[must_use]
    pub fn new(property: impl Into<String>, kind: RelationKind, target: fn() -> EntityType) -> Self {
        Self {
            property: property.into(),
            kind,
            target,
            inverse: None,
            owner: false,
            cascade_insert: false,
            cascade_update: false,
            cascade_remove: false,
            nullable: true,
            join: None,
        }
    }
}

/// Validated, immutable relation metadata.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct Relation {
    property: String,
    kind: RelationKind,
    target: fn() -> EntityType,
    inverse: Option<InverseSide>,
    owner: bool,
    cascade_insert: bool,
    cascade_update: bool,
    cascade_remove: bool,
    nullable: bool,
    join: Option<JoinHint>,
}

impl Relation {
    /// Validates `options` and builds the relation.
    pub fn new(options: RelationOptions) -> Result<Self> {
        validate_identifier("relation", &options.property)?;
        if let Some(InverseSide::Named(name)) = &options.inverse {
            validate_identifier("inverse relation", name)?;
        }
        Ok(Self {
            property: options.property,
            kind: options.kind,
            target: options.target,
            inverse: options.inverse,
            owner: options.owner,
            cascade_insert: options.cascade_insert,
            cascade_update: options.cascade_update,
            cascade_remove: options.cascade_remove,
            nullable: options.nullable,
            join: options.join,
        })
    }

    /// Builds a relation from options carrying separate inner/left join
    /// flags, as declarations often do.
    pub fn with_join_flags(mut options: RelationOptions, inner: bool, left: bool) -> Result<Self> {
        options.join = match (inner, left) {
            (true, true) => return Err(MetadataError::ConflictingJoinHints(options.property)),
            (true, false) => Some(JoinHint::Inner),
            (false, true) => Some(JoinHint::Left),
            (false, false) => None,
        };
        Self::new(options)
    }

    /// Property name on the owning entity.
    #[must_use]
    pub fn property(&self) -> &str {
        &self.property
    }

    /// Physical relation name under `naming`.
    #[must_use]
    pub fn name(&self, naming: &dyn NamingStrategy) -> String {
        naming.relation_name(&self.property)
    }

    /// Cardinality.
    #[must_use]
    pub const fn kind(&self) -> RelationKind {
        self.kind
    }

    /// The related entity.
    #[must_use]
    pub fn target(&self) -> EntityType {
        (self.target)()
    }

    /// Inverse property name on the related entity, given its properties.
    #[must_use]
    pub fn inverse_property(&self, related: &EntityProperties) -> Option<String> {
        match &self.inverse {
            Some(InverseSide::Named(name)) => Some(name.clone()),
            Some(InverseSide::Resolver(resolve)) => Some(resolve(related)),
            None => None,
        }
    }

    /// Whether this side owns the foreign key.
    #[must_use]
    pub const fn is_owner(&self) -> bool {
        self.owner
    }

    /// Whether inserts cascade.
    #[must_use]
    pub const fn cascades_insert(&self) -> bool {
        self.cascade_insert
    }

    /// Whether updates cascade.
    #[must_use]
    pub const fn cascades_update(&self) -> bool {
        self.cascade_update
    }

    /// Whether removals cascade.
    #[must_use]
    pub const fn cascades_remove(&self) -> bool {
        self.cascade_remove
    }

    /// Whether the relation may be absent.
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Join hint.
    #[must_use]
    pub const fn join_hint(&self) -> Option<JoinHint> {
        self.join
    }
}

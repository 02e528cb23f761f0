//! Table metadata and the entity-to-table registry.

use std::collections::HashMap;

use crate::error::{MetadataError, Result};
use crate::ident::{is_valid_identifier, validate_identifier};

use super::entity::EntityType;
use super::naming::NamingStrategy;

/// Declared options for a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    /// Explicit physical name. Overrides the naming strategy.
    pub name: Option<String>,
    /// Abstract tables describe shared columns and are never created.
    pub is_abstract: bool,
}

impl TableOptions {
    /// Options with an explicit table name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            is_abstract: false,
        }
    }
}

/// Validated, immutable table metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    entity: EntityType,
    name: String,
    is_abstract: bool,
}

impl Table {
    /// Builds the table for `entity`.
    ///
    /// The name is the explicit one from `options`, or the entity's short
    /// type name.
    pub fn new(entity: EntityType, options: TableOptions) -> Result<Self> {
        Self::build(entity, options, None)
    }

    /// Like [`Table::new`], but derives the name through `naming` when no
    /// explicit name is given.
    pub fn with_naming(
        entity: EntityType,
        options: TableOptions,
        naming: &dyn NamingStrategy,
    ) -> Result<Self> {
        Self::build(entity, options, Some(naming))
    }

    fn build(
        entity: EntityType,
        options: TableOptions,
        naming: Option<&dyn NamingStrategy>,
    ) -> Result<Self> {
        let identity = entity.short_name();
        if !is_valid_identifier(identity) {
            return Err(MetadataError::InvalidTarget(entity.type_name().to_string()));
        }

        let name = match (options.name, naming) {
            (Some(name), _) => name,
            (None, Some(naming)) => naming.table_name(identity),
            (None, None) => identity.to_string(),
        };
        validate_identifier("table", &name)?;

        Ok(Self {
            entity,
            name,
            is_abstract: options.is_abstract,
        })
    }

    /// The backing entity.
    #[must_use]
    pub const fn entity(&self) -> EntityType {
        self.entity
    }

    /// Resolved physical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the table is abstract.
    #[must_use]
    pub const fn is_abstract(&self) -> bool {
        self.is_abstract
    }
}

/// Lookup from entity identity to table metadata.
#[derive(Debug, Clone, Default)]
pub struct TableRegistry {
    tables: HashMap<EntityType, Table>,
}

impl TableRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table, replacing any previous table for the same entity.
    pub fn register(&mut self, table: Table) -> &mut Self {
        self.tables.insert(table.entity(), table);
        self
    }

    /// Looks up the table for `entity`.
    #[must_use]
    pub fn get(&self, entity: &EntityType) -> Option<&Table> {
        self.tables.get(entity)
    }

    /// Physical name of a concrete (non-abstract) registered table.
    #[must_use]
    pub fn table_name(&self, entity: &EntityType) -> Option<&str> {
        self.get(entity)
            .filter(|t| !t.is_abstract())
            .map(Table::name)
    }

    /// Tables that are physically created, sorted by name.
    #[must_use]
    pub fn concrete_tables(&self) -> Vec<&Table> {
        let mut tables: Vec<&Table> = self.tables.values().filter(|t| !t.is_abstract()).collect();
        tables.sort_by(|a, b| a.name().cmp(b.name()));
        tables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::naming::SnakeCaseNamingStrategy;

    struct OrderItem;
    struct Timestamped;

    #[test]
    fn name_defaults_to_type_name() {
        let table = Table::new(EntityType::of::<OrderItem>(), TableOptions::default()).unwrap();
        assert_eq!(table.name(), "OrderItem");
        assert!(!table.is_abstract());
    }

    #[test]
    fn naming_strategy_applies_without_explicit_name() {
        let naming = SnakeCaseNamingStrategy;
        let table = Table::with_naming(
            EntityType::of::<OrderItem>(),
            TableOptions::default(),
            &naming,
        )
        .unwrap();
        assert_eq!(table.name(), "order_item");

        let table = Table::with_naming(
            EntityType::of::<OrderItem>(),
            TableOptions::named("line_items"),
            &naming,
        )
        .unwrap();
        assert_eq!(table.name(), "line_items");
    }

    #[test]
    fn rejects_unnameable_targets() {
        let err = Table::new(EntityType::of::<(i32, i32)>(), TableOptions::default());
        assert!(matches!(err, Err(MetadataError::InvalidTarget(_))));

        let err = Table::new(EntityType::of::<&str>(), TableOptions::default());
        assert!(matches!(err, Err(MetadataError::InvalidTarget(_))));
    }

    #[test]
    fn rejects_invalid_explicit_name() {
        let err = Table::new(EntityType::of::<OrderItem>(), TableOptions::named("order items"));
        assert!(matches!(
            err,
            Err(MetadataError::InvalidName { role: "table", .. })
        ));
    }

    #[test]
    fn registry_skips_abstract_tables() {
        let mut registry = TableRegistry::new();
        registry
            .register(Table::new(EntityType::of::<OrderItem>(), TableOptions::named("order_items")).unwrap())
            .register(
                Table::new(
                    EntityType::of::<Timestamped>(),
                    TableOptions {
                        name: None,
                        is_abstract: true,
                    },
                )
                .unwrap(),
            );

        assert_eq!(
            registry.table_name(&EntityType::of::<OrderItem>()),
            Some("order_items")
        );
        assert_eq!(registry.table_name(&EntityType::of::<Timestamped>()), None);
        assert_eq!(registry.concrete_tables().len(), 1);
    }
}

//! Clause fragments accumulated by [`QueryBuilder`](super::QueryBuilder).
//!
//! Fragments hold raw text and are only turned into SQL at render time.

use std::fmt;

use crate::metadata::EntityType;

/// A FROM or JOIN target: a literal table name or an entity to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Literal table name, emitted as-is.
    Name(String),
    /// Entity resolved through an [`EntityResolver`](super::EntityResolver).
    Entity(EntityType),
}

impl Target {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Name(name) => name.trim().is_empty(),
            Self::Entity(_) => false,
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<EntityType> for Target {
    fn from(entity: EntityType) -> Self {
        Self::Entity(entity)
    }
}

/// JOIN flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// INNER JOIN.
    Inner,
    /// LEFT JOIN.
    Left,
    /// RIGHT JOIN.
    Right,
    /// CROSS JOIN.
    Cross,
    /// NATURAL JOIN.
    Natural,
}

impl JoinKind {
    pub(crate) const fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Cross => "CROSS JOIN",
            Self::Natural => "NATURAL JOIN",
        }
    }
}

/// How a join matches rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinCondition {
    /// `ON <criteria>`.
    On(String),
    /// `USING (<criteria>)`.
    Using(String),
    /// No explicit condition.
    Natural,
}

impl JoinCondition {
    /// `ON <criteria>`.
    #[must_use]
    pub fn on(criteria: impl Into<String>) -> Self {
        Self::On(criteria.into())
    }

    /// `USING (<columns>)`.
    #[must_use]
    pub fn using(columns: impl Into<String>) -> Self {
        Self::Using(columns.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Join {
    pub(crate) kind: JoinKind,
    pub(crate) target: Target,
    pub(crate) alias: Option<String>,
    pub(crate) condition: JoinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connective {
    Simple,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Predicate {
    pub(crate) connective: Connective,
    pub(crate) condition: String,
}

/// Renders a WHERE/HAVING chain. The first entry never gets a connective.
pub(crate) fn render_predicates(predicates: &[Predicate]) -> String {
    let mut sql = String::new();
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            match predicate.connective {
                Connective::Or => sql.push_str(" OR "),
                Connective::And | Connective::Simple => sql.push_str(" AND "),
            }
        }
        sql.push_str(&predicate.condition);
    }
    sql
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => f.write_str("ASC"),
            Self::Desc => f.write_str("DESC"),
        }
    }
}

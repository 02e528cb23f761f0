//! Chainable SELECT builder.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::error::QueryError;

use super::fragment::{
    render_predicates, Connective, Join, JoinCondition, JoinKind, Order, Predicate, Target,
};
use super::params::{normalize_name, substitute};
use super::resolver::EntityResolver;
use super::value::{SqlValue, ToSqlValue};

static AGGREGATE_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(COUNT|SUM|AVG|MIN|MAX)\s*\(").expect("aggregate pattern is valid")
});

static COLUMN_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s+AS\s+[A-Za-z_][A-Za-z0-9_]*\s*$").expect("alias pattern is valid")
});

/// Result type for fallible builder calls.
pub type BuildResult<'a> = Result<&'a mut QueryBuilder, QueryError>;

/// A SELECT statement under construction.
///
/// Calls mutate fragment lists in place and return `&mut Self`. Calls that
/// validate their input eagerly return a `Result` instead. Nothing is
/// rendered until [`get_query`](Self::get_query).
///
/// ```rust
/// use strata_core::builder::{JoinCondition, QueryBuilder};
///
/// let mut qb = QueryBuilder::new();
/// qb.select(&["id"])
///     .from("users", Some("u"))
///     .unwrap()
///     .inner_join("orders", Some("o"), JoinCondition::on("u.id = o.user_id"))
///     .unwrap();
///
/// assert_eq!(
///     qb.get_query().unwrap(),
///     "SELECT id FROM users u INNER JOIN orders o ON u.id = o.user_id"
/// );
/// ```
#[derive(Clone, Default)]
pub struct QueryBuilder {
    distinct: bool,
    columns: Vec<String>,
    from: Option<(Target, Option<String>)>,
    joins: Vec<Join>,
    wheres: Vec<Predicate>,
    group_by: Vec<String>,
    havings: Vec<Predicate>,
    order_by: Vec<(String, Order)>,
    limit: Option<u64>,
    offset: Option<u64>,
    parameters: BTreeMap<String, SqlValue>,
    resolver: Option<Arc<dyn EntityResolver>>,
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("distinct", &self.distinct)
            .field("columns", &self.columns)
            .field("from", &self.from)
            .field("joins", &self.joins)
            .field("wheres", &self.wheres)
            .field("group_by", &self.group_by)
            .field("havings", &self.havings)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit)
            .field("offset", &self.offset)
            .field("parameters", &self.parameters)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

fn push_unique(list: &mut Vec<String>, items: &[&str]) {
    for item in items {
        if !list.iter().any(|existing| existing == item) {
            list.push((*item).to_string());
        }
    }
}

fn predicate(connective: Connective, condition: &str) -> Result<Predicate, QueryError> {
    if condition.trim().is_empty() {
        return Err(QueryError::EmptyCondition);
    }
    Ok(Predicate {
        connective,
        condition: condition.to_string(),
    })
}

impl QueryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the resolver used for [`Target::Entity`] targets.
    pub fn with_resolver(&mut self, resolver: impl EntityResolver + 'static) -> &mut Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    /// Sets a shared resolver.
    pub fn with_shared_resolver(&mut self, resolver: Arc<dyn EntityResolver>) -> &mut Self {
        self.resolver = Some(resolver);
        self
    }

    /// Toggles `SELECT DISTINCT`.
    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.distinct = distinct;
        self
    }

    /// Replaces the projection. An empty projection renders as `*`.
    pub fn select(&mut self, columns: &[&str]) -> &mut Self {
        self.columns.clear();
        push_unique(&mut self.columns, columns);
        self
    }

    /// Appends columns not already projected.
    pub fn add_columns(&mut self, columns: &[&str]) -> &mut Self {
        push_unique(&mut self.columns, columns);
        self
    }

    /// Sets the FROM target.
    pub fn from(&mut self, target: impl Into<Target>, alias: Option<&str>) -> BuildResult<'_> {
        let target = target.into();
        if target.is_empty() {
            return Err(QueryError::InvalidFrom);
        }
        self.from = Some((target, non_empty(alias)));
        Ok(self)
    }

    fn join(
        &mut self,
        kind: JoinKind,
        target: Target,
        alias: Option<&str>,
        condition: JoinCondition,
    ) -> BuildResult<'_> {
        if target.is_empty() {
            return Err(QueryError::InvalidJoinTarget);
        }
        match &condition {
            JoinCondition::On(criteria) if criteria.trim().is_empty() => {
                return Err(QueryError::JoinRequiresCriteria("ON"));
            }
            JoinCondition::Using(criteria) if criteria.trim().is_empty() => {
                return Err(QueryError::JoinRequiresCriteria("USING"));
            }
            _ => {}
        }
        self.joins.push(Join {
            kind,
            target,
            alias: non_empty(alias),
            condition,
        });
        Ok(self)
    }

    /// Appends an INNER JOIN.
    pub fn inner_join(
        &mut self,
        target: impl Into<Target>,
        alias: Option<&str>,
        condition: JoinCondition,
    ) -> BuildResult<'_> {
        self.join(JoinKind::Inner, target.into(), alias, condition)
    }

    /// Appends a LEFT JOIN.
    pub fn left_join(
        &mut self,
        target: impl Into<Target>,
        alias: Option<&str>,
        condition: JoinCondition,
    ) -> BuildResult<'_> {
        self.join(JoinKind::Left, target.into(), alias, condition)
    }

    /// Appends a RIGHT JOIN.
    pub fn right_join(
        &mut self,
        target: impl Into<Target>,
        alias: Option<&str>,
        condition: JoinCondition,
    ) -> BuildResult<'_> {
        self.join(JoinKind::Right, target.into(), alias, condition)
    }

    /// Appends a CROSS JOIN.
    pub fn cross_join(&mut self, target: impl Into<Target>) -> BuildResult<'_> {
        self.join(JoinKind::Cross, target.into(), None, JoinCondition::Natural)
    }

    /// Appends a NATURAL JOIN.
    pub fn natural_join(
        &mut self,
        target: impl Into<Target>,
        alias: Option<&str>,
    ) -> BuildResult<'_> {
        self.join(JoinKind::Natural, target.into(), alias, JoinCondition::Natural)
    }

    /// Replaces the WHERE chain with `condition`.
    pub fn where_(&mut self, condition: &str) -> BuildResult<'_> {
        let predicate = predicate(Connective::Simple, condition)?;
        self.wheres = vec![predicate];
        Ok(self)
    }

    /// Appends `AND condition` to the WHERE chain.
    pub fn and_where(&mut self, condition: &str) -> BuildResult<'_> {
        self.wheres.push(predicate(Connective::And, condition)?);
        Ok(self)
    }

    /// Appends `OR condition` to the WHERE chain.
    pub fn or_where(&mut self, condition: &str) -> BuildResult<'_> {
        self.wheres.push(predicate(Connective::Or, condition)?);
        Ok(self)
    }

    /// Replaces the GROUP BY list.
    pub fn group_by(&mut self, columns: &[&str]) -> &mut Self {
        self.group_by.clear();
        push_unique(&mut self.group_by, columns);
        self
    }

    /// Appends GROUP BY columns not already present.
    pub fn add_group_by(&mut self, columns: &[&str]) -> &mut Self {
        push_unique(&mut self.group_by, columns);
        self
    }

    /// Replaces the HAVING chain with `condition`.
    pub fn having(&mut self, condition: &str) -> BuildResult<'_> {
        let predicate = predicate(Connective::Simple, condition)?;
        self.havings = vec![predicate];
        Ok(self)
    }

    /// Appends `AND condition` to the HAVING chain.
    pub fn and_having(&mut self, condition: &str) -> BuildResult<'_> {
        self.havings.push(predicate(Connective::And, condition)?);
        Ok(self)
    }

    /// Appends `OR condition` to the HAVING chain.
    pub fn or_having(&mut self, condition: &str) -> BuildResult<'_> {
        self.havings.push(predicate(Connective::Or, condition)?);
        Ok(self)
    }

    /// Replaces the sort list with a single entry.
    pub fn order_by(&mut self, column: &str, order: Order) -> &mut Self {
        self.order_by = vec![(column.to_string(), order)];
        self
    }

    /// Appends a sort entry. A column already sorted on keeps its first
    /// direction.
    pub fn add_order_by(&mut self, column: &str, order: Order) -> &mut Self {
        if !self.order_by.iter().any(|(existing, _)| existing == column) {
            self.order_by.push((column.to_string(), order));
        }
        self
    }

    /// Sets LIMIT.
    pub fn set_limit(&mut self, limit: u64) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    /// Removes LIMIT.
    pub fn clear_limit(&mut self) -> &mut Self {
        self.limit = None;
        self
    }

    /// Sets OFFSET.
    pub fn set_offset(&mut self, offset: u64) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    /// Removes OFFSET.
    pub fn clear_offset(&mut self) -> &mut Self {
        self.offset = None;
        self
    }

    /// Registers a named parameter. A leading `:` is added when missing.
    pub fn set_parameter(&mut self, name: &str, value: impl ToSqlValue) -> BuildResult<'_> {
        let name = normalize_name(name)?;
        self.parameters.insert(name, value.to_sql_value());
        Ok(self)
    }

    /// Registers several named parameters, stopping at the first invalid
    /// name.
    pub fn set_parameters<I, K, V>(&mut self, parameters: I) -> BuildResult<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSqlValue,
    {
        for (name, value) in parameters {
            self.set_parameter(name.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Registered parameters, keyed by normalized name.
    #[must_use]
    pub const fn parameters(&self) -> &BTreeMap<String, SqlValue> {
        &self.parameters
    }

    fn resolve(&self, target: &Target) -> Result<String, QueryError> {
        match target {
            Target::Name(name) => Ok(name.clone()),
            Target::Entity(entity) => {
                let resolver = self
                    .resolver
                    .as_ref()
                    .ok_or_else(|| QueryError::MissingResolver(entity.to_string()))?;
                resolver
                    .resolve(entity)
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| QueryError::UnresolvedEntity(entity.to_string()))
            }
        }
    }

    fn check_group_by(&self) -> Result<(), QueryError> {
        if self.group_by.is_empty() {
            return Ok(());
        }
        for column in &self.columns {
            let trimmed = column.trim();
            if trimmed == "*" || AGGREGATE_CALL.is_match(trimmed) {
                continue;
            }
            let bare = COLUMN_ALIAS.replace(trimmed, "");
            let grouped = self
                .group_by
                .iter()
                .any(|g| g.trim() == bare || g.trim() == trimmed);
            if !grouped {
                return Err(QueryError::MissingGroupBy(column.clone()));
            }
        }
        Ok(())
    }

    /// Renders the statement and substitutes registered parameters.
    pub fn get_query(&self) -> Result<String, QueryError> {
        let (target, alias) = self.from.as_ref().ok_or(QueryError::MissingFrom)?;
        self.check_group_by()?;

        let mut sql = String::from("SELECT ");

        if self.distinct {
            sql.push_str("DISTINCT ");
        }

        if self.columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.columns.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.resolve(target)?);
        if let Some(alias) = alias {
            sql.push(' ');
            sql.push_str(alias);
        }

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.kind.keyword());
            sql.push(' ');
            sql.push_str(&self.resolve(&join.target)?);
            if let Some(alias) = &join.alias {
                sql.push(' ');
                sql.push_str(alias);
            }
            match (&join.kind, &join.condition) {
                (JoinKind::Cross | JoinKind::Natural, _) | (_, JoinCondition::Natural) => {}
                (_, JoinCondition::On(criteria)) => {
                    sql.push_str(" ON ");
                    sql.push_str(criteria);
                }
                (_, JoinCondition::Using(criteria)) => {
                    sql.push_str(" USING (");
                    sql.push_str(criteria);
                    sql.push(')');
                }
            }
        }

        if !self.wheres.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&render_predicates(&self.wheres));
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.havings.is_empty() {
            sql.push_str(" HAVING ");
            sql.push_str(&render_predicates(&self.havings));
        }

        if !self.order_by.is_empty() {
            let entries: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, order)| format!("{column} {order}"))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&entries.join(", "));
        }

        if let Some(n) = self.limit {
            sql.push_str(&format!(" LIMIT {n}"));
        }

        if let Some(n) = self.offset {
            sql.push_str(&format!(" OFFSET {n}"));
        }

        Ok(substitute(&sql, &self.parameters))
    }
}

fn non_empty(alias: Option<&str>) -> Option<String> {
    alias
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::EntityType;

    struct User;

    #[test]
    fn test_select_all_by_default() {
        let mut qb = QueryBuilder::new();
        qb.from("users", None).unwrap();
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users");
    }

    #[test]
    fn test_add_columns_deduplicates() {
        let mut qb = QueryBuilder::new();
        qb.select(&["id", "name"]).add_columns(&["name", "email", "id"]);
        qb.from("users", None).unwrap();
        assert_eq!(qb.get_query().unwrap(), "SELECT id, name, email FROM users");

        qb.select(&["email"]);
        assert_eq!(qb.get_query().unwrap(), "SELECT email FROM users");
    }

    #[test]
    fn test_missing_from() {
        let qb = QueryBuilder::new();
        assert_eq!(qb.get_query(), Err(QueryError::MissingFrom));
    }

    #[test]
    fn test_invalid_targets() {
        let mut qb = QueryBuilder::new();
        assert_eq!(qb.from("", None).unwrap_err(), QueryError::InvalidFrom);
        assert_eq!(
            qb.inner_join("  ", None, JoinCondition::on("a = b")).unwrap_err(),
            QueryError::InvalidJoinTarget
        );
        assert_eq!(
            qb.left_join("orders", None, JoinCondition::on(" ")).unwrap_err(),
            QueryError::JoinRequiresCriteria("ON")
        );
        assert_eq!(
            qb.right_join("orders", None, JoinCondition::using("")).unwrap_err(),
            QueryError::JoinRequiresCriteria("USING")
        );
    }

    #[test]
    fn test_join_rendering() {
        let mut qb = QueryBuilder::new();
        qb.select(&["u.id"]).from("users", Some("u")).unwrap();
        qb.left_join("profiles", Some("p"), JoinCondition::using("user_id"))
            .unwrap()
            .cross_join("regions")
            .unwrap()
            .natural_join("settings", Some("s"))
            .unwrap();
        assert_eq!(
            qb.get_query().unwrap(),
            "SELECT u.id FROM users u LEFT JOIN profiles p USING (user_id) \
             CROSS JOIN regions NATURAL JOIN settings s"
        );
    }

    #[test]
    fn test_where_chain() {
        let mut qb = QueryBuilder::new();
        qb.from("users", None).unwrap();
        qb.or_where("a = 1").unwrap().or_where("b = 2").unwrap();
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users WHERE a = 1 OR b = 2");

        qb.where_("c = 3").unwrap().and_where("d = 4").unwrap();
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users WHERE c = 3 AND d = 4");

        assert_eq!(qb.and_where("").unwrap_err(), QueryError::EmptyCondition);
        assert_eq!(qb.having("   ").unwrap_err(), QueryError::EmptyCondition);
    }

    #[test]
    fn test_group_by_and_having() {
        let mut qb = QueryBuilder::new();
        qb.select(&["status", "COUNT(*) AS total"])
            .from("orders", None)
            .unwrap()
            .group_by(&["status"])
            .having("COUNT(*) > 1")
            .unwrap()
            .or_having("status = 'open'")
            .unwrap();
        assert_eq!(
            qb.get_query().unwrap(),
            "SELECT status, COUNT(*) AS total FROM orders GROUP BY status \
             HAVING COUNT(*) > 1 OR status = 'open'"
        );
    }

    #[test]
    fn test_group_by_ignores_alias() {
        let mut qb = QueryBuilder::new();
        qb.select(&["category AS c", "max(price)"])
            .from("products", None)
            .unwrap()
            .group_by(&["category"]);
        assert!(qb.get_query().is_ok());

        qb.add_columns(&["brand"]);
        assert_eq!(
            qb.get_query(),
            Err(QueryError::MissingGroupBy("brand".to_string()))
        );

        qb.add_group_by(&["brand", "category"]);
        assert!(qb.get_query().is_ok());
    }

    #[test]
    fn test_order_by() {
        let mut qb = QueryBuilder::new();
        qb.from("users", None).unwrap();
        qb.order_by("name", Order::Desc)
            .add_order_by("id", Order::Asc)
            .add_order_by("name", Order::Asc);
        assert_eq!(
            qb.get_query().unwrap(),
            "SELECT * FROM users ORDER BY name DESC, id ASC"
        );

        qb.order_by("email", Order::default());
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users ORDER BY email ASC");
    }

    #[test]
    fn test_limit_offset() {
        let mut qb = QueryBuilder::new();
        qb.from("users", None).unwrap();
        qb.set_limit(10).set_offset(20);
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users LIMIT 10 OFFSET 20");

        qb.clear_limit();
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users OFFSET 20");
    }

    #[test]
    fn test_distinct() {
        let mut qb = QueryBuilder::new();
        qb.distinct(true).select(&["status"]).from("orders", None).unwrap();
        assert_eq!(qb.get_query().unwrap(), "SELECT DISTINCT status FROM orders");
    }

    #[test]
    fn test_entity_resolution() {
        let mut qb = QueryBuilder::new();
        qb.from(EntityType::of::<User>(), Some("u")).unwrap();
        assert_eq!(
            qb.get_query(),
            Err(QueryError::MissingResolver("User".to_string()))
        );

        qb.with_resolver(|entity: &EntityType| format!("{}s", entity.short_name().to_lowercase()));
        assert_eq!(qb.get_query().unwrap(), "SELECT * FROM users u");
    }

    #[test]
    fn test_parameters() {
        let mut qb = QueryBuilder::new();
        qb.from("users", None)
            .unwrap()
            .where_("id = :id")
            .unwrap()
            .and_where("name = :name")
            .unwrap()
            .set_parameter("id", 1)
            .unwrap()
            .set_parameter(":name", "John")
            .unwrap();
        assert_eq!(
            qb.get_query().unwrap(),
            "SELECT * FROM users WHERE id = 1 AND name = 'John'"
        );
        assert_eq!(qb.parameters().len(), 2);
        assert_eq!(
            qb.set_parameter("bad name", 1).unwrap_err(),
            QueryError::InvalidParameterName("bad name".to_string())
        );
    }
}

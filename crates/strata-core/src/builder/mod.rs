//! Query builder.
//!
//! [`QueryBuilder`] accumulates SELECT clauses as raw fragments and renders
//! them in a fixed order on [`QueryBuilder::get_query`]:
//!
//! ```text
//! SELECT [DISTINCT] ... FROM ... [JOIN ...]* [WHERE ...] [GROUP BY ...]
//!     [HAVING ...] [ORDER BY ...] [LIMIT n] [OFFSET n]
//! ```
//!
//! Named parameters (`:name`) registered with
//! [`QueryBuilder::set_parameter`] are substituted inline, escaped through
//! [`SqlValue::to_sql_inline`].

mod fragment;
mod params;
mod query;
mod resolver;
mod value;

pub use fragment::{JoinCondition, JoinKind, Order, Target};
pub use params::PARAMETER_MARKER;
pub use query::{BuildResult, QueryBuilder};
pub use resolver::EntityResolver;
pub use value::{SqlValue, ToSqlValue};

//! Server version parsing and comparison.

use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SchemaError};

static VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("version pattern is valid")
});

/// Database engine family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// Oracle MySQL.
    MySql,
    /// MariaDB.
    MariaDb,
    /// PostgreSQL.
    Postgres,
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MySql => f.write_str("MySQL"),
            Self::MariaDb => f.write_str("MariaDB"),
            Self::Postgres => f.write_str("PostgreSQL"),
        }
    }
}

/// A `major.minor.patch` server version.
///
/// Ordering compares the numeric triple. Equal triples of different
/// flavors are unordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DatabaseVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version; `0` when the server reports none.
    pub patch: u32,
    /// Engine family.
    pub flavor: Flavor,
}

impl DatabaseVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(flavor: Flavor, major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            flavor,
        }
    }

    /// Parses a MySQL-family version string such as `8.0.34-0ubuntu0.22.04.1`
    /// or `10.6.12-MariaDB-1:10.6.12+maria~ubu2004`.
    pub fn parse_mysql(raw: &str) -> Result<Self> {
        let flavor = if raw.to_ascii_lowercase().contains("mariadb") {
            Flavor::MariaDb
        } else {
            Flavor::MySql
        };
        Self::parse(raw, flavor)
    }

    /// Parses a PostgreSQL version string such as `15.3 (Debian 15.3-1)`.
    pub fn parse_postgres(raw: &str) -> Result<Self> {
        Self::parse(raw, Flavor::Postgres)
    }

    fn parse(raw: &str, flavor: Flavor) -> Result<Self> {
        let unknown = || SchemaError::UnknownVersion(raw.to_string());
        let caps = VERSION.captures(raw).ok_or_else(unknown)?;
        let part = |i: usize| -> Result<u32> {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| unknown()))
        };
        Ok(Self::new(flavor, part(1)?, part(2)?, part(3)?))
    }

    const fn triple(&self) -> (u32, u32, u32) {
        (self.major, self.minor, self.patch)
    }

    /// Whether this version is `>= other`.
    #[must_use]
    pub fn at_least(&self, other: &Self) -> bool {
        self.triple() >= other.triple()
    }
}

impl PartialOrd for DatabaseVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.triple().cmp(&other.triple()) {
            Ordering::Equal if self.flavor != other.flavor => None,
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}.{}", self.flavor, self.major, self.minor, self.patch)
    }
}

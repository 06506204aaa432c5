//! SQL engine families.

use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The SQL engine family a connection talks to.
///
/// The dialect only governs which per-column type clause goes into `CREATE TABLE`;
/// every other generated statement is dialect-neutral and uses `?` placeholders.
/// Serialized as its driver identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dialect {
    Sqlite,
    MySql,
    Postgres,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Sqlite, Dialect::MySql, Dialect::Postgres];

    /// Canonical driver identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite3",
            Dialect::MySql => "mysql",
            Dialect::Postgres => "postgre",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite3" | "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::MySql),
            "postgre" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            other => Err(OrmError::schema(format!("unsupported driver {other}"))),
        }
    }
}

impl TryFrom<String> for Dialect {
    type Error = OrmError;

    fn try_from(s: String) -> OrmResult<Self> {
        s.parse()
    }
}

impl From<Dialect> for String {
    fn from(d: Dialect) -> Self {
        d.as_str().to_string()
    }
}

//! Connection configuration.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use serde::{Deserialize, Serialize};

/// Environment variable naming the dialect (`sqlite3`, `mysql`, `postgres`, ...).
pub const DIALECT_ENV: &str = "DBMAP_DIALECT";
/// Environment variable holding the database path or connection string.
pub const URL_ENV: &str = "DATABASE_URL";

const MEMORY: &str = ":memory:";

/// Which database to open and where it lives.
///
/// ```ignore
/// let db = Database::new(DatabaseConfig::sqlite("app.db").open_sqlite()?);
///
/// // DBMAP_DIALECT=postgres DATABASE_URL=postgres://...
/// let config = DatabaseConfig::from_env()?;
/// let db = Database::new(config.connect_postgres().await?);
/// ```
///
/// It also deserializes, e.g. from an application settings file:
/// `{"dialect": "sqlite3", "url": "app.db"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    /// File path (sqlite) or connection string (postgres).
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::sqlite_in_memory()
    }
}

impl DatabaseConfig {
    pub fn new(dialect: Dialect, url: impl Into<String>) -> Self {
        Self {
            dialect,
            url: url.into(),
        }
    }

    pub fn sqlite(path: impl Into<String>) -> Self {
        Self::new(Dialect::Sqlite, path)
    }

    pub fn sqlite_in_memory() -> Self {
        Self::sqlite(MEMORY)
    }

    pub fn postgres(url: impl Into<String>) -> Self {
        Self::new(Dialect::Postgres, url)
    }

    /// Read [`DIALECT_ENV`] and [`URL_ENV`], loading a `.env` file first when present.
    ///
    /// Without a dialect variable, `postgres://` and `postgresql://` URLs select postgres
    /// and anything else sqlite.
    pub fn from_env() -> OrmResult<Self> {
        dotenvy::dotenv().ok();
        let dialect = std::env::var(DIALECT_ENV).ok();
        let url = std::env::var(URL_ENV).ok();
        Self::from_vars(dialect.as_deref(), url.as_deref())
    }

    fn from_vars(dialect: Option<&str>, url: Option<&str>) -> OrmResult<Self> {
        let url = url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| OrmError::Connection(format!("{URL_ENV} is not set")))?;
        let dialect = match dialect.filter(|d| !d.trim().is_empty()) {
            Some(name) => name.parse()?,
            None if url.starts_with("postgres://") || url.starts_with("postgresql://") => {
                Dialect::Postgres
            }
            None => Dialect::Sqlite,
        };
        Ok(Self::new(dialect, url))
    }

    fn require_dialect(&self, dialect: Dialect) -> OrmResult<()> {
        if self.dialect != dialect {
            return Err(OrmError::Connection(format!(
                "configured for {} but {} was requested",
                self.dialect, dialect
            )));
        }
        Ok(())
    }

    /// sqlite file path with any `sqlite:` scheme removed.
    fn sqlite_path(&self) -> &str {
        let url = self.url.as_str();
        url.strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url)
    }

    #[cfg(feature = "sqlite")]
    pub fn open_sqlite(&self) -> OrmResult<crate::driver::SqliteClient> {
        self.require_dialect(Dialect::Sqlite)?;
        match self.sqlite_path() {
            MEMORY | "" => crate::driver::SqliteClient::open_in_memory(),
            path => crate::driver::SqliteClient::open(path),
        }
    }

    #[cfg(feature = "postgres")]
    pub async fn connect_postgres(&self) -> OrmResult<crate::driver::PostgresClient> {
        self.require_dialect(Dialect::Postgres)?;
        crate::driver::PostgresClient::connect(&self.url).await
    }
}

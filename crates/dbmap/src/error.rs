//! Error types for dbmap

use thiserror::Error;

/// Result type alias for dbmap operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for registration, query building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Invalid record metadata or DDL request (raised while registering or creating tables)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A builder was bound to a table name that was never registered
    #[error("{0} table is not registered")]
    NotRegistered(String),

    /// Call-time misuse: wrong destination count, column/value arity, unknown columns
    #[error("Shape error: {0}")]
    Shape(String),

    /// The statement returned no rows where one was expected
    #[error("Not found: {0}")]
    NotFound(String),

    /// Value decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Error reported by the sqlite driver
    #[cfg(feature = "sqlite")]
    #[error("Sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Error reported by the postgres driver
    #[cfg(feature = "postgres")]
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a schema error
    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema(message.into())
    }

    /// Create a shape error
    pub fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a not registered error for a table name
    pub fn not_registered(table: impl Into<String>) -> Self {
        Self::NotRegistered(table.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a schema error
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Check if this is a shape error
    pub fn is_shape(&self) -> bool {
        matches!(self, Self::Shape(_))
    }
}

//! Convenient imports for typical `dbmap` usage.
//!
//! ```ignore
//! use dbmap::prelude::*;
//! ```

pub use crate::{
    Database, DatabaseConfig, Dialect, FieldSet, GenericClient, OrmError, OrmResult, Record,
    SqlHook, Transaction, TracingSqlHook, Value,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteClient;

#[cfg(feature = "postgres")]
pub use crate::PostgresClient;

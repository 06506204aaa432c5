//! Bundled backends.
//!
//! Each backend implements [`Connector`](crate::Connector) for its connection type and
//! [`TransactionClient`](crate::TransactionClient) for its transaction type. Any other
//! driver can be plugged in by implementing the same traits.

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteClient, SqliteTransaction};

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::{PostgresClient, PostgresTransaction, rewrite_placeholders};

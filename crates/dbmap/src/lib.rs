//! # dbmap
//!
//! Register a record type once, then insert, select, join, update and delete it without
//! writing SQL by hand.
//!
//! ## Features
//!
//! - **Declarative schema**: column names and per-dialect type clauses live on the fields
//!   (`#[derive(Record)]` with `#[orm(...)]` attributes)
//! - **DDL per dialect**: `CREATE TABLE IF NOT EXISTS` for sqlite, mysql and postgres
//! - **Fluent builders**: filter / sort / limit / offset, chained joins, narrowed updates
//! - **Index-based materialization**: rows decode straight into caller-owned records,
//!   one record per table for joins
//! - **Transaction-friendly**: builders from a [`Transaction`] run inside it
//! - **Bound values only**: every value travels as a `?` parameter
//!
//! ## Example
//!
//! ```ignore
//! use dbmap::prelude::*;
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(db = "id", sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
//!           mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT")]
//!     id: i64,
//!     #[orm(db = "userid", sqlite = "TEXT NOT NULL", mysql = "varchar(32) NOT NULL")]
//!     userid: String,
//!     #[orm(db = "nickname", form = "nick", sqlite = "TEXT", mysql = "varchar(64)")]
//!     nickname: String,
//! }
//!
//! # async fn demo() -> OrmResult<()> {
//! let mut db = Database::new(SqliteClient::open_in_memory()?).with_hook(TracingSqlHook::new());
//! db.register::<User>("user")?;
//! db.create_tables().await?;
//!
//! let user = User { userid: "A".into(), nickname: "eschao".into(), ..Default::default() };
//! db.table("user").insert(&user).await?;
//!
//! let mut found = User::default();
//! db.table("user").select_all().filter("userid=?", ["A"]).one(&mut found).await?;
//!
//! db.table("user")
//!     .update("userid=?", ["A"])
//!     .set(&["nickname"])
//!     .values(("mark",))
//!     .await?;
//!
//! let tx = db.begin().await?;
//! tx.table("user").delete("userid=?", ["A"]).await?;
//! tx.commit().await?;
//! # Ok(()) }
//! ```

pub mod builder;
pub mod client;
pub mod config;
pub mod database;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod hook;
pub mod materialize;
pub mod prelude;
pub mod record;
pub mod row;
pub mod schema;
pub mod value;

pub use builder::{Executor, JoinKind, JoinStep, Jointer, Selector, Updater};
pub use client::{Connector, ExecResult, GenericClient, TransactionClient};
pub use config::DatabaseConfig;
pub use database::{Database, Transaction};
pub use dialect::Dialect;
pub use error::{OrmError, OrmResult};
pub use hook::{SqlHook, TracingSqlHook};
pub use materialize::{JoinSinks, JoinTargets, RowSink};
pub use record::{FieldDef, FieldSet, Record};
pub use row::Row;
pub use schema::{Column, Table};
pub use value::{FromValue, IntoParams, ToValue, Value};

#[cfg(feature = "sqlite")]
pub use driver::{SqliteClient, SqliteTransaction};

#[cfg(feature = "postgres")]
pub use driver::{PostgresClient, PostgresTransaction};

#[cfg(feature = "derive")]
pub use dbmap_derive::Record;

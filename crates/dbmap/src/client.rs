//! Driver seam.
//!
//! dbmap never talks to a database directly. Everything it generates is handed to a
//! [`GenericClient`]: a connection or a transaction that can prepare, bind `?`
//! placeholders and run a statement. [`Connector`] adds the ability to open a
//! transaction, and [`TransactionClient`] finishes one.
//!
//! The bundled backends live in [`crate::driver`].

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// Outcome of a statement that does not return rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecResult {
    pub rows_affected: u64,
    /// Row id generated by the last insert, when the driver reports one.
    pub last_insert_id: Option<i64>,
}

/// A trait that unifies database connections and transactions.
///
/// Builders accept any `GenericClient`, so the same code runs against the ambient
/// connection or inside a transaction.
pub trait GenericClient: Send + Sync {
    /// SQL engine family on the other side of this client.
    fn dialect(&self) -> Dialect;

    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a statement and report affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<ExecResult>> + Send;

    /// Execute a query and return the **first** row.
    ///
    /// Semantics:
    /// - 0 rows: returns [`OrmError::NotFound`]
    /// - 1 or more rows: returns the first row (does **not** error)
    fn query_one(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Row>> + Send {
        async move {
            self.query(sql, params)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::not_found("query returned no rows"))
        }
    }

    /// Run one or more parameterless statements (DDL, transaction control).
    fn batch_execute(&self, sql: &str) -> impl Future<Output = OrmResult<()>> + Send {
        async move { self.execute(sql, &[]).await.map(|_| ()) }
    }
}

/// A transaction handle. Finishing consumes it, so it ends exactly once; dropping an
/// unfinished transaction rolls it back.
pub trait TransactionClient: GenericClient + Sized {
    fn commit(self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(self) -> impl Future<Output = OrmResult<()>> + Send;
}

/// A connection that can open transactions.
pub trait Connector: GenericClient {
    type Transaction: TransactionClient;

    fn begin(&self) -> impl Future<Output = OrmResult<Self::Transaction>> + Send;
}

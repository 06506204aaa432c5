//! sqlite backend over `rusqlite`.
//!
//! One connection behind `Arc<Mutex<_>>`. Statements run synchronously under the lock;
//! prepared statements are cached per connection. A transaction is `BEGIN` on that
//! same connection, so statements sent through the [`SqliteClient`] while a
//! [`SqliteTransaction`] is open run inside it.

use crate::client::{Connector, ExecResult, GenericClient, TransactionClient};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Bool(b) => ToSqlOutput::Owned(Sql::Integer(i64::from(*b))),
            Value::Int(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::Float(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn decode(column: &str, value: ValueRef<'_>) -> OrmResult<Value> {
    Ok(match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Int(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(bytes) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| OrmError::decode(column, e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(bytes) => Value::Bytes(bytes.to_vec()),
    })
}

fn returns_rowid(sql: &str) -> bool {
    let head = sql.trim_start();
    ["INSERT", "REPLACE"].iter().any(|verb| {
        head.get(..verb.len())
            .is_some_and(|h| h.eq_ignore_ascii_case(verb))
    })
}

fn lock(conn: &Mutex<Connection>) -> OrmResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|_| OrmError::Connection("sqlite connection lock poisoned".to_string()))
}

fn run_query(conn: &Mutex<Connection>, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
    let conn = lock(conn)?;
    let mut stmt = conn.prepare_cached(sql)?;
    let columns: Arc<[String]> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            values.push(decode(name, row.get_ref(i)?)?);
        }
        out.push(Row::new(columns.clone(), values));
    }
    Ok(out)
}

fn run_execute(conn: &Mutex<Connection>, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
    let conn = lock(conn)?;
    let mut stmt = conn.prepare_cached(sql)?;
    let affected = stmt.execute(params_from_iter(params.iter()))?;
    Ok(ExecResult {
        rows_affected: affected as u64,
        last_insert_id: returns_rowid(sql).then(|| conn.last_insert_rowid()),
    })
}

fn run_batch(conn: &Mutex<Connection>, sql: &str) -> OrmResult<()> {
    lock(conn)?.execute_batch(sql)?;
    Ok(())
}

/// A shared sqlite connection.
#[derive(Clone)]
pub struct SqliteClient {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteClient {
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let path = path.as_ref();
        tracing::debug!(target: "dbmap", path = %path.display(), "opening sqlite database");
        Ok(Self::from_connection(Connection::open(path)?))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

impl GenericClient for SqliteClient {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        run_query(&self.conn, sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_execute(&self.conn, sql, params)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        run_batch(&self.conn, sql)
    }
}

impl Connector for SqliteClient {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> OrmResult<SqliteTransaction> {
        run_batch(&self.conn, "BEGIN")?;
        Ok(SqliteTransaction {
            conn: self.conn.clone(),
            finished: false,
        })
    }
}

/// An open sqlite transaction. Dropping it unfinished rolls it back.
pub struct SqliteTransaction {
    conn: Arc<Mutex<Connection>>,
    finished: bool,
}

impl SqliteTransaction {
    fn finish(&mut self, sql: &str) -> OrmResult<()> {
        run_batch(&self.conn, sql)?;
        self.finished = true;
        Ok(())
    }
}

impl GenericClient for SqliteTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        run_query(&self.conn, sql, params)
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_execute(&self.conn, sql, params)
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        run_batch(&self.conn, sql)
    }
}

impl TransactionClient for SqliteTransaction {
    async fn commit(mut self) -> OrmResult<()> {
        self.finish("COMMIT")
    }

    async fn rollback(mut self) -> OrmResult<()> {
        self.finish("ROLLBACK")
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(error) = run_batch(&self.conn, "ROLLBACK") {
            tracing::warn!(target: "dbmap", %error, "rollback of dropped transaction failed");
        }
    }
}

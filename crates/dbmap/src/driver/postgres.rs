//! postgres backend over `tokio-postgres`.
//!
//! Generated SQL uses `?` placeholders; they are rewritten to `$1..$n` before preparing.
//! Parameters are encoded according to the type the server inferred for them, so a
//! [`Value::Text`] can feed a `timestamp`, `uuid` or `jsonb` column.
//!
//! Transactions are `BEGIN`/`COMMIT`/`ROLLBACK` on the shared connection; statements
//! sent through the [`PostgresClient`] while a [`PostgresTransaction`] is open run
//! inside it.

use crate::client::{Connector, ExecResult, GenericClient, TransactionClient};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{ToValue, Value};
use bytes::BytesMut;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};
use tokio_postgres::{Client, NoTls};

type BoxError = Box<dyn Error + Sync + Send>;

/// Rewrite `?` placeholders to `$1..$n`.
///
/// Quoted literals and identifiers (including `E'...'` backslash escapes), dollar-quoted
/// bodies, `--` line comments and `/* */` comments are copied untouched. `??` stands for a
/// literal `?`, e.g. the jsonb key-exists operator. Nested block comments are not tracked.
pub fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut idx = 0;
    let mut rest = sql;
    while let Some(ch) = rest.chars().next() {
        let skip = match ch {
            '?' if rest.starts_with("??") => {
                out.push('?');
                rest = &rest[2..];
                continue;
            }
            '?' => {
                idx += 1;
                out.push('$');
                out.push_str(&idx.to_string());
                rest = &rest[1..];
                continue;
            }
            '\'' => quoted_len(rest, '\'', escape_string_prefix(&out)),
            '"' => quoted_len(rest, '"', false),
            '-' if rest.starts_with("--") => rest.find('\n').map_or(rest.len(), |i| i + 1),
            '/' if rest.starts_with("/*") => rest[2..].find("*/").map_or(rest.len(), |i| i + 4),
            '$' if !ends_with_ident_char(&out) => dollar_quoted_len(rest).unwrap_or(1),
            _ => ch.len_utf8(),
        };
        out.push_str(&rest[..skip]);
        rest = &rest[skip..];
    }
    out
}

fn ends_with_ident_char(s: &str) -> bool {
    s.chars()
        .next_back()
        .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// `E'...'`: the quote follows a standalone `E`.
fn escape_string_prefix(before: &str) -> bool {
    let mut chars = before.chars().rev();
    matches!(chars.next(), Some('E' | 'e'))
        && !chars.next().is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Length of the quoted run at the start of `s`, closing quote included.
fn quoted_len(s: &str, quote: char, backslash_escapes: bool) -> usize {
    let mut chars = s.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        if backslash_escapes && c == '\\' {
            chars.next();
        } else if c == quote {
            if s[i + 1..].starts_with(quote) {
                chars.next();
            } else {
                return i + 1;
            }
        }
    }
    s.len()
}

/// Length of a `$tag$...$tag$` body at the start of `s`; `None` when `s` does not open one
/// (e.g. a `$1` parameter).
fn dollar_quoted_len(s: &str) -> Option<usize> {
    let tag_len = s[1..].find(|c: char| !(c.is_alphanumeric() || c == '_'))? + 2;
    if !s[tag_len - 1..].starts_with('$') || s[1..].starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let tag = &s[..tag_len];
    Some(
        s[tag_len..]
            .find(tag)
            .map_or(s.len(), |pos| tag_len + pos + tag_len),
    )
}

/// A [`Value`] bound to a postgres parameter of whatever type the server expects.
#[derive(Debug)]
struct PgParam<'a>(&'a Value);

fn out_of_range(value: i64, ty: &Type) -> BoxError {
    format!("{value} is out of range for {ty}").into()
}

fn parse_text<T: std::str::FromStr>(s: &str, ty: &Type) -> Result<T, BoxError>
where
    T::Err: std::fmt::Display,
{
    s.trim()
        .parse::<T>()
        .map_err(|e| format!("cannot encode '{s}' as {ty}: {e}").into())
}

impl ToSql for PgParam<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ => PgParam(&Value::Int(i64::from(*b))).to_sql(ty, out),
            },
            Value::Int(v) => {
                let v = *v;
                match *ty {
                    Type::INT2 => i16::try_from(v)
                        .map_err(|_| out_of_range(v, ty))?
                        .to_sql(ty, out),
                    Type::INT4 => i32::try_from(v)
                        .map_err(|_| out_of_range(v, ty))?
                        .to_sql(ty, out),
                    Type::INT8 => v.to_sql(ty, out),
                    Type::OID => u32::try_from(v)
                        .map_err(|_| out_of_range(v, ty))?
                        .to_sql(ty, out),
                    Type::FLOAT4 => (v as f32).to_sql(ty, out),
                    Type::FLOAT8 => (v as f64).to_sql(ty, out),
                    Type::BOOL => (v != 0).to_sql(ty, out),
                    Type::TIMESTAMPTZ => chrono::DateTime::from_timestamp(v, 0)
                        .ok_or_else(|| out_of_range(v, ty))?
                        .to_sql(ty, out),
                    _ => text_to_sql(&v.to_string(), ty, out),
                }
            }
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => v.to_sql(ty, out),
                _ => text_to_sql(&v.to_string(), ty, out),
            },
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Bytes(b) => match *ty {
                Type::UUID => uuid::Uuid::from_slice(b)?.to_sql(ty, out),
                _ => b.as_slice().to_sql(ty, out),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

/// Encode text for a parameter of type `ty`, parsing it when the type is not textual.
fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::BOOL => decode_text::<bool>(s, ty)?.to_sql(ty, out),
        Type::INT2 => parse_text::<i16>(s, ty)?.to_sql(ty, out),
        Type::INT4 => parse_text::<i32>(s, ty)?.to_sql(ty, out),
        Type::INT8 => parse_text::<i64>(s, ty)?.to_sql(ty, out),
        Type::OID => parse_text::<u32>(s, ty)?.to_sql(ty, out),
        Type::FLOAT4 => parse_text::<f32>(s, ty)?.to_sql(ty, out),
        Type::FLOAT8 => parse_text::<f64>(s, ty)?.to_sql(ty, out),
        Type::TIMESTAMP => decode_text::<chrono::NaiveDateTime>(s, ty)?.to_sql(ty, out),
        Type::TIMESTAMPTZ => decode_text::<chrono::DateTime<chrono::Utc>>(s, ty)?.to_sql(ty, out),
        Type::DATE => decode_text::<chrono::NaiveDate>(s, ty)?.to_sql(ty, out),
        Type::TIME => decode_text::<chrono::NaiveTime>(s, ty)?.to_sql(ty, out),
        Type::UUID => decode_text::<uuid::Uuid>(s, ty)?.to_sql(ty, out),
        Type::JSON | Type::JSONB => decode_text::<serde_json::Value>(s, ty)?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        _ => s.to_sql(ty, out),
    }
}

/// Parse text with the same rules used when decoding rows.
fn decode_text<T: crate::value::FromValue>(s: &str, ty: &Type) -> Result<T, BoxError> {
    T::from_value(Value::Text(s.to_string()))
        .map_err(|e| format!("cannot encode '{s}' as {ty}: {e}").into())
}

fn column_value<'r, T>(row: &'r tokio_postgres::Row, idx: usize, name: &str) -> OrmResult<Value>
where
    T: FromSql<'r> + ToValue,
{
    row.try_get::<_, Option<T>>(idx)
        .map(|v| v.to_value())
        .map_err(|e| OrmError::decode(name, e.to_string()))
}

fn decode_row(row: &tokio_postgres::Row, columns: &Arc<[String]>) -> OrmResult<Row> {
    let mut values = Vec::with_capacity(columns.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name();
        let value = match *column.type_() {
            Type::BOOL => column_value::<bool>(row, idx, name)?,
            Type::INT2 => column_value::<i16>(row, idx, name)?,
            Type::INT4 => column_value::<i32>(row, idx, name)?,
            Type::INT8 => column_value::<i64>(row, idx, name)?,
            Type::OID => column_value::<u32>(row, idx, name)?,
            Type::FLOAT4 => column_value::<f32>(row, idx, name)?,
            Type::FLOAT8 => column_value::<f64>(row, idx, name)?,
            Type::BYTEA => column_value::<Vec<u8>>(row, idx, name)?,
            Type::TIMESTAMP => column_value::<chrono::NaiveDateTime>(row, idx, name)?,
            Type::TIMESTAMPTZ => column_value::<chrono::DateTime<chrono::Utc>>(row, idx, name)?,
            Type::DATE => column_value::<chrono::NaiveDate>(row, idx, name)?,
            Type::TIME => column_value::<chrono::NaiveTime>(row, idx, name)?,
            Type::UUID => column_value::<uuid::Uuid>(row, idx, name)?,
            Type::JSON | Type::JSONB => column_value::<serde_json::Value>(row, idx, name)?,
            _ => column_value::<String>(row, idx, name).map_err(|_| {
                OrmError::decode(name, format!("unsupported postgres type {}", column.type_()))
            })?,
        };
        values.push(value);
    }
    Ok(Row::new(columns.clone(), values))
}

async fn run_query(client: &Client, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
    let sql = rewrite_placeholders(sql);
    let stmt = client.prepare(&sql).await?;
    let bound: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    let rows = client.query(&stmt, &refs).await?;

    let columns: Arc<[String]> = stmt
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    rows.iter().map(|row| decode_row(row, &columns)).collect()
}

async fn run_execute(client: &Client, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
    let sql = rewrite_placeholders(sql);
    let stmt = client.prepare(&sql).await?;
    let bound: Vec<PgParam<'_>> = params.iter().map(PgParam).collect();
    let refs: Vec<&(dyn ToSql + Sync)> = bound.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
    let rows_affected = client.execute(&stmt, &refs).await?;
    Ok(ExecResult {
        rows_affected,
        last_insert_id: None,
    })
}

/// A postgres connection.
#[derive(Clone)]
pub struct PostgresClient {
    client: Arc<Client>,
}

impl PostgresClient {
    /// Connect without TLS and drive the connection on a spawned tokio task.
    pub async fn connect(url: &str) -> OrmResult<Self> {
        let (client, connection) = tokio_postgres::connect(url, NoTls).await?;
        tokio::spawn(async move {
            if let Err(error) = connection.await {
                tracing::error!(target: "dbmap", %error, "postgres connection closed with error");
            }
        });
        Ok(Self::from_client(client))
    }

    /// Wrap a client whose connection task the caller already drives.
    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn inner(&self) -> &Client {
        &self.client
    }
}

impl GenericClient for PostgresClient {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        run_query(&self.client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_execute(&self.client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

impl Connector for PostgresClient {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> OrmResult<PostgresTransaction> {
        self.client.batch_execute("BEGIN").await?;
        Ok(PostgresTransaction {
            client: self.client.clone(),
            finished: false,
        })
    }
}

/// An open postgres transaction. Dropping it unfinished schedules a rollback on the
/// current tokio runtime.
pub struct PostgresTransaction {
    client: Arc<Client>,
    finished: bool,
}

impl PostgresTransaction {
    async fn finish(&mut self, sql: &str) -> OrmResult<()> {
        self.client.batch_execute(sql).await?;
        self.finished = true;
        Ok(())
    }
}

impl GenericClient for PostgresTransaction {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        run_query(&self.client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        run_execute(&self.client, sql, params).await
    }

    async fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }
}

impl TransactionClient for PostgresTransaction {
    async fn commit(mut self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(mut self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let client = self.client.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(error) = client.batch_execute("ROLLBACK").await {
                        tracing::warn!(target: "dbmap", %error, "rollback of dropped transaction failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!(target: "dbmap", "transaction dropped outside a tokio runtime; not rolled back");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_in_order() {
        assert_eq!(
            rewrite_placeholders("UPDATE user SET a=?,b=? WHERE id=?"),
            "UPDATE user SET a=$1,b=$2 WHERE id=$3"
        );
    }

    #[test]
    fn placeholders_inside_quotes_are_kept() {
        assert_eq!(
            rewrite_placeholders("SELECT '?', \"a?\" FROM t WHERE x=? AND y='it''s?'"),
            "SELECT '?', \"a?\" FROM t WHERE x=$1 AND y='it''s?'"
        );
        assert_eq!(rewrite_placeholders("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn comments_and_dollar_bodies_are_kept() {
        assert_eq!(
            rewrite_placeholders("SELECT a -- why?\nFROM t WHERE b=? /* c=? */"),
            "SELECT a -- why?\nFROM t WHERE b=$1 /* c=? */"
        );
        assert_eq!(
            rewrite_placeholders("SELECT $$it's ?$$, $fn$ ? $fn$, ?"),
            "SELECT $$it's ?$$, $fn$ ? $fn$, $1"
        );
        assert_eq!(rewrite_placeholders("SELECT $1, ?"), "SELECT $1, $1");
    }

    #[test]
    fn escape_strings_and_literal_question_marks() {
        assert_eq!(
            rewrite_placeholders("SELECT E'a\\'?' , ?"),
            "SELECT E'a\\'?' , $1"
        );
        // a plain string does not treat backslash as an escape
        assert_eq!(rewrite_placeholders("SELECT '\\', ?"), "SELECT '\\', $1");
        assert_eq!(
            rewrite_placeholders("SELECT doc ?? 'k' FROM t WHERE id=?"),
            "SELECT doc ? 'k' FROM t WHERE id=$1"
        );
    }

    #[test]
    fn params_follow_the_inferred_type() {
        let mut out = BytesMut::new();
        PgParam(&Value::Int(7)).to_sql(&Type::INT4, &mut out).unwrap();
        assert_eq!(&out[..], &7_i32.to_be_bytes());

        let mut out = BytesMut::new();
        PgParam(&Value::Text("42".into())).to_sql(&Type::INT8, &mut out).unwrap();
        assert_eq!(&out[..], &42_i64.to_be_bytes());

        let mut out = BytesMut::new();
        assert!(PgParam(&Value::Int(70_000)).to_sql(&Type::INT2, &mut out).is_err());
        assert!(matches!(
            PgParam(&Value::Null).to_sql(&Type::TEXT, &mut out),
            Ok(IsNull::Yes)
        ));
    }
}

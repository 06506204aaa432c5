//! Fluent statement builders.
//!
//! Everything starts from an [`Executor`] bound to one registered table
//! ([`Database::table`](crate::Database::table) or
//! [`Transaction::table`](crate::Transaction::table)):
//!
//! - [`Executor`]: insert / replace / delete / count, and the entry points below
//! - [`Selector`]: filtered, sorted, paginated `SELECT` into records
//! - [`Jointer`]: `SELECT` across chained joins into one record per table
//! - [`Updater`]: `UPDATE` from a record, positional values or a column map
//!
//! Clause setters take and return the builder by value. Only terminal calls touch the
//! database. A builder bound to an unknown table name still builds; the
//! [`OrmError::NotRegistered`](crate::OrmError::NotRegistered) surfaces from its first
//! terminal call, before any statement is sent.
//!
//! Generated statements use `?` placeholders; values are always bound, never inlined.

mod executor;
mod join;
mod select;
mod update;

pub use executor::Executor;
pub use join::{JoinStep, Jointer};
pub use select::Selector;
pub use update::Updater;

use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::hook::SqlHook;
use crate::row::Row;
use crate::schema::{Registry, Table};
use crate::value::Value;

/// What every builder carries: the client to run on, the registry to resolve table names
/// against, and the hook to report statements to.
pub(crate) struct Session<'a, C> {
    client: &'a C,
    tables: &'a Registry,
    hook: Option<&'a dyn SqlHook>,
}

impl<C> Clone for Session<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Session<'_, C> {}

impl<'a, C: GenericClient> Session<'a, C> {
    pub(crate) fn new(client: &'a C, tables: &'a Registry, hook: Option<&'a dyn SqlHook>) -> Self {
        Self {
            client,
            tables,
            hook,
        }
    }

    pub(crate) fn table(&self, name: &str) -> Option<&'a Table> {
        self.tables.get(name)
    }

    fn report(&self, sql: &str) {
        if let Some(hook) = self.hook {
            hook.before_query(sql);
        }
    }

    pub(crate) async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        self.report(sql);
        self.client.query(sql, params).await
    }

    pub(crate) async fn query_one(&self, sql: &str, params: &[Value]) -> OrmResult<Row> {
        self.report(sql);
        self.client.query_one(sql, params).await
    }

    pub(crate) async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<ExecResult> {
        self.report(sql);
        self.client.execute(sql, params).await
    }
}

/// Resolve the bound table or return the deferred binding error.
fn bound<'a>(table: Option<&'a Table>, name: &str) -> OrmResult<&'a Table> {
    table.ok_or_else(|| OrmError::not_registered(name))
}

/// `WHERE` predicate: opaque SQL text with `?` placeholders plus its arguments.
#[derive(Debug, Clone, Default)]
pub(crate) struct Filter {
    clause: String,
    args: Vec<Value>,
}

impl Filter {
    pub(crate) fn new(clause: &str, args: Vec<Value>) -> Self {
        Self {
            clause: clause.to_string(),
            args,
        }
    }

    pub(crate) fn args(&self) -> &[Value] {
        &self.args
    }

    fn push_sql(&self, sql: &mut String) {
        if !self.clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.clause);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// `ORDER BY` columns, all sorted in one direction.
#[derive(Debug, Clone)]
pub(crate) struct Sort {
    columns: Vec<String>,
    direction: Direction,
}

impl Sort {
    pub(crate) fn new(columns: &[&str], direction: Direction) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            direction,
        }
    }

    /// Append ` ORDER BY t.a,t.b DIR`, qualifying each column with `table`.
    fn push_sql(&self, sql: &mut String, table: &str) {
        if self.columns.is_empty() {
            return;
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&qualified(table, self.columns.iter().map(String::as_str)));
        sql.push(' ');
        sql.push_str(self.direction.as_str());
    }
}

/// The join operators a [`Selector`] or [`Jointer`] can chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    LeftOuter,
    Right,
    RightOuter,
    Full,
    FullOuter,
}

impl JoinKind {
    /// The operator as spliced between two table expressions, spaces included.
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => " INNER JOIN ",
            JoinKind::Left => " LEFT JOIN ",
            JoinKind::LeftOuter => " LEFT OUTER JOIN ",
            JoinKind::Right => " RIGHT JOIN ",
            JoinKind::RightOuter => " RIGHT OUTER JOIN ",
            JoinKind::Full => " FULL JOIN ",
            JoinKind::FullOuter => " FULL OUTER JOIN ",
        }
    }
}

/// `t.a,t.b,...`
fn qualified<'c>(table: &str, columns: impl IntoIterator<Item = &'c str>) -> String {
    columns
        .into_iter()
        .map(|c| format!("{table}.{c}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Field indexes for `columns`, failing on a column `table` does not have.
fn field_indexes(table: &Table, columns: &[String]) -> OrmResult<Vec<usize>> {
    columns
        .iter()
        .map(|name| table.require_column(name).map(|c| c.index))
        .collect()
}

/// Shared `[WHERE] [ORDER BY] [LIMIT] [OFFSET]` tail of select statements.
#[derive(Debug, Clone, Default)]
pub(crate) struct Clauses {
    filter: Filter,
    sort: Option<Sort>,
    limit: u64,
    offset: u64,
}

impl Clauses {
    fn push_sql(&self, sql: &mut String, table: &str) {
        self.filter.push_sql(sql);
        if let Some(sort) = &self.sort {
            sort.push_sql(sql, table);
        }
        if self.limit > 0 {
            sql.push_str(&format!(" LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            sql.push_str(&format!(" OFFSET {}", self.offset));
        }
    }
}

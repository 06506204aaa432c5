use super::{Filter, Selector, Session, Updater, bound};
use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::record::FieldSet;
use crate::schema::Table;
use crate::value::{IntoParams, Value};

/// Entry point for statements against one table.
///
/// Obtained from [`Database::table`](crate::Database::table) or
/// [`Transaction::table`](crate::Transaction::table). The executor itself is cheap and can
/// be reused for several statements.
pub struct Executor<'a, C> {
    session: Session<'a, C>,
    name: String,
    table: Option<&'a Table>,
}

impl<'a, C: GenericClient> Executor<'a, C> {
    pub(crate) fn new(session: Session<'a, C>, name: &str) -> Self {
        Self {
            session,
            name: name.to_string(),
            table: session.table(name),
        }
    }

    /// Table name this executor was requested for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema of the bound table.
    pub fn schema(&self) -> OrmResult<&'a Table> {
        bound(self.table, &self.name)
    }

    /// Insert `record`, leaving auto-increment columns to the database.
    pub async fn insert<R: FieldSet>(&self, record: &R) -> OrmResult<ExecResult> {
        let table = self.schema()?;
        let (sql, params) = write_sql("INSERT INTO", table, record, false)?;
        self.session.execute(&sql, &params).await
    }

    /// `REPLACE INTO` with every column, auto-increment ones included.
    pub async fn replace<R: FieldSet>(&self, record: &R) -> OrmResult<ExecResult> {
        let table = self.schema()?;
        let (sql, params) = write_sql("REPLACE INTO", table, record, true)?;
        self.session.execute(&sql, &params).await
    }

    /// Number of rows in the table.
    pub async fn count_all(&self) -> OrmResult<u64> {
        self.count("", ()).await
    }

    /// Number of rows matching `where_clause`; an empty clause counts every row.
    pub async fn count(&self, where_clause: &str, args: impl IntoParams) -> OrmResult<u64> {
        let table = self.schema()?;
        let filter = Filter::new(where_clause, args.into_params());
        let mut sql = format!("SELECT COUNT(*) FROM {}", table.name());
        filter.push_sql(&mut sql);

        match self.session.query_one(&sql, filter.args()).await {
            Ok(row) => row.try_get::<u64>(0),
            Err(err) if err.is_not_found() => Ok(0),
            Err(err) => Err(err),
        }
    }

    /// Delete rows matching `where_clause` and return how many went. An empty clause
    /// deletes every row.
    pub async fn delete(&self, where_clause: &str, args: impl IntoParams) -> OrmResult<u64> {
        let table = self.schema()?;
        let filter = Filter::new(where_clause, args.into_params());
        let mut sql = format!("DELETE FROM {}", table.name());
        filter.push_sql(&mut sql);
        Ok(self.session.execute(&sql, filter.args()).await?.rows_affected)
    }

    /// Select every column, in declaration order.
    pub fn select_all(&self) -> Selector<'a, C> {
        let columns = self.table.map(Table::column_names).unwrap_or_default();
        Selector::new(self.session, &self.name, self.table, columns)
    }

    /// Select the given columns; each must belong to the table.
    pub fn select(&self, columns: &[&str]) -> Selector<'a, C> {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        Selector::new(self.session, &self.name, self.table, columns)
    }

    /// Start an `UPDATE` of the rows matching `where_clause`.
    pub fn update(&self, where_clause: &str, args: impl IntoParams) -> Updater<'a, C> {
        Updater::new(
            self.session,
            &self.name,
            self.table,
            Filter::new(where_clause, args.into_params()),
        )
    }
}

/// `<verb> <table>(<cols>) VALUES(<?,...>)` with values read from `record` in column order.
fn write_sql<R: FieldSet>(
    verb: &str,
    table: &Table,
    record: &R,
    with_auto_increment: bool,
) -> OrmResult<(String, Vec<Value>)> {
    let mut names = Vec::with_capacity(table.columns().len());
    let mut params = Vec::with_capacity(table.columns().len());
    for column in table.columns() {
        if column.is_auto_increment && !with_auto_increment {
            continue;
        }
        names.push(column.name.as_str());
        params.push(record.get_field(column.index)?);
    }

    if names.is_empty() {
        return Err(OrmError::shape(format!(
            "{} table doesn't have columns to write",
            table.name()
        )));
    }

    let placeholders = vec!["?"; names.len()].join(",");
    let sql = format!(
        "{verb} {}({}) VALUES({placeholders})",
        table.name(),
        names.join(",")
    );
    Ok((sql, params))
}

use super::{Filter, Session, bound};
use crate::client::{ExecResult, GenericClient};
use crate::error::{OrmError, OrmResult};
use crate::record::FieldSet;
use crate::schema::Table;
use crate::value::{IntoParams, ToValue, Value};
use std::collections::HashMap;
use std::hash::BuildHasher;

/// `UPDATE` builder for the rows matched by its filter.
///
/// ```ignore
/// db.table("user")
///     .update("userid=?", ["A"])
///     .set(&["password"])
///     .value(&user)
///     .await?;
/// ```
pub struct Updater<'a, C> {
    session: Session<'a, C>,
    name: String,
    table: Option<&'a Table>,
    columns: Vec<String>,
    filter: Filter,
}

impl<'a, C: GenericClient> Updater<'a, C> {
    pub(crate) fn new(
        session: Session<'a, C>,
        name: &str,
        table: Option<&'a Table>,
        filter: Filter,
    ) -> Self {
        Self {
            session,
            name: name.to_string(),
            table,
            columns: Vec::new(),
            filter,
        }
    }

    /// Restrict the update to `columns`.
    pub fn set(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Write the fields of `record`: the [`set`](Self::set) columns, or every column when
    /// none were set. Auto-increment columns are never written.
    pub async fn value<R: FieldSet>(&self, record: &R) -> OrmResult<ExecResult> {
        let table = bound(self.table, &self.name)?;
        let names: Vec<&str> = if self.columns.is_empty() {
            table.columns().iter().map(|c| c.name.as_str()).collect()
        } else {
            self.columns.iter().map(String::as_str).collect()
        };

        let mut assigned = Vec::with_capacity(names.len());
        let mut params = Vec::with_capacity(names.len());
        for name in names {
            let column = table.require_column(name)?;
            if column.is_auto_increment {
                continue;
            }
            assigned.push(name);
            params.push(record.get_field(column.index)?);
        }

        self.exec(table, &assigned, params).await
    }

    /// Positional values for the [`set`](Self::set) columns, one per column.
    pub async fn values(&self, values: impl IntoParams) -> OrmResult<ExecResult> {
        let table = bound(self.table, &self.name)?;
        let values = values.into_params();
        if self.columns.is_empty() {
            return Err(OrmError::shape("please specify columns to update"));
        }
        if values.len() != self.columns.len() {
            return Err(OrmError::shape(format!(
                "{} columns to update but {} values given",
                self.columns.len(),
                values.len()
            )));
        }

        let mut assigned = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            assigned.push(table.require_column(name)?.name.as_str());
        }

        self.exec(table, &assigned, values).await
    }

    /// Values looked up by column name, e.g. from
    /// [`Table::column_map_from_form`](crate::Table::column_map_from_form).
    ///
    /// Columns missing from `map` are left alone, as are auto-increment columns. When
    /// [`set`](Self::set) was used, only those columns are considered. A key naming a
    /// column the table lacks is an error, and so is a map that leaves nothing to write.
    pub async fn value_map<V, S>(&self, map: &HashMap<String, V, S>) -> OrmResult<ExecResult>
    where
        V: ToValue,
        S: BuildHasher,
    {
        let table = bound(self.table, &self.name)?;
        for key in map.keys() {
            table.require_column(key)?;
        }
        for name in &self.columns {
            table.require_column(name)?;
        }

        let mut assigned = Vec::new();
        let mut params = Vec::new();
        for column in table.columns() {
            if column.is_auto_increment {
                continue;
            }
            if !self.columns.is_empty() && !self.columns.contains(&column.name) {
                continue;
            }
            if let Some(value) = map.get(&column.name) {
                assigned.push(column.name.as_str());
                params.push(value.to_value());
            }
        }

        self.exec(table, &assigned, params).await
    }

    async fn exec(
        &self,
        table: &Table,
        assigned: &[&str],
        mut params: Vec<Value>,
    ) -> OrmResult<ExecResult> {
        if assigned.is_empty() {
            return Err(OrmError::shape("no specified columns to update"));
        }

        let sets: Vec<String> = assigned.iter().map(|c| format!("{c}=?")).collect();
        let mut sql = format!("UPDATE {} SET {}", table.name(), sets.join(","));
        self.filter.push_sql(&mut sql);
        params.extend_from_slice(self.filter.args());
        self.session.execute(&sql, &params).await
    }
}

//! Result rows as returned by a driver.

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// One result row: values in select-list order plus the shared column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Decode the value at `index`, returning `OrmError::Decode` on failure.
    pub fn try_get<T: FromValue>(&self, index: usize) -> OrmResult<T> {
        let column = self
            .columns
            .get(index)
            .map(String::as_str)
            .unwrap_or("?");
        let value = self
            .values
            .get(index)
            .cloned()
            .ok_or_else(|| OrmError::decode(column, format!("row has no column at {index}")))?;
        T::from_value(value).map_err(|msg| OrmError::decode(column, msg))
    }

    /// Decode the value of the column named `name`.
    pub fn try_get_column<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OrmError::decode(name, "no such column in row"))?;
        self.try_get(index)
    }
}

//! Column values from submitted form fields.
//!
//! Request parsing stays with the web framework; these helpers take the already-parsed
//! multi-valued form map and pick out the fields that belong to the table.

use super::table::Table;
use crate::value::Value;
use std::collections::HashMap;

impl Table {
    /// Column names and text values for every column present in `form`.
    ///
    /// A column is looked up by its form alias, or by its name when it has none; only the
    /// first submitted value is used and fields without values are skipped. The result
    /// lines up with [`Updater::set`](crate::Updater::set) +
    /// [`Updater::values`](crate::Updater::values).
    pub fn columns_from_form(&self, form: &HashMap<String, Vec<String>>) -> (Vec<String>, Vec<Value>) {
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for column in self.columns() {
            if let Some(first) = form.get(column.form_key()).and_then(|vs| vs.first()) {
                columns.push(column.name.clone());
                values.push(Value::Text(first.clone()));
            }
        }
        (columns, values)
    }

    /// Same as [`Table::columns_from_form`], keyed by column name for
    /// [`Updater::value_map`](crate::Updater::value_map).
    pub fn column_map_from_form(&self, form: &HashMap<String, Vec<String>>) -> HashMap<String, Value> {
        let (columns, values) = self.columns_from_form(form);
        columns.into_iter().zip(values).collect()
    }
}

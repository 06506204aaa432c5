//! Schema registry: record metadata → `Table` / `Column` model and DDL.

mod column;
mod form;
mod table;

pub use column::Column;
pub use table::Table;

use std::collections::BTreeMap;

/// Registered tables by name.
pub(crate) type Registry = BTreeMap<String, Table>;

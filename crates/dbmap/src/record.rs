//! Record description and field access.
//!
//! A record type describes itself once through [`Record::fields`] (ordered
//! [`FieldDef`]s carrying the raw column annotations) and exposes its fields by index
//! through [`FieldSet`]. The schema registry validates the descriptors at registration
//! time and keeps only the field indexes; every later read or write goes through
//! `get_field` / `set_field`.
//!
//! These traits are normally derived:
//!
//! ```ignore
//! use dbmap::Record;
//!
//! #[derive(Debug, Default, Record)]
//! struct User {
//!     #[orm(db = "id", sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
//!           mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT")]
//!     id: i64,
//!     #[orm(db = "userid", sqlite = "TEXT NOT NULL", mysql = "varchar(32) NOT NULL")]
//!     userid: String,
//!     // not persisted: no column annotation
//!     cached_display_name: String,
//! }
//! ```

use crate::error::OrmResult;
use crate::value::Value;

/// Declarative metadata for one field of a record type.
///
/// Annotation values are kept exactly as written; an empty string means "not given".
/// Which of `column` / `col` / `db` wins, and which dialect aliases apply, is decided by
/// the schema registry, not here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldDef {
    /// Position of the field in the record's declaration order.
    pub index: usize,
    /// Rust field name, used in diagnostics.
    pub field: &'static str,
    pub column: &'static str,
    pub col: &'static str,
    pub db: &'static str,
    /// Alias used when the column is read from a submitted form.
    pub form: &'static str,
    pub sqlite: &'static str,
    pub sqlite3: &'static str,
    pub mysql: &'static str,
    pub postgres: &'static str,
    pub postgre: &'static str,
}

impl FieldDef {
    pub const fn new(index: usize, field: &'static str) -> Self {
        Self {
            index,
            field,
            column: "",
            col: "",
            db: "",
            form: "",
            sqlite: "",
            sqlite3: "",
            mysql: "",
            postgres: "",
            postgre: "",
        }
    }

    pub const fn column(mut self, name: &'static str) -> Self {
        self.column = name;
        self
    }

    pub const fn col(mut self, name: &'static str) -> Self {
        self.col = name;
        self
    }

    pub const fn db(mut self, name: &'static str) -> Self {
        self.db = name;
        self
    }

    pub const fn form(mut self, name: &'static str) -> Self {
        self.form = name;
        self
    }

    pub const fn sqlite(mut self, clause: &'static str) -> Self {
        self.sqlite = clause;
        self
    }

    pub const fn mysql(mut self, clause: &'static str) -> Self {
        self.mysql = clause;
        self
    }

    pub const fn postgres(mut self, clause: &'static str) -> Self {
        self.postgres = clause;
        self
    }

    /// Column name by priority: `column`, then `col`, then `db`.
    pub fn column_name(&self) -> Option<&'static str> {
        [self.column, self.col, self.db]
            .into_iter()
            .find(|name| !name.is_empty())
    }

    /// sqlite clause, accepting the `sqlite3` spelling.
    pub fn sqlite_clause(&self) -> &'static str {
        if self.sqlite.is_empty() {
            self.sqlite3
        } else {
            self.sqlite
        }
    }

    /// postgres clause, accepting the `postgre` spelling.
    pub fn postgres_clause(&self) -> &'static str {
        if self.postgres.is_empty() {
            self.postgre
        } else {
            self.postgres
        }
    }
}

/// Index-based access to the persisted fields of a record.
///
/// This trait is object safe; the materializer works on `&mut dyn FieldSet` so that one
/// join row can be spread across records of different types.
pub trait FieldSet {
    /// Read the field at `index` (declaration order) as a bindable value.
    fn get_field(&self, index: usize) -> OrmResult<Value>;

    /// Decode `value` into the field at `index`.
    fn set_field(&mut self, index: usize, value: Value) -> OrmResult<()>;
}

/// A record type that can be registered as a table.
///
/// Typically derived using `#[derive(Record)]` from the `dbmap-derive` crate.
pub trait Record: FieldSet + Default + Send + Sync {
    /// Field descriptors in declaration order. Fields without a column annotation may
    /// be omitted or returned with empty names; either way they are not persisted.
    fn fields() -> Vec<FieldDef>;
}

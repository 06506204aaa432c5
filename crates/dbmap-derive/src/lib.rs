//! Derive macros for dbmap
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;

/// Derive `FieldSet` and `Record` for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use dbmap::Record;
///
/// #[derive(Debug, Default, Record)]
/// struct User {
///     #[orm(db = "id", sqlite = "INTEGER PRIMARY KEY AUTOINCREMENT",
///           mysql = "int NOT NULL PRIMARY KEY AUTO_INCREMENT")]
///     id: i64,
///     #[orm(db = "userid", sqlite = "TEXT NOT NULL", mysql = "varchar(32) NOT NULL")]
///     userid: String,
///     #[orm(db = "nickname", form = "nick", sqlite = "TEXT")]
///     nickname: String,
///     // not persisted
///     session: Option<String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[orm(column = "name")]`, `#[orm(col = "name")]`, `#[orm(db = "name")]` - Column
///   name, first non-empty one in that order. Fields without one are not persisted.
/// - `#[orm(form = "alias")]` - Form field the column is read from
/// - `#[orm(sqlite = "...")]` / `sqlite3` - sqlite type clause
/// - `#[orm(mysql = "...")]` - mysql type clause
/// - `#[orm(postgres = "...")]` / `postgre` - postgres type clause
///
/// Persisted fields must implement `ToValue` and `FromValue`.
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

use super::column::Column;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::record::{FieldDef, Record};
use std::collections::HashMap;

/// Column schema derived from a registered record type.
///
/// Built once by [`Table::parse`] and read-only afterwards. Columns keep the record's
/// declaration order, which is the order every generated statement lists them in.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
}

impl Table {
    /// Build the table model for record type `R`.
    pub fn from_record<R: Record>(name: &str) -> OrmResult<Self> {
        Self::parse(name, &R::fields())
    }

    /// Validate field descriptors and build the table model.
    ///
    /// A field participates only when it has a column name (`column`, `col` or `db`, in
    /// that priority). Primary-key and auto-increment flags come from the sqlite clause;
    /// when a mysql clause is present too, its flags must agree.
    pub fn parse(name: &str, fields: &[FieldDef]) -> OrmResult<Self> {
        let mut columns: Vec<Column> = Vec::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());

        for field in fields {
            let Some(col) = field.column_name() else {
                continue;
            };

            let sqlite = field.sqlite_clause();
            let mysql = field.mysql;
            let postgres = field.postgres_clause();

            let mut is_primary_key = false;
            let mut is_auto_increment = false;
            if !sqlite.is_empty() {
                let s = sqlite.to_lowercase();
                is_primary_key = s.contains("primary key");
                is_auto_increment = s.contains("autoincrement");
            }

            if !mysql.is_empty() && !sqlite.is_empty() {
                let s = mysql.to_lowercase();
                if is_primary_key != s.contains("primary key") {
                    return Err(OrmError::schema(format!(
                        "column {col} has different 'primary key' attribute"
                    )));
                }
                if is_auto_increment != s.contains("auto_increment") {
                    return Err(OrmError::schema(format!(
                        "column {col} has different 'auto-increment' attribute"
                    )));
                }
            }

            if sqlite.is_empty() && mysql.is_empty() && postgres.is_empty() {
                return Err(OrmError::schema(format!(
                    "column {col} does not have sql definition"
                )));
            }

            if by_name.contains_key(col) {
                return Err(OrmError::schema(format!("column {col} is redefined")));
            }

            by_name.insert(col.to_string(), columns.len());
            columns.push(Column {
                name: col.to_string(),
                form_name: field.form.to_string(),
                index: field.index,
                sqlite: sqlite.to_string(),
                mysql: mysql.to_string(),
                postgres: postgres.to_string(),
                is_primary_key,
                is_auto_increment,
            });
        }

        if columns.is_empty() {
            return Err(OrmError::schema(format!(
                "table {name} doesn't have column definitions"
            )));
        }

        Ok(Self {
            name: name.to_string(),
            columns,
            by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.by_name.get(name).map(|&i| &self.columns[i])
    }

    /// Look up a column, failing with a shape error naming the table.
    pub(crate) fn require_column(&self, name: &str) -> OrmResult<&Column> {
        self.column(name).ok_or_else(|| {
            OrmError::shape(format!("{} table has no column {}", self.name, name))
        })
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_indexes(&self) -> Vec<usize> {
        self.columns.iter().map(|c| c.index).collect()
    }

    /// First column flagged as primary key, if any.
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Render `CREATE TABLE IF NOT EXISTS` for `dialect`.
    ///
    /// Fails when any column lacks a type clause for that dialect.
    pub fn create_sql(&self, dialect: Dialect) -> OrmResult<String> {
        let mut defs = Vec::with_capacity(self.columns.len());
        for column in &self.columns {
            let clause = column.clause(dialect).ok_or_else(|| {
                OrmError::schema(format!(
                    "{} column of {} table has no definition for {}",
                    column.name, self.name, dialect
                ))
            })?;
            defs.push(format!("{} {}", column.name, clause));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {}({})",
            self.name,
            defs.join(",")
        ))
    }
}

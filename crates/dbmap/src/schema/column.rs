use crate::dialect::Dialect;

/// One persisted field of a registered record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    /// Form field alias; empty means the column name is used.
    pub form_name: String,
    /// Field index in the record's declaration order.
    pub index: usize,
    pub sqlite: String,
    pub mysql: String,
    pub postgres: String,
    pub is_primary_key: bool,
    pub is_auto_increment: bool,
}

impl Column {
    /// Type clause for `dialect`, or `None` when the column has no definition for it.
    pub fn clause(&self, dialect: Dialect) -> Option<&str> {
        let clause = match dialect {
            Dialect::Sqlite => &self.sqlite,
            Dialect::MySql => &self.mysql,
            Dialect::Postgres => &self.postgres,
        };
        (!clause.is_empty()).then_some(clause.as_str())
    }

    /// Name this column is looked up by in a submitted form.
    pub fn form_key(&self) -> &str {
        if self.form_name.is_empty() {
            &self.name
        } else {
            &self.form_name
        }
    }
}

//! SQL diagnostics hook.
//!
//! A [`Database`](crate::Database) can be given one hook at construction; it is called
//! with the exact SQL text right before every statement the database (or a transaction
//! opened from it) sends to the driver. Without a hook nothing is reported.

use tracing::Level;

/// Callback invoked with each SQL statement before execution.
pub trait SqlHook: Send + Sync {
    fn before_query(&self, sql: &str);
}

impl<F> SqlHook for F
where
    F: Fn(&str) + Send + Sync,
{
    fn before_query(&self, sql: &str) {
        self(sql)
    }
}

/// A `tracing`-based hook that emits each statement as an event on target `dbmap.sql`.
#[derive(Debug, Clone)]
pub struct TracingSqlHook {
    /// Tracing event level to emit at.
    pub level: Level,
    /// Truncate long SQL strings (in bytes, on a char boundary). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            level: Level::DEBUG,
            max_sql_length: Some(200),
        }
    }
}

impl TracingSqlHook {
    /// Create a new hook with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the tracing event level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_at_char_boundary(sql, max)),
            _ => sql.to_string(),
        }
    }
}

fn truncate_at_char_boundary(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

impl SqlHook for TracingSqlHook {
    fn before_query(&self, sql: &str) {
        let sql = self.truncate_sql(sql);
        match self.level {
            Level::ERROR => tracing::error!(target: "dbmap.sql", sql = %sql),
            Level::WARN => tracing::warn!(target: "dbmap.sql", sql = %sql),
            Level::INFO => tracing::info!(target: "dbmap.sql", sql = %sql),
            Level::DEBUG => tracing::debug!(target: "dbmap.sql", sql = %sql),
            Level::TRACE => tracing::trace!(target: "dbmap.sql", sql = %sql),
        }
    }
}

//! Database facade: table registry plus connection and transaction lifecycle.

use crate::builder::{Executor, Session};
use crate::client::{Connector, GenericClient, TransactionClient};
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::hook::SqlHook;
use crate::record::Record;
use crate::schema::{Registry, Table};
use std::sync::Arc;

/// A connection together with the record types registered on it.
///
/// ```ignore
/// use dbmap::prelude::*;
///
/// let mut db = Database::new(SqliteClient::open_in_memory()?);
/// db.register::<User>("user")?;
/// db.create_tables().await?;
///
/// db.table("user").insert(&user).await?;
/// let n = db.table("user").count("userid=?", ["A"]).await?;
/// ```
///
/// Registration needs `&mut self`, so it happens before the handle is shared; builders
/// borrow the database and cannot outlive it.
pub struct Database<C> {
    client: C,
    tables: Registry,
    hook: Option<Arc<dyn SqlHook>>,
}

impl<C: GenericClient> Database<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            tables: Registry::new(),
            hook: None,
        }
    }

    /// Report every statement to `hook` right before it is sent, including the ones run
    /// inside transactions opened from this database.
    pub fn with_hook(mut self, hook: impl SqlHook + 'static) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.client.dialect()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Register record type `R` as table `name`.
    pub fn register<R: Record>(&mut self, name: &str) -> OrmResult<&Table> {
        let table = Table::from_record::<R>(name)?;
        if self.tables.contains_key(name) {
            return Err(OrmError::schema(format!("{name} table is already existing")));
        }
        tracing::debug!(
            target: "dbmap",
            table = name,
            columns = table.columns().len(),
            "registered table"
        );
        Ok(self.tables.entry(name.to_string()).or_insert(table))
    }

    /// Schema of a registered table.
    pub fn table_schema(&self, name: &str) -> OrmResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| OrmError::not_registered(name))
    }

    /// Registered tables, ordered by name.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }

    fn session(&self) -> Session<'_, C> {
        Session::new(&self.client, &self.tables, self.hook.as_deref())
    }

    /// `CREATE TABLE IF NOT EXISTS` for every registered table, in name order.
    pub async fn create_tables(&self) -> OrmResult<()> {
        for table in self.tables.values() {
            self.create(table).await?;
        }
        Ok(())
    }

    /// `CREATE TABLE IF NOT EXISTS` for one registered table.
    pub async fn create_table(&self, name: &str) -> OrmResult<()> {
        let table = self.table_schema(name)?;
        self.create(table).await
    }

    async fn create(&self, table: &Table) -> OrmResult<()> {
        let sql = table.create_sql(self.dialect())?;
        tracing::debug!(target: "dbmap", table = table.name(), dialect = %self.dialect(), "creating table");
        self.session().execute(&sql, &[]).await.map(|_| ())
    }

    /// `DROP TABLE <name>`; the name does not have to be registered.
    pub async fn drop_table(&self, name: &str) -> OrmResult<()> {
        tracing::debug!(target: "dbmap", table = name, "dropping table");
        self.session()
            .execute(&format!("DROP TABLE {name}"), &[])
            .await
            .map(|_| ())
    }

    /// Statement builders for table `name`, run on the database connection.
    ///
    /// An unknown name is reported by the first terminal call on the returned builder.
    pub fn table(&self, name: &str) -> Executor<'_, C> {
        Executor::new(self.session(), name)
    }

    /// Close the database. Builders borrow it, so none can be alive at this point.
    pub fn close(self) {
        tracing::debug!(target: "dbmap", tables = self.tables.len(), "closing database");
    }

    /// Give up the registry and take the client back.
    pub fn into_client(self) -> C {
        self.client
    }
}

impl<C: Connector> Database<C> {
    /// Open a transaction. It must be finished with [`Transaction::commit`] or
    /// [`Transaction::rollback`]; dropping it unfinished rolls it back.
    pub async fn begin(&self) -> OrmResult<Transaction<'_, C>> {
        let tx = self.client.begin().await?;
        Ok(Transaction { db: self, tx })
    }
}

/// A transaction opened from a [`Database`], sharing its registry and hook.
pub struct Transaction<'a, C: Connector> {
    db: &'a Database<C>,
    tx: C::Transaction,
}

impl<'a, C: Connector> Transaction<'a, C> {
    /// Statement builders for table `name`, run inside this transaction.
    pub fn table(&self, name: &str) -> Executor<'_, C::Transaction> {
        Executor::new(
            Session::new(&self.tx, &self.db.tables, self.db.hook.as_deref()),
            name,
        )
    }

    /// The driver transaction, for statements written by hand.
    pub fn client(&self) -> &C::Transaction {
        &self.tx
    }

    pub async fn commit(self) -> OrmResult<()> {
        self.tx.commit().await
    }

    pub async fn rollback(self) -> OrmResult<()> {
        self.tx.rollback().await
    }
}

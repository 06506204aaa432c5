use super::{
    Clauses, Direction, Filter, JoinKind, JoinStep, Jointer, Session, Sort, bound,
    field_indexes, qualified,
};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::materialize::{RowSink, bind_row, decode_all};
use crate::record::{FieldSet, Record};
use crate::row::Row;
use crate::schema::Table;
use crate::value::IntoParams;

/// Single-table `SELECT` builder.
///
/// ```ignore
/// let mut users: Vec<User> = Vec::new();
/// db.table("user")
///     .select_all()
///     .filter("nickname<>?", [""])
///     .desc(&["id"])
///     .offset(20)
///     .limit(10)
///     .all(&mut users)
///     .await?;
/// ```
pub struct Selector<'a, C> {
    pub(super) session: Session<'a, C>,
    pub(super) name: String,
    pub(super) table: Option<&'a Table>,
    pub(super) columns: Vec<String>,
    pub(super) clauses: Clauses,
}

impl<'a, C: GenericClient> Selector<'a, C> {
    pub(crate) fn new(
        session: Session<'a, C>,
        name: &str,
        table: Option<&'a Table>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            session,
            name: name.to_string(),
            table,
            columns,
            clauses: Clauses::default(),
        }
    }

    /// Set the `WHERE` predicate, replacing any earlier one.
    pub fn filter(mut self, where_clause: &str, args: impl IntoParams) -> Self {
        self.clauses.filter = Filter::new(where_clause, args.into_params());
        self
    }

    /// Sort ascending by `columns`, replacing any earlier sort.
    pub fn asc(mut self, columns: &[&str]) -> Self {
        self.clauses.sort = Some(Sort::new(columns, Direction::Asc));
        self
    }

    /// Sort descending by `columns`, replacing any earlier sort.
    pub fn desc(mut self, columns: &[&str]) -> Self {
        self.clauses.sort = Some(Sort::new(columns, Direction::Desc));
        self
    }

    /// `LIMIT n`; zero leaves the clause out.
    pub fn limit(mut self, n: u64) -> Self {
        self.clauses.limit = n;
        self
    }

    /// `OFFSET n`; zero leaves the clause out.
    pub fn offset(mut self, n: u64) -> Self {
        self.clauses.offset = n;
        self
    }

    fn build(&self) -> OrmResult<(String, Vec<usize>)> {
        let table = bound(self.table, &self.name)?;
        if self.columns.is_empty() {
            return Err(OrmError::shape(format!(
                "no columns selected from {} table",
                table.name()
            )));
        }
        let indexes = field_indexes(table, &self.columns)?;

        let mut sql = format!(
            "SELECT {} FROM {}",
            qualified(table.name(), self.columns.iter().map(String::as_str)),
            table.name()
        );
        self.clauses.push_sql(&mut sql, table.name());
        Ok((sql, indexes))
    }

    /// The statement this selector would run.
    pub fn to_sql(&self) -> OrmResult<String> {
        self.build().map(|(sql, _)| sql)
    }

    /// Run the query and return the raw rows.
    pub async fn run(&self) -> OrmResult<Vec<Row>> {
        let (sql, _) = self.build()?;
        self.session.query(&sql, self.clauses.filter.args()).await
    }

    /// Fetch the first matching row into `record`.
    ///
    /// Only the selected columns are written; other fields keep their values. No
    /// matching row is [`OrmError::NotFound`].
    pub async fn one<R: FieldSet>(&self, record: &mut R) -> OrmResult<()> {
        let (sql, indexes) = self.build()?;
        let row = self
            .session
            .query_one(&sql, self.clauses.filter.args())
            .await?;
        bind_row(&mut [record as &mut dyn FieldSet], &[indexes], row.into_values())
    }

    /// Fetch every matching row into `records`.
    ///
    /// Elements already in `records` are reused by position and new ones are
    /// default-constructed. Afterwards `records` holds exactly the decoded rows, also
    /// when decoding stops on an error.
    pub async fn all<R: Record>(&self, records: &mut Vec<R>) -> OrmResult<()> {
        let (sql, indexes) = self.build()?;
        let rows = self.session.query(&sql, self.clauses.filter.args()).await?;
        decode_all(&mut [records as &mut dyn RowSink], &[indexes], rows)
    }

    fn join(self, kind: JoinKind, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        Jointer::from_selector(self).join(kind, table, on_left, on_right)
    }

    /// `INNER JOIN table ON <base>.on_left=<table>.on_right`
    pub fn inner_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::Inner, table, on_left, on_right)
    }

    /// `LEFT JOIN table ON <base>.on_left=<table>.on_right`
    pub fn left_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::Left, table, on_left, on_right)
    }

    /// `LEFT OUTER JOIN table ON <base>.on_left=<table>.on_right`
    pub fn left_outer_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::LeftOuter, table, on_left, on_right)
    }

    /// `RIGHT JOIN table ON <base>.on_left=<table>.on_right`
    pub fn right_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::Right, table, on_left, on_right)
    }

    /// `RIGHT OUTER JOIN table ON <base>.on_left=<table>.on_right`
    pub fn right_outer_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::RightOuter, table, on_left, on_right)
    }

    /// `FULL JOIN table ON <base>.on_left=<table>.on_right`
    pub fn full_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::Full, table, on_left, on_right)
    }

    /// `FULL OUTER JOIN table ON <base>.on_left=<table>.on_right`
    pub fn full_outer_join(self, table: &str, on_left: &str, on_right: &str) -> JoinStep<'a, C> {
        self.join(JoinKind::FullOuter, table, on_left, on_right)
    }
}

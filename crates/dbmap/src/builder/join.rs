use super::{
    Direction, Filter, JoinKind, Selector, Sort, bound, field_indexes, qualified,
};
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::materialize::{ColumnPlan, JoinSinks, JoinTargets, bind_row, decode_all};
use crate::row::Row;
use crate::value::IntoParams;

/// One link of a join chain.
#[derive(Debug, Clone)]
struct JoinSpec {
    kind: JoinKind,
    table: String,
    on_left: String,
    on_right: String,
    on_where: String,
    columns: Vec<String>,
}

/// A pending join: pick the joined table's columns to get the [`Jointer`] back.
///
/// ```ignore
/// let (mut user, mut account) = (User::default(), Account::default());
/// db.table("user")
///     .select(&["userid", "nickname"])
///     .left_join("account", "userid", "userid")
///     .select(&["email"])
///     .filter("user.userid=?", ["A"])
///     .one((&mut user, &mut account))
///     .await?;
/// ```
#[must_use = "a join step does nothing until its columns are selected"]
pub struct JoinStep<'a, C> {
    jointer: Jointer<'a, C>,
    spec: JoinSpec,
}

impl<'a, C: GenericClient> JoinStep<'a, C> {
    /// Extra text appended after this step's `ON` condition, e.g. `AND account.active=1`.
    pub fn on_where(mut self, clause: &str) -> Self {
        self.spec.on_where = clause.to_string();
        self
    }

    /// Take every column of the joined table.
    pub fn select_all(mut self) -> Jointer<'a, C> {
        if let Some(table) = self.jointer.selector.session.table(&self.spec.table) {
            self.spec.columns = table.column_names();
        }
        self.finish()
    }

    /// Take the given columns of the joined table. An empty list joins the table without
    /// selecting from it, so it needs no destination record.
    pub fn select(mut self, columns: &[&str]) -> Jointer<'a, C> {
        self.spec.columns = columns.iter().map(|c| c.to_string()).collect();
        self.finish()
    }

    fn finish(self) -> Jointer<'a, C> {
        let mut jointer = self.jointer;
        jointer.joins.push(self.spec);
        jointer
    }
}

/// Multi-table `SELECT` over a chain of joins.
///
/// Joins nest left to right: every new join takes the previous join expression,
/// parenthesised, as its left side. Every `ON` condition anchors its left column to the
/// base table, so keys used by later joins must live on the base table.
///
/// Results are decoded into one destination per participating table, in order: the
/// base table (when it selected columns), then each join that selected columns.
pub struct Jointer<'a, C> {
    selector: Selector<'a, C>,
    joins: Vec<JoinSpec>,
}

impl<'a, C: GenericClient> Jointer<'a, C> {
    pub(super) fn from_selector(selector: Selector<'a, C>) -> Self {
        Self {
            selector,
            joins: Vec::new(),
        }
    }

    pub(super) fn join(
        self,
        kind: JoinKind,
        table: &str,
        on_left: &str,
        on_right: &str,
    ) -> JoinStep<'a, C> {
        JoinStep {
            jointer: self,
            spec: JoinSpec {
                kind,
                table: table.to_string(),
                on_left: on_left.to_string(),
                on_right: on_right.to_string(),
                on_where: String::new(),
                columns: Vec::new(),
            },
        }
    }

    /// Set the `WHERE` predicate, replacing any earlier one.
    pub fn filter(mut self, where_clause: &str, args: impl IntoParams) -> Self {
        self.selector.clauses.filter = Filter::new(where_clause, args.into_params());
        self
    }

    /// Sort ascending by base-table `columns`, replacing any earlier sort.
    pub fn asc(mut self, columns: &[&str]) -> Self {
        self.selector.clauses.sort = Some(Sort::new(columns, Direction::Asc));
        self
    }

    /// Sort descending by base-table `columns`, replacing any earlier sort.
    pub fn desc(mut self, columns: &[&str]) -> Self {
        self.selector.clauses.sort = Some(Sort::new(columns, Direction::Desc));
        self
    }

    /// `LIMIT n`; zero leaves the clause out.
    pub fn limit(mut self, n: u64) -> Self {
        self.selector.clauses.limit = n;
        self
    }

    /// `OFFSET n`; zero leaves the clause out.
    pub fn offset(mut self, n: u64) -> Self {
        self.selector.clauses.offset = n;
        self
    }

    fn build(&self) -> OrmResult<(String, ColumnPlan)> {
        let selector = &self.selector;
        let base = bound(selector.table, &selector.name)?;
        let leftmost = base.name();

        let mut select_list: Vec<String> = Vec::new();
        let mut plan: ColumnPlan = Vec::with_capacity(self.joins.len() + 1);
        if !selector.columns.is_empty() {
            plan.push(field_indexes(base, &selector.columns)?);
            select_list.push(qualified(leftmost, selector.columns.iter().map(String::as_str)));
        }

        let mut from = String::new();
        for join in &self.joins {
            if join.on_left.is_empty() || join.on_right.is_empty() {
                return Err(OrmError::shape("no on columns for join"));
            }
            let table = selector
                .session
                .table(&join.table)
                .ok_or_else(|| OrmError::not_registered(&join.table))?;

            if !join.columns.is_empty() {
                plan.push(field_indexes(table, &join.columns)?);
                select_list.push(qualified(&join.table, join.columns.iter().map(String::as_str)));
            }

            from = if from.is_empty() {
                leftmost.to_string()
            } else {
                format!("({from})")
            };
            from.push_str(join.kind.keyword());
            from.push_str(&join.table);
            from.push_str(&format!(
                " ON {leftmost}.{}={}.{}",
                join.on_left, join.table, join.on_right
            ));
            if !join.on_where.is_empty() {
                from.push(' ');
                from.push_str(&join.on_where);
            }
        }

        if plan.is_empty() {
            return Err(OrmError::shape("no columns selected for join"));
        }

        let mut sql = format!("SELECT {} FROM {}", select_list.join(","), from);
        selector.clauses.push_sql(&mut sql, leftmost);
        Ok((sql, plan))
    }

    /// The statement this join would run.
    pub fn to_sql(&self) -> OrmResult<String> {
        self.build().map(|(sql, _)| sql)
    }

    /// Run the query and return the raw rows.
    pub async fn run(&self) -> OrmResult<Vec<Row>> {
        let (sql, _) = self.build()?;
        self.selector
            .session
            .query(&sql, self.selector.clauses.filter.args())
            .await
    }

    /// Fetch the first matching row, spreading it over one record per participating table.
    pub async fn one<T: JoinTargets>(&self, mut targets: T) -> OrmResult<()> {
        let (sql, plan) = self.build()?;
        check_count(targets.targets().len(), &plan)?;
        let row = self
            .selector
            .session
            .query_one(&sql, self.selector.clauses.filter.args())
            .await?;
        bind_row(&mut targets.targets(), &plan, row.into_values())
    }

    /// Fetch every matching row, growing one sequence per participating table in lockstep.
    pub async fn all<S: JoinSinks>(&self, mut sinks: S) -> OrmResult<()> {
        let (sql, plan) = self.build()?;
        check_count(sinks.sinks().len(), &plan)?;
        let rows = self
            .selector
            .session
            .query(&sql, self.selector.clauses.filter.args())
            .await?;
        decode_all(&mut sinks.sinks(), &plan, rows)
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

fn check_count(given: usize, plan: &ColumnPlan) -> OrmResult<()> {
    if given != plan.len() {
        return Err(OrmError::shape(format!(
            "join selects from {} tables but {} destinations were given",
            plan.len(),
            given
        )));
    }
    Ok(())
}

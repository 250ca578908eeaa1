//! SELECT statements and the fetch operations that map their results.

use crate::client::{GenericClient, StreamingClient};
use crate::condition::Condition;
use crate::cursor::Cursor;
use crate::error::{OrmError, OrmResult};
use crate::qb::check_scope;
use crate::qb::traits::{Statement, StatementKind};
use crate::render::{ParamType, RenderSettings, Rendered, Renderer};
use crate::result::{Record, ResultSet};
use crate::schema::{Column, Field, Relation, TableRef};
use crate::value::FromValue;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

#[derive(Debug, Clone)]
struct Source {
    table: TableRef,
    fields: Vec<Field>,
    join: Option<(JoinKind, Condition)>,
}

/// An ORDER BY item.
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    field: Field,
    descending: bool,
}

impl SortField {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn is_descending(&self) -> bool {
        self.descending
    }
}

impl<T> Column<T> {
    /// Ascending sort on this column.
    pub fn asc(&self) -> SortField {
        SortField {
            field: self.field().clone(),
            descending: false,
        }
    }

    /// Descending sort on this column.
    pub fn desc(&self) -> SortField {
        SortField {
            field: self.field().clone(),
            descending: true,
        }
    }
}

impl<T> From<&Column<T>> for SortField {
    fn from(column: &Column<T>) -> Self {
        column.asc()
    }
}

/// SELECT statement.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    /// Explicit projection; empty means every column of every source.
    projection: Vec<Field>,
    sources: Vec<Source>,
    where_clause: Option<Condition>,
    order_by: Vec<SortField>,
    limit: Option<u64>,
    offset: Option<u64>,
}

/// A pending join, completed by [`JoinStep::on`].
#[must_use]
#[derive(Debug)]
pub struct JoinStep {
    query: SelectQuery,
    table: TableRef,
    fields: Vec<Field>,
    kind: JoinKind,
}

impl JoinStep {
    /// Complete the join with its ON condition.
    ///
    /// The condition may reference the joined table and every table already in scope. Joining
    /// a table whose name (or alias) is already in scope is malformed.
    pub fn on(self, condition: Condition) -> OrmResult<SelectQuery> {
        let mut query = self.query;
        if query.sources.is_empty() {
            return Err(OrmError::malformed("join requires a from table"));
        }
        if query.where_clause.is_some() {
            return Err(OrmError::malformed("join after where"));
        }
        if let Some(existing) = query.scope().into_iter().find(|t| t.clashes_with(&self.table)) {
            return Err(specified_twice(existing, &self.table));
        }
        {
            let mut scope = query.scope();
            scope.push(&self.table);
            check_scope(condition.fields(), &scope)?;
        }
        query.sources.push(Source {
            table: self.table,
            fields: self.fields,
            join: Some((self.kind, condition)),
        });
        Ok(query)
    }
}

impl SelectQuery {
    pub(crate) fn new(projection: Vec<Field>) -> Self {
        Self {
            projection,
            sources: Vec::new(),
            where_clause: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Add a FROM table. Calling it again adds another table to the FROM list; a repeated
    /// name is reported by the next call that checks the projection.
    pub fn from<R: Relation>(mut self, table: &R) -> Self {
        self.sources.push(Source {
            table: table.relation().clone(),
            fields: table.columns(),
            join: None,
        });
        self
    }

    fn join_step<R: Relation>(self, table: &R, kind: JoinKind) -> JoinStep {
        JoinStep {
            query: self,
            table: table.relation().clone(),
            fields: table.columns(),
            kind,
        }
    }

    /// Inner join; complete it with [`JoinStep::on`].
    pub fn join<R: Relation>(self, table: &R) -> JoinStep {
        self.join_step(table, JoinKind::Inner)
    }

    /// Left outer join; complete it with [`JoinStep::on`].
    pub fn left_join<R: Relation>(self, table: &R) -> JoinStep {
        self.join_step(table, JoinKind::Left)
    }

    /// Add a WHERE condition, AND-ed with any previous one.
    ///
    /// Closes the join list, so the projection is checked here too.
    pub fn filter(mut self, condition: Condition) -> OrmResult<Self> {
        self.resolve_projection()?;
        check_scope(condition.fields(), &self.scope())?;
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        Ok(self)
    }

    /// Alias for [`SelectQuery::filter`], reading naturally after a first condition.
    pub fn and(self, condition: Condition) -> OrmResult<Self> {
        self.filter(condition)
    }

    /// Add an ORDER BY item.
    pub fn order_by(mut self, sort: impl Into<SortField>) -> OrmResult<Self> {
        let sort = sort.into();
        check_scope([&sort.field], &self.scope())?;
        self.order_by.push(sort);
        Ok(self)
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    fn scope(&self) -> Vec<&TableRef> {
        self.sources.iter().map(|s| &s.table).collect()
    }

    /// `select *`: nothing projected and a plain table whose columns are unknown.
    fn selects_star(&self) -> bool {
        self.projection.is_empty() && self.sources.iter().any(|s| s.table.is_plain())
    }

    /// The columns this query returns, in order. Empty for `select *` over a plain table.
    pub fn resolve_projection(&self) -> OrmResult<Vec<Field>> {
        if self.sources.is_empty() {
            return Err(OrmError::malformed("select without a from table"));
        }
        for (i, source) in self.sources.iter().enumerate() {
            if let Some(earlier) = self.sources[..i]
                .iter()
                .find(|s| s.table.clashes_with(&source.table))
            {
                return Err(specified_twice(&earlier.table, &source.table));
            }
        }
        if self.selects_star() {
            return Ok(Vec::new());
        }
        if self.projection.is_empty() {
            return Ok(self
                .sources
                .iter()
                .flat_map(|s| s.fields.iter().cloned())
                .collect());
        }
        check_scope(&self.projection, &self.scope())?;
        Ok(self.projection.clone())
    }

    fn render_parts(
        &self,
        mode: ParamType,
        settings: &RenderSettings,
    ) -> OrmResult<(Vec<Field>, Rendered)> {
        let projection = self.resolve_projection()?;
        let mut r = Renderer::new(mode, settings);

        r.keyword("select");
        r.push(" ");
        if self.selects_star() {
            r.push("*");
        } else {
            r.list(&projection, ", ", |r, f| f.render_qualified(r));
        }

        r.push(" ");
        r.keyword("from");
        r.push(" ");
        for (i, source) in self.sources.iter().enumerate() {
            match &source.join {
                None => {
                    if i > 0 {
                        r.push(", ");
                    }
                    source.table.render_source(&mut r);
                }
                Some((kind, condition)) => {
                    r.push(" ");
                    if *kind == JoinKind::Left {
                        r.keyword("left");
                        r.push(" ");
                    }
                    r.keyword("join");
                    r.push(" ");
                    source.table.render_source(&mut r);
                    r.push(" ");
                    r.keyword("on");
                    r.push(" ");
                    condition.render(&mut r);
                }
            }
        }

        if let Some(condition) = &self.where_clause {
            r.push(" ");
            r.keyword("where");
            r.push(" ");
            condition.render(&mut r);
        }

        if !self.order_by.is_empty() {
            r.push(" ");
            r.keyword("order by");
            r.push(" ");
            r.list(&self.order_by, ", ", |r, s| {
                s.field.render_qualified(r);
                r.push(" ");
                r.keyword(if s.descending { "desc" } else { "asc" });
            });
        }

        if let Some(limit) = self.limit {
            r.push(" ");
            r.keyword("limit");
            r.push(&format!(" {limit}"));
        }
        if let Some(offset) = self.offset {
            r.push(" ");
            r.keyword("offset");
            r.push(&format!(" {offset}"));
        }

        Ok((projection, r.finish()))
    }

    // ==================== Execution ====================

    /// Render for execution. Rows of a `select *` over a plain table cannot be mapped to
    /// columns, so such a query only renders.
    fn executable_parts(&self, settings: &RenderSettings) -> OrmResult<(Vec<Field>, Rendered)> {
        if self.selects_star() {
            return Err(OrmError::malformed(
                "select * from a plain table cannot be fetched; list its fields",
            ));
        }
        self.render_parts(ParamType::Parameterized, settings)
    }

    /// Execute and return every row.
    pub async fn fetch(&self, conn: &impl GenericClient) -> OrmResult<ResultSet> {
        let (projection, rendered) = self.executable_parts(&conn.render_settings())?;
        let rows = conn.query(&rendered.sql, &rendered.params).await?;
        ResultSet::new(projection, rows)
    }

    /// Execute and return the only row, `None` for no rows, or a cardinality error when the
    /// query returns more than one.
    pub async fn fetch_one(&self, conn: &impl GenericClient) -> OrmResult<Option<Record>> {
        let result = self.fetch(conn).await?;
        match result.len() {
            0 | 1 => Ok(result.into_records().into_iter().next()),
            got => Err(OrmError::too_many_rows(1, got)),
        }
    }

    /// Same contract as [`SelectQuery::fetch_one`].
    pub async fn fetch_optional(&self, conn: &impl GenericClient) -> OrmResult<Option<Record>> {
        self.fetch_one(conn).await
    }

    /// Execute and map every row with `mapper`.
    pub async fn fetch_into<T, F>(&self, conn: &impl GenericClient, mapper: F) -> OrmResult<Vec<T>>
    where
        F: Fn(&Record) -> OrmResult<T>,
    {
        self.fetch(conn).await?.map(mapper)
    }

    /// Execute, then map the single row (if any) with `mapper`.
    pub async fn fetch_one_into<T, F>(
        &self,
        conn: &impl GenericClient,
        mapper: F,
    ) -> OrmResult<Option<T>>
    where
        F: FnOnce(&Record) -> OrmResult<T>,
    {
        self.fetch_one(conn).await?.as_ref().map(mapper).transpose()
    }

    /// Execute and build a key/value map over two projected columns.
    pub async fn fetch_map<K, V>(
        &self,
        conn: &impl GenericClient,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<K, V>>
    where
        K: FromValue + Eq + Hash + fmt::Debug,
        V: FromValue,
    {
        self.fetch(conn).await?.into_map(key, value)
    }

    /// Execute and group the values of one column by another.
    pub async fn fetch_groups<K, V>(
        &self,
        conn: &impl GenericClient,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<K, Vec<V>>>
    where
        K: FromValue + Eq + Hash,
        V: FromValue,
    {
        self.fetch(conn).await?.into_groups(key, value)
    }

    /// [`SelectQuery::fetch_groups`] over nullable columns.
    pub async fn fetch_groups_opt<K, V>(
        &self,
        conn: &impl GenericClient,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<Option<K>, Vec<Option<V>>>>
    where
        K: FromValue + Eq + Hash,
        V: FromValue,
    {
        self.fetch(conn).await?.into_groups_opt(key, value)
    }

    /// Execute and return a cursor that pulls rows on demand.
    pub async fn fetch_lazy(&self, conn: &impl StreamingClient) -> OrmResult<Cursor> {
        let (projection, rendered) = self.executable_parts(&conn.render_settings())?;
        let stream = conn.query_stream(&rendered.sql, &rendered.params).await?;
        Ok(Cursor::new(Arc::from(projection), stream))
    }
}

fn specified_twice(existing: &TableRef, added: &TableRef) -> OrmError {
    OrmError::malformed(format!(
        "table name specified more than once: {added} (already in scope as {existing})"
    ))
}

impl Statement for SelectQuery {
    fn kind(&self) -> StatementKind {
        StatementKind::Select
    }

    fn render_with(&self, mode: ParamType, settings: &RenderSettings) -> OrmResult<Rendered> {
        self.render_parts(mode, settings).map(|(_, rendered)| rendered)
    }
}

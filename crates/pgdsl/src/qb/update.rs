//! UPDATE statements.

use crate::client::GenericClient;
use crate::condition::Condition;
use crate::error::{OrmError, OrmResult};
use crate::qb::check_scope;
use crate::qb::traits::{Mutation, Statement, StatementKind};
use crate::render::{ParamType, RenderSettings, Rendered, Renderer};
use crate::result::ResultSet;
use crate::schema::{Column, Field, IntoFields, Table, TableRef};
use crate::value::{ColumnType, Value};

/// UPDATE of one table.
#[derive(Debug, Clone)]
pub struct UpdateQuery {
    table: TableRef,
    assignments: Vec<(Field, Value)>,
    where_clause: Option<Condition>,
    returning: Vec<Field>,
}

impl UpdateQuery {
    pub(crate) fn new<T: Table>(table: &T) -> Self {
        Self {
            table: table.table_ref().clone(),
            assignments: Vec::new(),
            where_clause: None,
            returning: Vec::new(),
        }
    }

    /// Assign `value` to `column`. Assigning the same column twice keeps the last value.
    pub fn set<T: ColumnType>(self, column: &Column<T>, value: impl Into<T>) -> OrmResult<Self> {
        self.set_value(column.field(), value.into().into_value())
    }

    /// Assign NULL to `column`.
    pub fn set_null<T>(self, column: &Column<T>) -> OrmResult<Self> {
        self.set_value(column.field(), Value::Null)
    }

    /// Untyped assignment.
    pub fn set_value(mut self, field: &Field, value: Value) -> OrmResult<Self> {
        check_scope([field], &[&self.table])?;
        match self.assignments.iter_mut().find(|(f, _)| f == field) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((field.clone(), value)),
        }
        Ok(self)
    }

    /// Add a WHERE condition, AND-ed with any previous one.
    pub fn filter(mut self, condition: Condition) -> OrmResult<Self> {
        check_scope(condition.fields(), &[&self.table])?;
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        Ok(self)
    }

    /// Alias for [`UpdateQuery::filter`].
    pub fn and(self, condition: Condition) -> OrmResult<Self> {
        self.filter(condition)
    }

    /// Return `fields` of every updated row.
    pub fn returning(mut self, fields: impl IntoFields) -> OrmResult<Self> {
        let fields = fields.into_fields();
        check_scope(&fields, &[&self.table])?;
        self.returning.extend(fields);
        Ok(self)
    }

    /// Execute and return the `RETURNING` rows.
    pub async fn fetch_returning(&self, conn: &impl GenericClient) -> OrmResult<ResultSet> {
        if self.returning.is_empty() {
            return Err(OrmError::malformed("update has no returning clause"));
        }
        let rendered = self.render_with(ParamType::Parameterized, &conn.render_settings())?;
        let rows = conn.query(&rendered.sql, &rendered.params).await?;
        ResultSet::new(self.returning.clone(), rows)
    }
}

impl Statement for UpdateQuery {
    fn kind(&self) -> StatementKind {
        StatementKind::Update
    }

    fn render_with(&self, mode: ParamType, settings: &RenderSettings) -> OrmResult<Rendered> {
        if self.assignments.is_empty() {
            return Err(OrmError::malformed("update without assignments"));
        }

        let mut r = Renderer::new(mode, settings);
        r.keyword("update");
        r.push(" ");
        self.table.render_source(&mut r);
        r.push(" ");
        r.keyword("set");
        r.push(" ");
        r.list(&self.assignments, ", ", |r, (f, v)| {
            r.ident(f.name());
            r.push(" = ");
            r.bind(v);
        });

        if let Some(condition) = &self.where_clause {
            r.push(" ");
            r.keyword("where");
            r.push(" ");
            condition.render(&mut r);
        }

        if !self.returning.is_empty() {
            r.push(" ");
            r.keyword("returning");
            r.push(" ");
            r.list(&self.returning, ", ", |r, f| f.render_qualified(r));
        }

        Ok(r.finish())
    }
}

impl Mutation for UpdateQuery {}

//! INSERT statements.

use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::qb::check_scope;
use crate::qb::traits::{Mutation, Statement, StatementKind};
use crate::render::{ParamType, RenderSettings, Rendered, Renderer};
use crate::result::{Record, ResultSet};
use crate::schema::{Column, Field, IntoFields, Table, TableRef};
use crate::value::{ColumnType, Value};

/// INSERT of a single row.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    table: TableRef,
    table_fields: Vec<Field>,
    assignments: Vec<(Field, Value)>,
    returning: Vec<Field>,
}

impl InsertQuery {
    pub(crate) fn new<T: Table>(table: &T) -> Self {
        Self {
            table: table.table_ref().clone(),
            table_fields: table.fields(),
            assignments: Vec::new(),
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

    /// Return `fields` of the inserted row.
    pub fn returning(mut self, fields: impl IntoFields) -> OrmResult<Self> {
        let fields = fields.into_fields();
        check_scope(&fields, &[&self.table])?;
        self.returning.extend(fields);
        Ok(self)
    }

    /// Return every column of the inserted row, in schema order.
    pub fn returning_all(mut self) -> Self {
        self.returning = self.table_fields.clone();
        self
    }

    /// Execute and return the `RETURNING` rows.
    pub async fn fetch_returning(&self, conn: &impl GenericClient) -> OrmResult<ResultSet> {
        if self.returning.is_empty() {
            return Err(OrmError::malformed("insert has no returning clause"));
        }
        let rendered = self.render_with(ParamType::Parameterized, &conn.render_settings())?;
        let rows = conn.query(&rendered.sql, &rendered.params).await?;
        ResultSet::new(self.returning.clone(), rows)
    }

    /// Execute and return the inserted row's `RETURNING` record.
    pub async fn fetch_one_returning(&self, conn: &impl GenericClient) -> OrmResult<Record> {
        let result = self.fetch_returning(conn).await?;
        match result.len() {
            1 => result
                .into_records()
                .into_iter()
                .next()
                .ok_or_else(|| OrmError::Other("insert returned no row".to_string())),
            got => Err(OrmError::Cardinality { expected: 1, got }),
        }
    }
}

impl Statement for InsertQuery {
    fn kind(&self) -> StatementKind {
        StatementKind::Insert
    }

    fn render_with(&self, mode: ParamType, settings: &RenderSettings) -> OrmResult<Rendered> {
        let mut r = Renderer::new(mode, settings);
        r.keyword("insert into");
        r.push(" ");
        self.table.render_source(&mut r);
        r.push(" ");

        if self.assignments.is_empty() {
            r.keyword("default values");
        } else {
            r.push("(");
            r.list(&self.assignments, ", ", |r, (f, _)| r.ident(f.name()));
            r.push(") ");
            r.keyword("values");
            r.push(" (");
            r.list(&self.assignments, ", ", |r, (_, v)| r.bind(v));
            r.push(")");
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

impl Mutation for InsertQuery {}

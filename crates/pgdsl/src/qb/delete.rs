//! DELETE statements.

use crate::condition::Condition;
use crate::error::OrmResult;
use crate::qb::check_scope;
use crate::qb::traits::{Mutation, Statement, StatementKind};
use crate::render::{ParamType, RenderSettings, Rendered, Renderer};
use crate::schema::{Table, TableRef};

/// DELETE from one table.
#[derive(Debug, Clone)]
pub struct DeleteQuery {
    table: TableRef,
    where_clause: Option<Condition>,
}

impl DeleteQuery {
    pub(crate) fn new<T: Table>(table: &T) -> Self {
        Self {
            table: table.table_ref().clone(),
            where_clause: None,
        }
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

    /// Alias for [`DeleteQuery::filter`].
    pub fn and(self, condition: Condition) -> OrmResult<Self> {
        self.filter(condition)
    }
}

impl Statement for DeleteQuery {
    fn kind(&self) -> StatementKind {
        StatementKind::Delete
    }

    fn render_with(&self, mode: ParamType, settings: &RenderSettings) -> OrmResult<Rendered> {
        let mut r = Renderer::new(mode, settings);
        r.keyword("delete from");
        r.push(" ");
        self.table.render_source(&mut r);

        if let Some(condition) = &self.where_clause {
            r.push(" ");
            r.keyword("where");
            r.push(" ");
            condition.render(&mut r);
        }

        Ok(r.finish())
    }
}

impl Mutation for DeleteQuery {}

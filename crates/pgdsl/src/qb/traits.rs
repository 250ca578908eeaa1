//! Trait definitions for statements.

use crate::client::GenericClient;
use crate::error::OrmResult;
use crate::render::{ParamType, RenderSettings, Rendered};

/// Kind of a SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Classify raw SQL by its leading keyword.
    pub fn from_sql(sql: &str) -> Self {
        let head = sql
            .trim_start()
            .split(|c: char| c.is_whitespace() || c == '(')
            .next()
            .unwrap_or("");
        if head.eq_ignore_ascii_case("select") || head.eq_ignore_ascii_case("with") {
            StatementKind::Select
        } else if head.eq_ignore_ascii_case("insert") {
            StatementKind::Insert
        } else if head.eq_ignore_ascii_case("update") {
            StatementKind::Update
        } else if head.eq_ignore_ascii_case("delete") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "select",
            StatementKind::Insert => "insert",
            StatementKind::Update => "update",
            StatementKind::Delete => "delete",
            StatementKind::Other => "other",
        }
    }
}

/// An immutable, renderable SQL statement.
///
/// Rendering is pure: the same statement, mode and settings always produce the same output.
pub trait Statement: Sync {
    fn kind(&self) -> StatementKind;

    /// Render with explicit dialect settings.
    fn render_with(&self, mode: ParamType, settings: &RenderSettings) -> OrmResult<Rendered>;

    /// Render with the default PostgreSQL settings.
    fn render(&self, mode: ParamType) -> OrmResult<Rendered> {
        self.render_with(mode, &RenderSettings::default())
    }

    /// Debug helper: parameterized SQL with default settings.
    fn to_sql(&self) -> OrmResult<String> {
        self.render(ParamType::Parameterized).map(|r| r.sql)
    }

    /// Debug helper: SQL with every value inlined.
    fn to_inlined_sql(&self) -> OrmResult<String> {
        self.render(ParamType::Inlined).map(|r| r.sql)
    }
}

/// Statements that modify rows and report an affected-row count.
pub trait Mutation: Statement {
    /// Execute and return the number of affected rows.
    fn execute(
        &self,
        conn: &impl GenericClient,
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send {
        async move {
            let rendered = self.render_with(ParamType::Parameterized, &conn.render_settings())?;
            conn.execute(&rendered.sql, &rendered.params).await
        }
    }
}

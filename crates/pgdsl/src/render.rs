//! SQL rendering: render modes, dialect settings and the shared SQL writer.

use crate::value::Value;
use std::borrow::Cow;

/// How literal values are emitted when rendering a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParamType {
    /// Literals become positional placeholders; values are returned alongside the SQL.
    #[default]
    Parameterized,
    /// Literals are substituted into the SQL text.
    Inlined,
}

/// Placeholder syntax for parameterized rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaceholderStyle {
    /// `$1, $2, ...` (PostgreSQL wire protocol).
    #[default]
    Dollar,
    /// `?` for every parameter.
    Question,
}

/// Case used for SQL keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeywordCase {
    #[default]
    Lower,
    Upper,
}

impl KeywordCase {
    pub(crate) fn apply(self, keyword: &'static str) -> Cow<'static, str> {
        match self {
            KeywordCase::Lower => Cow::Borrowed(keyword),
            KeywordCase::Upper => Cow::Owned(keyword.to_ascii_uppercase()),
        }
    }
}

/// Dialect settings used when rendering.
///
/// The default targets PostgreSQL: `$n` placeholders and lower-case keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSettings {
    pub placeholder: PlaceholderStyle,
    pub keyword_case: KeywordCase,
}

impl RenderSettings {
    /// Create settings with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings accepted by `tokio-postgres`.
    pub fn postgres() -> Self {
        Self::default()
    }

    /// Set the placeholder style.
    pub fn with_placeholder(mut self, placeholder: PlaceholderStyle) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set the keyword case.
    pub fn with_keyword_case(mut self, keyword_case: KeywordCase) -> Self {
        self.keyword_case = keyword_case;
        self
    }
}

/// A rendered statement: SQL text plus bound values in placeholder order.
///
/// `params` is always empty for [`ParamType::Inlined`].
#[derive(Debug, Clone, PartialEq)]
pub struct Rendered {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Rendered {
    /// Parameters as references compatible with tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn tokio_postgres::types::ToSql + Sync)> {
        self.params
            .iter()
            .map(|v| v as &(dyn tokio_postgres::types::ToSql + Sync))
            .collect()
    }
}

/// Incremental SQL writer shared by all statement kinds.
pub(crate) struct Renderer<'a> {
    sql: String,
    params: Vec<Value>,
    mode: ParamType,
    settings: &'a RenderSettings,
}

impl<'a> Renderer<'a> {
    pub(crate) fn new(mode: ParamType, settings: &'a RenderSettings) -> Self {
        Self {
            sql: String::with_capacity(128),
            params: Vec::new(),
            mode,
            settings,
        }
    }

    pub(crate) fn push(&mut self, s: &str) {
        self.sql.push_str(s);
    }

    pub(crate) fn keyword(&mut self, kw: &'static str) {
        let kw = self.settings.keyword_case.apply(kw);
        self.sql.push_str(&kw);
    }

    /// Double-quoted identifier, `"` escaped as `""`.
    pub(crate) fn ident(&mut self, name: &str) {
        self.sql.push('"');
        for ch in name.chars() {
            if ch == '"' {
                self.sql.push('"');
            }
            self.sql.push(ch);
        }
        self.sql.push('"');
    }

    /// Emit a value as a placeholder or an inline literal depending on the mode.
    pub(crate) fn bind(&mut self, value: &Value) {
        match self.mode {
            ParamType::Inlined => value.write_literal(&mut self.sql, self.settings.keyword_case),
            ParamType::Parameterized => {
                self.params.push(value.clone());
                match self.settings.placeholder {
                    PlaceholderStyle::Dollar => {
                        self.sql.push('$');
                        self.sql.push_str(&self.params.len().to_string());
                    }
                    PlaceholderStyle::Question => self.sql.push('?'),
                }
            }
        }
    }

    /// Write `items` separated by `sep`.
    pub(crate) fn list<T>(&mut self, items: &[T], sep: &str, mut each: impl FnMut(&mut Self, &T)) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(sep);
            }
            each(&mut *self, item);
        }
    }

    pub(crate) fn finish(self) -> Rendered {
        Rendered {
            sql: self.sql,
            params: self.params,
        }
    }
}

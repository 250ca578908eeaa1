//! Error types for pgdsl

use thiserror::Error;

/// Result type alias for pgdsl operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement building, execution and result mapping
#[derive(Debug, Error)]
pub enum OrmError {
    /// A column was used in a statement that does not have its table in scope
    #[error("Reference error: column {column} belongs to {table}, which is not in scope")]
    Reference { column: String, table: String },

    /// Structurally invalid statement
    #[error("Malformed statement: {0}")]
    Malformed(String),

    /// A single-row fetch produced more rows than allowed
    #[error("Cardinality error: expected at most {expected} row(s), got {got}")]
    Cardinality { expected: usize, got: usize },

    /// Map building found the same key in more than one row
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Error raised by the database while executing a statement
    #[error("Execution error: {0}")]
    Execution(#[from] tokio_postgres::Error),

    /// Value decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a reference error for a column whose table is not in scope
    pub fn reference(column: impl Into<String>, table: impl Into<String>) -> Self {
        Self::Reference {
            column: column.into(),
            table: table.into(),
        }
    }

    /// Create a malformed statement error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a cardinality error
    pub fn too_many_rows(expected: usize, got: usize) -> Self {
        Self::Cardinality { expected, got }
    }

    /// Create a duplicate key error
    pub fn duplicate_key(message: impl Into<String>) -> Self {
        Self::DuplicateKey(message.into())
    }

    /// Check if this is a reference error
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    /// Check if this is a malformed statement error
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }

    /// Check if this is a cardinality error
    pub fn is_cardinality(&self) -> bool {
        matches!(self, Self::Cardinality { .. })
    }

    /// Check if this is a duplicate key error
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, Self::DuplicateKey(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// SQLSTATE of the underlying database error, if this is one.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Execution(err) => err.as_db_error().map(|db| db.code().code()),
            _ => None,
        }
    }

    /// Check if the database rejected the statement with a unique violation
    pub fn is_unique_violation(&self) -> bool {
        self.sql_state() == Some("23505")
    }

    /// Check if the database rejected the statement with a foreign key violation
    pub fn is_foreign_key_violation(&self) -> bool {
        self.sql_state() == Some("23503")
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for OrmError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

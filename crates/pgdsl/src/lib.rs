//! # pgdsl
//!
//! A typesafe PostgreSQL query DSL with result mapping.
//!
//! - **Typed schema**: tables and columns are declared once with [`table!`]; conditions compare
//!   columns with values of the column's Rust type
//! - **Scope checked**: a column whose table is not in FROM/JOIN is rejected when it is used
//! - **Plain SQL** names via [`table()`] and [`field()`] when no binding exists
//! - **Parameterized or inlined** rendering, with `$n` or `?` placeholders
//! - **Result mapping**: single records, optional records, lists, maps, groups, table records
//!   and lazy cursors
//! - **Transaction-friendly**: pass a transaction anywhere a [`GenericClient`] is expected
//!
//! ```ignore
//! use pgdsl::prelude::*;
//!
//! let result = select((&PERSON.first_name, &EVENT.name))
//!     .from(&PERSON)
//!     .join(&PERSON_EVENT_LOG)
//!     .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))?
//!     .join(&EVENT)
//!     .on(EVENT.id.eq_col(&PERSON_EVENT_LOG.event_id))?
//!     .filter(EVENT.name.eq("jProfessionals"))?
//!     .fetch(&client)
//!     .await?;
//!
//! let by_event = result.into_groups(&EVENT.name, &PERSON.first_name)?;
//! ```

pub mod client;
pub mod condition;
pub mod cursor;
pub mod error;
pub mod monitor;
pub mod prelude;
pub mod qb;
pub mod record;
pub mod render;
pub mod result;
pub mod row;
pub mod schema;
pub mod value;

#[cfg(test)]
mod test_support;

pub use client::{GenericClient, RowStream, StreamingClient};
pub use condition::{CompareOp, Condition, Operand};
pub use cursor::Cursor;
pub use error::{OrmError, OrmResult};
pub use monitor::{InstrumentedClient, MonitorConfig};
pub use qb::{
    DeleteQuery, InsertQuery, JoinKind, JoinStep, Mutation, SelectQuery, SortField, Statement,
    StatementKind, UpdateQuery, delete_from, field, insert_into, select, select_all, select_from,
    table, update,
};
pub use record::{RecordState, TableRecord};
pub use render::{KeywordCase, ParamType, PlaceholderStyle, RenderSettings, Rendered};
pub use result::{Record, ResultSet};
pub use schema::{
    Column, Field, IntoField, IntoFields, PlainTable, Relation, SqlType, Table, TableRef,
};
pub use value::{ColumnType, FromValue, IntoValue, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{
    DEFAULT_POOL_SIZE, create_pool, create_pool_with_config, create_pool_with_manager_config,
};

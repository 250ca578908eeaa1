//! Convenient imports for typical `pgdsl` usage.
//!
//! ```ignore
//! use pgdsl::prelude::*;
//! ```

pub use crate::{
    Column, Condition, Cursor, GenericClient, Mutation, OrmError, OrmResult, ParamType, Record,
    ResultSet, Statement, StreamingClient, Table, TableRecord, Value, delete_from, field,
    insert_into, select, select_all, select_from, table, update,
};

#[cfg(feature = "pool")]
pub use crate::{create_pool, create_pool_with_config};

//! Typed statement builders.
//!
//! Every builder takes columns generated by [`table!`](crate::table) and checks, at the call
//! that introduces a column, that its table is in scope. Statements render to SQL through
//! [`Statement::render`] and execute against any [`GenericClient`](crate::GenericClient).
//!
//! # Usage
//!
//! ```ignore
//! use pgdsl::prelude::*;
//!
//! let names = select((&PERSON.first_name, &EVENT.name))
//!     .from(&PERSON)
//!     .join(&PERSON_EVENT_LOG)
//!     .on(PERSON.id.eq_col(&PERSON_EVENT_LOG.person_id))?
//!     .join(&EVENT)
//!     .on(EVENT.id.eq_col(&PERSON_EVENT_LOG.event_id))?
//!     .filter(EVENT.name.eq("jProfessionals"))?
//!     .fetch(&client)
//!     .await?;
//!
//! insert_into(&PERSON)
//!     .set(&PERSON.first_name, "Ada")?
//!     .execute(&client)
//!     .await?;
//!
//! update(&PERSON)
//!     .set(&PERSON.last_name, "Lovelace")?
//!     .filter(PERSON.first_name.eq("Ada"))?
//!     .execute(&client)
//!     .await?;
//!
//! delete_from(&PERSON).execute(&client).await?;
//! ```
//!
//! Plain-SQL names are available too, rendered as written:
//!
//! ```ignore
//! let sql = select((field("PERSON.first_name")?, field("PERSON_EVENT.description")?))
//!     .from(&table("PERSON"))
//!     .join(&table("PERSON_EVENT"))
//!     .on(field("PERSON.ID")?.equal(field("PERSON_EVENT.person_id")?))?
//!     .to_sql()?;
//! ```

mod delete;
mod insert;
mod select;
mod traits;
mod update;

#[cfg(test)]
mod tests;

pub use delete::DeleteQuery;
pub use insert::InsertQuery;
pub use select::{JoinKind, JoinStep, SelectQuery, SortField};
pub use traits::{Mutation, Statement, StatementKind};
pub use update::UpdateQuery;

use crate::error::{OrmError, OrmResult};
use crate::schema::{Field, IntoFields, PlainTable, Relation, Table, TableRef};
use std::borrow::Cow;

/// Start a SELECT over `fields`. An empty projection selects every column of every table in
/// FROM/JOIN order.
pub fn select(fields: impl IntoFields) -> SelectQuery {
    SelectQuery::new(fields.into_fields())
}

/// Start a SELECT of every column of the tables added afterwards.
pub fn select_all() -> SelectQuery {
    SelectQuery::new(Vec::new())
}

/// `select * from table`, with the columns spelled out in schema order.
pub fn select_from<R: Relation>(table: &R) -> SelectQuery {
    select_all().from(table)
}

/// Start an INSERT into `table`.
pub fn insert_into<T: Table>(table: &T) -> InsertQuery {
    InsertQuery::new(table)
}

/// Start an UPDATE of `table`.
pub fn update<T: Table>(table: &T) -> UpdateQuery {
    UpdateQuery::new(table)
}

/// Start a DELETE from `table`. Without a filter every row is deleted.
pub fn delete_from<T: Table>(table: &T) -> DeleteQuery {
    DeleteQuery::new(table)
}

/// A table named in plain SQL, e.g. `table("PERSON")`.
///
/// The name is rendered as written; never build it from user input.
pub fn table(name: impl Into<Cow<'static, str>>) -> PlainTable {
    PlainTable::new(name)
}

/// A plain-SQL column written as `table.column`; the part before the last dot names the
/// table it must be in scope with.
pub fn field(qualified: &str) -> OrmResult<Field> {
    match qualified.rsplit_once('.') {
        Some((table_name, column)) if !table_name.is_empty() && !column.is_empty() => Ok(
            table(table_name.to_string()).field(column.to_string()),
        ),
        _ => Err(OrmError::malformed(format!(
            "plain field {qualified:?} must be written as table.column"
        ))),
    }
}

/// Fail with a reference error for the first field whose table is not in `scope`.
pub(crate) fn check_scope<'a>(
    fields: impl IntoIterator<Item = &'a Field>,
    scope: &[&TableRef],
) -> OrmResult<()> {
    for field in fields {
        if !scope.contains(&field.table()) {
            return Err(OrmError::reference(
                field.to_string(),
                field.table().to_string(),
            ));
        }
    }
    Ok(())
}

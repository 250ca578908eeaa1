//! Table-typed records and their persistence operations.
//!
//! A [`TableRecord<T>`] holds one value per column of `T`, a changed flag per column, and a
//! lifecycle state. New records are inserted by [`store`]; fetched records are updated by
//! primary key through [`store`] or [`update`] and removed with [`delete`]. Only changed
//! columns are written.

use crate::client::GenericClient;
use crate::condition::{CompareOp, Condition, Operand};
use crate::error::{OrmError, OrmResult};
use crate::qb::{self, Mutation};
use crate::schema::{Column, Field, Table};
use crate::value::{ColumnType, FromValue, Value};
use std::fmt;

/// Lifecycle state of a [`TableRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Not yet in the database; [`store`] inserts it.
    New,
    /// Loaded from (or written to) the database; [`store`] updates it.
    Fetched,
}

/// A record typed to one table.
#[derive(Debug, Clone)]
pub struct TableRecord<T: Table> {
    table: T,
    fields: Vec<Field>,
    values: Vec<Value>,
    changed: Vec<bool>,
    state: RecordState,
    /// Primary key as last read from or written to the database.
    key: Option<Value>,
}

impl<T: Table> TableRecord<T> {
    /// A fresh record: every value `Null`, nothing changed.
    pub fn new(table: &T) -> Self {
        let fields = table.fields();
        let n = fields.len();
        Self {
            table: table.clone(),
            fields,
            values: vec![Value::Null; n],
            changed: vec![false; n],
            state: RecordState::New,
            key: None,
        }
    }

    pub(crate) fn fetched(table: T, values: Vec<Value>) -> Self {
        let fields = table.fields();
        let n = fields.len();
        let mut record = Self {
            table,
            fields,
            values,
            changed: vec![false; n],
            state: RecordState::Fetched,
            key: None,
        };
        record.key = record.current_key();
        record
    }

    pub fn table(&self) -> &T {
        &self.table
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_new(&self) -> bool {
        self.state == RecordState::New
    }

    fn index_of(&self, field: &Field) -> OrmResult<usize> {
        if !field.table().same_relation(self.table.table_ref()) {
            return Err(OrmError::reference(
                field.to_string(),
                field.table().to_string(),
            ));
        }
        self.fields
            .iter()
            .position(|f| f.name() == field.name())
            .ok_or_else(|| OrmError::reference(field.to_string(), field.table().to_string()))
    }

    fn current_key(&self) -> Option<Value> {
        let pk = self.table.primary_key();
        self.fields
            .iter()
            .position(|f| f.name() == pk.name())
            .map(|idx| self.values[idx].clone())
            .filter(|v| !v.is_null())
    }

    /// Typed value of `column`.
    pub fn get<V: FromValue>(&self, column: &Column<V>) -> OrmResult<V> {
        let idx = self.index_of(column.field())?;
        V::from_value(&self.values[idx]).map_err(|msg| OrmError::decode(column.name(), msg))
    }

    /// Typed value of a nullable `column`.
    pub fn get_opt<V: FromValue>(&self, column: &Column<V>) -> OrmResult<Option<V>> {
        let idx = self.index_of(column.field())?;
        Option::<V>::from_value(&self.values[idx])
            .map_err(|msg| OrmError::decode(column.name(), msg))
    }

    /// Raw value of `field`.
    pub fn get_value(&self, field: &Field) -> OrmResult<&Value> {
        let idx = self.index_of(field)?;
        Ok(&self.values[idx])
    }

    /// Set `column` and mark it changed.
    pub fn set<V: ColumnType>(&mut self, column: &Column<V>, value: impl Into<V>) -> OrmResult<()> {
        self.set_value(column.field(), value.into().into_value())
    }

    /// Set `column` to NULL and mark it changed.
    pub fn set_null<V>(&mut self, column: &Column<V>) -> OrmResult<()> {
        self.set_value(column.field(), Value::Null)
    }

    /// Untyped setter.
    pub fn set_value(&mut self, field: &Field, value: Value) -> OrmResult<()> {
        let idx = self.index_of(field)?;
        self.values[idx] = value;
        self.changed[idx] = true;
        Ok(())
    }

    /// Whether `column` was set since the record was created, fetched or stored.
    pub fn changed<V>(&self, column: &Column<V>) -> bool {
        self.index_of(column.field())
            .map(|idx| self.changed[idx])
            .unwrap_or(false)
    }

    /// Whether any column was set since the record was created, fetched or stored.
    pub fn is_changed(&self) -> bool {
        self.changed.iter().any(|c| *c)
    }

    fn changed_values(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.fields
            .iter()
            .zip(&self.values)
            .zip(&self.changed)
            .filter(|(_, changed)| **changed)
            .map(|(pair, _)| pair)
    }

    fn reset_changed(&mut self) {
        self.changed.iter_mut().for_each(|c| *c = false);
    }

    fn key_condition(&self, key: Value) -> Condition {
        Condition::compare(
            Operand::Field(self.table.primary_key().clone()),
            CompareOp::Eq,
            Operand::Value(key),
        )
    }
}

impl<T: Table> PartialEq for TableRecord<T> {
    fn eq(&self, other: &Self) -> bool {
        self.table.table_ref() == other.table.table_ref() && self.values == other.values
    }
}

impl<T: Table> fmt::Display for TableRecord<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {{", self.table.table_ref())?;
        for (i, (field, value)) in self.fields.iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {}: {value}", field.name())?;
        }
        f.write_str(" }")
    }
}

/// Persist `record`: INSERT when new, otherwise [`update`].
///
/// An insert writes the changed columns and reads every column back, so generated keys and
/// defaults are visible on the record afterwards.
pub async fn store<T: Table>(
    record: &mut TableRecord<T>,
    conn: &impl GenericClient,
) -> OrmResult<u64> {
    if !record.is_new() {
        return update(record, conn).await;
    }

    let mut insert = qb::insert_into(&record.table);
    for (field, value) in record.changed_values() {
        insert = insert.set_value(field, value.clone())?;
    }
    let returned = insert.returning_all().fetch_one_returning(conn).await?;

    record.values = returned.into_values();
    record.reset_changed();
    record.state = RecordState::Fetched;
    record.key = record.current_key();
    Ok(1)
}

/// UPDATE the changed columns of a fetched record, keyed by its primary key.
///
/// Returns 0 without touching the database when nothing changed.
pub async fn update<T: Table>(
    record: &mut TableRecord<T>,
    conn: &impl GenericClient,
) -> OrmResult<u64> {
    if !record.is_changed() {
        return Ok(0);
    }
    let key = record
        .key
        .clone()
        .ok_or_else(|| OrmError::malformed("record has no primary key value"))?;

    let mut stmt = qb::update(&record.table);
    for (field, value) in record.changed_values() {
        stmt = stmt.set_value(field, value.clone())?;
    }
    let stmt = stmt.filter(record.key_condition(key))?;
    let affected = stmt.execute(conn).await?;

    record.reset_changed();
    record.key = record.current_key();
    Ok(affected)
}

/// DELETE the row of `record`, keyed by its primary key.
///
/// Afterwards the record is New again with every non-null column marked changed, so a later
/// [`store`] re-inserts it.
pub async fn delete<T: Table>(
    record: &mut TableRecord<T>,
    conn: &impl GenericClient,
) -> OrmResult<u64> {
    let key = record
        .key
        .clone()
        .or_else(|| record.current_key())
        .ok_or_else(|| OrmError::malformed("record has no primary key value"))?;

    let stmt = qb::delete_from(&record.table).filter(record.key_condition(key))?;
    let affected = stmt.execute(conn).await?;

    record.state = RecordState::New;
    record.key = None;
    for (changed, value) in record.changed.iter_mut().zip(&record.values) {
        *changed = !value.is_null();
    }
    Ok(affected)
}

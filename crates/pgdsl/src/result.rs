//! Fetched results: records, result sets, and the pure mapping operations over them.

use crate::error::{OrmError, OrmResult};
use crate::record::TableRecord;
use crate::schema::{Column, Field, Table, TableRef};
use crate::value::{FromValue, Value};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// One row of a result, exposing exactly the columns of the projection that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    fields: Arc<[Field]>,
    values: Vec<Value>,
}

impl Record {
    /// Build a record; `values` must have one entry per projected field.
    pub fn new(fields: Arc<[Field]>, values: Vec<Value>) -> OrmResult<Self> {
        if fields.len() != values.len() {
            return Err(OrmError::Other(format!(
                "row has {} column(s) but the projection has {}",
                values.len(),
                fields.len()
            )));
        }
        Ok(Self { fields, values })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Position of `field` in the projection.
    ///
    /// An exact match (same table reference and alias) wins. Otherwise the column matches a
    /// projected column of the same name on the same relation, as long as only one alias of
    /// that relation was projected.
    pub fn index_of(&self, field: &Field) -> Option<usize> {
        if let Some(idx) = self.fields.iter().position(|f| f == field) {
            return Some(idx);
        }
        let source = self.source_of(field.table()).ok()?;
        let rebound = field.rebind(&source);
        self.fields.iter().position(|f| *f == rebound)
    }

    /// The one reference to `table`'s relation in this projection.
    fn source_of(&self, table: &TableRef) -> OrmResult<TableRef> {
        if self.fields.iter().any(|f| f.table() == table) {
            return Ok(table.clone());
        }
        let mut sources: Vec<&TableRef> = Vec::new();
        for f in self.fields.iter() {
            if f.table().same_relation(table) && !sources.contains(&f.table()) {
                sources.push(f.table());
            }
        }
        match sources.as_slice() {
            [only] => Ok((*only).clone()),
            [] => Err(OrmError::reference(
                format!("{table}.*"),
                format!("{table} (not projected)"),
            )),
            many => {
                let aliases: Vec<String> = many.iter().map(|t| t.to_string()).collect();
                Err(OrmError::reference(
                    format!("{table}.*"),
                    format!("{table} (ambiguous: {})", aliases.join(", ")),
                ))
            }
        }
    }

    /// Raw value of `field`, if it is part of the projection.
    pub fn get_value(&self, field: &Field) -> Option<&Value> {
        self.index_of(field).map(|idx| &self.values[idx])
    }

    fn require(&self, field: &Field) -> OrmResult<&Value> {
        self.get_value(field)
            .ok_or_else(|| OrmError::decode(field.to_string(), "column is not part of the record"))
    }

    /// Typed value of a column. `Null` in a non-`Option` target is a decode error.
    pub fn get<T: FromValue>(&self, column: &Column<T>) -> OrmResult<T> {
        let value = self.require(column.field())?;
        T::from_value(value).map_err(|msg| OrmError::decode(column.field().to_string(), msg))
    }

    /// Typed value of a nullable column.
    pub fn get_opt<T: FromValue>(&self, column: &Column<T>) -> OrmResult<Option<T>> {
        let value = self.require(column.field())?;
        Option::<T>::from_value(value)
            .map_err(|msg| OrmError::decode(column.field().to_string(), msg))
    }

    /// Typed value at position `idx`; the usual accessor for single-column projections.
    pub fn value<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let value = self.values.get(idx).ok_or_else(|| {
            OrmError::decode(format!("#{idx}"), format!("record has {} column(s)", self.len()))
        })?;
        let name = self.fields[idx].to_string();
        T::from_value(value).map_err(|msg| OrmError::decode(name, msg))
    }

    /// Copy this record's values for `table`'s columns into a table record.
    ///
    /// The relation must appear in the projection under exactly one reference: `table` itself,
    /// or a single alias of it. Columns of `table` missing from the projection are `Null`.
    #[allow(clippy::wrong_self_convention)]
    pub fn into_table<T: Table>(&self, table: &T) -> OrmResult<TableRecord<T>> {
        let source = self.source_of(table.table_ref())?;
        let values = table
            .fields()
            .iter()
            .map(|f| {
                let rebound = f.rebind(&source);
                self.fields
                    .iter()
                    .position(|p| *p == rebound)
                    .map_or(Value::Null, |idx| self.values[idx].clone())
            })
            .collect();
        Ok(TableRecord::fetched(table.clone(), values))
    }

    /// JSON object keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.len());
        for (field, value) in self.fields.iter().zip(&self.values) {
            let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            map.insert(field.name().to_string(), json);
        }
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

/// An ordered, fully materialized query result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    fields: Arc<[Field]>,
    records: Vec<Record>,
}

impl ResultSet {
    /// Build a result set over `fields` from raw rows.
    pub fn new(fields: Vec<Field>, rows: Vec<Vec<Value>>) -> OrmResult<Self> {
        let fields: Arc<[Field]> = fields.into();
        let records = rows
            .into_iter()
            .map(|values| Record::new(Arc::clone(&fields), values))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(Self { fields, records })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn first(&self) -> Option<&Record> {
        self.records.first()
    }

    fn check_projected(&self, field: &Field) -> OrmResult<()> {
        if self.fields.iter().any(|f| f == field) {
            Ok(())
        } else {
            Err(OrmError::reference(
                field.to_string(),
                "the result projection".to_string(),
            ))
        }
    }

    /// Map every record with a caller-supplied function, preserving order.
    pub fn map<T, F>(&self, mapper: F) -> OrmResult<Vec<T>>
    where
        F: Fn(&Record) -> OrmResult<T>,
    {
        self.records.iter().map(mapper).collect()
    }

    /// Values of one column, in row order. A `Null` is a decode error; use
    /// [`ResultSet::values_of_opt`] for nullable columns.
    pub fn values_of<T: FromValue>(&self, column: &Column<T>) -> OrmResult<Vec<T>> {
        self.check_projected(column.field())?;
        self.records.iter().map(|r| r.get(column)).collect()
    }

    /// Values of a nullable column, in row order.
    pub fn values_of_opt<T: FromValue>(&self, column: &Column<T>) -> OrmResult<Vec<Option<T>>> {
        self.check_projected(column.field())?;
        self.records.iter().map(|r| r.get_opt(column)).collect()
    }

    fn map_with<K, V>(
        &self,
        key: &Field,
        value: &Field,
        decode_key: impl Fn(&Record) -> OrmResult<K>,
        decode_value: impl Fn(&Record) -> OrmResult<V>,
    ) -> OrmResult<HashMap<K, V>>
    where
        K: Eq + Hash + fmt::Debug,
    {
        self.check_projected(key)?;
        self.check_projected(value)?;
        let mut map = HashMap::with_capacity(self.len());
        for record in &self.records {
            let k = decode_key(record)?;
            if map.contains_key(&k) {
                return Err(OrmError::duplicate_key(format!(
                    "{k:?} appears more than once in column {key}"
                )));
            }
            let v = decode_value(record)?;
            map.insert(k, v);
        }
        Ok(map)
    }

    fn group_with<K, V>(
        &self,
        key: &Field,
        value: &Field,
        decode: impl Fn(&Record) -> OrmResult<(K, V)>,
    ) -> OrmResult<HashMap<K, Vec<V>>>
    where
        K: Eq + Hash,
    {
        self.check_projected(key)?;
        self.check_projected(value)?;
        let mut groups: HashMap<K, Vec<V>> = HashMap::new();
        for record in &self.records {
            let (k, v) = decode(record)?;
            groups.entry(k).or_default().push(v);
        }
        Ok(groups)
    }

    /// Key/value map over two projected columns. A key seen twice is a
    /// [`OrmError::DuplicateKey`].
    #[allow(clippy::wrong_self_convention)]
    pub fn into_map<K, V>(&self, key: &Column<K>, value: &Column<V>) -> OrmResult<HashMap<K, V>>
    where
        K: FromValue + Eq + Hash + fmt::Debug,
        V: FromValue,
    {
        self.map_with(key.field(), value.field(), |r| r.get(key), |r| r.get(value))
    }

    /// [`ResultSet::into_map`] over nullable columns. `None` is a key like any other, so two
    /// rows with a `Null` key are a duplicate.
    #[allow(clippy::wrong_self_convention)]
    pub fn into_map_opt<K, V>(
        &self,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<Option<K>, Option<V>>>
    where
        K: FromValue + Eq + Hash + fmt::Debug,
        V: FromValue,
    {
        self.map_with(
            key.field(),
            value.field(),
            |r| r.get_opt(key),
            |r| r.get_opt(value),
        )
    }

    /// Group values of `value` by `key`. Values keep row order; duplicates are kept.
    #[allow(clippy::wrong_self_convention)]
    pub fn into_groups<K, V>(
        &self,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<K, Vec<V>>>
    where
        K: FromValue + Eq + Hash,
        V: FromValue,
    {
        self.group_with(key.field(), value.field(), |r| Ok((r.get(key)?, r.get(value)?)))
    }

    /// [`ResultSet::into_groups`] over nullable columns: rows with a `Null` key share the
    /// `None` group and `Null` values are kept as `None`.
    #[allow(clippy::wrong_self_convention)]
    pub fn into_groups_opt<K, V>(
        &self,
        key: &Column<K>,
        value: &Column<V>,
    ) -> OrmResult<HashMap<Option<K>, Vec<Option<V>>>>
    where
        K: FromValue + Eq + Hash,
        V: FromValue,
    {
        self.group_with(key.field(), value.field(), |r| {
            Ok((r.get_opt(key)?, r.get_opt(value)?))
        })
    }

    /// Every record converted to `table`'s columns.
    #[allow(clippy::wrong_self_convention)]
    pub fn into_tables<T: Table>(&self, table: &T) -> OrmResult<Vec<TableRecord<T>>> {
        self.records.iter().map(|r| r.into_table(table)).collect()
    }

    /// JSON array of objects keyed by column name.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.records.iter().map(Record::to_json).collect())
    }
}

impl IntoIterator for ResultSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

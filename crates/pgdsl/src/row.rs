//! Decoding PostgreSQL rows into [`Value`]s.

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSqlOwned, Type};
use uuid::Uuid;

fn get<T, F>(row: &Row, idx: usize, wrap: F) -> OrmResult<Value>
where
    T: FromSqlOwned,
    F: FnOnce(T) -> Value,
{
    let v: Option<T> = row
        .try_get(idx)
        .map_err(|e| OrmError::decode(row.columns()[idx].name(), e.to_string()))?;
    Ok(v.map_or(Value::Null, wrap))
}

/// Decode column `idx` of `row` according to its PostgreSQL type.
pub fn decode_column(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    match *ty {
        Type::BOOL => get::<bool, _>(row, idx, Value::Bool),
        Type::INT2 => get::<i16, _>(row, idx, |v| Value::Int(v.into())),
        Type::INT4 => get::<i32, _>(row, idx, |v| Value::Int(v.into())),
        Type::INT8 => get::<i64, _>(row, idx, Value::Int),
        Type::OID => get::<u32, _>(row, idx, |v| Value::Int(v.into())),
        Type::FLOAT4 => get::<f32, _>(row, idx, |v| Value::Float(v.into())),
        Type::FLOAT8 => get::<f64, _>(row, idx, Value::Float),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
            get::<String, _>(row, idx, Value::Text)
        }
        Type::TIMESTAMP => get::<NaiveDateTime, _>(row, idx, Value::Timestamp),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>, _>(row, idx, Value::TimestampTz),
        Type::DATE => get::<NaiveDate, _>(row, idx, Value::Date),
        Type::UUID => get::<Uuid, _>(row, idx, Value::Uuid),
        Type::JSON | Type::JSONB => get::<serde_json::Value, _>(row, idx, Value::Json),
        Type::BYTEA => get::<Vec<u8>, _>(row, idx, Value::Bytes),
        _ => Err(OrmError::decode(
            column.name(),
            format!("unsupported column type {ty}"),
        )),
    }
}

/// Decode every column of `row`, in column order.
pub fn decode_row(row: &Row) -> OrmResult<Vec<Value>> {
    (0..row.len()).map(|idx| decode_column(row, idx)).collect()
}

//! Dynamically typed SQL values.
//!
//! [`Value`] is what flows across the execution boundary in both directions: bound parameters
//! going out, decoded column values coming back. [`IntoValue`] and [`FromValue`] convert between
//! Rust types and values; [`ColumnType`] ties a Rust type to its declared SQL type.

use crate::render::KeywordCase;
use crate::schema::SqlType;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    /// Any integer width; narrowed to the column type when bound.
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Uuid(Uuid),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is NULL
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the variant, used in decode errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::TimestampTz(_) => "timestamptz",
            Self::Date(_) => "date",
            Self::Uuid(_) => "uuid",
            Self::Json(_) => "json",
            Self::Bytes(_) => "bytea",
        }
    }

    /// Write this value as an inline SQL literal.
    pub(crate) fn write_literal(&self, out: &mut String, case: KeywordCase) {
        match self {
            Self::Null => out.push_str(&case.apply("null")),
            Self::Bool(true) => out.push_str(&case.apply("true")),
            Self::Bool(false) => out.push_str(&case.apply("false")),
            Self::Int(v) => out.push_str(&v.to_string()),
            Self::Float(v) if v.is_finite() => out.push_str(&format!("{v:?}")),
            Self::Float(v) => {
                let text = if v.is_nan() {
                    "NaN"
                } else if *v > 0.0 {
                    "Infinity"
                } else {
                    "-Infinity"
                };
                write_cast(out, text, "double precision", case);
            }
            Self::Text(s) => write_quoted_literal(out, s),
            Self::Timestamp(ts) => {
                out.push_str(&case.apply("timestamp"));
                out.push(' ');
                write_quoted_literal(out, &ts.format("%Y-%m-%d %H:%M:%S%.f").to_string());
            }
            Self::TimestampTz(ts) => {
                out.push_str(&case.apply("timestamp with time zone"));
                out.push(' ');
                write_quoted_literal(out, &ts.to_rfc3339());
            }
            Self::Date(d) => {
                out.push_str(&case.apply("date"));
                out.push(' ');
                write_quoted_literal(out, &d.format("%Y-%m-%d").to_string());
            }
            Self::Uuid(u) => write_cast(out, &u.to_string(), "uuid", case),
            Self::Json(j) => write_cast(out, &j.to_string(), "jsonb", case),
            Self::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02x}")).collect();
                out.push_str(&case.apply("decode"));
                out.push('(');
                write_quoted_literal(out, &hex);
                out.push_str(", 'hex')");
            }
        }
    }

    /// Render this value as an inline SQL literal with lower-case keywords.
    pub fn to_literal(&self) -> String {
        let mut out = String::new();
        self.write_literal(&mut out, KeywordCase::Lower);
        out
    }
}

fn write_quoted_literal(out: &mut String, s: &str) {
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
}

fn write_cast(out: &mut String, text: &str, ty: &str, case: KeywordCase) {
    out.push_str(&case.apply("cast"));
    out.push('(');
    write_quoted_literal(out, text);
    out.push(' ');
    out.push_str(&case.apply("as"));
    out.push(' ');
    out.push_str(ty);
    out.push(')');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_literal())
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql_checked(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql_checked(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => v.to_sql_checked(ty, out),
            Value::TimestampTz(v) => v.to_sql_checked(ty, out),
            Value::Date(v) => v.to_sql_checked(ty, out),
            Value::Uuid(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        matches!(
            *ty,
            Type::BOOL
                | Type::INT2
                | Type::INT4
                | Type::INT8
                | Type::FLOAT4
                | Type::FLOAT8
                | Type::TEXT
                | Type::VARCHAR
                | Type::BPCHAR
                | Type::NAME
                | Type::UNKNOWN
                | Type::TIMESTAMP
                | Type::TIMESTAMPTZ
                | Type::DATE
                | Type::UUID
                | Type::JSON
                | Type::JSONB
                | Type::BYTEA
        )
    }

    to_sql_checked!();
}

/// Conversion of a Rust value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a [`Value`] into a Rust value.
///
/// The error is a human-readable message; callers attach the column name.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self, String>;
}

/// A Rust type that can be the value type of a [`Column`](crate::Column).
pub trait ColumnType: IntoValue + FromValue + Send + Sync + 'static {
    /// Declared SQL type of columns holding this type.
    const SQL_TYPE: SqlType;
}

fn mismatch<T>(expected: &str, value: &Value) -> Result<T, String> {
    Err(format!("expected {expected}, got {}", value.type_name()))
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoValue::into_value)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        value.into_value()
    }
}

impl IntoValue for &String {
    fn into_value(self) -> Value {
        Value::Text(self.clone())
    }
}

macro_rules! int_value {
    ($($ty:ty => $sql:expr),* $(,)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, String> {
                    match value {
                        Value::Int(v) => <$ty>::try_from(*v)
                            .map_err(|_| format!("{v} is out of range for {}", stringify!($ty))),
                        other => mismatch(stringify!($ty), other),
                    }
                }
            }

            impl ColumnType for $ty {
                const SQL_TYPE: SqlType = $sql;
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

int_value!(i16 => SqlType::SmallInt, i32 => SqlType::Integer, i64 => SqlType::BigInt);

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v as f32),
            Value::Int(v) => Ok(*v as f32),
            other => mismatch("f32", other),
        }
    }
}

impl ColumnType for f32 {
    const SQL_TYPE: SqlType = SqlType::Real;
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        value.into_value()
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(*v),
            Value::Int(v) => Ok(*v as f64),
            other => mismatch("f64", other),
        }
    }
}

impl ColumnType for f64 {
    const SQL_TYPE: SqlType = SqlType::Double;
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

/// Types that map one-to-one onto a [`Value`] variant.
macro_rules! variant_value {
    ($($ty:ty => $variant:ident, $sql:expr);* $(;)?) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }

            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self, String> {
                    match value {
                        Value::$variant(v) => Ok(v.clone()),
                        other => mismatch(stringify!($ty), other),
                    }
                }
            }

            impl ColumnType for $ty {
                const SQL_TYPE: SqlType = $sql;
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

variant_value! {
    bool => Bool, SqlType::Boolean;
    String => Text, SqlType::Text;
    NaiveDateTime => Timestamp, SqlType::Timestamp;
    DateTime<Utc> => TimestampTz, SqlType::TimestampTz;
    NaiveDate => Date, SqlType::Date;
    Uuid => Uuid, SqlType::Uuid;
    serde_json::Value => Json, SqlType::Jsonb;
    Vec<u8> => Bytes, SqlType::Bytea;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_literal_doubles_quotes() {
        assert_eq!(Value::from("it's").to_literal(), "'it''s'");
    }

    #[test]
    fn scalar_literals() {
        assert_eq!(Value::Null.to_literal(), "null");
        assert_eq!(Value::Bool(true).to_literal(), "true");
        assert_eq!(Value::Int(-42).to_literal(), "-42");
        assert_eq!(Value::Float(1.5).to_literal(), "1.5");
        assert_eq!(
            Value::Float(f64::NAN).to_literal(),
            "cast('NaN' as double precision)"
        );
    }

    #[test]
    fn temporal_literals() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(Value::Date(date).to_literal(), "date '2024-03-09'");

        let ts = date.and_hms_opt(10, 5, 0).unwrap();
        assert_eq!(
            Value::Timestamp(ts).to_literal(),
            "timestamp '2024-03-09 10:05:00'"
        );
    }

    #[test]
    fn keyword_case_applies_to_literals() {
        let mut out = String::new();
        Value::Null.write_literal(&mut out, KeywordCase::Upper);
        assert_eq!(out, "NULL");
    }

    #[test]
    fn bytes_literal_is_hex_decoded() {
        assert_eq!(
            Value::Bytes(vec![0xde, 0xad]).to_literal(),
            "decode('dead', 'hex')"
        );
    }

    #[test]
    fn int_narrowing_reports_overflow() {
        let err = i16::from_value(&Value::Int(100_000)).unwrap_err();
        assert!(err.contains("out of range"));
        assert_eq!(i32::from_value(&Value::Int(7)), Ok(7));
    }

    #[test]
    fn option_maps_null() {
        assert_eq!(Option::<String>::from_value(&Value::Null), Ok(None));
        assert_eq!(
            Option::<String>::from_value(&Value::from("x")),
            Ok(Some("x".to_string()))
        );
        assert!(String::from_value(&Value::Null).is_err());
    }

    #[test]
    fn json_serialization_is_untagged() {
        let json = serde_json::to_value(vec![Value::Int(1), Value::Null, Value::from("a")]).unwrap();
        assert_eq!(json, serde_json::json!([1, null, "a"]));
    }
}

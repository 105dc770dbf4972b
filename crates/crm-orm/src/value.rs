//! Dynamic value type used by the filter parser, the query builder and the
//! store-field payloads the ORM runtime moves around.
//!
//! Field values arrive over the wire as `serde_json::Value` (HTTP bodies) and
//! must become `tokio_postgres` parameters without the caller ever naming a
//! concrete Rust type. `Value` is the bridge: a small, closed enum that knows
//! how to bind itself as a SQL parameter and how to round-trip through JSON.

use crate::error::{OrmError, OrmResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::error::Error as StdError;
use std::str::FromStr;
use tokio_postgres::types::{IsNull, ToSql, Type};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(serde_json::Value),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert an incoming JSON value into the closed `Value` set. `Null` for
    /// anything that doesn't obviously map (arrays of non-scalars become
    /// `List` for `in`/`between` operator use, objects become `Json`).
    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or_default())
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(_) => Value::Json(v.clone()),
        }
    }

    /// Like [`from_json`](Self::from_json), but routes `Decimal` fields
    /// through `rust_decimal` instead of the default numeric mapping —
    /// decimals travel the wire as JSON strings (`"19.99"`) to avoid
    /// floating-point precision loss, so they need the field's declared
    /// kind to be told apart from an ordinary text value.
    pub fn from_json_typed(v: &serde_json::Value, kind: &crate::field::FieldKind) -> OrmResult<Value> {
        if let crate::field::FieldKind::Decimal { .. } = kind {
            return match v {
                serde_json::Value::Null => Ok(Value::Null),
                serde_json::Value::String(s) => Decimal::from_str(s)
                    .map(Value::Decimal)
                    .map_err(|e| OrmError::decode("<decimal>", e.to_string())),
                serde_json::Value::Number(n) => n
                    .as_f64()
                    .and_then(Decimal::from_f64_retain)
                    .map(Value::Decimal)
                    .ok_or_else(|| OrmError::decode("<decimal>", "not a finite number")),
                other => Err(OrmError::decode("<decimal>", format!("expected a decimal string, got {other}"))),
            };
        }
        Ok(Value::from_json(v))
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::json!(f),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Bytes(b) => serde_json::json!(b),
            Value::Date(d) => serde_json::Value::String(d.to_string()),
            Value::DateTime(d) => serde_json::Value::String(d.to_string()),
            Value::TimestampTz(d) => serde_json::Value::String(d.to_rfc3339()),
            Value::Json(v) => v.clone(),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => b.to_sql(ty, out),
            Value::Int(i) => {
                // Let the declared column type pick the right integer width;
                // i64 converts losslessly down into int4/int2 via tokio-postgres.
                i.to_sql(ty, out)
            }
            Value::Float(f) => f.to_sql(ty, out),
            Value::Decimal(d) => d.to_sql(ty, out),
            Value::Text(s) => s.to_sql(ty, out),
            Value::Bytes(b) => b.to_sql(ty, out),
            Value::Date(d) => d.to_sql(ty, out),
            Value::DateTime(d) => d.to_sql(ty, out),
            Value::TimestampTz(d) => d.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
            Value::List(items) => {
                let ints: Result<Vec<i64>, _> = items
                    .iter()
                    .map(|v| match v {
                        Value::Int(i) => Ok(*i),
                        other => Err(format!("expected int in list, got {other:?}")),
                    })
                    .collect();
                if let Ok(ints) = ints {
                    return ints.to_sql(ty, out);
                }
                let strings: Vec<String> = items
                    .iter()
                    .map(|v| match v {
                        Value::Text(s) => s.clone(),
                        other => other.to_json().to_string(),
                    })
                    .collect();
                strings.to_sql(ty, out)
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::from_json(&v)
    }
}

macro_rules! impl_from_scalar {
    ($ty:ty, $variant:ident) => {
        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v.into())
            }
        }
    };
}

impl_from_scalar!(i64, Int);
impl_from_scalar!(i32, Int);
impl_from_scalar!(bool, Bool);
impl_from_scalar!(f64, Float);
impl_from_scalar!(String, Text);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

// used to move values across the bind/column boundary
use rusqlite::types::{Null, ToSql, ToSqlOutput, ValueRef};

// used for temporal values, stored as TEXT
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

// used to print out readable forms of values and storage classes
use std::fmt;

use crate::error::{RelatableError, Result};

// ------------- Storage classes -------------

/// SQL storage class of a column, derived from the semantic type of the
/// record field it is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Integer,
    Real,
    Text,
    Blob,
}

impl SqlType {
    pub fn keyword(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

// ------------- Values -------------

/// A single bound parameter or column value.
///
/// Everything that crosses the statement boundary is one of these; record
/// accessors produce and consume them, the binder moves them in and out of
/// the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
            Value::Null => "NULL",
        }
    }

    /// Read one column slot out of a stepped row.
    pub(crate) fn read(value: ValueRef<'_>) -> Value {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Value::Blob(b.to_vec()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(t) => write!(f, "{}", t),
            Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::from(*i),
            Value::Real(r) => ToSqlOutput::from(*r),
            Value::Text(t) => ToSqlOutput::from(t.as_str()),
            Value::Blob(b) => ToSqlOutput::from(b.as_slice()),
            Value::Null => ToSqlOutput::from(Null),
        })
    }
}

// ------------- Into conversions -------------

macro_rules! value_from_integer {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Value {
                Value::Integer(v as i64)
            }
        }
    )*};
}
value_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Value {
        Value::Integer(v as i64)
    }
}
impl From<f32> for Value {
    fn from(v: f32) -> Value {
        Value::Real(v as f64)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Value {
        Value::Real(v)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Value {
        Value::Text(v.to_owned())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Value {
        Value::Text(v)
    }
}
impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Value {
        Value::Blob(v.to_vec())
    }
}
impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Value {
        Value::Blob(v)
    }
}
impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Value {
        Value::Text(v.to_string())
    }
}
impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Value {
        Value::Text(v.to_string())
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Value {
        Value::Text(v.to_rfc3339())
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Value {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

// ------------- TryFrom extraction -------------

macro_rules! integer_try_from_value {
    ($($t:ty),*) => {$(
        impl TryFrom<Value> for $t {
            type Error = RelatableError;
            fn try_from(value: Value) -> Result<Self> {
                match value {
                    Value::Integer(i) => <$t>::try_from(i).map_err(|_| RelatableError::TypeMismatch {
                        expected: stringify!($t),
                        got: "INTEGER",
                    }),
                    other => Err(RelatableError::TypeMismatch {
                        expected: stringify!($t),
                        got: other.type_name(),
                    }),
                }
            }
        }
    )*};
}
integer_try_from_value!(i8, i16, i32, i64, u8, u16, u32);

impl TryFrom<Value> for bool {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i != 0),
            other => Err(RelatableError::TypeMismatch {
                expected: "bool",
                got: other.type_name(),
            }),
        }
    }
}
impl TryFrom<Value> for f64 {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Real(r) => Ok(r),
            other => Err(RelatableError::TypeMismatch {
                expected: "f64",
                got: other.type_name(),
            }),
        }
    }
}
impl TryFrom<Value> for f32 {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Real(r) => Ok(r as f32),
            other => Err(RelatableError::TypeMismatch {
                expected: "f32",
                got: other.type_name(),
            }),
        }
    }
}
impl TryFrom<Value> for String {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Text(t) => Ok(t),
            other => Err(RelatableError::TypeMismatch {
                expected: "String",
                got: other.type_name(),
            }),
        }
    }
}
impl TryFrom<Value> for Vec<u8> {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Blob(b) => Ok(b),
            other => Err(RelatableError::TypeMismatch {
                expected: "Vec<u8>",
                got: other.type_name(),
            }),
        }
    }
}
impl TryFrom<Value> for NaiveDate {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        let text = String::try_from(value)?;
        text.parse().map_err(|_| RelatableError::TypeMismatch {
            expected: "NaiveDate",
            got: "TEXT",
        })
    }
}
impl TryFrom<Value> for NaiveDateTime {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        let text = String::try_from(value)?;
        text.parse().map_err(|_| RelatableError::TypeMismatch {
            expected: "NaiveDateTime",
            got: "TEXT",
        })
    }
}
impl TryFrom<Value> for DateTime<Utc> {
    type Error = RelatableError;
    fn try_from(value: Value) -> Result<Self> {
        let text = String::try_from(value)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|d| d.with_timezone(&Utc))
            .map_err(|_| RelatableError::TypeMismatch {
                expected: "DateTime<Utc>",
                got: "TEXT",
            })
    }
}
// A blanket impl for Option<T> would collide with the standard library's
// reflexive TryFrom, so nullable extraction is spelled out per base type.
macro_rules! option_try_from_value {
    ($($t:ty),*) => {$(
        impl TryFrom<Value> for Option<$t> {
            type Error = RelatableError;
            fn try_from(value: Value) -> Result<Self> {
                match value {
                    Value::Null => Ok(None),
                    other => <$t>::try_from(other).map(Some),
                }
            }
        }
    )*};
}
option_try_from_value!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    bool,
    f32,
    f64,
    String,
    Vec<u8>,
    NaiveDate,
    NaiveDateTime,
    DateTime<Utc>
);

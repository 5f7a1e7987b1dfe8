use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::SqliteShimError;

/// Values that can be bound as statement parameters or read back from a row.
///
/// Rows only ever carry `Null`, `Int`, `Float`, `Text` and `Blob`; `Bool` and `JSON`
/// exist for the parameter side:
/// ```rust
/// use sqlite_shim::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// NULL value
    Null,
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value, bound as 1/0
    Bool(bool),
    /// Binary data
    Blob(Vec<u8>),
    /// JSON value, bound as a blob of its serialized text
    JSON(JsonValue),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            RowValues::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            RowValues::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Booleans come back from the engine as integers, so 0/1 are accepted too.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(0) => Some(false),
            RowValues::Int(1) => Some(true),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            RowValues::Null => "null",
            RowValues::Int(_) => "integer",
            RowValues::Float(_) => "float",
            RowValues::Text(_) => "text",
            RowValues::Bool(_) => "boolean",
            RowValues::Blob(_) => "blob",
            RowValues::JSON(_) => "json",
        }
    }
}

impl From<rusqlite::types::Value> for RowValues {
    fn from(value: rusqlite::types::Value) -> Self {
        use rusqlite::types::Value;
        match value {
            Value::Null => RowValues::Null,
            Value::Integer(i) => RowValues::Int(i),
            Value::Real(f) => RowValues::Float(f),
            Value::Text(s) => RowValues::Text(s),
            Value::Blob(b) => RowValues::Blob(b),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for RowValues {
                fn from(v: $ty) -> Self {
                    RowValues::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl TryFrom<u64> for RowValues {
    type Error = SqliteShimError;

    fn try_from(v: u64) -> Result<Self, Self::Error> {
        i64::try_from(v)
            .map(RowValues::Int)
            .map_err(|_| SqliteShimError::BindError(format!("{v} does not fit in a 64-bit signed integer")))
    }
}

impl TryFrom<usize> for RowValues {
    type Error = SqliteShimError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        i64::try_from(v)
            .map(RowValues::Int)
            .map_err(|_| SqliteShimError::BindError(format!("{v} does not fit in a 64-bit signed integer")))
    }
}

impl From<f64> for RowValues {
    fn from(v: f64) -> Self {
        RowValues::Float(v)
    }
}

impl From<f32> for RowValues {
    fn from(v: f32) -> Self {
        RowValues::Float(f64::from(v))
    }
}

impl From<bool> for RowValues {
    fn from(v: bool) -> Self {
        RowValues::Bool(v)
    }
}

impl From<&str> for RowValues {
    fn from(v: &str) -> Self {
        RowValues::Text(v.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(v: String) -> Self {
        RowValues::Text(v)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(v: Vec<u8>) -> Self {
        RowValues::Blob(v)
    }
}

impl From<&[u8]> for RowValues {
    fn from(v: &[u8]) -> Self {
        RowValues::Blob(v.to_vec())
    }
}

impl From<JsonValue> for RowValues {
    fn from(v: JsonValue) -> Self {
        RowValues::JSON(v)
    }
}

impl<T> From<Option<T>> for RowValues
where
    T: Into<RowValues>,
{
    fn from(opt: Option<T>) -> Self {
        opt.map_or(RowValues::Null, Into::into)
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Null => serializer.serialize_none(),
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Blob(bytes) => serializer.serialize_bytes(bytes),
            RowValues::JSON(json) => json.serialize(serializer),
        }
    }
}

/// Build a `Vec<RowValues>` from heterogeneous values.
///
/// ```rust
/// use sqlite_shim::{RowValues, params};
///
/// let p = params![42, "x", 1.5, true, None::<i64>];
/// assert_eq!(p[0], RowValues::Int(42));
/// assert_eq!(p[4], RowValues::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::RowValues>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::RowValues::from($value)),+]
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_map_to_null() {
        assert_eq!(RowValues::from(None::<String>), RowValues::Null);
        assert_eq!(RowValues::from(Some(7_i32)), RowValues::Int(7));
    }

    #[test]
    fn oversized_unsigned_is_a_bind_error() {
        let err = RowValues::try_from(u64::MAX).unwrap_err();
        assert!(matches!(err, SqliteShimError::BindError(_)));
        assert_eq!(RowValues::try_from(5_u64).unwrap(), RowValues::Int(5));
    }

    #[test]
    fn bool_accessor_reads_engine_integers() {
        assert_eq!(RowValues::Int(1).as_bool(), Some(true));
        assert_eq!(RowValues::Int(0).as_bool(), Some(false));
        assert_eq!(RowValues::Int(2).as_bool(), None);
    }

    #[test]
    fn serializes_as_plain_json() {
        let json = serde_json::to_value(vec![
            RowValues::Null,
            RowValues::Int(3),
            RowValues::Text("a".into()),
            RowValues::Blob(vec![1, 2]),
        ])
        .unwrap();
        assert_eq!(json, serde_json::json!([null, 3, "a", [1, 2]]));
    }

    #[test]
    fn params_macro_converts_each_value() {
        let p = crate::params![1_i64, "two", 3.5, false];
        assert_eq!(
            p,
            vec![
                RowValues::Int(1),
                RowValues::Text("two".into()),
                RowValues::Float(3.5),
                RowValues::Bool(false),
            ]
        );
        assert!(crate::params![].is_empty());
    }
}

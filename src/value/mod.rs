//! Typed values crossing the engine boundary.
//!
//! SQLite stores dynamically typed values; this module pins them to a closed
//! tagged union and centralizes every conversion between that union and the
//! application's type system. Encoding and decoding go through one serde
//! serializer/deserializer pair rather than ad hoc casts.

mod decode;
mod encode;

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub(crate) use decode::from_row;
use decode::ValueDeserializer;

use crate::error::SqliteError;

/// A single SQLite storage value.
///
/// Integers are 64-bit signed, reals are IEEE-754 doubles, text is UTF-8,
/// blobs are opaque byte sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum SqliteValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqliteValue {
    /// Encode an application value into exactly one storage tag.
    ///
    /// Supported inputs: integers (u64 only while representable as i64),
    /// floats, booleans, strings, byte sequences, `Option` wrappers, newtype
    /// wrappers, and types serializing to one of those. Chrono date/times
    /// serialize to RFC 3339 text. Anything else is `UnsupportedType`.
    pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<SqliteValue, SqliteError> {
        value.serialize(encode::ValueSerializer)
    }

    /// Decode this value into a target type.
    ///
    /// Defined conversions only: integer to bool via nonzero, integer to
    /// float widening, checked integer narrowing, text to chrono date/times
    /// via RFC 3339. Everything else is `TypeMismatch`.
    pub fn decode<'de, T: Deserialize<'de>>(&'de self) -> Result<T, SqliteError> {
        T::deserialize(ValueDeserializer::new(self))
    }

    /// The storage-class name, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            SqliteValue::Null => "NULL",
            SqliteValue::Integer(_) => "INTEGER",
            SqliteValue::Real(_) => "REAL",
            SqliteValue::Text(_) => "TEXT",
            SqliteValue::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqliteValue::Null)
    }
}

impl fmt::Display for SqliteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqliteValue::Null => write!(f, "NULL"),
            SqliteValue::Integer(value) => write!(f, "{value}"),
            SqliteValue::Real(value) => write!(f, "{value}"),
            SqliteValue::Text(value) => write!(f, "{value}"),
            SqliteValue::Blob(bytes) => write!(f, "<blob {} bytes>", bytes.len()),
        }
    }
}

impl From<i64> for SqliteValue {
    fn from(value: i64) -> Self {
        SqliteValue::Integer(value)
    }
}

impl From<i32> for SqliteValue {
    fn from(value: i32) -> Self {
        SqliteValue::Integer(value.into())
    }
}

impl From<f64> for SqliteValue {
    fn from(value: f64) -> Self {
        SqliteValue::Real(value)
    }
}

impl From<bool> for SqliteValue {
    fn from(value: bool) -> Self {
        SqliteValue::Integer(value.into())
    }
}

impl From<&str> for SqliteValue {
    fn from(value: &str) -> Self {
        SqliteValue::Text(value.to_string())
    }
}

impl From<String> for SqliteValue {
    fn from(value: String) -> Self {
        SqliteValue::Text(value)
    }
}

impl From<Vec<u8>> for SqliteValue {
    fn from(value: Vec<u8>) -> Self {
        SqliteValue::Blob(value)
    }
}

impl From<&[u8]> for SqliteValue {
    fn from(value: &[u8]) -> Self {
        SqliteValue::Blob(value.to_vec())
    }
}

impl From<DateTime<Utc>> for SqliteValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqliteValue::Text(value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

impl<T> From<Option<T>> for SqliteValue
where
    T: Into<SqliteValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => SqliteValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_resolves_each_supported_type_to_one_tag() {
        assert_eq!(
            SqliteValue::encode(&42i64).unwrap(),
            SqliteValue::Integer(42)
        );
        assert_eq!(SqliteValue::encode(&7u16).unwrap(), SqliteValue::Integer(7));
        assert_eq!(
            SqliteValue::encode(&1.5f64).unwrap(),
            SqliteValue::Real(1.5)
        );
        assert_eq!(
            SqliteValue::encode(&true).unwrap(),
            SqliteValue::Integer(1)
        );
        assert_eq!(
            SqliteValue::encode("hello").unwrap(),
            SqliteValue::Text("hello".to_string())
        );
        assert_eq!(
            SqliteValue::encode(&None::<i64>).unwrap(),
            SqliteValue::Null
        );
        assert_eq!(
            SqliteValue::encode(&Some(9i32)).unwrap(),
            SqliteValue::Integer(9)
        );
    }

    #[test]
    fn encode_rejects_unrepresentable_values() {
        let err = SqliteValue::encode(&u64::MAX).unwrap_err();
        assert!(matches!(err, SqliteError::UnsupportedType { .. }));

        let err = SqliteValue::encode(&vec![1i64, 2, 3]).unwrap_err();
        assert!(matches!(err, SqliteError::UnsupportedType { .. }));
    }

    #[test]
    fn round_trip_preserves_supported_types() {
        let text: String = SqliteValue::encode("swan").unwrap().decode().unwrap();
        assert_eq!(text, "swan");

        let n: i64 = SqliteValue::encode(&-3i64).unwrap().decode().unwrap();
        assert_eq!(n, -3);

        let f: f64 = SqliteValue::encode(&2.25f64).unwrap().decode().unwrap();
        assert_eq!(f, 2.25);

        let flag: bool = SqliteValue::encode(&true).unwrap().decode().unwrap();
        assert!(flag);

        let blob: Vec<u8> = SqliteValue::encode(&serde_bytes(&[1u8, 2, 3]))
            .unwrap()
            .decode()
            .unwrap();
        assert_eq!(blob, vec![1, 2, 3]);

        let missing: Option<i64> = SqliteValue::Null.decode().unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn datetime_round_trips_through_text() {
        let stamp: DateTime<Utc> = "2024-05-01T12:30:00Z".parse().unwrap();
        let value = SqliteValue::from(stamp);
        assert!(matches!(value, SqliteValue::Text(_)));
        let back: DateTime<Utc> = value.decode().unwrap();
        assert_eq!(back, stamp);
    }

    #[test]
    fn integer_decodes_to_bool_via_nonzero() {
        let truthy: bool = SqliteValue::Integer(5).decode().unwrap();
        assert!(truthy);
        let falsy: bool = SqliteValue::Integer(0).decode().unwrap();
        assert!(!falsy);
        let err = SqliteValue::Text("yes".to_string()).decode::<bool>().unwrap_err();
        assert!(matches!(err, SqliteError::TypeMismatch { .. }));
    }

    #[test]
    fn narrowing_is_checked() {
        let ok: u8 = SqliteValue::Integer(200).decode().unwrap();
        assert_eq!(ok, 200);
        let err = SqliteValue::Integer(300).decode::<u8>().unwrap_err();
        assert!(matches!(err, SqliteError::TypeMismatch { .. }));
        let widened: f64 = SqliteValue::Integer(3).decode().unwrap();
        assert_eq!(widened, 3.0);
    }

    fn serde_bytes(bytes: &[u8]) -> impl Serialize + '_ {
        struct Bytes<'a>(&'a [u8]);
        impl Serialize for Bytes<'_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_bytes(self.0)
            }
        }
        Bytes(bytes)
    }
}

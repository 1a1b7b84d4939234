//! `SqliteValue` and `SqliteRow` to application value decoding.

use serde::de::value::{BorrowedStrDeserializer, SeqDeserializer};
use serde::de::{DeserializeSeed, Deserializer, MapAccess, Visitor};
use serde::forward_to_deserialize_any;
use serde::Deserialize;

use crate::error::SqliteError;
use crate::row::SqliteRow;
use crate::value::SqliteValue;

/// Deserializer over one stored value.
pub(crate) struct ValueDeserializer<'de> {
    value: &'de SqliteValue,
}

impl<'de> ValueDeserializer<'de> {
    pub(crate) fn new(value: &'de SqliteValue) -> Self {
        Self { value }
    }

    fn mismatch(&self, expected: &'static str) -> SqliteError {
        SqliteError::TypeMismatch {
            expected,
            found: self.value.type_name().to_string(),
        }
    }
}

macro_rules! deserialize_narrowed_integer {
    ($method:ident, $visit:ident, $target:ty, $expected:literal) => {
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
            match self.value {
                SqliteValue::Integer(v) => match <$target>::try_from(*v) {
                    Ok(narrowed) => visitor.$visit(narrowed),
                    Err(_) => Err(SqliteError::TypeMismatch {
                        expected: $expected,
                        found: format!("INTEGER out of range ({v})"),
                    }),
                },
                _ => Err(self.mismatch($expected)),
            }
        }
    };
}

impl<'de> Deserializer<'de> for ValueDeserializer<'de> {
    type Error = SqliteError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Null => visitor.visit_unit(),
            SqliteValue::Integer(v) => visitor.visit_i64(*v),
            SqliteValue::Real(v) => visitor.visit_f64(*v),
            SqliteValue::Text(v) => visitor.visit_borrowed_str(v),
            SqliteValue::Blob(v) => visitor.visit_borrowed_bytes(v),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Integer(v) => visitor.visit_bool(*v != 0),
            _ => Err(self.mismatch("INTEGER convertible to bool")),
        }
    }

    deserialize_narrowed_integer!(deserialize_i8, visit_i8, i8, "8-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_i16, visit_i16, i16, "16-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_i32, visit_i32, i32, "32-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_u8, visit_u8, u8, "unsigned 8-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_u16, visit_u16, u16, "unsigned 16-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_u32, visit_u32, u32, "unsigned 32-bit INTEGER");
    deserialize_narrowed_integer!(deserialize_u64, visit_u64, u64, "unsigned 64-bit INTEGER");

    fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Integer(v) => visitor.visit_i64(*v),
            _ => Err(self.mismatch("INTEGER")),
        }
    }

    fn deserialize_f32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        self.deserialize_f64(visitor)
    }

    fn deserialize_f64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Real(v) => visitor.visit_f64(*v),
            // integers widen to doubles
            SqliteValue::Integer(v) => visitor.visit_f64(*v as f64),
            _ => Err(self.mismatch("REAL")),
        }
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Text(v) => {
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => visitor.visit_char(c),
                    _ => Err(self.mismatch("single-character TEXT")),
                }
            }
            _ => Err(self.mismatch("TEXT")),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Text(v) => visitor.visit_borrowed_str(v),
            _ => Err(self.mismatch("TEXT")),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Blob(v) => visitor.visit_borrowed_bytes(v),
            _ => Err(self.mismatch("BLOB")),
        }
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        self.deserialize_bytes(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Null => visitor.visit_unit(),
            _ => Err(self.mismatch("NULL")),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SqliteError> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, SqliteError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        match self.value {
            SqliteValue::Blob(v) => visitor.visit_seq(SeqDeserializer::new(v.iter().copied())),
            _ => Err(self.mismatch("BLOB")),
        }
    }

    forward_to_deserialize_any! {
        tuple tuple_struct map struct enum identifier ignored_any
    }
}

/// Decode a row into a structured record.
///
/// Columns are filtered by the wildcard table rule (an unqualified column
/// matches any requested table and vice versa) and, when given, by exact
/// occurrence. Of several surviving columns sharing a name, the first in
/// result-set position order wins.
pub(crate) fn from_row<'de, T: Deserialize<'de>>(
    row: &'de SqliteRow,
    table: Option<&str>,
    occurrence: Option<u32>,
) -> Result<T, SqliteError> {
    let mut fields: Vec<(&str, &SqliteValue)> = Vec::with_capacity(row.len());
    let mut saw_table_match = false;
    for (column, value) in row.iter() {
        let table_matches = match (column.table.as_deref(), table) {
            (Some(have), Some(want)) => have == want,
            _ => true,
        };
        if !table_matches {
            continue;
        }
        saw_table_match = true;
        if occurrence.is_some_and(|want| column.occurrence != want) {
            continue;
        }
        if !fields.iter().any(|(existing, _)| *existing == column.name) {
            fields.push((column.name.as_str(), value));
        }
    }
    if let Some(want) = table {
        if !saw_table_match && !row.is_empty() {
            return Err(SqliteError::InvalidTable(want.to_string()));
        }
    }
    T::deserialize(RowDeserializer { fields })
}

struct RowDeserializer<'de> {
    fields: Vec<(&'de str, &'de SqliteValue)>,
}

impl<'de> Deserializer<'de> for RowDeserializer<'de> {
    type Error = SqliteError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, SqliteError> {
        visitor.visit_map(RowAccess {
            entries: self.fields.into_iter(),
            value: None,
        })
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str string bytes
        byte_buf option unit unit_struct newtype_struct seq tuple tuple_struct
        map struct enum identifier ignored_any
    }
}

struct RowAccess<'de> {
    entries: std::vec::IntoIter<(&'de str, &'de SqliteValue)>,
    value: Option<&'de SqliteValue>,
}

impl<'de> MapAccess<'de> for RowAccess<'de> {
    type Error = SqliteError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, SqliteError> {
        match self.entries.next() {
            Some((name, value)) => {
                self.value = Some(value);
                seed.deserialize(BorrowedStrDeserializer::new(name)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V: DeserializeSeed<'de>>(&mut self, seed: V) -> Result<V::Value, SqliteError> {
        let value = self
            .value
            .take()
            .ok_or_else(|| SqliteError::Codec("row value read before its key".to_string()))?;
        seed.deserialize(ValueDeserializer::new(value))
    }
}

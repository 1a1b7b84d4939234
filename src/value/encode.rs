//! Application value to `SqliteValue` encoding.

use serde::ser::{Impossible, Serialize, Serializer};

use crate::error::SqliteError;
use crate::value::SqliteValue;

/// Serializer producing exactly one storage tag per application value.
pub(crate) struct ValueSerializer;

type Compound = Impossible<SqliteValue, SqliteError>;

fn unsupported(type_name: &str) -> SqliteError {
    SqliteError::UnsupportedType {
        type_name: type_name.to_string(),
    }
}

impl Serializer for ValueSerializer {
    type Ok = SqliteValue;
    type Error = SqliteError;

    type SerializeSeq = Compound;
    type SerializeTuple = Compound;
    type SerializeTupleStruct = Compound;
    type SerializeTupleVariant = Compound;
    type SerializeMap = Compound;
    type SerializeStruct = Compound;
    type SerializeStructVariant = Compound;

    fn serialize_bool(self, v: bool) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_i8(self, v: i8) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<SqliteValue, SqliteError> {
        i64::try_from(v)
            .map(SqliteValue::Integer)
            .map_err(|_| unsupported("u64 beyond the signed 64-bit range"))
    }

    fn serialize_f32(self, v: f32) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Real(v.into()))
    }

    fn serialize_f64(self, v: f64) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Real(v))
    }

    fn serialize_char(self, v: char) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Text(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Text(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Blob(v.to_vec()))
    }

    fn serialize_none(self) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<SqliteValue, SqliteError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<SqliteValue, SqliteError> {
        Ok(SqliteValue::Null)
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<SqliteValue, SqliteError> {
        Err(unsupported(name))
    }

    fn serialize_newtype_struct<T>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<SqliteValue, SqliteError>
    where
        T: Serialize + ?Sized,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<SqliteValue, SqliteError>
    where
        T: Serialize + ?Sized,
    {
        Err(unsupported(name))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound, SqliteError> {
        Err(unsupported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Compound, SqliteError> {
        Err(unsupported("tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Compound, SqliteError> {
        Err(unsupported(name))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, SqliteError> {
        Err(unsupported(name))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Compound, SqliteError> {
        Err(unsupported("map"))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Compound, SqliteError> {
        Err(unsupported(name))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound, SqliteError> {
        Err(unsupported(name))
    }
}

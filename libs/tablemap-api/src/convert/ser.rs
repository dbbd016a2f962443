use serde::Serialize;
use serde::ser::{self, Impossible};

use super::CellError;
use crate::value::ValueCell;

/// Serializes one primitive value into a [`ValueCell`].
///
/// - `bool` → Boolean; 8/16/32-bit integers → Int32; `i64`, `u32`, `u64` → Int64
/// - floats → Double; `str`, `char` → String; bytes → Binary
/// - `None`, `()` → empty String; unit enum variants → their name
/// - sequences, maps, structs → error (those fields are Complex)
pub struct CellSerializer;

fn not_scalar(shape: &str) -> CellError {
    <CellError as ser::Error>::custom(format!("{shape} cannot be stored in a single cell"))
}

impl ser::Serializer for CellSerializer {
    type Ok = ValueCell;
    type Error = CellError;

    type SerializeSeq = Impossible<ValueCell, CellError>;
    type SerializeTuple = Impossible<ValueCell, CellError>;
    type SerializeTupleStruct = Impossible<ValueCell, CellError>;
    type SerializeTupleVariant = Impossible<ValueCell, CellError>;
    type SerializeMap = Impossible<ValueCell, CellError>;
    type SerializeStruct = Impossible<ValueCell, CellError>;
    type SerializeStructVariant = Impossible<ValueCell, CellError>;

    fn serialize_bool(self, v: bool) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Boolean(v))
    }

    fn serialize_i8(self, v: i8) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int32(i32::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int32(i32::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int32(v))
    }

    fn serialize_i64(self, v: i64) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int64(v))
    }

    fn serialize_u8(self, v: u8) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int32(i32::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int32(i32::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Int64(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<ValueCell, CellError> {
        i64::try_from(v)
            .map(ValueCell::Int64)
            .map_err(|_| <CellError as ser::Error>::custom(format!("{v} does not fit in Int64")))
    }

    fn serialize_f32(self, v: f32) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Double(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Double(v))
    }

    fn serialize_char(self, v: char) -> Result<ValueCell, CellError> {
        Ok(ValueCell::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<ValueCell, CellError> {
        Ok(ValueCell::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<ValueCell, CellError> {
        Ok(ValueCell::Binary(v.to_vec()))
    }

    fn serialize_none(self) -> Result<ValueCell, CellError> {
        Ok(ValueCell::empty())
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<ValueCell, CellError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<ValueCell, CellError> {
        Ok(ValueCell::empty())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<ValueCell, CellError> {
        Ok(ValueCell::empty())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<ValueCell, CellError> {
        Ok(ValueCell::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<ValueCell, CellError> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<ValueCell, CellError> {
        Err(not_scalar(&format!("variant {name}::{variant}")))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, CellError> {
        Err(not_scalar("a sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, CellError> {
        Err(not_scalar("a tuple"))
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, CellError> {
        Err(not_scalar(&format!("tuple struct {name}")))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, CellError> {
        Err(not_scalar(&format!("variant {name}::{variant}")))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, CellError> {
        Err(not_scalar("a map"))
    }

    fn serialize_struct(
        self,
        name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, CellError> {
        Err(not_scalar(&format!("struct {name}")))
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, CellError> {
        Err(not_scalar(&format!("variant {name}::{variant}")))
    }
}

//! Deserialization of a structural [`Value`] into caller types.
//!
//! This is the inverse of [`to_value`](crate::to_value): maps become structs, arrays become
//! sequences, and enums are read back from either a bare variant-name string or a single-pair map
//! keyed by the variant name.

use serde::de::value::{MapDeserializer, SeqDeserializer, StringDeserializer};
use serde::de::Error as DeError;
use serde::de::*;

use crate::error::{Error, Result};
use crate::value::Value;

/// Convert a [`Value`] into any deserializable type.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    T::deserialize(value)
}

fn visit_array<'de, V: Visitor<'de>>(array: Vec<Value>, visitor: V) -> Result<V::Value> {
    let mut deserializer = SeqDeserializer::new(array.into_iter());
    let seq = visitor.visit_seq(&mut deserializer)?;
    deserializer.end()?;
    Ok(seq)
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match *value {
        Value::Null => Unexpected::Unit,
        Value::Bool(v) => Unexpected::Bool(v),
        Value::Int(v) => Unexpected::Signed(v),
        Value::F64(v) => Unexpected::Float(v),
        Value::Str(ref v) => Unexpected::Str(v),
        Value::Bin(ref v) => Unexpected::Bytes(v),
        Value::Array(_) => Unexpected::Seq,
        Value::Map(_) => Unexpected::Map,
    }
}

impl<'de> Deserializer<'de> for Value {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(v) => visitor.visit_bool(v),
            Value::Int(v) => visitor.visit_i64(v),
            Value::F64(v) => visitor.visit_f64(v),
            Value::Str(v) => visitor.visit_string(v),
            Value::Bin(v) => visitor.visit_byte_buf(v),
            Value::Array(v) => visit_array(v, visitor),
            Value::Map(v) => {
                let mut deserializer = MapDeserializer::new(v.into_iter());
                let map = visitor.visit_map(&mut deserializer)?;
                deserializer.end()?;
                Ok(map)
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Null => visitor.visit_none(),
            v => visitor.visit_some(v),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value> {
        visitor.visit_newtype_struct(self)
    }

    // Byte sequences can also be read as plain sequences, so a `Vec<u8>` without `serde_bytes`
    // still deserializes.
    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
        match self {
            Value::Bin(v) => {
                let mut deserializer = SeqDeserializer::new(v.into_iter());
                let seq = visitor.visit_seq(&mut deserializer)?;
                deserializer.end()?;
                Ok(seq)
            }
            v => v.deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value> {
        match self {
            Value::Str(variant) => {
                let de: StringDeserializer<Error> = variant.into_deserializer();
                visitor.visit_enum(de)
            }
            Value::Map(map) => {
                if map.len() != 1 {
                    return Err(Error::SerdeFail(
                        "expected a size-1 map or a string".to_string(),
                    ));
                }
                let mut iter = map.into_iter();
                let (variant, value) = iter.next().ok_or_else(|| {
                    Error::SerdeFail("expected a size-1 map or a string".to_string())
                })?;
                visitor.visit_enum(EnumAccess { variant, value })
            }
            other => Err(Error::invalid_type(
                unexpected(&other),
                &"a size-1 map or a string",
            )),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 u8 u16 u32 u64 f32 f64 char str
        string bytes byte_buf unit unit_struct
        tuple tuple_struct map struct identifier ignored_any
    }
}

impl<'de> IntoDeserializer<'de, Error> for Value {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

struct EnumAccess {
    variant: String,
    value: Value,
}

impl<'de> serde::de::EnumAccess<'de> for EnumAccess {
    type Error = Error;
    type Variant = Value;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let de: StringDeserializer<Error> = self.variant.into_deserializer();
        let val = seed.deserialize(de)?;
        Ok((val, self.value))
    }
}

/// The content of a single-pair enum map.
impl<'de> VariantAccess<'de> for Value {
    type Error = Error;

    fn unit_variant(self) -> Result<()> {
        match self {
            Value::Null => Ok(()),
            other => Err(Error::invalid_type(unexpected(&other), &"unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        seed.deserialize(self)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Array(v) => visit_array(v, visitor),
            other => Err(Error::invalid_type(unexpected(&other), &"tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self {
            Value::Map(_) => self.deserialize_any(visitor),
            other => Err(Error::invalid_type(unexpected(&other), &"struct variant")),
        }
    }
}

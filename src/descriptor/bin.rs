use super::*;
use crate::error::{Error, Result};
use serde_bytes::ByteBuf;

/// Validator for raw byte sequences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BinShape {
    name: String,
}

impl BinShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        match value {
            Value::Bin(_) => Ok(value),
            ref other => Err(Error::type_mismatch(&self.name, "bytes", other)),
        }
    }
}

/// Make a descriptor for byte sequences.
///
/// The logical type is [`ByteBuf`] so that typed values serialize as bytes rather than as a
/// sequence of integers. Inside a struct, use `#[serde(with = "serde_bytes")]` on `Vec<u8>`
/// fields.
pub fn bytes(name: impl Into<String>) -> Descriptor<ByteBuf> {
    Descriptor::new(Shape::Bin(BinShape { name: name.into() }))
}

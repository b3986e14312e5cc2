use super::*;
use crate::error::{Error, Result};

/// Validator for UTF-8 strings.
///
/// The optional length limit counts characters (Unicode scalar values), not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrShape {
    name: String,
    max_len: Option<usize>,
}

impl StrShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        let val = match value {
            Value::Str(ref v) => v,
            ref other => return Err(Error::type_mismatch(&self.name, "string", other)),
        };
        if let Some(max_len) = self.max_len {
            // Byte length is an upper bound on character count
            if val.len() > max_len {
                let len_char = bytecount::num_chars(val.as_bytes());
                if len_char > max_len {
                    return Err(Error::length_exceeded(&self.name, max_len, len_char, &value));
                }
            }
        }
        Ok(value)
    }
}

/// Make a descriptor for any string.
pub fn string(name: impl Into<String>) -> Descriptor<String> {
    Descriptor::new(Shape::Str(StrShape {
        name: name.into(),
        max_len: None,
    }))
}

/// Make a descriptor for strings of at most `max_len` characters.
pub fn bounded_string(name: impl Into<String>, max_len: usize) -> Descriptor<String> {
    Descriptor::new(Shape::Str(StrShape {
        name: name.into(),
        max_len: Some(max_len),
    }))
}

use super::*;
use crate::error::{Error, Result};

/// Validator for booleans, optionally fixed to a single value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoolShape {
    name: String,
    expected: Option<bool>,
}

impl BoolShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The only value accepted, if this is a literal.
    pub fn expected(&self) -> Option<bool> {
        self.expected
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        let val = match value {
            Value::Bool(v) => v,
            ref other => return Err(Error::type_mismatch(&self.name, "boolean", other)),
        };
        match self.expected {
            Some(expected) if expected != val => Err(Error::value_mismatch(
                &self.name,
                expected.to_string(),
                &value,
            )),
            _ => Ok(value),
        }
    }
}

/// Make a descriptor that accepts any boolean.
pub fn boolean(name: impl Into<String>) -> Descriptor<bool> {
    Descriptor::new(Shape::Bool(BoolShape {
        name: name.into(),
        expected: None,
    }))
}

/// Make a descriptor that only accepts `expected`. Used for fixed discriminant flags.
pub fn literal_bool(name: impl Into<String>, expected: bool) -> Descriptor<bool> {
    Descriptor::new(Shape::Bool(BoolShape {
        name: name.into(),
        expected: Some(expected),
    }))
}

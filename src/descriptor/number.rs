use super::*;
use crate::error::{Error, Result};

/// Validator for numbers. Integers and floating-point values are both accepted, with no range
/// constraints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NumberShape {
    name: String,
}

impl NumberShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        match value {
            Value::Int(_) | Value::F64(_) => Ok(value),
            ref other => Err(Error::type_mismatch(&self.name, "number", other)),
        }
    }
}

/// Make a descriptor for any number.
pub fn number(name: impl Into<String>) -> Descriptor<f64> {
    Descriptor::new(Shape::Number(NumberShape { name: name.into() }))
}

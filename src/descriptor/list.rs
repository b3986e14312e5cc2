use super::*;
use crate::error::{Error, Result};

/// Validator for homogeneous sequences.
///
/// Items are validated in order, and the first failure fails the whole list.
#[derive(Debug)]
pub struct ListShape {
    name: String,
    item: Arc<Shape>,
}

impl ListShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn item(&self) -> &Shape {
        &self.item
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        let items = match value {
            Value::Array(items) => items,
            other => return Err(Error::type_mismatch(&self.name, "array", &other)),
        };
        items
            .into_iter()
            .map(|item| self.item.validate(item, Parent::Named(&self.name)))
            .collect::<Result<Vec<Value>>>()
            .map(Value::Array)
    }
}

/// Make a descriptor for a sequence of `item`.
pub fn list<T, D: AsDescriptor<T>>(name: impl Into<String>, item: &D) -> Descriptor<Vec<T>> {
    Descriptor::new(Shape::List(ListShape {
        name: name.into(),
        item: item.as_descriptor().shared_shape(),
    }))
}

use super::*;
use crate::error::Result;

/// Lets its base descriptor also accept null (absent).
///
/// Null passes through without the base ever seeing it. Anything else is handed to the base
/// unchanged, along with the parent context.
#[derive(Debug)]
pub struct OptionalShape {
    base: Arc<Shape>,
}

impl OptionalShape {
    pub fn base(&self) -> &Shape {
        &self.base
    }

    pub(crate) fn validate(&self, value: Value, parent: Parent) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            value => self.base.validate(value, parent),
        }
    }
}

/// Make a descriptor that accepts null/absent in addition to whatever `base` accepts.
///
/// Wrapping an optional descriptor again does nothing: `optional(&optional(&d))` is the same
/// shape as `optional(&d)`.
pub fn optional<T, D: AsDescriptor<T>>(base: &D) -> Descriptor<Option<T>> {
    let base = base.as_descriptor().shared_shape();
    if base.is_optional() {
        return Descriptor::from_shape(base);
    }
    Descriptor::new(Shape::Optional(OptionalShape { base }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn null_skips_base() {
        // A base that rejects everything, including null
        let never: Descriptor<()> = UnionBuilder::new("never", "kind").build();
        let maybe = optional(&never);
        assert_eq!(maybe.validate_value(Value::Null).unwrap(), Value::Null);
        assert_eq!(maybe.validate(&None).unwrap(), None);
    }

    #[test]
    fn present_defers_to_base() {
        let art = optional(&bounded_string("albumArt", 3));
        assert_eq!(art.validate(&Some("png".to_string())).unwrap(), Some("png".to_string()));
        let err = art.validate_value(Value::from("jpeg")).unwrap_err();
        assert!(matches!(err, Error::LengthExceeded { .. }));
        assert_eq!(art.name(), "albumArt");
    }

    #[test]
    fn nesting_is_flattened() {
        let once = optional(&string("albumArt"));
        let twice = optional(&once);
        assert!(std::ptr::eq(once.shape(), twice.shape()));
        match twice.shape() {
            Shape::Optional(opt) => assert!(!opt.base().is_optional()),
            _ => panic!("not optional"),
        }
    }
}

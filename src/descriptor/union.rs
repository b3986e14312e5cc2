use super::*;
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Validator that tries a list of record variants in order.
///
/// The first variant that accepts the value wins, and later variants are never tried. If none
/// accept it, a single [`Error::UnionMismatch`] is returned and the individual variant failures
/// are only logged, at trace level.
///
/// The discriminator field is kept for documentation; resolution never reads it.
#[derive(Debug)]
pub struct UnionShape {
    name: String,
    discriminator: String,
    variants: Vec<RecordLike>,
}

impl UnionShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    /// Variant names, in the order they are tried.
    pub fn variant_names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|v| v.name())
    }

    pub(crate) fn validate(&self, value: Value, parent: Parent) -> Result<Value> {
        for (index, variant) in self.variants.iter().enumerate() {
            match variant.validate(value.clone(), Parent::Named(&self.name)) {
                Ok(valid) => return Ok(valid),
                Err(err) => trace!(
                    union = %self.name,
                    variant = variant.name(),
                    index,
                    %err,
                    "union variant rejected value"
                ),
            }
        }
        debug!(
            union = %self.name,
            %parent,
            variants = self.variants.len(),
            "no union variant accepted value"
        );
        Err(Error::union_mismatch(&self.name, &value))
    }
}

/// Builder for a union descriptor.
#[derive(Clone, Debug)]
pub struct UnionBuilder {
    name: String,
    discriminator: String,
    variants: Vec<RecordLike>,
}

impl UnionBuilder {
    pub fn new(name: impl Into<String>, discriminator: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            discriminator: discriminator.into(),
            variants: Vec::new(),
        }
    }

    /// Append a variant. Variants are tried in the order they are added.
    pub fn variant<V>(mut self, record: &Record<V>) -> Self {
        self.variants.push(record.record_like().clone());
        self
    }

    pub fn build<T>(self) -> Descriptor<T> {
        Descriptor::new(Shape::Union(UnionShape {
            name: self.name,
            discriminator: self.discriminator,
            variants: self.variants,
        }))
    }
}

/// Make a union descriptor from an ordered list of variants.
pub fn union<T>(
    name: impl Into<String>,
    discriminator: impl Into<String>,
    variants: Vec<Variant>,
) -> Descriptor<T> {
    let mut builder = UnionBuilder::new(name, discriminator);
    builder.variants = variants.into_iter().map(|v| v.0).collect();
    builder.build()
}

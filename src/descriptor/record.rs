use super::*;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a record does with keys it doesn't declare.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    /// Pass undeclared keys through unchecked.
    #[default]
    Preserve,
    /// Remove undeclared keys from the validated result.
    Drop,
}

/// An insertion-ordered set of named field descriptors, used to build records and extensions.
///
/// Adding a key that is already present replaces its descriptor but keeps its original position.
#[derive(Clone, Debug, Default)]
pub struct Fields {
    fields: Vec<(String, Arc<Shape>)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any existing field with the same key.
    pub fn add<T, D: AsDescriptor<T>>(mut self, key: impl Into<String>, descriptor: &D) -> Self {
        self.insert(key, descriptor);
        self
    }

    /// Add a field in place, replacing any existing field with the same key.
    pub fn insert<T, D: AsDescriptor<T>>(&mut self, key: impl Into<String>, descriptor: &D) {
        let key = key.into();
        let shape = descriptor.as_descriptor().shared_shape();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = shape,
            None => self.fields.push((key, shape)),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.iter().any(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&Shape> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, shape)| shape.as_ref())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Shape)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Validate each field not in `skip`, in declaration order. Absent fields are read as null,
    /// and fields that validate to null are left out of the map.
    pub(crate) fn check(
        &self,
        owner: &str,
        map: &mut BTreeMap<String, Value>,
        skip: &BTreeSet<String>,
    ) -> Result<()> {
        for (key, shape) in self.fields.iter() {
            if skip.contains(key) {
                continue;
            }
            let field = map.remove(key).unwrap_or(Value::Null);
            match shape.validate(field, Parent::Named(owner))? {
                Value::Null => (),
                valid => {
                    map.insert(key.clone(), valid);
                }
            }
        }
        Ok(())
    }
}

/// Validator for maps with a fixed set of named fields.
///
/// Every declared field is validated, with absent fields read as null. So a field that may be
/// left out needs an [`optional`] descriptor. Validation stops at the first field that fails.
#[derive(Debug)]
pub struct RecordShape {
    name: String,
    fields: Fields,
    unknown_keys: UnknownKeys,
}

impl RecordShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub(crate) fn check(
        &self,
        map: &mut BTreeMap<String, Value>,
        skip: &BTreeSet<String>,
    ) -> Result<()> {
        self.fields.check(&self.name, map, skip)
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        let mut map = match value {
            Value::Map(map) => map,
            other => return Err(Error::type_mismatch(&self.name, "object", &other)),
        };
        self.check(&mut map, &BTreeSet::new())?;
        if self.unknown_keys == UnknownKeys::Drop {
            map.retain(|k, _| self.fields.contains(k));
        }
        Ok(Value::Map(map))
    }
}

/// Either kind of record, as held by extensions and unions.
#[derive(Clone, Debug)]
pub(crate) enum RecordLike {
    Plain(Arc<RecordShape>),
    Extended(Arc<ExtendShape>),
}

impl RecordLike {
    pub(crate) fn name(&self) -> &str {
        match self {
            RecordLike::Plain(v) => v.name(),
            RecordLike::Extended(v) => v.name(),
        }
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        match self {
            RecordLike::Plain(v) => v.fields().contains(key),
            RecordLike::Extended(v) => v.contains(key),
        }
    }

    pub(crate) fn keys(&self) -> Vec<&str> {
        match self {
            RecordLike::Plain(v) => v.fields().keys().collect(),
            RecordLike::Extended(v) => v.keys(),
        }
    }

    /// Validate the declared fields without checking the value kind or applying the unknown key
    /// policy.
    pub(crate) fn check(
        &self,
        map: &mut BTreeMap<String, Value>,
        skip: &BTreeSet<String>,
    ) -> Result<()> {
        match self {
            RecordLike::Plain(v) => v.check(map, skip),
            RecordLike::Extended(v) => v.check(map, skip),
        }
    }

    pub(crate) fn validate(&self, value: Value, parent: Parent) -> Result<Value> {
        match self {
            RecordLike::Plain(v) => v.validate(value, parent),
            RecordLike::Extended(v) => v.validate(value, parent),
        }
    }
}

/// Builder for a [`Record`].
#[derive(Clone, Debug)]
pub struct RecordBuilder {
    name: String,
    fields: Fields,
    unknown_keys: UnknownKeys,
}

impl RecordBuilder {
    /// Make a new record builder with no fields, that preserves undeclared keys.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Fields::new(),
            unknown_keys: UnknownKeys::default(),
        }
    }

    /// Add a field, replacing any existing field with the same key.
    pub fn field<T, D: AsDescriptor<T>>(mut self, key: impl Into<String>, descriptor: &D) -> Self {
        self.fields.insert(key, descriptor);
        self
    }

    /// Replace all fields.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Set what happens to undeclared keys.
    pub fn unknown_keys(mut self, unknown_keys: UnknownKeys) -> Self {
        self.unknown_keys = unknown_keys;
        self
    }

    pub fn build<T>(self) -> Record<T> {
        Record::plain(RecordShape {
            name: self.name,
            fields: self.fields,
            unknown_keys: self.unknown_keys,
        })
    }
}

/// Make a record descriptor from a set of fields.
pub fn record<T>(name: impl Into<String>, fields: Fields) -> Record<T> {
    RecordBuilder::new(name).fields(fields).build()
}

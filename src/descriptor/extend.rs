use super::*;
use crate::error::{Error, Result};
use std::collections::{BTreeMap, BTreeSet};

/// Validator for a record composed from a base record plus its own fields.
///
/// Fields declared here that the base also declares are overridden: the base never validates
/// them, so a redefined field isn't held to both definitions. The override set is fixed when the
/// extension is built.
#[derive(Debug)]
pub struct ExtendShape {
    name: String,
    base: RecordLike,
    fields: Fields,
    overridden: BTreeSet<String>,
    unknown_keys: UnknownKeys,
}

impl ExtendShape {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base_name(&self) -> &str {
        self.base.name()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Keys this extension redefines from its base.
    pub fn overridden_keys(&self) -> impl Iterator<Item = &str> {
        self.overridden.iter().map(|k| k.as_str())
    }

    pub fn unknown_keys(&self) -> UnknownKeys {
        self.unknown_keys
    }

    pub(crate) fn contains(&self, key: &str) -> bool {
        self.fields.contains(key) || self.base.contains(key)
    }

    /// Base keys first, then the keys this extension adds.
    pub(crate) fn keys(&self) -> Vec<&str> {
        let mut keys = self.base.keys();
        keys.extend(self.fields.keys().filter(|k| !self.overridden.contains(*k)));
        keys
    }

    pub(crate) fn check(
        &self,
        map: &mut BTreeMap<String, Value>,
        skip: &BTreeSet<String>,
    ) -> Result<()> {
        if skip.is_empty() {
            self.base.check(map, &self.overridden)?;
        } else {
            let base_skip: BTreeSet<String> = self.overridden.union(skip).cloned().collect();
            self.base.check(map, &base_skip)?;
        }
        self.fields.check(&self.name, map, skip)
    }

    pub(crate) fn validate(&self, value: Value, _parent: Parent) -> Result<Value> {
        let mut map = match value {
            Value::Map(map) => map,
            other => return Err(Error::type_mismatch(&self.name, "object", &other)),
        };
        self.check(&mut map, &BTreeSet::new())?;
        if self.unknown_keys == UnknownKeys::Drop {
            map.retain(|k, _| self.contains(k));
        }
        Ok(Value::Map(map))
    }
}

/// Builder for an extended [`Record`].
#[derive(Clone, Debug)]
pub struct ExtendBuilder {
    name: String,
    base: RecordLike,
    fields: Fields,
    unknown_keys: UnknownKeys,
}

impl ExtendBuilder {
    /// Start an extension of `base` with no fields of its own.
    pub fn new<B>(name: impl Into<String>, base: &Record<B>) -> Self {
        Self {
            name: name.into(),
            base: base.record_like().clone(),
            fields: Fields::new(),
            unknown_keys: UnknownKeys::default(),
        }
    }

    /// Add a field, replacing any field with the same key added before. If the base record also
    /// has this key, the base definition is overridden.
    pub fn field<T, D: AsDescriptor<T>>(mut self, key: impl Into<String>, descriptor: &D) -> Self {
        self.fields.insert(key, descriptor);
        self
    }

    /// Replace all of this extension's own fields.
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    /// Set what happens to keys declared by neither the base nor this extension.
    pub fn unknown_keys(mut self, unknown_keys: UnknownKeys) -> Self {
        self.unknown_keys = unknown_keys;
        self
    }

    pub fn build<T>(self) -> Record<T> {
        let overridden = self
            .fields
            .keys()
            .filter(|k| self.base.contains(k))
            .map(String::from)
            .collect();
        Record::extended(ExtendShape {
            name: self.name,
            base: self.base,
            fields: self.fields,
            overridden,
            unknown_keys: self.unknown_keys,
        })
    }
}

/// Make a record descriptor that extends `base` with more fields.
pub fn extend<T, B>(name: impl Into<String>, base: &Record<B>, fields: Fields) -> Record<T> {
    ExtendBuilder::new(name, base).fields(fields).build()
}

//! Composable type descriptors.
//!
//! A descriptor is built once, declaratively, and then used to validate structural [`Value`]s and
//! to move them across an encoding [`Backend`]. Every descriptor is a [`Descriptor<T>`], where `T`
//! is the logical Rust type it accepts and produces. Internally, each one wraps a shared
//! [`Shape`], which holds the actual validation logic.
//!
//! There are descriptors for each primitive kind:
//! - [`boolean`] and [`literal_bool`] - for booleans, optionally fixed to one value.
//! - [`string`] and [`bounded_string`] - for UTF-8 strings, optionally with a character limit.
//! - [`number`] - for any integer or floating-point number.
//! - [`bytes`] - for byte sequences.
//!
//! And combinators that build on them:
//! - [`optional`] - lets a descriptor also accept null/absent.
//! - [`record`] - a fixed set of named fields. See [`RecordBuilder`].
//! - [`extend`] - a record that adds fields to (or overrides fields of) a base record. See
//!     [`ExtendBuilder`].
//! - [`union`] - an ordered list of record variants, the first one to accept a value wins. See
//!     [`UnionBuilder`].
//! - [`list`] - a homogeneous sequence.
//!
//! Only the outermost call touches the backend. Nested descriptors are always handed values that
//! are already structural, and are told who their enclosing descriptor is through [`Parent`].
//!
//! # Examples
//!
//! ```
//! # use shape_pack::*;
//! # use serde::{Deserialize, Serialize};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Song {
//!     title: String,
//!     #[serde(default, skip_serializing_if = "Option::is_none")]
//!     album: Option<String>,
//! }
//!
//! let song = record::<Song>(
//!     "song",
//!     Fields::new()
//!         .add("title", &bounded_string("title", 100))
//!         .add("album", &optional(&string("album"))),
//! );
//!
//! let all_star = Song { title: "All Star".into(), album: None };
//! let encoded = song.serialize(&TextBackend::new(), &all_star)?;
//! assert_eq!(encoded, r#"{"title":"All Star"}"#);
//! let decoded = song.deserialize(&TextBackend::new(), encoded.as_str())?;
//! assert_eq!(decoded.title, "All Star");
//! # Ok(())
//! # }
//! ```

mod bin;
mod bool;
mod extend;
mod list;
mod number;
mod optional;
mod record;
mod str;
mod union;

pub use self::bin::*;
pub use self::bool::*;
pub use self::extend::*;
pub use self::list::*;
pub use self::number::*;
pub use self::optional::*;
pub use self::record::*;
pub use self::str::*;
pub use self::union::*;

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::backend::Backend;
use crate::error::Result;
use crate::value::Value;
use crate::{de::from_value, ser::to_value};

/// Where a validation call sits in the descriptor tree.
///
/// `Root` is only ever used by [`Descriptor`] itself, when a value has just come from (or is about
/// to go to) a backend. Every nested call is told the name of the descriptor that invoked it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent<'a> {
    Root,
    Named(&'a str),
}

impl<'a> Parent<'a> {
    pub fn is_root(&self) -> bool {
        matches!(self, Parent::Root)
    }
}

impl<'a> fmt::Display for Parent<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Parent::Root => f.write_str("<root>"),
            Parent::Named(name) => f.write_str(name),
        }
    }
}

/// The validation logic behind a descriptor.
///
/// Shapes are immutable once built and are shared between every descriptor that refers to them.
#[derive(Debug)]
pub enum Shape {
    /// [`BoolShape`] - for booleans.
    Bool(BoolShape),
    /// [`StrShape`] - for UTF-8 strings.
    Str(StrShape),
    /// [`NumberShape`] - for numbers.
    Number(NumberShape),
    /// [`BinShape`] - for byte sequences.
    Bin(BinShape),
    /// [`OptionalShape`] - passes null through, otherwise defers to its base.
    Optional(OptionalShape),
    /// [`RecordShape`] - for maps with a fixed set of named fields.
    Record(Arc<RecordShape>),
    /// [`ExtendShape`] - a record built on top of another record.
    Extend(Arc<ExtendShape>),
    /// [`UnionShape`] - tries several records in order.
    Union(UnionShape),
    /// [`ListShape`] - for sequences.
    List(ListShape),
}

impl Shape {
    /// The diagnostic name of this shape. Optional shapes report the name of their base.
    pub fn name(&self) -> &str {
        match self {
            Shape::Bool(v) => v.name(),
            Shape::Str(v) => v.name(),
            Shape::Number(v) => v.name(),
            Shape::Bin(v) => v.name(),
            Shape::Optional(v) => v.base().name(),
            Shape::Record(v) => v.name(),
            Shape::Extend(v) => v.name(),
            Shape::Union(v) => v.name(),
            Shape::List(v) => v.name(),
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Shape::Optional(_))
    }

    /// Validate an already-structural value, returning the validated form of it.
    pub fn validate(&self, value: Value, parent: Parent) -> Result<Value> {
        match self {
            Shape::Bool(v) => v.validate(value, parent),
            Shape::Str(v) => v.validate(value, parent),
            Shape::Number(v) => v.validate(value, parent),
            Shape::Bin(v) => v.validate(value, parent),
            Shape::Optional(v) => v.validate(value, parent),
            Shape::Record(v) => v.validate(value, parent),
            Shape::Extend(v) => v.validate(value, parent),
            Shape::Union(v) => v.validate(value, parent),
            Shape::List(v) => v.validate(value, parent),
        }
    }
}

/// A descriptor for the logical type `T`.
///
/// This is a cheap handle to a shared [`Shape`]: cloning it does not copy the descriptor tree,
/// and it can be shared freely between threads.
pub struct Descriptor<T> {
    shape: Arc<Shape>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Descriptor<T> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Descriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Descriptor")
            .field("shape", &self.shape)
            .finish()
    }
}

impl<T> Descriptor<T> {
    pub(crate) fn new(shape: Shape) -> Self {
        Self::from_shape(Arc::new(shape))
    }

    pub(crate) fn from_shape(shape: Arc<Shape>) -> Self {
        Self {
            shape,
            _type: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.shape.name()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub(crate) fn shared_shape(&self) -> Arc<Shape> {
        self.shape.clone()
    }

    /// Validate a structural value as the root of a descriptor tree.
    pub fn validate_value(&self, value: Value) -> Result<Value> {
        self.shape.validate(value, Parent::Root)
    }

    /// Validate a structural value, then encode it with the given backend.
    pub fn serialize_value<B: Backend>(&self, backend: &B, value: Value) -> Result<B::Packed> {
        let value = self.validate_value(value)?;
        backend.pack(&value).map_err(|err| {
            debug!(descriptor = self.name(), %err, "backend failed to pack value");
            err
        })
    }

    /// Decode a value with the given backend, then validate it.
    pub fn deserialize_value<B: Backend>(&self, backend: &B, raw: &B::Raw) -> Result<Value> {
        let value = backend.unpack(raw).map_err(|err| {
            debug!(descriptor = self.name(), %err, "backend failed to unpack value");
            err
        })?;
        self.validate_value(value)
    }
}

impl<T: Serialize + DeserializeOwned> Descriptor<T> {
    /// Validate a value without encoding it, returning the validated copy.
    ///
    /// Fields that are optional and absent are removed, and undeclared fields are preserved or
    /// dropped according to each record's [`UnknownKeys`] policy.
    pub fn validate(&self, value: &T) -> Result<T> {
        from_value(self.validate_value(to_value(value)?)?)
    }

    /// Validate a value, then encode it with the given backend.
    pub fn serialize<B: Backend>(&self, backend: &B, value: &T) -> Result<B::Packed> {
        self.serialize_value(backend, to_value(value)?)
    }

    /// Decode a value with the given backend, validate it, and convert it into `T`.
    pub fn deserialize<B: Backend>(&self, backend: &B, raw: &B::Raw) -> Result<T> {
        from_value(self.deserialize_value(backend, raw)?)
    }
}

/// Anything that can be used where a [`Descriptor<T>`] is expected, such as a [`Record<T>`].
pub trait AsDescriptor<T> {
    fn as_descriptor(&self) -> &Descriptor<T>;
}

impl<T> AsDescriptor<T> for Descriptor<T> {
    fn as_descriptor(&self) -> &Descriptor<T> {
        self
    }
}

impl<T> AsDescriptor<T> for Record<T> {
    fn as_descriptor(&self) -> &Descriptor<T> {
        &self.descriptor
    }
}

/// A descriptor known to describe a record: either a plain [`record`] or an [`extend`]ed one.
///
/// Only records can be extended or used as union variants. A `Record<T>` can be used anywhere a
/// [`Descriptor<T>`] can.
pub struct Record<T> {
    descriptor: Descriptor<T>,
    inner: RecordLike,
}

impl<T> Clone for Record<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            inner: self.inner.clone(),
        }
    }
}

impl<T> fmt::Debug for Record<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Record").field(&self.inner).finish()
    }
}

impl<T> Record<T> {
    pub(crate) fn plain(shape: RecordShape) -> Self {
        let shape = Arc::new(shape);
        Self {
            descriptor: Descriptor::new(Shape::Record(shape.clone())),
            inner: RecordLike::Plain(shape),
        }
    }

    pub(crate) fn extended(shape: ExtendShape) -> Self {
        let shape = Arc::new(shape);
        Self {
            descriptor: Descriptor::new(Shape::Extend(shape.clone())),
            inner: RecordLike::Extended(shape),
        }
    }

    pub(crate) fn record_like(&self) -> &RecordLike {
        &self.inner
    }

    /// Every field key this record validates, including those inherited from a base record.
    pub fn keys(&self) -> Vec<&str> {
        self.inner.keys()
    }

    /// Make this record usable as a union variant.
    pub fn variant(&self) -> Variant {
        Variant(self.inner.clone())
    }
}

impl<T> Deref for Record<T> {
    type Target = Descriptor<T>;

    fn deref(&self) -> &Self::Target {
        &self.descriptor
    }
}

/// One alternative record shape inside a [`union`]. Made with [`Record::variant`].
#[derive(Clone, Debug)]
pub struct Variant(pub(crate) RecordLike);

impl Variant {
    pub fn name(&self) -> &str {
        self.0.name()
    }
}

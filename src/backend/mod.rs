//! Encoding backends.
//!
//! A [`Backend`] turns a structural [`Value`] into its encoded form and back. Descriptors only
//! call a backend at the root of a descriptor tree, so the same descriptors work unchanged with
//! any backend:
//!
//! - [`TextBackend`] - JSON text, with deterministic key order.
//! - [`CompactBackend`] - MessagePack.
//! - [`DocumentBackend`] - a binary document produced by an injected [`DocumentCodec`], such as
//!     the canonical [`MarkerCodec`].
//!
//! [`Format`] picks one of these at runtime, for hosts that choose the wire format through their
//! own configuration.

mod compact;
mod document;
mod text;

pub use self::compact::*;
pub use self::document::*;
pub use self::text::*;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::Value;

/// A pluggable pack/unpack pair.
///
/// Backends must be pure functions of their input: descriptors may call them from any number of
/// threads at once.
pub trait Backend {
    /// The encoded form produced by [`pack`](Backend::pack).
    type Packed;
    /// The borrowed encoded form accepted by [`unpack`](Backend::unpack).
    type Raw: ?Sized;

    fn pack(&self, value: &Value) -> Result<Self::Packed>;

    fn unpack(&self, raw: &Self::Raw) -> Result<Value>;
}

impl<B: Backend + ?Sized> Backend for &B {
    type Packed = B::Packed;
    type Raw = B::Raw;

    fn pack(&self, value: &Value) -> Result<Self::Packed> {
        (**self).pack(value)
    }

    fn unpack(&self, raw: &Self::Raw) -> Result<Value> {
        (**self).unpack(raw)
    }
}

/// A wire format selectable at runtime. Every format packs to bytes; text is UTF-8.
///
/// The document format uses a [`MarkerCodec`] with the default limits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    #[default]
    Text,
    Compact,
    Document,
}

impl Backend for Format {
    type Packed = Vec<u8>;
    type Raw = [u8];

    fn pack(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            Format::Text => TextBackend::new().pack(value).map(String::into_bytes),
            Format::Compact => CompactBackend::new().pack(value),
            Format::Document => DocumentBackend::new(&MarkerCodec::default()).pack(value),
        }
    }

    fn unpack(&self, raw: &[u8]) -> Result<Value> {
        match self {
            Format::Text => {
                let text = std::str::from_utf8(raw)
                    .map_err(|e| Error::BadDecode(format!("text is not UTF-8: {}", e)))?;
                TextBackend::new().unpack(text)
            }
            Format::Compact => CompactBackend::new().unpack(raw),
            Format::Document => DocumentBackend::new(&MarkerCodec::default()).unpack(raw),
        }
    }
}

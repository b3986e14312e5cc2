//! shape-pack describes the shape of structured data once, and then uses that description to
//! validate values and carry them across a wire format. The goal is a single declaration per
//! message type, shared by everything that produces or consumes it.
//!
//! It provides:
//!
//! - A structural [`Value`] model, with a serde bridge ([`to_value`] and [`from_value`]) so any
//!     `Serialize`/`Deserialize` type can be validated.
//! - Composable descriptors for each kind of data:
//!     - Primitives: [`boolean`], [`literal_bool`], [`string`], [`bounded_string`], [`number`],
//!         and [`bytes`]
//!     - Combinators: [`optional`], [`record`], [`extend`], [`union`], and [`list`]
//! - Pluggable encoding backends, chosen by the caller at every call:
//!     - [`TextBackend`] for JSON text
//!     - [`CompactBackend`] for MessagePack
//!     - [`DocumentBackend`] for binary documents, through an injected [`DocumentCodec`]
//! - A canonical binary document codec, [`MarkerCodec`]. Given a known input, the same document is
//!     always generated, and only that encoding is accepted back.
//!
//! Descriptors are immutable once built and are cheap to clone, so a set of them can be built
//! at startup and shared by every thread of a service.
//!
//! Validation failures are reported through [`Error`], and each one names the descriptor that
//! rejected the value. Nothing is printed: diagnostics go through [`tracing`] at `debug` and
//! `trace` level, and are only seen if the host installs a subscriber.

mod de;
mod depth_tracking;
mod element;
mod error;
mod marker;
mod ser;
mod value;

pub mod backend;
pub mod descriptor;

pub use self::backend::*;
pub use self::de::from_value;
pub use self::descriptor::*;
pub use self::error::{Error, Result};
pub use self::ser::to_value;
pub use self::value::Value;

/// The default maximum nesting depth of a binary document, counting the root object.
pub const MAX_DEPTH: usize = 100;
/// The default maximum size of an encoded binary document is 1 MiB.
pub const MAX_DOC_SIZE: usize = 1usize << 20; // 1 MiB

//! Object graph serialization.
//!
//! Values are written as a flat stream of named entries: primitives, nulls,
//! primitive arrays, arrays and nodes. Shared objects are written once and
//! referred to by id afterwards, so aliasing and cycles survive a round trip.
//! Objects owned by the host can be written as external references that a
//! resolver maps back when reading.
//!
//! ## Layers
//!
//! - [`stream`]: the entry encodings, [`DataWriter`] and [`DataReader`] with
//!   a binary and a token implementation.
//! - [`serializer`]: one serializer per type, owning the entry or node a
//!   value occupies. Object slots go through the polymorphic serializer.
//! - [`formatter`]: the member layout inside a node, found through a
//!   priority ordered locator chain.
//! - [`context`]: per session state, references, policies and logging.
//! - [`info`] / [`registry`]: compile-time type information and the
//!   process-wide type registry.
//!
//! ## Example
//!
//! ```
//! use vc_serial::Serial;
//! use vc_serial::context::{DeserializationContext, SerializationContext};
//! use vc_serial::utility::{from_bytes, to_bytes};
//!
//! #[derive(Serial, Default, Debug, PartialEq)]
//! struct Player {
//!     pub name: String,
//!     pub level: u32,
//!     pub inventory: Vec<u16>,
//! }
//!
//! let player = Player { name: "Ferris".into(), level: 7, inventory: vec![3, 1] };
//! let bytes = to_bytes(&player, SerializationContext::default()).unwrap();
//! let back: Player = from_bytes(&bytes, DeserializationContext::default()).unwrap();
//!
//! assert_eq!(player, back);
//! ```
//!
//! [`DataWriter`]: stream::DataWriter
//! [`DataReader`]: stream::DataReader

// -----------------------------------------------------------------------------
// Extern Self

// `vc_macro_utils::Manifest` resolves `vc_serial` to `::vc_serial`, which
// needs this alias inside the crate itself.
extern crate self as vc_serial;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod reflect;

pub mod context;
pub mod error;
pub mod formatter;
pub mod impls;
pub mod info;
pub mod registry;
pub mod serde;
pub mod serializer;
pub mod stream;
pub mod utility;
pub mod value;

#[doc(hidden)]
pub mod __macro_exports;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::{SerialError, SerialResult};
pub use reflect::{Reflect, Serial};
pub use vc_serial_derive::Serial;

pub use vc_serial_derive as derive;

//! A `serde` bridge over the entry stream.
//!
//! [`EntrySerializer`] implements [`serde::Serializer`] on top of a
//! [`DataWriter`](crate::stream::DataWriter) and [`EntryDeserializer`]
//! implements [`serde::Deserializer`] on top of a
//! [`DataReader`](crate::stream::DataReader), so any type with serde
//! implementations can live inside an object graph.
//!
//! Layout, with `name` the entry name of the value:
//!
//! - scalars: one named entry; `None` and `()` are null entries.
//! - structs: a node whose members are named entries.
//! - sequences and tuples: a node holding one array.
//! - maps: a node holding an array of `{ key, value }` nodes.
//! - enums: unit variants are strings, other variants a node holding one
//!   entry named by the variant.
//! - bytes: a primitive array of `U8`.
//!
//! At the top level, inside a node its caller has opened, structs and maps
//! write their members and sequences their array directly into that node.

// -----------------------------------------------------------------------------
// Modules

mod de;
mod ser;

// -----------------------------------------------------------------------------
// Exports

pub use de::EntryDeserializer;
pub use ser::EntrySerializer;

use alloc::string::{String, ToString};
use core::fmt::Display;

use thiserror::Error;

use crate::error::SerialError;

// -----------------------------------------------------------------------------
// BridgeError

/// The error of the serde bridge.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BridgeError {
    /// The underlying stream failed or the session aborted.
    #[error(transparent)]
    Serial(#[from] SerialError),

    /// A serde implementation or the bridge rejected the data.
    #[error("{0}")]
    Custom(String),
}

impl ::serde::ser::Error for BridgeError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl ::serde::de::Error for BridgeError {
    fn custom<T: Display>(msg: T) -> Self {
        Self::Custom(msg.to_string())
    }
}

impl From<BridgeError> for SerialError {
    fn from(value: BridgeError) -> Self {
        match value {
            BridgeError::Serial(error) => error,
            BridgeError::Custom(message) => SerialError::Serde(message),
        }
    }
}

/// Entry name of map keys.
pub(crate) const KEY: &str = "key";
/// Entry name of map values.
pub(crate) const VALUE: &str = "value";

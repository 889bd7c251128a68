//! The entry stream protocol.
//!
//! A serialized graph is a flat sequence of entries: typed primitive values
//! and structural markers that open and close nodes and arrays. Formatters
//! and serializers only talk to the abstract [`DataWriter`] and
//! [`DataReader`]; concrete encodings implement those traits.
//!
//! ## Menu
//!
//! - [`EntryType`]: the kind of a single entry.
//! - [`NodeInfo`], [`DeclaredType`], [`NodeStack`]: node bookkeeping shared
//!   by every encoding.
//! - [`PrimitiveArray`]: bulk array payload of a primitive element type.
//! - [`DataWriter`] / [`DataReader`]: the abstract protocol.
//! - [`skip_entry`], [`skip_to_end_of_node`], [`skip_to_end_of_array`]:
//!   encoding independent skipping that keeps nested ids resolvable.
//! - [`TokenWriter`] / [`TokenReader`]: an in-memory encoding whose
//!   [`Token`]s are `serde` serializable.
//! - [`BinaryDataWriter`] / [`BinaryDataReader`]: a compact byte encoding.

// -----------------------------------------------------------------------------
// Modules

mod binary;
mod node;
mod primitive_array;
mod reader;
mod skip;
mod token;
mod writer;

// -----------------------------------------------------------------------------
// Exports

pub use binary::{BinaryDataReader, BinaryDataWriter};
pub use node::{DeclaredType, NodeInfo, NodeStack};
pub use primitive_array::PrimitiveArray;
pub use reader::DataReader;
pub use skip::{skip_entry, skip_to_end_of_array, skip_to_end_of_node};
pub use token::{IntegerValue, Token, TokenReader, TokenWriter};
pub use writer::DataWriter;

// -----------------------------------------------------------------------------
// EntryType

/// The kind of a single entry in a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryType {
    StartOfNode,
    EndOfNode,
    StartOfArray,
    EndOfArray,
    PrimitiveArray,
    Null,
    Boolean,
    Integer,
    FloatingPoint,
    String,
    Guid,
    InternalReference,
    ExternalReferenceByIndex,
    ExternalReferenceByGuid,
    ExternalReferenceByString,
    EndOfStream,
}

impl EntryType {
    /// Returns `true` for the entries a failed read never consumes.
    #[inline]
    pub fn is_end(self) -> bool {
        matches!(self, Self::EndOfNode | Self::EndOfArray | Self::EndOfStream)
    }

    /// Returns `true` for single-entry primitive values.
    #[inline]
    pub fn is_primitive(self) -> bool {
        matches!(
            self,
            Self::Boolean | Self::Integer | Self::FloatingPoint | Self::String | Self::Guid
        )
    }

    /// Returns `true` for internal and external reference entries.
    #[inline]
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Self::InternalReference
                | Self::ExternalReferenceByIndex
                | Self::ExternalReferenceByGuid
                | Self::ExternalReferenceByString
        )
    }
}

//! Provide some tools for parsing the derive input.

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod serial_derive;
mod serial_meta;

// -----------------------------------------------------------------------------
// Internal API

pub(crate) use attributes::{FieldAttributes, FieldMarker, TypeAttributes};
pub(crate) use serial_derive::{SerialDerive, SerialEnum, SerialField, SerialStruct};
pub(crate) use serial_meta::SerialMeta;

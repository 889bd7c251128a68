use crate::context::SerializationContext;
use crate::error::SerialResult;
use crate::info::TypeInfo;
use crate::stream::{NodeStack, PrimitiveArray};
use crate::value::Guid;

// -----------------------------------------------------------------------------
// DataWriter

/// The writing half of the entry protocol.
///
/// Every write takes the entry name, `None` inside arrays and for unnamed
/// entries. Closing a node or array that is not the innermost open scope is
/// a [`ProtocolError`](crate::error::ProtocolError) and ends the session.
///
/// The trait is object safe; formatters receive `&mut dyn DataWriter`.
pub trait DataWriter {
    /// The session state: references, policy, binder and diagnostics.
    fn context(&self) -> &SerializationContext;

    fn context_mut(&mut self) -> &mut SerializationContext;

    /// The currently open nodes and arrays.
    fn nodes(&self) -> &NodeStack;

    /// Opens a node for an object registered under internal id `id`.
    ///
    /// `ty` is written through the binder when present.
    fn begin_reference_node(
        &mut self,
        name: Option<&str>,
        ty: Option<&'static TypeInfo>,
        id: i32,
    ) -> SerialResult<()>;

    /// Opens a node for a value without identity.
    fn begin_struct_node(&mut self, name: Option<&str>, ty: Option<&'static TypeInfo>) -> SerialResult<()>;

    /// Closes the current node, which must be named `name`.
    fn end_node(&mut self, name: Option<&str>) -> SerialResult<()>;

    /// Opens an array of `length` elements.
    fn begin_array_node(&mut self, length: u64) -> SerialResult<()>;

    /// Closes the current array.
    fn end_array_node(&mut self) -> SerialResult<()>;

    fn write_primitive_array(&mut self, name: Option<&str>, array: &PrimitiveArray) -> SerialResult<()>;

    fn write_null(&mut self, name: Option<&str>) -> SerialResult<()>;

    fn write_internal_reference(&mut self, name: Option<&str>, id: i32) -> SerialResult<()>;

    fn write_external_reference_by_index(&mut self, name: Option<&str>, index: i32) -> SerialResult<()>;

    fn write_external_reference_by_guid(&mut self, name: Option<&str>, guid: Guid) -> SerialResult<()>;

    fn write_external_reference_by_string(&mut self, name: Option<&str>, key: &str) -> SerialResult<()>;

    fn write_bool(&mut self, name: Option<&str>, value: bool) -> SerialResult<()>;

    fn write_char(&mut self, name: Option<&str>, value: char) -> SerialResult<()>;

    fn write_i8(&mut self, name: Option<&str>, value: i8) -> SerialResult<()>;

    fn write_i16(&mut self, name: Option<&str>, value: i16) -> SerialResult<()>;

    fn write_i32(&mut self, name: Option<&str>, value: i32) -> SerialResult<()>;

    fn write_i64(&mut self, name: Option<&str>, value: i64) -> SerialResult<()>;

    fn write_u8(&mut self, name: Option<&str>, value: u8) -> SerialResult<()>;

    fn write_u16(&mut self, name: Option<&str>, value: u16) -> SerialResult<()>;

    fn write_u32(&mut self, name: Option<&str>, value: u32) -> SerialResult<()>;

    fn write_u64(&mut self, name: Option<&str>, value: u64) -> SerialResult<()>;

    fn write_f32(&mut self, name: Option<&str>, value: f32) -> SerialResult<()>;

    fn write_f64(&mut self, name: Option<&str>, value: f64) -> SerialResult<()>;

    fn write_string(&mut self, name: Option<&str>, value: &str) -> SerialResult<()>;

    fn write_guid(&mut self, name: Option<&str>, value: Guid) -> SerialResult<()>;

    /// Platform-width integers are written as 64-bit values.
    #[inline]
    fn write_isize(&mut self, name: Option<&str>, value: isize) -> SerialResult<()> {
        self.write_i64(name, value as i64)
    }

    #[inline]
    fn write_usize(&mut self, name: Option<&str>, value: usize) -> SerialResult<()> {
        self.write_u64(name, value as u64)
    }

    /// Starts a new session on the same sink.
    ///
    /// Clears the node stack, the context's session state and any
    /// encoding-level tables.
    fn prepare_new_session(&mut self);
}

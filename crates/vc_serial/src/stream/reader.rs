use alloc::string::String;

use crate::context::DeserializationContext;
use crate::error::SerialResult;
use crate::stream::{EntryType, NodeInfo, NodeStack, PrimitiveArray};
use crate::value::Guid;

// -----------------------------------------------------------------------------
// DataReader

/// The reading half of the entry protocol.
///
/// Typed reads return `Ok(None)` when the current entry does not hold a
/// value of the requested type. A failed read consumes the offending entry
/// (skipping it like [`skip_entry`](Self::skip_entry) does) unless it is an
/// end marker, which is never consumed by a failed read. `Err` is reserved
/// for structural violations, i/o failures and the abort signal.
///
/// Integer and floating point entries are accepted for each other when the
/// value survives the conversion; narrower integer reads fail on overflow.
pub trait DataReader {
    /// The session state: references, policy, binder and diagnostics.
    fn context(&self) -> &DeserializationContext;

    fn context_mut(&mut self) -> &mut DeserializationContext;

    /// The currently open nodes and arrays.
    fn nodes(&self) -> &NodeStack;

    /// Returns the kind and name of the current entry without consuming it.
    ///
    /// Returns [`EntryType::EndOfStream`] once the input is exhausted.
    fn peek_entry(&mut self) -> SerialResult<(EntryType, Option<String>)>;

    /// Consumes the current entry as is, without any node bookkeeping.
    ///
    /// Used by the skipping routines for leaf entries and stray markers.
    fn consume_entry(&mut self) -> SerialResult<()>;

    /// Enters the node at the current position.
    ///
    /// Returns `None` if the current entry is not the start of a node.
    fn enter_node(&mut self) -> SerialResult<Option<NodeInfo>>;

    /// Skips what is left of the current node and leaves it.
    ///
    /// Returns `false` if the stream ended before the node was closed.
    fn exit_node(&mut self) -> SerialResult<bool>;

    /// Enters the array at the current position and returns its length.
    fn enter_array(&mut self) -> SerialResult<Option<u64>>;

    /// Skips what is left of the current array and leaves it.
    fn exit_array(&mut self) -> SerialResult<bool>;

    fn read_primitive_array(&mut self) -> SerialResult<Option<PrimitiveArray>>;

    /// Consumes a null entry, returns `false` if the current entry is not null.
    fn read_null(&mut self) -> SerialResult<bool>;

    fn read_internal_reference(&mut self) -> SerialResult<Option<i32>>;

    fn read_external_reference_by_index(&mut self) -> SerialResult<Option<i32>>;

    fn read_external_reference_by_guid(&mut self) -> SerialResult<Option<Guid>>;

    fn read_external_reference_by_string(&mut self) -> SerialResult<Option<String>>;

    fn read_bool(&mut self) -> SerialResult<Option<bool>>;

    /// Reads a string entry holding exactly one character.
    fn read_char(&mut self) -> SerialResult<Option<char>>;

    fn read_i64(&mut self) -> SerialResult<Option<i64>>;

    fn read_u64(&mut self) -> SerialResult<Option<u64>>;

    fn read_f64(&mut self) -> SerialResult<Option<f64>>;

    fn read_string(&mut self) -> SerialResult<Option<String>>;

    fn read_guid(&mut self) -> SerialResult<Option<Guid>>;

    /// Skips the current entry.
    ///
    /// Nodes declaring a known type are deserialized and discarded, so ids
    /// registered inside them stay resolvable. End markers are not consumed.
    /// Implementations forward to [`skip_entry`](crate::stream::skip_entry).
    fn skip_entry(&mut self) -> SerialResult<()>;

    /// Starts a new session on the same source.
    fn prepare_new_session(&mut self);

    // -------------------------------------------------------------------------
    // Narrow reads

    fn read_i8(&mut self) -> SerialResult<Option<i8>> {
        Ok(self.read_i64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_i16(&mut self) -> SerialResult<Option<i16>> {
        Ok(self.read_i64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_i32(&mut self) -> SerialResult<Option<i32>> {
        Ok(self.read_i64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_isize(&mut self) -> SerialResult<Option<isize>> {
        Ok(self.read_i64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_u8(&mut self) -> SerialResult<Option<u8>> {
        Ok(self.read_u64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_u16(&mut self) -> SerialResult<Option<u16>> {
        Ok(self.read_u64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_u32(&mut self) -> SerialResult<Option<u32>> {
        Ok(self.read_u64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_usize(&mut self) -> SerialResult<Option<usize>> {
        Ok(self.read_u64()?.and_then(|v| v.try_into().ok()))
    }

    fn read_f32(&mut self) -> SerialResult<Option<f32>> {
        Ok(self.read_f64()?.map(|v| v as f32))
    }
}

// -----------------------------------------------------------------------------
// Conversions shared by encodings

/// Converts a float entry to an integer if it holds an exact integral value.
pub(crate) fn float_to_i64(value: f64) -> Option<i64> {
    const LIMIT: f64 = 9_223_372_036_854_775_808.0; // 2^63
    (value.fract() == 0.0 && (-LIMIT..LIMIT).contains(&value)).then_some(value as i64)
}

pub(crate) fn float_to_u64(value: f64) -> Option<u64> {
    const LIMIT: f64 = 18_446_744_073_709_551_616.0; // 2^64
    (value.fract() == 0.0 && (0.0..LIMIT).contains(&value)).then_some(value as u64)
}

#[cfg(test)]
mod tests {
    use super::{float_to_i64, float_to_u64};

    #[test]
    fn only_integral_floats_convert() {
        assert_eq!(float_to_i64(-3.0), Some(-3));
        assert_eq!(float_to_i64(0.5), None);
        assert_eq!(float_to_i64(f64::NAN), None);
        assert_eq!(float_to_i64(1e19), None);
        assert_eq!(float_to_u64(-1.0), None);
        assert_eq!(float_to_u64(1e19), Some(10_000_000_000_000_000_000));
    }
}

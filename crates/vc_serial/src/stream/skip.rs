use crate::error::SerialResult;
use crate::stream::{DataReader, DeclaredType, EntryType};

/// Skips the current entry of `reader`.
///
/// - A node declaring a resolved type is deserialized through that type's
///   formatter and the result discarded. Its id, and every id nested inside
///   it, stays registered so later references still resolve.
/// - Any other node is walked entry by entry, so typed nodes nested inside
///   it are treated the same way.
/// - Arrays are walked element by element.
/// - End markers are left in place, every other entry is consumed.
pub fn skip_entry(reader: &mut dyn DataReader) -> SerialResult<()> {
    let (entry, _) = reader.peek_entry()?;
    match entry {
        EntryType::StartOfNode => {
            let Some(node) = reader.enter_node()? else {
                return Ok(());
            };
            if let DeclaredType::Resolved(_) = node.declared {
                // An abort returns before the node is closed.
                crate::serializer::read_skipped_node(reader, &node)?;
            }
            reader.exit_node()?;
        }
        EntryType::StartOfArray => {
            reader.consume_entry()?;
            skip_array_contents(reader)?;
        }
        entry if entry.is_end() => {}
        _ => reader.consume_entry()?,
    }
    Ok(())
}

/// Skips entries until the end of the current node, which is left in place.
///
/// Stray array ends inside the node are consumed.
pub fn skip_to_end_of_node(reader: &mut dyn DataReader) -> SerialResult<()> {
    loop {
        match reader.peek_entry()?.0 {
            EntryType::EndOfNode | EntryType::EndOfStream => return Ok(()),
            EntryType::EndOfArray => reader.consume_entry()?,
            _ => skip_entry(reader)?,
        }
    }
}

/// Skips entries until the end of the current array, which is left in place.
///
/// Stray node ends inside the array are consumed.
pub fn skip_to_end_of_array(reader: &mut dyn DataReader) -> SerialResult<()> {
    loop {
        match reader.peek_entry()?.0 {
            EntryType::EndOfArray | EntryType::EndOfStream => return Ok(()),
            EntryType::EndOfNode => reader.consume_entry()?,
            _ => skip_entry(reader)?,
        }
    }
}

// Skips an array whose start was consumed without entering it.
fn skip_array_contents(reader: &mut dyn DataReader) -> SerialResult<()> {
    skip_to_end_of_array(reader)?;
    if reader.peek_entry()?.0 == EntryType::EndOfArray {
        reader.consume_entry()?;
    }
    Ok(())
}

use core::time::Duration;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::error::SerialResult;
use crate::formatter::{Formatter, FormatterRegistration, FormatterTarget};
use crate::info::{TypeInfo, Typed};
use crate::stream::{DataReader, DataWriter, skip_entry};

/// Formats a [`Duration`] as `secs` and `nanos` entries.
///
/// Host formatters for types outside this crate are written the same way:
/// a [`Formatter`] over the public reader and writer surface, plus a
/// [`FormatterRegistration`] submitted to `inventory`.
pub struct DurationFormatter;

impl Formatter for DurationFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        Duration::type_info()
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let duration = value.downcast_ref::<Duration>().copied().unwrap_or_default();
        writer.write_u64(Some("secs"), duration.as_secs())?;
        writer.write_u32(Some("nanos"), duration.subsec_nanos())
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let (mut secs, mut nanos) = (0_u64, 0_u32);
        loop {
            let (entry, name) = reader.peek_entry()?;
            if entry.is_end() {
                break;
            }
            match name.as_deref() {
                Some("secs") => secs = reader.read_u64()?.unwrap_or_default(),
                Some("nanos") => nanos = reader.read_u32()?.unwrap_or_default(),
                _ => {
                    reader.context().debug().log_warning(format_args!(
                        "unexpected entry {name:?} in a duration, skipping it",
                    ));
                    skip_entry(reader)?;
                }
            }
        }
        if let Some(value) = value.downcast_mut::<Duration>() {
            *value = Duration::new(secs, nanos.min(999_999_999));
        }
        Ok(())
    }
}

fn create(_ty: &'static TypeInfo) -> Option<Arc<dyn Formatter>> {
    Some(Arc::new(DurationFormatter))
}

pub(crate) static DURATION_FORMATTER: FormatterRegistration = FormatterRegistration {
    name: "vc_serial::DurationFormatter",
    priority: 0,
    target: FormatterTarget::Exact(<Duration as Typed>::type_info),
    create,
    weak_fallback: None,
    can_format: None,
};

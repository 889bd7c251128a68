use alloc::boxed::Box;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::formatter::{Formatter, FormatterLocator, LocatorRegistration, LocatorStep};
use crate::info::TypeInfo;
use crate::registry::{TypeRegistryArc, TypeTraitSelfFormatter};
use crate::stream::{DataReader, DataWriter};

/// A type that writes and reads its own members.
///
/// Registered with `#[serial(self_formatted)]`, which records a
/// [`TypeTraitSelfFormatter`] for the type.
pub trait SelfFormatted {
    /// Writes the members of `self` into the node that is currently open.
    fn serialize_self(&self, writer: &mut dyn DataWriter) -> SerialResult<()>;

    /// Reads members into `self` until the end of the current node.
    fn deserialize_self(&mut self, reader: &mut dyn DataReader) -> SerialResult<()>;
}

/// Formats a [`SelfFormatted`] type by delegating to the type itself.
pub struct SelfFormatterFormatter {
    ty: &'static TypeInfo,
    type_trait: TypeTraitSelfFormatter,
}

impl SelfFormatterFormatter {
    #[inline]
    pub fn new(ty: &'static TypeInfo, type_trait: TypeTraitSelfFormatter) -> Self {
        Self { ty, type_trait }
    }
}

impl Formatter for SelfFormatterFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        self.ty
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        self.type_trait.write(value, writer)
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        self.type_trait.read(value, reader)
    }
}

/// Locates the [`SelfFormatterFormatter`] of types registered with a
/// [`TypeTraitSelfFormatter`] in the global registry.
pub struct SelfFormatterLocator;

impl FormatterLocator for SelfFormatterLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        _allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        if step != LocatorStep::AfterRegisteredFormatters {
            return Ok(None);
        }
        let type_trait = TypeRegistryArc::global().type_trait::<TypeTraitSelfFormatter>(ty);
        Ok(type_trait.map(|type_trait| Arc::new(SelfFormatterFormatter::new(ty, type_trait)) as _))
    }
}

pub(crate) static SELF_FORMATTER_LOCATOR: LocatorRegistration = LocatorRegistration {
    name: "vc_serial::SelfFormatterLocator",
    priority: -60,
    create: || Box::new(SelfFormatterLocator),
};

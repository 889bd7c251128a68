use alloc::boxed::Box;
use alloc::vec::Vec;

use vc_os::sync::{Arc, LazyLock};

use crate::context::SerializationPolicy;
use crate::error::{AbortError, SerialResult};
use crate::formatter::array::ARRAY_LOCATOR;
use crate::formatter::collection::COLLECTION_LOCATOR;
use crate::formatter::dictionary::{BTREE_MAP_FORMATTER, HASH_MAP_FORMATTER};
use crate::formatter::duration::DURATION_FORMATTER;
use crate::formatter::nullable::NULLABLE_FORMATTER;
use crate::formatter::self_formatter::SELF_FORMATTER_LOCATOR;
use crate::formatter::serde_formatter::SERDE_LOCATOR;
use crate::formatter::type_ref::TYPE_REF_LOCATOR;
use crate::formatter::{EmptyTypeFormatter, Formatter, PrimitiveFormatter, ReflectionFormatter};
use crate::info::{TypeInfo, TypeKind};

// -----------------------------------------------------------------------------
// Locators

/// The step of the chain a locator is asked in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LocatorStep {
    /// Before any [`FormatterRegistration`] is considered.
    BeforeRegisteredFormatters,
    /// After no [`FormatterRegistration`] matched. Catch-all strategies
    /// attach here.
    AfterRegisteredFormatters,
}

/// A strategy producing formatters for a family of types.
pub trait FormatterLocator: Send + Sync {
    /// Returns a formatter for `ty`, `Ok(None)` to pass.
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        policy: &Arc<SerializationPolicy>,
        allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>>;
}

/// A statically registered [`FormatterLocator`].
///
/// Locators are asked highest priority first; equal priorities are ordered
/// by name so the choice is the same on every platform.
///
/// ```ignore
/// inventory::submit! {
///     LocatorRegistration { name: "my_crate::MyLocator", priority: 0, create: || Box::new(MyLocator) }
/// }
/// ```
pub struct LocatorRegistration {
    pub name: &'static str,
    pub priority: i32,
    pub create: fn() -> Box<dyn FormatterLocator>,
}

#[cfg(feature = "auto_register")]
inventory::collect!(LocatorRegistration);

// -----------------------------------------------------------------------------
// Registered formatters

/// The types a [`FormatterRegistration`] applies to.
#[derive(Clone, Copy)]
pub enum FormatterTarget {
    /// Exactly one type.
    Exact(fn() -> &'static TypeInfo),
    /// Every instantiation of a generic definition, matched against
    /// [`TypeInfo::generic_definition`].
    GenericDefinition(&'static str),
}

impl FormatterTarget {
    fn matches(&self, ty: &TypeInfo) -> bool {
        match self {
            Self::Exact(target) => target() == ty,
            Self::GenericDefinition(path) => ty.generic_definition() == Some(*path),
        }
    }

    fn is_exact(&self) -> bool {
        matches!(self, Self::Exact(_))
    }
}

/// A statically registered formatter.
///
/// `create` builds the formatter for a matching type. If it returns `None`
/// the type lacks the compiled support the formatter needs; the
/// `weak_fallback` is used instead when weak fallback is allowed, otherwise
/// the session aborts. `can_format` lets a registration refuse a matching
/// type.
pub struct FormatterRegistration {
    pub name: &'static str,
    pub priority: i32,
    pub target: FormatterTarget,
    pub create: fn(&'static TypeInfo) -> Option<Arc<dyn Formatter>>,
    pub weak_fallback: Option<fn(&'static TypeInfo) -> Arc<dyn Formatter>>,
    pub can_format: Option<fn(&'static TypeInfo) -> bool>,
}

#[cfg(feature = "auto_register")]
inventory::collect!(FormatterRegistration);

// -----------------------------------------------------------------------------
// Registries

struct LocatorEntry {
    name: &'static str,
    priority: i32,
    locator: Box<dyn FormatterLocator>,
}

static BUILTIN_LOCATORS: [&LocatorRegistration; 5] = [
    &SELF_FORMATTER_LOCATOR,
    &TYPE_REF_LOCATOR,
    &ARRAY_LOCATOR,
    &COLLECTION_LOCATOR,
    &SERDE_LOCATOR,
];

static BUILTIN_FORMATTERS: [&FormatterRegistration; 4] = [
    &HASH_MAP_FORMATTER,
    &BTREE_MAP_FORMATTER,
    &NULLABLE_FORMATTER,
    &DURATION_FORMATTER,
];

static LOCATORS: LazyLock<Vec<LocatorEntry>> = LazyLock::new(|| {
    let registrations = BUILTIN_LOCATORS.iter().copied();
    #[cfg(feature = "auto_register")]
    let registrations = registrations.chain(inventory::iter::<LocatorRegistration>);

    let mut entries: Vec<LocatorEntry> = registrations
        .map(|registration| LocatorEntry {
            name: registration.name,
            priority: registration.priority,
            locator: (registration.create)(),
        })
        .collect();
    entries.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.name.cmp(b.name)));
    entries
});

static REGISTRATIONS: LazyLock<Vec<&'static FormatterRegistration>> = LazyLock::new(|| {
    let registrations = BUILTIN_FORMATTERS.iter().copied();
    #[cfg(feature = "auto_register")]
    let registrations = registrations.chain(inventory::iter::<FormatterRegistration>);

    let mut entries: Vec<&'static FormatterRegistration> = registrations.collect();
    // Exact targets first, then by priority and name.
    entries.sort_by(|a, b| {
        b.target
            .is_exact()
            .cmp(&a.target.is_exact())
            .then_with(|| b.priority.cmp(&a.priority))
            .then_with(|| a.name.cmp(b.name))
    });
    entries
});

/// The names and priorities of every locator, in the order they are asked.
pub fn locators() -> impl Iterator<Item = (&'static str, i32)> {
    LOCATORS.iter().map(|entry| (entry.name, entry.priority))
}

/// Every formatter registration, in the order they are matched.
pub fn registrations() -> &'static [&'static FormatterRegistration] {
    &REGISTRATIONS
}

// -----------------------------------------------------------------------------
// Resolution

fn locate(
    ty: &'static TypeInfo,
    step: LocatorStep,
    policy: &Arc<SerializationPolicy>,
    allow_weak_fallback: bool,
) -> SerialResult<Option<Arc<dyn Formatter>>> {
    for entry in LOCATORS.iter() {
        if let Some(formatter) = entry.locator.try_get_formatter(ty, step, policy, allow_weak_fallback)? {
            return Ok(Some(formatter));
        }
    }
    Ok(None)
}

fn registered(ty: &'static TypeInfo, allow_weak_fallback: bool) -> SerialResult<Option<Arc<dyn Formatter>>> {
    let registration = REGISTRATIONS.iter().find(|registration| {
        registration.target.matches(ty) && registration.can_format.is_none_or(|can_format| can_format(ty))
    });
    let Some(registration) = registration else {
        return Ok(None);
    };
    if let Some(formatter) = (registration.create)(ty) {
        return Ok(Some(formatter));
    }
    match registration.weak_fallback {
        Some(weak_fallback) if allow_weak_fallback => Ok(Some(weak_fallback(ty))),
        _ => Err(AbortError::MissingCompiledFormatter {
            type_path: ty.type_path().into(),
            generics: ty.describe_generics(),
        }
        .into()),
    }
}

/// Runs the locator chain for `ty`, see [`get`](crate::formatter::get).
pub(crate) fn create_formatter(
    ty: &'static TypeInfo,
    policy: &Arc<SerializationPolicy>,
    allow_weak_fallback: bool,
) -> SerialResult<Arc<dyn Formatter>> {
    if PrimitiveFormatter::can_format(ty) {
        return Ok(Arc::new(PrimitiveFormatter::new(ty)));
    }
    if let Some(formatter) = locate(ty, LocatorStep::BeforeRegisteredFormatters, policy, allow_weak_fallback)? {
        return Ok(formatter);
    }
    if let Some(formatter) = registered(ty, allow_weak_fallback)? {
        return Ok(formatter);
    }
    if let Some(formatter) = locate(ty, LocatorStep::AfterRegisteredFormatters, policy, allow_weak_fallback)? {
        return Ok(formatter);
    }

    if !ty.is_serializable() && !policy.allow_non_serializable_types() {
        log::debug!(
            target: "vc_serial",
            "policy `{}` rejects non-serializable type `{ty}`, its values are written empty",
            policy.name(),
        );
        return Ok(Arc::new(EmptyTypeFormatter::new(ty)));
    }

    #[cfg(feature = "emit")]
    if let Some(formatter) = ty.generated_formatter(policy) {
        return Ok(formatter);
    }

    match ty.kind() {
        TypeKind::Struct(_) => Ok(Arc::new(ReflectionFormatter::new(ty, policy))),
        kind => {
            log::warn!(
                target: "vc_serial",
                "no formatter can serialize `{ty}` of kind {}, its values are written empty",
                kind.name(),
            );
            Ok(Arc::new(EmptyTypeFormatter::new(ty)))
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{locators, registrations};
    use alloc::vec::Vec;

    #[test]
    fn builtin_locators_are_ordered_by_priority() {
        let builtin: Vec<_> = locators().filter(|(name, _)| name.starts_with("vc_serial::")).collect();
        let priorities: Vec<i32> = builtin.iter().map(|(_, priority)| *priority).collect();
        assert_eq!(priorities, [-60, -70, -80, -100, -110]);
        assert_eq!(builtin[0].0, "vc_serial::SelfFormatterLocator");
    }

    #[test]
    fn exact_registrations_come_first() {
        let names: Vec<_> = registrations().iter().map(|r| r.name).collect();
        let duration = names.iter().position(|n| *n == "vc_serial::DurationFormatter").unwrap();
        let nullable = names.iter().position(|n| *n == "vc_serial::NullableFormatter").unwrap();
        assert!(duration < nullable);
    }
}

//! Formatters: the member layout of a type inside its node.
//!
//! A formatter writes the members of one value into a node that its caller
//! has already opened, and reads them back in place until the end of that
//! node. Serializers own the node; formatters own what is inside it.
//!
//! Formatters are found through a priority ordered locator chain and cached
//! per `(type, policy, weak fallback)`, see [`get`].
//!
//! ## Menu
//!
//! - [`Formatter`]: the member layout of a type.
//! - [`FormatterLocator`], [`LocatorStep`], [`LocatorRegistration`],
//!   [`FormatterRegistration`], [`FormatterTarget`]: the locator chain and its
//!   static registrations.
//! - [`ReflectionFormatter`], [`EmptyTypeFormatter`], [`PrimitiveFormatter`]:
//!   the universal fallbacks.
//! - [`ArrayFormatter`], [`PrimitiveArrayFormatter`], [`WeakArrayFormatter`],
//!   [`CollectionFormatter`], [`DictionaryFormatter`], [`NullableFormatter`]:
//!   containers.
//! - [`SelfFormatted`] / [`SelfFormatterFormatter`]: types that write themselves.
//! - [`TypeRefFormatter`], [`SerdeFormatter`], [`DurationFormatter`].

// -----------------------------------------------------------------------------
// Modules

mod array;
mod collection;
mod dictionary;
mod duration;
mod locator;
mod nullable;
mod primitive;
mod reflection;
mod self_formatter;
mod serde_formatter;
mod type_ref;

#[doc(hidden)]
pub mod generated;

// -----------------------------------------------------------------------------
// Exports

pub use array::{ArrayFormatter, ArrayFormatterLocator, PrimitiveArrayFormatter, WeakArrayFormatter};
pub use array::array_formatter;
pub use collection::{CollectionFormatter, CollectionFormatterLocator};
pub use dictionary::DictionaryFormatter;
pub use duration::DurationFormatter;
pub use locator::{FormatterLocator, FormatterRegistration, FormatterTarget};
pub use locator::{LocatorRegistration, LocatorStep, locators, registrations};
pub use nullable::NullableFormatter;
pub use primitive::PrimitiveFormatter;
pub use reflection::{EmptyTypeFormatter, ReflectionFormatter};
pub use self_formatter::{SelfFormatted, SelfFormatterFormatter, SelfFormatterLocator};
pub use serde_formatter::{SerdeFormatter, SerdeFormatterLocator};
pub use type_ref::{TypeRefFormatter, TypeRefFormatterLocator};

use core::any::TypeId;

use vc_os::sync::{Arc, RwLock, read_lock, write_lock};
use vc_utils::hash::{FixedHashState, HashMap};

use crate::Reflect;
use crate::context::SerializationPolicy;
use crate::error::SerialResult;
use crate::info::TypeInfo;
use crate::stream::{DataReader, DataWriter};

// -----------------------------------------------------------------------------
// Formatter

/// The member layout of a type.
pub trait Formatter: Send + Sync {
    /// The type this formatter reads and writes.
    fn serialized_type(&self) -> &'static TypeInfo;

    /// Writes the members of `value` into the node that is currently open.
    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()>;

    /// Reads members into `value` until the end of the current node.
    ///
    /// The end marker itself is left for the caller.
    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()>;
}

// -----------------------------------------------------------------------------
// Cache

type CacheKey = (TypeId, u64, bool);

static CACHE: RwLock<HashMap<CacheKey, Arc<dyn Formatter>>> =
    RwLock::new(HashMap::with_hasher(FixedHashState));

/// Returns the formatter of `ty` under `policy`.
///
/// The first lookup of a `(type, policy, allow_weak_fallback)` triple runs
/// the locator chain; later lookups return the same instance. Resolution
/// order:
///
/// 1. primitives, enums and other single entry types use the
///    [`PrimitiveFormatter`];
/// 2. locators in their [`LocatorStep::BeforeRegisteredFormatters`] step;
/// 3. [`FormatterRegistration`]s, exact targets before generic shapes;
/// 4. locators in their [`LocatorStep::AfterRegisteredFormatters`] step;
/// 5. non-serializable types the policy rejects get the [`EmptyTypeFormatter`];
/// 6. with the `emit` feature, the derive-generated formatter;
/// 7. structs use the [`ReflectionFormatter`], everything else the
///    [`EmptyTypeFormatter`].
///
/// # Errors
///
/// Returns the abort signal if a locator needs compiled support for `ty`
/// that does not exist and `allow_weak_fallback` is not set.
pub fn get(
    ty: &'static TypeInfo,
    policy: &Arc<SerializationPolicy>,
    allow_weak_fallback: bool,
) -> SerialResult<Arc<dyn Formatter>> {
    let key = (ty.type_id(), policy.id(), allow_weak_fallback);
    if let Some(formatter) = read_lock(&CACHE).get(&key) {
        return Ok(formatter.clone());
    }

    // Built outside the lock: locators look up formatters of other types.
    let created = locator::create_formatter(ty, policy, allow_weak_fallback)?;
    Ok(write_lock(&CACHE).entry(key).or_insert(created).clone())
}

/// Returns the formatter of `ty` under the configuration of `writer`.
pub(crate) fn for_writer(ty: &'static TypeInfo, writer: &dyn DataWriter) -> SerialResult<Arc<dyn Formatter>> {
    let config = writer.context().config();
    get(ty, config.policy(), config.allow_weak_fallback())
}

/// Returns the formatter of `ty` under the configuration of `reader`.
pub(crate) fn for_reader(ty: &'static TypeInfo, reader: &dyn DataReader) -> SerialResult<Arc<dyn Formatter>> {
    let config = reader.context().config();
    get(ty, config.policy(), config.allow_weak_fallback())
}

/// Returns `true` if the session of `writer` may use weak fallbacks.
#[inline]
pub(crate) fn writer_allows_weak(writer: &dyn DataWriter) -> bool {
    writer.context().config().allow_weak_fallback()
}

/// Returns `true` if the session of `reader` may use weak fallbacks.
#[inline]
pub(crate) fn reader_allows_weak(reader: &dyn DataReader) -> bool {
    reader.context().config().allow_weak_fallback()
}

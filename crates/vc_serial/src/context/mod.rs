//! Session state shared by readers, writers, serializers and formatters.
//!
//! ## Menu
//!
//! - [`SerializationPolicy`]: named rule set, compared by identity.
//! - [`TypeBinder`] / [`DefaultTypeBinder`]: type <-> name mapping.
//! - [`DebugContext`], [`SerializationLogger`], [`LoggingPolicy`]: the
//!   diagnostics sink for recoverable anomalies.
//! - [`SerializationConfig`]: policy, binder, diagnostics and fallback switch.
//! - [`ExternalIndexResolver`], [`ExternalGuidResolver`],
//!   [`ExternalStringResolver`]: host tables for objects outside the graph.
//! - [`SerializationContext`] / [`DeserializationContext`]: per-session
//!   reference tables.

// -----------------------------------------------------------------------------
// Modules

mod binder;
mod config;
mod debug;
mod deserialization;
mod external;
mod policy;
mod serialization;

// -----------------------------------------------------------------------------
// Exports

pub use binder::{DefaultTypeBinder, TypeBinder};
pub use config::SerializationConfig;
pub use debug::{DebugContext, DefaultLogger, LoggingPolicy, SerializationLogger};
pub use deserialization::DeserializationContext;
pub use external::{ExternalGuidResolver, ExternalIndexResolver, ExternalStringResolver};
pub use external::{ExternalReference, ExternalResolvers};
pub use policy::{MemberFilter, PolicyBuilder, SerializationPolicy};
pub use serialization::{InternalReference, SerializationContext};

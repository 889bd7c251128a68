// -----------------------------------------------------------------------------
// Modules

mod convert;
mod self_formatter;
mod serde_support;

// -----------------------------------------------------------------------------
// Exports

pub use convert::TypeTraitConvert;
pub use self_formatter::TypeTraitSelfFormatter;
pub use serde_support::TypeTraitSerde;

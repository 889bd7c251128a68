//! Platform layer shared by the `vc_*` crates.
//!
//! Every other crate in the workspace takes its synchronization primitives
//! from [`sync`] instead of naming `std::sync` directly, so the lock types
//! used by the global caches can be swapped in a single place.
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

pub mod sync;

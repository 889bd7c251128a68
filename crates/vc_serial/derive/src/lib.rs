//! See following macros:
//!
//! - [`Serial`]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static SERIAL_ATTRIBUTE_NAME: &str = "serial";

// -----------------------------------------------------------------------------
// Modules

mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// # Serial Derivation
///
/// `#[derive(Serial)]` implements the following traits:
///
/// - `TypePath`
/// - `Typed`
/// - `Serial`
/// - `GetTypeMeta`
///
/// The type must implement `Default`: values are created empty and filled
/// while reading.
///
/// Supported shapes:
///
/// - structs with named members, tuple structs and unit structs, whose
///   members are written as named entries. Tuple members are named by
///   their index.
/// - field-less enums, written as their discriminant.
///
/// Struct member types must implement `Serial` themselves. Shared objects
/// are held in `Option<Obj<T>>` members.
///
/// For structs a specialized formatter is generated that reads
/// and writes the members through their typed serializers. It is used when
/// the `emit` feature of `vc_serial` is enabled; otherwise members are
/// walked through the type information.
///
/// ## Example
///
/// ```rust, ignore
/// #[derive(Serial, Default)]
/// struct Player {
///     pub name: String,
///     pub hp: u32,
///     pub target: Option<Obj<Player>>,
/// }
/// ```
///
/// ## Member Selection
///
/// Which members are written is decided by the session policy. By default
/// only public members are. Field attributes override it:
///
/// ```rust, ignore
/// #[derive(Serial, Default)]
/// struct Player {
///     pub name: String,
///     #[serial(serialize)]
///     secret: u64,
///     #[serial(skip)]
///     pub cache: Vec<u8>,
///     #[serial(rename = "hp")]
///     pub health: u32,
/// }
/// ```
///
/// - `serialize`: always written, even if private.
/// - `skip`: never written.
/// - `rename = ".."`: the entry name, defaults to the member name.
///
/// ## Custom Type Path
///
/// The type path is the name written into streams for polymorphic values.
/// It defaults to `module_path!()` followed by the ident, which changes if
/// the type is moved. Pin it with:
///
/// ```rust, ignore
/// #[derive(Serial, Default)]
/// #[serial(type_path = "game::Player")]
/// struct Player;
/// ```
///
/// Generic arguments are appended automatically.
///
/// ## Interfaces
///
/// Types assignable to an interface marker declared with `impl_interface!`
/// list it, so references declared as the interface accept them:
///
/// ```rust, ignore
/// pub trait Animal {}
/// impl_interface!(dyn Animal, "zoo::Animal");
///
/// #[derive(Serial, Default)]
/// #[serial(implements(dyn Animal))]
/// struct Dog { pub name: String }
/// ```
///
/// ## Other Type Attributes
///
/// - `opaque`: members are not inspected. The type is serialized through a
///   registered formatter, `serde` or `self_formatted`.
/// - `serde`: the type is serialized through its `serde::Serialize` and
///   `serde::Deserialize` implementations, see `TypeTraitSerde`.
/// - `self_formatted`: the type implements `SelfFormatted` and writes its
///   own members, see `TypeTraitSelfFormatter`.
/// - `callbacks`: the type implements `SerializationCallbacks`, whose hooks
///   run around its (de)serialization.
/// - `not_serializable`: policies that reject non-serializable types write
///   the type empty.
///
/// ## Auto Registration
///
/// With the `auto_register` feature, non generic types are registered into
/// the global type registry on first access. Generic types must be
/// registered by hand, as the instantiations are unknown to the macro.
///
/// ## Generics
///
/// Type parameters are supported and bounded by `Serial`. Lifetime and
/// const parameters are not.
#[proc_macro_derive(Serial, attributes(serial))]
pub fn derive_serial(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    impls::match_serial_impls(ast)
}

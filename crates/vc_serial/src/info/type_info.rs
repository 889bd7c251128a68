use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use core::any::TypeId;
use core::fmt;

use vc_os::sync::Arc;

use crate::context::SerializationPolicy;
use crate::formatter::Formatter;
use crate::info::{PrimitiveKind, Type, TypeKind, TypePath};
use crate::registry::{GetTypeMeta, TypeMeta};
use crate::serializer::{ErasedSerializer, SerializationCallbacks};
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// TypeHooks

/// Optional capabilities attached to a [`TypeInfo`].
///
/// The serializer and generated formatter hooks are the artefacts of compiled
/// code generation. Their absence is what the serializer resolution and the
/// formatter locator react to with weak fallbacks or an abort.
#[derive(Clone, Copy, Default)]
pub struct TypeHooks {
    default: Option<fn() -> Box<dyn Reflect>>,
    serializer: Option<fn() -> Arc<dyn ErasedSerializer>>,
    generated_formatter: Option<fn(&SerializationPolicy) -> Arc<dyn Formatter>>,
    before_serialize: Option<fn(&dyn Reflect)>,
    after_deserialize: Option<fn(&mut dyn Reflect)>,
    type_meta: Option<fn() -> TypeMeta>,
}

// -----------------------------------------------------------------------------
// TypeInfo

/// Compile-time information about a type, the runtime type handle of this crate.
///
/// Two infos are equal if they describe the same [`TypeId`].
pub struct TypeInfo {
    ty: Type,
    kind: TypeKind,
    generics: Box<[fn() -> &'static TypeInfo]>,
    generic_definition: Option<&'static str>,
    implements: Box<[fn() -> &'static TypeInfo]>,
    serializable: bool,
    hooks: TypeHooks,
}

impl TypeInfo {
    /// Creates the info of `T` with the given kind and no hooks.
    ///
    /// Structs and opaque types start out non-serializable, every other kind
    /// serializable. See [`with_serializable`](Self::with_serializable).
    pub fn new<T: TypePath + ?Sized>(kind: TypeKind) -> Self {
        let serializable = !matches!(kind, TypeKind::Struct(_) | TypeKind::Opaque);
        Self {
            ty: Type::of::<T>(),
            kind,
            generics: Box::new([]),
            generic_definition: None,
            implements: Box::new([]),
            serializable,
            hooks: TypeHooks::default(),
        }
    }

    /// Sets the generic type arguments of this instantiation.
    pub fn with_generics(mut self, generics: &[fn() -> &'static TypeInfo]) -> Self {
        self.generics = generics.into();
        self
    }

    /// Sets the path of the generic definition, e.g. `alloc::vec::Vec`.
    ///
    /// Registered formatters targeting a generic shape match on this path.
    pub fn with_generic_definition(mut self, path: &'static str) -> Self {
        self.generic_definition = Some(path);
        self
    }

    /// Sets the interfaces this type implements.
    pub fn with_implements(mut self, interfaces: &[fn() -> &'static TypeInfo]) -> Self {
        self.implements = interfaces.into();
        self
    }

    /// Marks the type as explicitly serializable (or not).
    pub fn with_serializable(mut self, serializable: bool) -> Self {
        self.serializable = serializable;
        self
    }

    /// Attaches `T::default` as the constructor.
    pub fn with_default<T: Reflect + Default>(mut self) -> Self {
        self.hooks.default = Some(|| -> Box<dyn Reflect> { Box::new(T::default()) });
        self
    }

    /// Attaches the compiled serializer of `T`.
    pub fn with_serializer<T: Serial>(mut self) -> Self {
        self.hooks.serializer = Some(|| -> Arc<dyn ErasedSerializer> { crate::serializer::get::<T>() });
        self
    }

    /// Attaches a generated specialized formatter factory.
    pub fn with_generated_formatter(
        mut self,
        factory: fn(&SerializationPolicy) -> Arc<dyn Formatter>,
    ) -> Self {
        self.hooks.generated_formatter = Some(factory);
        self
    }

    /// Attaches the [`SerializationCallbacks`] of `T`.
    pub fn with_callbacks<T: Reflect + SerializationCallbacks>(mut self) -> Self {
        self.hooks.before_serialize = Some(|value| {
            if let Some(value) = value.downcast_ref::<T>() {
                value.on_before_serialize();
            }
        });
        self.hooks.after_deserialize = Some(|value| {
            if let Some(value) = value.downcast_mut::<T>() {
                value.on_after_deserialize();
            }
        });
        self
    }

    /// Attaches the [`GetTypeMeta`] implementation of `T`, used when the
    /// type is registered by its info alone.
    pub fn with_type_meta<T: GetTypeMeta>(mut self) -> Self {
        self.hooks.type_meta = Some(T::get_type_meta);
        self
    }

    // -------------------------------------------------------------------------
    // Accessors

    #[inline(always)]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline(always)]
    pub fn type_id(&self) -> TypeId {
        self.ty.id()
    }

    #[inline(always)]
    pub fn type_path(&self) -> &'static str {
        self.ty.path()
    }

    #[inline(always)]
    pub fn type_name(&self) -> &'static str {
        self.ty.name()
    }

    #[inline(always)]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// Returns `true` if this is the info of `T`.
    #[inline]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.ty.is::<T>()
    }

    pub fn generics(&self) -> impl ExactSizeIterator<Item = &'static TypeInfo> + '_ {
        self.generics.iter().map(|f| f())
    }

    pub fn generic_definition(&self) -> Option<&'static str> {
        self.generic_definition
    }

    pub fn implements(&self) -> impl ExactSizeIterator<Item = &'static TypeInfo> + '_ {
        self.implements.iter().map(|f| f())
    }

    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    /// Returns the primitive kind if this is a primitive type.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self.kind {
            TypeKind::Primitive(kind) => Some(kind),
            _ => None,
        }
    }

    /// Interfaces and the dynamic slot cannot be instantiated.
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_) | TypeKind::Dynamic)
    }

    /// Returns `true` if a value of type `self` may be stored where `target` is expected.
    pub fn is_assignable_to(&self, target: &TypeInfo) -> bool {
        if self.type_id() == target.type_id() {
            return true;
        }
        match &target.kind {
            TypeKind::Dynamic => true,
            TypeKind::Interface(info) if info.is_root() => true,
            _ => self.implements().any(|i| i.is_assignable_to(target)),
        }
    }

    // -------------------------------------------------------------------------
    // Hooks

    pub fn has_default(&self) -> bool {
        self.hooks.default.is_some()
    }

    /// Creates a default instance, `None` if the type has no constructor.
    pub fn create_default(&self) -> Option<Box<dyn Reflect>> {
        self.hooks.default.map(|f| f())
    }

    /// Returns the compiled serializer, `None` if none was generated.
    pub fn compiled_serializer(&self) -> Option<Arc<dyn ErasedSerializer>> {
        self.hooks.serializer.map(|f| f())
    }

    /// Returns the generated formatter for `policy`, `None` if none was generated.
    pub fn generated_formatter(&self, policy: &SerializationPolicy) -> Option<Arc<dyn Formatter>> {
        self.hooks.generated_formatter.map(|f| f(policy))
    }

    pub fn has_generated_formatter(&self) -> bool {
        self.hooks.generated_formatter.is_some()
    }

    /// Creates the registry entry of this type.
    pub(crate) fn create_type_meta(&'static self) -> TypeMeta {
        match self.hooks.type_meta {
            Some(type_meta) => type_meta(),
            None => TypeMeta::from_info(self),
        }
    }

    pub(crate) fn invoke_before_serialize(&self, value: &dyn Reflect) {
        if let Some(hook) = self.hooks.before_serialize {
            hook(value);
        }
    }

    pub(crate) fn invoke_after_deserialize(&self, value: &mut dyn Reflect) {
        if let Some(hook) = self.hooks.after_deserialize {
            hook(value);
        }
    }

    /// Describes the generic arguments, recursively, for diagnostics.
    ///
    /// Returns an empty string for non generic types.
    pub fn describe_generics(&self) -> String {
        if self.generics.is_empty() {
            return String::new();
        }
        let arguments = self
            .generics()
            .map(|arg| format!("`{}`{}", arg.type_path(), arg.describe_generics()))
            .collect::<alloc::vec::Vec<_>>()
            .join(", ");
        format!(" (generic arguments: {arguments})")
    }
}

impl PartialEq for TypeInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for TypeInfo {}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("type_path", &self.type_path())
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_path())
    }
}

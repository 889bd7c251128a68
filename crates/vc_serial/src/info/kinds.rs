use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use vc_os::sync::Arc;

use crate::Reflect;
use crate::formatter::Formatter;
use crate::info::{TypeInfo, Typed};
use crate::stream::EntryType;
use crate::value::{Guid, ObjectRef};

// -----------------------------------------------------------------------------
// TypeKind

/// The shape of a type, as far as serialization is concerned.
pub enum TypeKind {
    /// A primitive written as a single entry.
    Primitive(PrimitiveKind),
    /// A field-less enum, written as its discriminant.
    Enum(EnumInfo),
    /// A struct whose members are walked by formatters.
    Struct(StructInfo),
    /// An ordered list with array shape, e.g. `Vec<T>`.
    List(ListInfo),
    /// A generic collection such as `VecDeque<T>` or a set.
    Collection(CollectionInfo),
    /// A key-value map.
    Map(MapInfo),
    /// An optional value type, `Option<T>`.
    Nullable(NullableInfo),
    /// A nullable slot holding a shared object, `Option<Obj<T>>`.
    Reference(ReferenceInfo),
    /// An abstract interface marker such as `dyn Animal`.
    Interface(InterfaceInfo),
    /// The fully dynamic `object` slot, [`AnyValue`](crate::value::AnyValue).
    Dynamic,
    /// A reflected type value, [`TypeRef`](crate::value::TypeRef).
    TypeRef,
    /// Only serializable through a registered formatter, a self formatter or serde.
    Opaque,
}

impl TypeKind {
    /// Returns the kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Primitive(_) => "Primitive",
            Self::Enum(_) => "Enum",
            Self::Struct(_) => "Struct",
            Self::List(_) => "List",
            Self::Collection(_) => "Collection",
            Self::Map(_) => "Map",
            Self::Nullable(_) => "Nullable",
            Self::Reference(_) => "Reference",
            Self::Interface(_) => "Interface",
            Self::Dynamic => "Dynamic",
            Self::TypeRef => "TypeRef",
            Self::Opaque => "Opaque",
        }
    }
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// -----------------------------------------------------------------------------
// PrimitiveKind

/// The closed set of primitive types, each written as exactly one entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
    String,
    Guid,
}

impl PrimitiveKind {
    /// Returns the type info of the Rust type backing this primitive.
    pub fn type_info(self) -> &'static TypeInfo {
        match self {
            Self::Bool => bool::type_info(),
            Self::Char => char::type_info(),
            Self::I8 => i8::type_info(),
            Self::I16 => i16::type_info(),
            Self::I32 => i32::type_info(),
            Self::I64 => i64::type_info(),
            Self::Isize => isize::type_info(),
            Self::U8 => u8::type_info(),
            Self::U16 => u16::type_info(),
            Self::U32 => u32::type_info(),
            Self::U64 => u64::type_info(),
            Self::Usize => usize::type_info(),
            Self::F32 => f32::type_info(),
            Self::F64 => f64::type_info(),
            Self::String => alloc::string::String::type_info(),
            Self::Guid => Guid::type_info(),
        }
    }

    /// The entry kind a value of this primitive is written as.
    pub fn entry_type(self) -> EntryType {
        match self {
            Self::Bool => EntryType::Boolean,
            Self::Char | Self::String => EntryType::String,
            Self::F32 | Self::F64 => EntryType::FloatingPoint,
            Self::Guid => EntryType::Guid,
            _ => EntryType::Integer,
        }
    }

    /// Returns `true` for the integer kinds.
    pub fn is_integer(self) -> bool {
        self.entry_type() == EntryType::Integer
    }

    /// Returns `true` for the kinds that can be stored in a primitive array.
    pub fn is_array_element(self) -> bool {
        !matches!(self, Self::String | Self::Guid)
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// A named discriminant of a field-less enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: &'static str,
    pub value: i64,
}

/// Info of a field-less enum.
pub struct EnumInfo {
    variants: Box<[EnumVariant]>,
    to_value: fn(&dyn Reflect) -> Option<i64>,
    from_value: fn(i64) -> Option<Box<dyn Reflect>>,
}

impl EnumInfo {
    pub fn new(
        variants: &[EnumVariant],
        to_value: fn(&dyn Reflect) -> Option<i64>,
        from_value: fn(i64) -> Option<Box<dyn Reflect>>,
    ) -> Self {
        Self {
            variants: variants.into(),
            to_value,
            from_value,
        }
    }

    pub fn variants(&self) -> &[EnumVariant] {
        &self.variants
    }

    /// Returns the discriminant of `value`, `None` if it is not of this enum.
    pub fn to_value(&self, value: &dyn Reflect) -> Option<i64> {
        (self.to_value)(value)
    }

    /// Builds the variant with discriminant `value`, `None` if there is none.
    pub fn from_value(&self, value: i64) -> Option<Box<dyn Reflect>> {
        (self.from_value)(value)
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// Explicit serialization marker of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum FieldMarker {
    #[default]
    None,
    /// Serialize even if the field is private.
    Serialize,
    /// Never serialize.
    Skip,
}

/// A serializable member of a struct.
pub struct FieldInfo {
    name: &'static str,
    type_info: fn() -> &'static TypeInfo,
    public: bool,
    marker: FieldMarker,
    get: fn(&dyn Reflect) -> &dyn Reflect,
    get_mut: fn(&mut dyn Reflect) -> &mut dyn Reflect,
}

impl FieldInfo {
    /// Creates a field of type `T`.
    ///
    /// `get` and `get_mut` project the owning struct onto the field; they may
    /// panic if handed a value of another type.
    pub fn new<T: Typed>(
        name: &'static str,
        get: fn(&dyn Reflect) -> &dyn Reflect,
        get_mut: fn(&mut dyn Reflect) -> &mut dyn Reflect,
    ) -> Self {
        Self {
            name,
            type_info: T::type_info,
            public: false,
            marker: FieldMarker::None,
            get,
            get_mut,
        }
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_marker(mut self, marker: FieldMarker) -> Self {
        self.marker = marker;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    #[inline]
    pub fn marker(&self) -> FieldMarker {
        self.marker
    }

    #[inline]
    pub fn get<'a>(&self, owner: &'a dyn Reflect) -> &'a dyn Reflect {
        (self.get)(owner)
    }

    #[inline]
    pub fn get_mut<'a>(&self, owner: &'a mut dyn Reflect) -> &'a mut dyn Reflect {
        (self.get_mut)(owner)
    }
}

/// Info of a struct with named, positional or no members.
pub struct StructInfo {
    fields: Box<[FieldInfo]>,
}

impl StructInfo {
    pub fn new(fields: Vec<FieldInfo>) -> Self {
        Self {
            fields: fields.into_boxed_slice(),
        }
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|field| field.name == name)
    }
}

// -----------------------------------------------------------------------------
// Containers

/// Info of an ordered list with array shape.
pub struct ListInfo {
    item: fn() -> &'static TypeInfo,
    len: fn(&dyn Reflect) -> usize,
    get: fn(&dyn Reflect, usize) -> Option<&dyn Reflect>,
    push: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>,
    typed_formatter: Option<fn() -> Arc<dyn Formatter>>,
}

impl ListInfo {
    pub fn new<T: Typed>(
        len: fn(&dyn Reflect) -> usize,
        get: fn(&dyn Reflect, usize) -> Option<&dyn Reflect>,
        push: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>,
    ) -> Self {
        Self {
            item: T::type_info,
            len,
            get,
            push,
            typed_formatter: None,
        }
    }

    /// Attaches the monomorphized formatter for this list type.
    pub fn with_typed_formatter(mut self, formatter: fn() -> Arc<dyn Formatter>) -> Self {
        self.typed_formatter = Some(formatter);
        self
    }

    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }

    pub fn len(&self, list: &dyn Reflect) -> usize {
        (self.len)(list)
    }

    pub fn get<'a>(&self, list: &'a dyn Reflect, index: usize) -> Option<&'a dyn Reflect> {
        (self.get)(list, index)
    }

    /// Appends `item`, handing it back if it has the wrong type.
    pub fn push(&self, list: &mut dyn Reflect, item: Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>> {
        (self.push)(list, item)
    }

    pub fn typed_formatter(&self) -> Option<Arc<dyn Formatter>> {
        self.typed_formatter.map(|f| f())
    }
}

/// Info of a generic collection: a sequence that is not an array.
pub struct CollectionInfo {
    item: fn() -> &'static TypeInfo,
    len: fn(&dyn Reflect) -> usize,
    iter: fn(&dyn Reflect) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>,
    insert: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>,
}

impl CollectionInfo {
    pub fn new<T: Typed>(
        len: fn(&dyn Reflect) -> usize,
        iter: fn(&dyn Reflect) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>,
        insert: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<(), Box<dyn Reflect>>,
    ) -> Self {
        Self {
            item: T::type_info,
            len,
            iter,
            insert,
        }
    }

    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }

    pub fn len(&self, collection: &dyn Reflect) -> usize {
        (self.len)(collection)
    }

    pub fn iter<'a>(&self, collection: &'a dyn Reflect) -> Box<dyn Iterator<Item = &'a dyn Reflect> + 'a> {
        (self.iter)(collection)
    }

    /// Adds `item`, handing it back if it has the wrong type.
    pub fn insert(
        &self,
        collection: &mut dyn Reflect,
        item: Box<dyn Reflect>,
    ) -> Result<(), Box<dyn Reflect>> {
        (self.insert)(collection, item)
    }
}

/// Info of a key-value map.
pub struct MapInfo {
    key: fn() -> &'static TypeInfo,
    value: fn() -> &'static TypeInfo,
    len: fn(&dyn Reflect) -> usize,
    iter: fn(&dyn Reflect) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>,
    insert: fn(&mut dyn Reflect, Box<dyn Reflect>, Box<dyn Reflect>) -> bool,
}

impl MapInfo {
    pub fn new<K: Typed, V: Typed>(
        len: fn(&dyn Reflect) -> usize,
        iter: fn(&dyn Reflect) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>,
        insert: fn(&mut dyn Reflect, Box<dyn Reflect>, Box<dyn Reflect>) -> bool,
    ) -> Self {
        Self {
            key: K::type_info,
            value: V::type_info,
            len,
            iter,
            insert,
        }
    }

    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }

    pub fn len(&self, map: &dyn Reflect) -> usize {
        (self.len)(map)
    }

    pub fn iter<'a>(
        &self,
        map: &'a dyn Reflect,
    ) -> Box<dyn Iterator<Item = (&'a dyn Reflect, &'a dyn Reflect)> + 'a> {
        (self.iter)(map)
    }

    /// Inserts a pair, returns `false` if either half has the wrong type.
    pub fn insert(&self, map: &mut dyn Reflect, key: Box<dyn Reflect>, value: Box<dyn Reflect>) -> bool {
        (self.insert)(map, key, value)
    }
}

/// Info of `Option<T>` where `T` is a value type.
pub struct NullableInfo {
    inner: fn() -> &'static TypeInfo,
    get: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    set: fn(&mut dyn Reflect, Box<dyn Reflect>) -> bool,
}

impl NullableInfo {
    pub fn new<T: Typed>(
        get: fn(&dyn Reflect) -> Option<&dyn Reflect>,
        set: fn(&mut dyn Reflect, Box<dyn Reflect>) -> bool,
    ) -> Self {
        Self {
            inner: T::type_info,
            get,
            set,
        }
    }

    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    pub fn get<'a>(&self, nullable: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        (self.get)(nullable)
    }

    /// Stores `Some(value)`, returns `false` if `value` has the wrong type.
    pub fn set(&self, nullable: &mut dyn Reflect, value: Box<dyn Reflect>) -> bool {
        (self.set)(nullable, value)
    }
}

/// Info of a reference slot `Option<Obj<T>>`.
pub struct ReferenceInfo {
    target: fn() -> &'static TypeInfo,
    get: fn(&dyn Reflect) -> Option<ObjectRef>,
    set: fn(&mut dyn Reflect, Option<ObjectRef>) -> bool,
}

impl ReferenceInfo {
    pub fn new<T: Typed + ?Sized>(
        get: fn(&dyn Reflect) -> Option<ObjectRef>,
        set: fn(&mut dyn Reflect, Option<ObjectRef>) -> bool,
    ) -> Self {
        Self {
            target: T::type_info,
            get,
            set,
        }
    }

    /// The declared type of objects this slot may hold.
    pub fn target(&self) -> &'static TypeInfo {
        (self.target)()
    }

    pub fn get(&self, slot: &dyn Reflect) -> Option<ObjectRef> {
        (self.get)(slot)
    }

    /// Stores `object`, returns `false` if its type is not assignable to the target.
    pub fn set(&self, slot: &mut dyn Reflect, object: Option<ObjectRef>) -> bool {
        (self.set)(slot, object)
    }
}

/// Info of an interface marker type.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterfaceInfo {
    root: bool,
}

impl InterfaceInfo {
    pub const fn new() -> Self {
        Self { root: false }
    }

    /// The root interface every type is assignable to.
    pub const fn root() -> Self {
        Self { root: true }
    }

    pub const fn is_root(&self) -> bool {
        self.root
    }
}

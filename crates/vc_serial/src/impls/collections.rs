use alloc::boxed::Box;
use alloc::collections::{BTreeMap, BTreeSet, VecDeque};
use alloc::vec::Vec;
use core::hash::Hash;
use std::collections::{HashMap, HashSet};

use crate::formatter::array_formatter;
use crate::impls::{BTREE_MAP_DEFINITION, HASH_MAP_DEFINITION, VEC_DEFINITION, impl_generic_type_path};
use crate::info::{CollectionInfo, GenericTypeInfoCell, ListInfo, MapInfo, TypeInfo, TypeKind, Typed};
use crate::registry::GetTypeMeta;
use crate::{Reflect, Serial};

// -----------------------------------------------------------------------------
// Vec

impl_generic_type_path!(Vec<T>, "alloc::vec", "Vec");

impl<T: Serial> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let info = ListInfo::new::<T>(
                |list| list.downcast_ref::<Self>().map_or(0, Vec::len),
                |list, index| {
                    let item = list.downcast_ref::<Self>()?.get(index)?;
                    Some(item as &dyn Reflect)
                },
                |list, item| {
                    let item = item.take::<T>()?;
                    match list.downcast_mut::<Self>() {
                        Some(list) => {
                            list.push(item);
                            Ok(())
                        }
                        None => Err(Box::new(item)),
                    }
                },
            )
            .with_typed_formatter(array_formatter::<T>);
            TypeInfo::new::<Self>(TypeKind::List(info))
                .with_generics(&[T::type_info])
                .with_generic_definition(VEC_DEFINITION)
                .with_default::<Self>()
                .with_serializer::<Self>()
        })
    }
}

impl<T: Serial> Serial for Vec<T> {}

impl<T: Serial> GetTypeMeta for Vec<T> {}

// -----------------------------------------------------------------------------
// Collections

macro_rules! impl_collection {
    ($ty:ident, $module:literal, $name:literal, $insert:ident, [$($bound:tt)*]) => {
        impl_generic_type_path!($ty<T>, $module, $name);

        impl<T: Serial $($bound)*> Typed for $ty<T> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let info = CollectionInfo::new::<T>(
                        |collection| collection.downcast_ref::<Self>().map_or(0, $ty::len),
                        |collection| {
                            let items = collection.downcast_ref::<Self>().into_iter().flatten();
                            Box::new(items.map(|item| item as &dyn Reflect))
                        },
                        |collection, item| {
                            let item = item.take::<T>()?;
                            match collection.downcast_mut::<Self>() {
                                Some(collection) => {
                                    collection.$insert(item);
                                    Ok(())
                                }
                                None => Err(Box::new(item)),
                            }
                        },
                    );
                    TypeInfo::new::<Self>(TypeKind::Collection(info))
                        .with_generics(&[T::type_info])
                        .with_generic_definition(concat!($module, "::", $name))
                        .with_default::<Self>()
                        .with_serializer::<Self>()
                })
            }
        }

        impl<T: Serial $($bound)*> Serial for $ty<T> {}

        impl<T: Serial $($bound)*> GetTypeMeta for $ty<T> {}
    };
}

impl_collection!(VecDeque, "alloc::collections", "VecDeque", push_back, []);
impl_collection!(BTreeSet, "alloc::collections", "BTreeSet", insert, [+ Ord]);
impl_collection!(HashSet, "std::collections", "HashSet", insert, [+ Eq + Hash]);

// -----------------------------------------------------------------------------
// Maps

macro_rules! impl_map {
    ($ty:ident, $module:literal, $name:literal, $definition:ident, [$($bound:tt)*]) => {
        impl_generic_type_path!($ty<K, V>, $module, $name);

        impl<K: Serial $($bound)*, V: Serial> Typed for $ty<K, V> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| {
                    let info = MapInfo::new::<K, V>(
                        |map| map.downcast_ref::<Self>().map_or(0, $ty::len),
                        |map| {
                            let pairs = map.downcast_ref::<Self>().into_iter().flatten();
                            Box::new(pairs.map(|(k, v)| (k as &dyn Reflect, v as &dyn Reflect)))
                        },
                        |map, key, value| {
                            let (Ok(key), Ok(value)) = (key.take::<K>(), value.take::<V>()) else {
                                return false;
                            };
                            match map.downcast_mut::<Self>() {
                                Some(map) => {
                                    map.insert(key, value);
                                    true
                                }
                                None => false,
                            }
                        },
                    );
                    TypeInfo::new::<Self>(TypeKind::Map(info))
                        .with_generics(&[K::type_info, V::type_info])
                        .with_generic_definition($definition)
                        .with_default::<Self>()
                        .with_serializer::<Self>()
                })
            }
        }

        impl<K: Serial $($bound)*, V: Serial> Serial for $ty<K, V> {}

        impl<K: Serial $($bound)*, V: Serial> GetTypeMeta for $ty<K, V> {}
    };
}

impl_map!(BTreeMap, "alloc::collections", "BTreeMap", BTREE_MAP_DEFINITION, [+ Ord]);
impl_map!(HashMap, "std::collections", "HashMap", HASH_MAP_DEFINITION, [+ Eq + Hash]);

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::collections::BTreeSet;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::collections::HashMap;

    use crate::impls::HASH_MAP_DEFINITION;
    use crate::info::{TypeKind, TypePath, Typed};

    #[test]
    fn generic_paths() {
        assert_eq!(<Vec<i32>>::type_path(), "alloc::vec::Vec<i32>");
        assert_eq!(<Vec<i32>>::type_name(), "Vec<i32>");
        assert_eq!(
            <HashMap<u8, Vec<bool>>>::type_path(),
            "std::collections::HashMap<u8, alloc::vec::Vec<bool>>"
        );
        assert_eq!(
            <HashMap<u8, bool>>::type_info().generic_definition(),
            Some(HASH_MAP_DEFINITION)
        );
    }

    #[test]
    fn list_access_through_info() {
        let TypeKind::List(info) = <Vec<u8>>::type_info().kind() else {
            panic!("`Vec` is a list");
        };
        let mut list = vec![1_u8, 2];
        assert_eq!(info.len(&list), 2);
        assert!(info.push(&mut list, Box::new(3_u8)).is_ok());
        assert!(info.push(&mut list, Box::new(7_i32)).is_err());
        assert_eq!(list, [1, 2, 3]);
        assert_eq!(info.get(&list, 2).and_then(|v| v.downcast_ref::<u8>()), Some(&3));
    }

    #[test]
    fn collection_and_map_access_through_info() {
        let TypeKind::Collection(info) = <BTreeSet<i64>>::type_info().kind() else {
            panic!("`BTreeSet` is a collection");
        };
        let mut set = BTreeSet::<i64>::new();
        assert!(info.insert(&mut set, Box::new(5_i64)).is_ok());
        assert_eq!(info.iter(&set).count(), 1);

        let TypeKind::Map(info) = <HashMap<u8, bool>>::type_info().kind() else {
            panic!("`HashMap` is a map");
        };
        let mut map = HashMap::<u8, bool>::new();
        assert!(info.insert(&mut map, Box::new(1_u8), Box::new(true)));
        assert!(!info.insert(&mut map, Box::new(true), Box::new(1_u8)));
        assert_eq!(map.get(&1), Some(&true));
        let pairs: Vec<_> = info.iter(&map).collect();
        assert_eq!(pairs.len(), 1);
    }
}

//! Object graphs: identity, cycles, skipping and failure handling.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use vc_serial::context::{DefaultTypeBinder, DeserializationContext, SerializationConfig, SerializationContext};
use vc_serial::info::{FieldInfo, NonGenericTypeInfoCell, StructInfo, TypeInfo, TypeKind};
use vc_serial::info::{TypePath, Typed};
use vc_serial::registry::{TypeRegistry, TypeRegistryArc};
use vc_serial::serializer::SerializationCallbacks;
use vc_serial::stream::{DataReader, DataWriter, IntegerValue, Token, TokenReader, TokenWriter};
use vc_serial::utility::{deserialize_value, from_bytes, from_tokens, serialize_value, to_bytes, to_tokens};
use vc_serial::value::{AnyValue, Obj};
use vc_serial::{Reflect, Serial};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Serial, Default, Debug)]
struct TreeNode {
    pub id: i32,
    pub name: String,
    pub children: Vec<Option<Obj<TreeNode>>>,
}

fn tree_node(id: i32, name: &str, children: Vec<Option<Obj<TreeNode>>>) -> Obj<TreeNode> {
    Obj::new(TreeNode {
        id,
        name: name.into(),
        children,
    })
}

fn sample_tree() -> Obj<TreeNode> {
    tree_node(
        1,
        "root",
        vec![
            Some(tree_node(2, "a", Vec::new())),
            Some(tree_node(3, "b", Vec::new())),
        ],
    )
}

fn assert_same_tree(left: &Obj<TreeNode>, right: &Obj<TreeNode>) {
    let left = left.borrow();
    let right = right.borrow();
    assert_eq!(left.id, right.id);
    assert_eq!(left.name, right.name);
    assert_eq!(left.children.len(), right.children.len());
    for (l, r) in left.children.iter().zip(&right.children) {
        match (l, r) {
            (Some(l), Some(r)) => assert_same_tree(l, r),
            (None, None) => {}
            _ => panic!("child presence differs"),
        }
    }
}

#[derive(Serial, Default, Debug)]
struct Item {
    pub label: String,
}

#[derive(Serial, Default, Debug)]
struct Holder {
    pub first: Option<Obj<Item>>,
    pub second: Option<Obj<Item>>,
}

#[derive(Serial, Default, Debug)]
struct Link {
    pub name: String,
    pub next: Option<Obj<Link>>,
}

// -----------------------------------------------------------------------------
// Round trips

#[test]
fn tree_gets_ids_in_traversal_order() {
    let root = Some(sample_tree());

    let mut writer = TokenWriter::new(SerializationContext::default());
    serialize_value(&root, &mut writer).unwrap();
    assert_eq!(writer.context().internal_reference_count(), 3);
    let tokens = writer.into_tokens();

    let ids: Vec<i32> = tokens
        .iter()
        .filter_map(|token| match token {
            Token::StartOfNode { id, .. } if *id >= 0 => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, [0, 1, 2]);

    let mut reader = TokenReader::new(&tokens, DeserializationContext::default());
    let read: Option<Obj<TreeNode>> = deserialize_value(&mut reader).unwrap();
    assert_eq!(reader.context().internal_reference_count(), 3);
    assert!(reader.is_exhausted());
    assert_same_tree(root.as_ref().unwrap(), read.as_ref().unwrap());
}

#[test]
fn tree_round_trips_through_bytes() {
    let root = Some(sample_tree());
    let bytes = to_bytes(&root, SerializationContext::default()).unwrap();
    let read: Option<Obj<TreeNode>> = from_bytes(&bytes, DeserializationContext::default()).unwrap();
    assert_same_tree(root.as_ref().unwrap(), read.as_ref().unwrap());
}

#[test]
fn shared_objects_stay_shared() {
    let item = Obj::new(Item {
        label: "shared".into(),
    });
    let holder = Holder {
        first: Some(item.clone()),
        second: Some(item),
    };

    let tokens = to_tokens(&holder, SerializationContext::default()).unwrap();
    assert!(
        tokens
            .iter()
            .any(|token| matches!(token, Token::InternalReference { id: 0, .. }))
    );
    let read: Holder = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    let (first, second) = (read.first.unwrap(), read.second.unwrap());
    assert!(first.ptr_eq(&second));
    assert_eq!(first.borrow().label, "shared");

    let bytes = to_bytes(&holder, SerializationContext::default()).unwrap();
    let read: Holder = from_bytes(&bytes, DeserializationContext::default()).unwrap();
    assert!(read.first.unwrap().ptr_eq(&read.second.unwrap()));
}

#[test]
fn cycles_are_preserved() {
    let a = Obj::new(Link {
        name: "a".into(),
        next: None,
    });
    let b = Obj::new(Link {
        name: "b".into(),
        next: Some(a.clone()),
    });
    a.borrow_mut().next = Some(b.clone());

    let tokens = to_tokens(&Some(a.clone()), SerializationContext::default()).unwrap();
    // Break the cycle so the fixture is freed.
    a.borrow_mut().next = None;

    let read: Option<Obj<Link>> = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    let a = read.unwrap();
    let b = a.borrow().next.clone().unwrap();
    assert_eq!(b.borrow().name, "b");
    let back = b.borrow().next.clone().unwrap();
    assert!(back.ptr_eq(&a));
    assert_eq!(back.borrow().name, "a");

    a.borrow_mut().next = None;
}

// -----------------------------------------------------------------------------
// Callbacks

static BEFORE_SERIALIZE: AtomicUsize = AtomicUsize::new(0);
static AFTER_DESERIALIZE: AtomicUsize = AtomicUsize::new(0);

#[derive(Serial, Default, Debug)]
#[serial(callbacks)]
struct Counted {
    pub value: u32,
}

impl SerializationCallbacks for Counted {
    fn on_before_serialize(&self) {
        BEFORE_SERIALIZE.fetch_add(1, Ordering::SeqCst);
    }

    fn on_after_deserialize(&mut self) {
        AFTER_DESERIALIZE.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Serial, Default, Debug)]
struct ManyRefs {
    pub a: Option<Obj<Counted>>,
    pub b: Option<Obj<Counted>>,
    pub list: Vec<Option<Obj<Counted>>>,
}

#[test]
fn each_object_is_written_once() {
    let counted = Obj::new(Counted { value: 7 });
    let value = ManyRefs {
        a: Some(counted.clone()),
        b: Some(counted.clone()),
        list: vec![Some(counted.clone()), Some(counted)],
    };

    let mut writer = TokenWriter::new(SerializationContext::default());
    serialize_value(&value, &mut writer).unwrap();
    assert_eq!(BEFORE_SERIALIZE.load(Ordering::SeqCst), 1);
    assert_eq!(writer.context().internal_reference_count(), 1);

    let tokens = writer.into_tokens();
    let full_writes = tokens
        .iter()
        .filter(|token| matches!(token, Token::StartOfNode { id, .. } if *id >= 0))
        .count();
    assert_eq!(full_writes, 1);

    let read: ManyRefs = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(AFTER_DESERIALIZE.load(Ordering::SeqCst), 1);
    let a = read.a.unwrap();
    assert_eq!(a.borrow().value, 7);
    assert!(read.list.iter().all(|item| item.as_ref().unwrap().ptr_eq(&a)));
}

// -----------------------------------------------------------------------------
// Skipping

/// Written in place of a [`Holder`] by a process that knows `Ghost`.
#[derive(Serial, Default, Debug)]
struct Smuggler {
    pub first: Option<Obj<dyn Reflect>>,
    pub second: Option<Obj<Item>>,
}

#[derive(Serial, Default, Debug)]
struct Ghost {
    pub power: i32,
    pub cargo: Option<Obj<Item>>,
}

fn smuggler() -> Smuggler {
    let item = Obj::new(Item {
        label: "nested".into(),
    });
    Smuggler {
        first: Obj::new(Ghost {
            power: 3,
            cargo: Some(item.clone()),
        })
        .cast::<dyn Reflect>(),
        second: Some(item),
    }
}

fn smuggled_tokens() -> Vec<Token> {
    to_tokens(&smuggler(), SerializationContext::default()).unwrap()
}

/// Reads with a binder that knows `Item` but not `Ghost`.
fn reading_without_ghost() -> (Arc<common::CountingLogger>, DeserializationContext) {
    let mut registry = TypeRegistry::new();
    registry.register::<Item>();
    let (logger, config) = common::counting_config();
    let binder = DefaultTypeBinder::with_registry(TypeRegistryArc::new(registry));
    (logger, common::reading(config.with_binder(Arc::new(binder))))
}

#[test]
fn skipped_node_keeps_nested_ids() {
    let tokens = smuggled_tokens();
    // The nested object has the slot's exact type and still declares it.
    assert!(tokens.contains(&Token::StartOfNode {
        name: Some("cargo".into()),
        type_name: Some(Item::type_path().into()),
        id: 1,
    }));
    assert!(tokens.contains(&Token::InternalReference {
        name: Some("second".into()),
        id: 1,
    }));

    let (logger, context) = reading_without_ghost();
    let mut reader = TokenReader::new(&tokens, context);
    let holder: Holder = deserialize_value(&mut reader).unwrap();
    assert!(reader.is_exhausted());

    assert!(holder.first.is_none());
    assert_eq!(holder.second.unwrap().borrow().label, "nested");
    // The discarded node still occupies its id.
    assert!(reader.context().has_internal_reference(0));
    assert!(reader.context().internal_reference(0).is_none());
    assert!(!logger.warnings().is_empty());
}

#[test]
fn skipped_node_keeps_nested_ids_in_binary() {
    let bytes = to_bytes(&smuggler(), SerializationContext::default()).unwrap();
    let read: Holder = from_bytes(&bytes, reading_without_ghost().1).unwrap();
    assert!(read.first.is_none());
    assert_eq!(read.second.unwrap().borrow().label, "nested");
}

#[test]
fn unknown_members_are_skipped() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::Boolean {
            name: Some("retired".into()),
            value: true,
        },
        Token::String {
            name: Some("label".into()),
            value: "kept".into(),
        },
        Token::EndOfNode,
    ];

    let (logger, config) = common::counting_config();
    let item: Item = from_tokens(&tokens, common::reading(config)).unwrap();
    assert_eq!(item.label, "kept");
    let warnings = logger.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("retired"));
}

// -----------------------------------------------------------------------------
// Mismatches

#[derive(Serial, Default, Debug, PartialEq)]
struct Stats {
    pub count: i32,
    pub label: String,
}

#[test]
fn type_mismatch_degrades_with_one_warning() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::String {
            name: Some("count".into()),
            value: "many".into(),
        },
        Token::String {
            name: Some("label".into()),
            value: "ok".into(),
        },
        Token::EndOfNode,
    ];

    let (logger, config) = common::counting_config();
    let stats: Stats = from_tokens(&tokens, common::reading(config)).unwrap();
    assert_eq!(
        stats,
        Stats {
            count: 0,
            label: "ok".into()
        }
    );
    assert_eq!(logger.warnings().len(), 1);
    assert!(logger.errors().is_empty());
}

#[test]
fn numbers_convert_between_integer_and_float() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::FloatingPoint {
            name: Some("count".into()),
            value: 12.0,
        },
        Token::EndOfNode,
    ];

    let (logger, config) = common::counting_config();
    let stats: Stats = from_tokens(&tokens, common::reading(config)).unwrap();
    assert_eq!(stats.count, 12);
    assert!(logger.warnings().is_empty());
}

#[derive(Serial, Default, Debug)]
struct Outer {
    pub stats: Stats,
    pub tail: u8,
}

#[test]
fn null_where_a_value_node_is_expected() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::Null {
            name: Some("stats".into()),
        },
        Token::Integer {
            name: Some("tail".into()),
            value: IntegerValue::Unsigned(9),
        },
        Token::EndOfNode,
    ];

    let (logger, config) = common::counting_config();
    let outer: Outer = from_tokens(&tokens, common::reading(config)).unwrap();
    assert_eq!(outer.stats, Stats::default());
    assert_eq!(outer.tail, 9);
    assert_eq!(logger.warnings().len(), 1);
}

// -----------------------------------------------------------------------------
// Abort

// A hand-written type without a compiled serializer.
#[derive(Default)]
struct Raw;

impl TypePath for Raw {
    fn type_path() -> &'static str {
        "graph::Raw"
    }

    fn type_name() -> &'static str {
        "Raw"
    }
}

impl Typed for Raw {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::new::<Self>(TypeKind::Struct(StructInfo::new(Vec::new())))
                .with_serializable(true)
                .with_default::<Self>()
        })
    }
}

#[derive(Default)]
struct RawHolder {
    raw: Raw,
}

fn raw_of(owner: &dyn Reflect) -> &dyn Reflect {
    &owner.downcast_ref::<RawHolder>().unwrap().raw
}

fn raw_of_mut(owner: &mut dyn Reflect) -> &mut dyn Reflect {
    &mut owner.downcast_mut::<RawHolder>().unwrap().raw
}

impl TypePath for RawHolder {
    fn type_path() -> &'static str {
        "graph::RawHolder"
    }

    fn type_name() -> &'static str {
        "RawHolder"
    }
}

impl Typed for RawHolder {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            let raw = FieldInfo::new::<Raw>("raw", raw_of, raw_of_mut).with_public(true);
            TypeInfo::new::<Self>(TypeKind::Struct(StructInfo::new(vec![raw])))
                .with_serializable(true)
                .with_default::<Self>()
        })
    }
}

#[derive(Serial, Default)]
struct Envelope {
    pub label: String,
    pub payload: AnyValue,
}

#[test]
fn abort_leaves_nodes_open() {
    let envelope = Envelope {
        label: "outer".into(),
        payload: AnyValue::Value(Box::new(RawHolder::default())),
    };
    let config = SerializationConfig::default().with_allow_weak_fallback(false);
    let mut writer = TokenWriter::new(common::writing(config));

    let error = serialize_value(&envelope, &mut writer).unwrap_err();
    assert!(error.is_abort());
    assert!(error.to_string().contains("graph::Raw"));

    // Neither the envelope node nor the payload node was closed.
    assert_eq!(writer.nodes().depth(), 2);
    assert!(
        !writer
            .tokens()
            .iter()
            .any(|token| matches!(token, Token::EndOfNode))
    );
}

#[test]
fn weak_fallback_handles_the_same_graph() {
    let envelope = Envelope {
        label: "outer".into(),
        payload: AnyValue::Value(Box::new(RawHolder::default())),
    };

    let tokens = to_tokens(&envelope, SerializationContext::default()).unwrap();
    let read: Envelope = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.label, "outer");
    assert_eq!(
        read.payload.value_type_info().map(TypeInfo::type_path),
        Some("graph::RawHolder")
    );
}

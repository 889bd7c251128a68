//! Runtime types in reference and dynamic slots, and cast recovery.

mod common;

use std::sync::Arc;

use vc_serial::context::{DefaultTypeBinder, DeserializationContext};
use vc_serial::context::{SerializationContext, SerializationPolicy};
use vc_serial::info::{TypePath, Typed};
use vc_serial::registry::{TypeRegistry, TypeRegistryArc};
use vc_serial::stream::{IntegerValue, Token};
use vc_serial::utility::{from_tokens, to_tokens};
use vc_serial::value::{AnyValue, Obj, ObjectRef, PrimitiveValue};
use vc_serial::{Reflect, Serial};

// -----------------------------------------------------------------------------
// Fixtures

pub trait Animal {}

vc_serial::impl_interface!(dyn Animal, "zoo::Animal");

#[derive(Serial, Default, Debug)]
#[serial(implements(dyn Animal))]
struct Dog {
    pub name: String,
    pub good: bool,
}

impl Animal for Dog {}

#[derive(Serial, Default, Debug)]
#[serial(implements(dyn Animal))]
struct Cat {
    pub name: String,
    pub lives: u8,
}

impl Animal for Cat {}

#[derive(Serial, Default, Debug)]
struct Keeper {
    pub name: String,
}

#[derive(Serial, Default, Debug)]
struct Zoo {
    pub name: String,
    pub star: Option<Obj<dyn Animal>>,
    pub residents: Vec<Option<Obj<dyn Animal>>>,
    pub keeper: Option<Obj<Keeper>>,
}

fn sample_zoo() -> Zoo {
    let dog = Obj::new(Dog {
        name: "Rex".into(),
        good: true,
    })
    .cast::<dyn Animal>()
    .unwrap();
    let cat = Obj::new(Cat {
        name: "Tom".into(),
        lives: 9,
    })
    .cast::<dyn Animal>()
    .unwrap();
    Zoo {
        name: "city zoo".into(),
        star: Some(dog.clone()),
        residents: vec![Some(cat), Some(dog)],
        keeper: Some(Obj::new(Keeper {
            name: "Ann".into(),
        })),
    }
}

// -----------------------------------------------------------------------------
// Interfaces

#[test]
fn interface_slots_keep_the_runtime_type() {
    assert!(Dog::type_info().is_assignable_to(<dyn Animal>::type_info()));
    assert!(!Keeper::type_info().is_assignable_to(<dyn Animal>::type_info()));

    let zoo = sample_zoo();
    let tokens = to_tokens(&zoo, SerializationContext::default()).unwrap();
    assert!(tokens.iter().any(|token| matches!(
        token,
        Token::StartOfNode { name: Some(name), type_name: Some(type_name), .. }
            if name == "star" && type_name == Dog::type_path()
    )));
    // Reference nodes carry their type even when it is the declared one.
    assert!(tokens.iter().any(|token| matches!(
        token,
        Token::StartOfNode { name: Some(name), type_name: Some(type_name), .. }
            if name == "keeper" && type_name == Keeper::type_path()
    )));

    let read: Zoo = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    let star = read.star.unwrap();
    let dog = star.cast::<Dog>().unwrap();
    assert_eq!(dog.borrow().name, "Rex");
    assert!(dog.borrow().good);

    let cat = read.residents[0].as_ref().unwrap().cast::<Cat>().unwrap();
    assert_eq!(cat.borrow().lives, 9);
    assert!(read.residents[1].as_ref().unwrap().ptr_eq(&star));
    assert_eq!(read.keeper.unwrap().borrow().name, "Ann");
}

#[test]
fn unknown_runtime_type_reads_as_null() {
    let tokens = to_tokens(&sample_zoo(), SerializationContext::default()).unwrap();

    // A binder that knows nothing but the primitives.
    let binder = DefaultTypeBinder::with_registry(TypeRegistryArc::new(TypeRegistry::new()));
    let (logger, config) = common::counting_config();
    let config = config.with_binder(Arc::new(binder));

    let read: Zoo = from_tokens(&tokens, common::reading(config)).unwrap();
    assert_eq!(read.name, "city zoo");
    assert!(read.star.is_none());
    assert_eq!(read.residents.len(), 2);
    assert!(read.residents.iter().all(Option::is_none));
    // The keeper node names exactly its slot's type.
    assert_eq!(read.keeper.unwrap().borrow().name, "Ann");
    assert!(
        logger
            .warnings()
            .iter()
            .any(|warning| warning.contains("Value lost"))
    );
}

// -----------------------------------------------------------------------------
// Cast recovery

#[derive(Serial, Default, Debug)]
struct Celsius {
    pub degrees: f64,
}

#[derive(Serial, Default, Debug)]
struct Kelvin {
    pub degrees: f64,
}

impl From<Celsius> for Kelvin {
    fn from(value: Celsius) -> Self {
        Self {
            degrees: value.degrees + 273.15,
        }
    }
}

#[derive(Serial, Default, Debug)]
struct Fahrenheit {
    pub degrees: f64,
}

#[derive(Serial, Default)]
struct LooseProbe {
    pub reading: Option<Obj<dyn Reflect>>,
}

#[derive(Serial, Default)]
struct KelvinProbe {
    pub reading: Option<Obj<Kelvin>>,
}

#[derive(Serial, Default)]
struct CelsiusProbe {
    pub reading: Option<Obj<Celsius>>,
}

fn loose_probe<T: Typed>(value: T) -> Vec<Token> {
    let probe = LooseProbe {
        reading: Obj::new(value).cast::<dyn Reflect>(),
    };
    to_tokens(&probe, SerializationContext::default()).unwrap()
}

#[test]
fn registered_conversions_recover_casts() {
    TypeRegistryArc::global()
        .write()
        .register_conversion::<Celsius, Kelvin>();

    let tokens = loose_probe(Celsius { degrees: 20.0 });
    let (logger, config) = common::counting_config();
    let read: KelvinProbe = from_tokens(&tokens, common::reading(config)).unwrap();

    let kelvin = read.reading.unwrap();
    assert!((kelvin.borrow().degrees - 293.15).abs() < 1e-9);
    assert!(logger.warnings().is_empty());
}

#[test]
fn incompatible_types_are_dropped_by_default() {
    let tokens = loose_probe(Fahrenheit { degrees: 451.0 });
    let (logger, config) = common::counting_config();
    let read: CelsiusProbe = from_tokens(&tokens, common::reading(config)).unwrap();

    assert!(read.reading.is_none());
    let warnings = logger.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("Value lost"));
}

#[test]
fn invalid_data_policy_reads_members_by_name() {
    let tokens = loose_probe(Fahrenheit { degrees: 451.0 });
    let (logger, config) = common::counting_config();
    let config = config.with_policy(SerializationPolicy::everything());
    let read: CelsiusProbe = from_tokens(&tokens, common::reading(config)).unwrap();

    assert_eq!(read.reading.unwrap().borrow().degrees, 451.0);
    assert_eq!(logger.warnings().len(), 1);
}

// -----------------------------------------------------------------------------
// Dynamic slots

#[derive(Serial, Default, Debug, Clone, Copy, PartialEq)]
enum Mood {
    #[default]
    Calm,
    Angry = 5,
}

#[derive(Serial, Default, Debug)]
struct Bag {
    pub items: Vec<AnyValue>,
}

#[test]
fn dynamic_slots_hold_anything() {
    let shared = ObjectRef::from_value(Keeper {
        name: "shared".into(),
    });
    let bag = Bag {
        items: vec![
            AnyValue::Null,
            AnyValue::Primitive(PrimitiveValue::I32(5)),
            AnyValue::Primitive(PrimitiveValue::String("hi".into())),
            AnyValue::Value(Box::new(Mood::Angry)),
            AnyValue::Value(Box::new(Keeper {
                name: "boxed".into(),
            })),
            AnyValue::Object(shared.clone()),
            AnyValue::Object(shared),
        ],
    };

    let tokens = to_tokens(&bag, SerializationContext::default()).unwrap();
    let read: Bag = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    let items = &read.items;
    assert_eq!(items.len(), 7);
    assert!(items[0].is_null());
    assert_eq!(items[1].as_primitive(), Some(&PrimitiveValue::I32(5)));
    assert_eq!(
        items[2].as_primitive(),
        Some(&PrimitiveValue::String("hi".into()))
    );
    assert_eq!(items[3].downcast_value_ref::<Mood>(), Some(&Mood::Angry));
    assert_eq!(
        items[4].downcast_value_ref::<Keeper>().unwrap().name,
        "boxed"
    );
    let first = items[5].as_obj::<Keeper>().unwrap();
    assert_eq!(first.borrow().name, "shared");
    assert!(first.ptr_eq(&items[6].as_obj::<Keeper>().unwrap()));
}

#[test]
fn dynamic_slots_accept_bare_primitives() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::StartOfArray { length: 2 },
        Token::Boolean {
            name: None,
            value: true,
        },
        Token::Integer {
            name: None,
            value: IntegerValue::Signed(-4),
        },
        Token::EndOfArray,
        Token::EndOfNode,
    ];

    // `Vec<AnyValue>` is written as a node holding one array.
    let items: Vec<AnyValue> = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(items[0].as_primitive(), Some(&PrimitiveValue::Bool(true)));
    assert_eq!(items[1].as_primitive(), Some(&PrimitiveValue::I64(-4)));
}

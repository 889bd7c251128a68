//! What `#[derive(Serial)]` and its attributes put into a stream.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vc_serial::context::{DeserializationContext, SerializationConfig, SerializationContext};
use vc_serial::context::{MemberFilter, SerializationPolicy};
use vc_serial::error::SerialResult;
use vc_serial::formatter::SelfFormatted;
use vc_serial::info::TypePath;
use vc_serial::stream::{DataReader, DataWriter, IntegerValue, Token};
use vc_serial::utility::{from_bytes, from_tokens, to_bytes, to_tokens};
use vc_serial::value::Obj;
use vc_serial::{Reflect, Serial};

/// Names of the entries written directly into the root node.
fn root_entries(tokens: &[Token]) -> Vec<String> {
    let mut depth = 0_usize;
    let mut names = Vec::new();
    for token in tokens {
        match token {
            Token::StartOfNode { name, .. } => {
                if depth == 1 {
                    names.extend(name.clone());
                }
                depth += 1;
            }
            Token::EndOfNode => depth -= 1,
            Token::StartOfArray { .. } => depth += 1,
            Token::EndOfArray => depth -= 1,
            other if depth == 1 => names.extend(other.name().map(str::to_owned)),
            _ => {}
        }
    }
    names
}

fn with_policy(policy: Arc<SerializationPolicy>) -> SerializationConfig {
    SerializationConfig::default().with_policy(policy)
}

// -----------------------------------------------------------------------------
// Member selection

#[derive(Serial, Default, Debug)]
struct Account {
    pub name: String,
    secret: u64,
    #[serial(serialize)]
    pin: u16,
    #[serial(skip)]
    pub cache: Vec<u8>,
    #[serial(rename = "hp")]
    pub health: u32,
}

fn sample_account() -> Account {
    Account {
        name: "ann".into(),
        secret: 77,
        pin: 1234,
        cache: vec![1, 2, 3],
        health: 90,
    }
}

#[test]
fn default_policy_writes_public_and_marked_members() {
    let tokens = to_tokens(&sample_account(), SerializationContext::default()).unwrap();
    assert_eq!(root_entries(&tokens), ["name", "pin", "hp"]);

    let read: Account = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.name, "ann");
    assert_eq!(read.secret, 0);
    assert_eq!(read.pin, 1234);
    assert!(read.cache.is_empty());
    assert_eq!(read.health, 90);
}

#[test]
fn everything_policy_writes_private_members_too() {
    let config = with_policy(SerializationPolicy::everything());
    let tokens = to_tokens(&sample_account(), SerializationContext::new(config.clone())).unwrap();
    assert_eq!(root_entries(&tokens), ["name", "secret", "pin", "hp"]);

    let read: Account = from_tokens(&tokens, DeserializationContext::new(config)).unwrap();
    assert_eq!(read.secret, 77);
    assert!(read.cache.is_empty());
}

#[test]
fn member_filter_of_a_custom_policy() {
    let policy = SerializationPolicy::builder("members")
        .with_member_filter(MemberFilter::All)
        .build();
    assert_eq!(policy.name(), "members");
    assert!(!policy.allow_non_serializable_types());
    assert_ne!(policy.id(), SerializationPolicy::everything().id());

    let tokens = to_tokens(&sample_account(), SerializationContext::new(with_policy(policy))).unwrap();
    assert_eq!(root_entries(&tokens), ["name", "secret", "pin", "hp"]);
}

// -----------------------------------------------------------------------------
// Shapes

#[derive(Serial, Default, Debug, PartialEq)]
struct Pair(pub i32, pub String);

#[derive(Serial, Default, Debug, PartialEq)]
struct Marker;

#[derive(Serial, Default, Debug, Clone, Copy, PartialEq)]
enum Level {
    #[default]
    Low = 1,
    High = 5,
}

#[derive(Serial, Default, Debug)]
struct Gauge {
    pub level: Level,
}

#[test]
fn tuple_members_are_named_by_index() {
    let pair = Pair(-3, "x".into());
    let tokens = to_tokens(&pair, SerializationContext::default()).unwrap();
    assert_eq!(root_entries(&tokens), ["0", "1"]);

    let read: Pair = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read, pair);
}

#[test]
fn unit_structs_are_empty_nodes() {
    let tokens = to_tokens(&Marker, SerializationContext::default()).unwrap();
    assert_eq!(tokens.len(), 2);
    assert!(matches!(tokens[0], Token::StartOfNode { .. }));
    assert!(matches!(tokens[1], Token::EndOfNode));

    let read: Marker = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read, Marker);
}

#[test]
fn enums_are_written_as_discriminants() {
    let gauge = Gauge { level: Level::High };
    let tokens = to_tokens(&gauge, SerializationContext::default()).unwrap();
    assert!(tokens.contains(&Token::Integer {
        name: Some("level".into()),
        value: IntegerValue::Unsigned(5),
    }));

    let read: Gauge = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.level, Level::High);
}

#[test]
fn unknown_discriminants_read_as_the_default_variant() {
    let tokens = vec![
        Token::StartOfNode {
            name: None,
            type_name: None,
            id: -1,
        },
        Token::Integer {
            name: Some("level".into()),
            value: IntegerValue::Unsigned(9),
        },
        Token::EndOfNode,
    ];
    let read: Gauge = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.level, Level::Low);
}

#[derive(Serial, Default, Debug, Clone, Copy, PartialEq)]
#[repr(i8)]
enum Tilt {
    Neg = -3,
    #[default]
    Flat = 0,
    Pos = 2,
}

#[derive(Serial, Default, Debug, PartialEq)]
struct Board {
    pub left: Tilt,
    pub right: Tilt,
}

#[test]
fn negative_discriminants_survive_both_encodings() {
    let board = Board {
        left: Tilt::Neg,
        right: Tilt::Pos,
    };

    let tokens = to_tokens(&board, SerializationContext::default()).unwrap();
    assert!(tokens.contains(&Token::Integer {
        name: Some("left".into()),
        value: IntegerValue::Unsigned(-3_i64 as u64),
    }));
    let read: Board = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read, board);

    let bytes = to_bytes(&board, SerializationContext::default()).unwrap();
    let read: Board = from_bytes(&bytes, DeserializationContext::default()).unwrap();
    assert_eq!(read, board);
}

// -----------------------------------------------------------------------------
// Generics

#[derive(Serial, Default, Debug)]
struct Wrapper<T> {
    pub inner: T,
    pub next: Option<Obj<Wrapper<T>>>,
}

#[test]
fn generic_type_paths_carry_their_arguments() {
    let path = <Wrapper<u32>>::type_path();
    assert!(path.ends_with("Wrapper<u32>"), "{path}");
    assert_ne!(path, <Wrapper<String>>::type_path());

    let value = Wrapper {
        inner: 7_u32,
        next: Some(Obj::new(Wrapper {
            inner: 8,
            next: None,
        })),
    };
    let tokens = to_tokens(&value, SerializationContext::default()).unwrap();
    let read: Wrapper<u32> = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.inner, 7);
    assert_eq!(read.next.unwrap().borrow().inner, 8);
}

// -----------------------------------------------------------------------------
// Type attributes

#[derive(Serial, Serialize, Deserialize, Default, Debug, PartialEq)]
#[serial(opaque, serde)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

#[derive(Serial, Default, Debug)]
struct Palette {
    pub name: String,
    pub main: Color,
}

#[test]
fn serde_types_use_their_serde_impls() {
    let palette = Palette {
        name: "warm".into(),
        main: Color { r: 200, g: 80, b: 10 },
    };
    let tokens = to_tokens(&palette, SerializationContext::default()).unwrap();
    // Private members are written: serde decides, not the policy.
    assert!(tokens.iter().any(|token| token.name() == Some("g")));

    let read: Palette = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.name, "warm");
    assert_eq!(read.main, Color { r: 200, g: 80, b: 10 });
}

#[derive(Serial, Default, Debug)]
#[serial(self_formatted)]
struct Stamp {
    ticks: u64,
}

impl SelfFormatted for Stamp {
    fn serialize_self(&self, writer: &mut dyn DataWriter) -> SerialResult<()> {
        writer.write_u64(Some("double"), self.ticks * 2)
    }

    fn deserialize_self(&mut self, reader: &mut dyn DataReader) -> SerialResult<()> {
        if let Some(double) = reader.read_u64()? {
            self.ticks = double / 2;
        }
        Ok(())
    }
}

#[test]
fn self_formatted_types_write_their_own_members() {
    let tokens = to_tokens(&Stamp { ticks: 42 }, SerializationContext::default()).unwrap();
    assert!(tokens.contains(&Token::Integer {
        name: Some("double".into()),
        value: IntegerValue::Unsigned(84),
    }));
    assert!(tokens.iter().all(|token| token.name() != Some("ticks")));

    let read: Stamp = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.ticks, 42);
}

#[derive(Serial, Default, Debug)]
#[serial(type_path = "demo::Renamed")]
struct Renamed {
    pub value: i32,
}

#[derive(Serial, Default)]
struct Slot {
    pub held: Option<Obj<dyn Reflect>>,
}

#[test]
fn pinned_type_paths_are_written_and_bound() {
    assert_eq!(Renamed::type_path(), "demo::Renamed");

    let slot = Slot {
        held: Obj::new(Renamed { value: 3 }).cast::<dyn Reflect>(),
    };
    let tokens = to_tokens(&slot, SerializationContext::default()).unwrap();
    assert!(tokens.iter().any(|token| matches!(
        token,
        Token::StartOfNode { type_name: Some(type_name), .. } if type_name == "demo::Renamed"
    )));

    let read: Slot = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    let renamed = read.held.unwrap().cast::<Renamed>().unwrap();
    assert_eq!(renamed.borrow().value, 3);
}

#[derive(Serial, Default, Debug)]
#[serial(not_serializable)]
struct Scratch {
    pub value: i32,
}

#[test]
fn strict_policy_writes_non_serializable_types_empty() {
    let scratch = Scratch { value: 12 };

    let config = with_policy(SerializationPolicy::strict());
    let tokens = to_tokens(&scratch, SerializationContext::new(config.clone())).unwrap();
    assert!(root_entries(&tokens).is_empty());
    let read: Scratch = from_tokens(&tokens, DeserializationContext::new(config)).unwrap();
    assert_eq!(read.value, 0);

    let tokens = to_tokens(&scratch, SerializationContext::default()).unwrap();
    assert_eq!(root_entries(&tokens), ["value"]);
}

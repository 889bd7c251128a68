//! Formatter and serializer caches, and the locator chain.
#![cfg(feature = "auto_register")]

use std::sync::Arc;
use std::thread;

use vc_serial::context::{DeserializationContext, SerializationContext, SerializationPolicy};
use vc_serial::error::SerialResult;
use vc_serial::formatter::{self, EmptyTypeFormatter, Formatter, FormatterLocator, LocatorStep};
use vc_serial::formatter::{FormatterRegistration, FormatterTarget, LocatorRegistration};
use vc_serial::info::{TypeInfo, Typed};
use vc_serial::serializer;
use vc_serial::stream::{DataReader, DataWriter, IntegerValue, Token};
use vc_serial::utility::{from_tokens, to_tokens};
use vc_serial::value::Obj;
use vc_serial::{Reflect, Serial};

fn same<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn address<T: ?Sized>(arc: &Arc<T>) -> usize {
    Arc::as_ptr(arc).cast::<()>() as usize
}

// -----------------------------------------------------------------------------
// Caches

#[derive(Serial, Default, Debug)]
struct Cached {
    pub value: i32,
    hidden: i32,
}

#[test]
fn formatters_are_cached_per_policy() {
    let ty = Cached::type_info();
    let default = SerializationPolicy::default_policy();
    let everything = SerializationPolicy::everything();

    let a = formatter::get(ty, &default, true).unwrap();
    let b = formatter::get(ty, &default, true).unwrap();
    assert!(same(&a, &b));
    assert!(std::ptr::eq(a.serialized_type(), ty));

    // Different policies select different members.
    let c = formatter::get(ty, &everything, true).unwrap();
    assert!(!same(&a, &c));
    assert!(same(&c, &formatter::get(ty, &everything, true).unwrap()));
}

#[test]
fn serializers_are_cached_per_type() {
    let a = serializer::get::<Cached>();
    let b = serializer::get::<Cached>();
    assert!(same(&a, &b));

    let weak_a = serializer::for_type(Cached::type_info(), true).unwrap();
    let weak_b = serializer::for_type(Cached::type_info(), true).unwrap();
    assert!(same(&weak_a, &weak_b));
    assert!(std::ptr::eq(weak_a.serialized_type(), Cached::type_info()));
}

#[derive(Serial, Default, Debug)]
struct Contended {
    pub items: Vec<u16>,
    pub next: Option<Obj<Contended>>,
}

#[test]
fn concurrent_lookups_share_one_instance() {
    let policy = SerializationPolicy::default_policy();
    let (formatters, serializers): (Vec<usize>, Vec<usize>) = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let policy = &policy;
                scope.spawn(move || {
                    let formatter = formatter::get(Contended::type_info(), policy, true).unwrap();
                    let serializer = serializer::get::<Contended>();
                    (address(&formatter), address(&serializer))
                })
            })
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap()).unzip()
    });

    assert!(formatters.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(serializers.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn sessions_run_in_parallel() {
    thread::scope(|scope| {
        for index in 0..4_u16 {
            scope.spawn(move || {
                let tail = Obj::new(Contended {
                    items: vec![index],
                    next: None,
                });
                let head = Contended {
                    items: vec![index, index + 1],
                    next: Some(tail),
                };
                let tokens = to_tokens(&head, SerializationContext::default()).unwrap();
                let read: Contended = from_tokens(&tokens, DeserializationContext::default()).unwrap();
                assert_eq!(read.items, [index, index + 1]);
                assert_eq!(read.next.unwrap().borrow().items, [index]);
            });
        }
    });
}

// -----------------------------------------------------------------------------
// Locator chain

/// Distance in meters, written in millimeters by a registered formatter.
#[derive(Serial, Default, Debug, PartialEq)]
struct Meters {
    pub value: f64,
}

struct MillimeterFormatter;

impl Formatter for MillimeterFormatter {
    fn serialized_type(&self) -> &'static TypeInfo {
        Meters::type_info()
    }

    fn serialize(&self, value: &dyn Reflect, writer: &mut dyn DataWriter) -> SerialResult<()> {
        let meters = value.downcast_ref::<Meters>().map_or(0.0, |meters| meters.value);
        writer.write_i64(Some("mm"), (meters * 1000.0).round() as i64)
    }

    fn deserialize(&self, value: &mut dyn Reflect, reader: &mut dyn DataReader) -> SerialResult<()> {
        let millimeters = reader.read_i64()?.unwrap_or_default();
        if let Some(meters) = value.downcast_mut::<Meters>() {
            meters.value = millimeters as f64 / 1000.0;
        }
        Ok(())
    }
}

inventory::submit! {
    FormatterRegistration {
        name: "caches::MillimeterFormatter",
        priority: 0,
        target: FormatterTarget::Exact(Meters::type_info),
        create: |_| Some(Arc::new(MillimeterFormatter)),
        weak_fallback: None,
        can_format: None,
    }
}

#[derive(Serial, Default, Debug)]
struct Secret {
    pub code: String,
}

/// Hides every [`Secret`] before any registration is considered.
struct SecretLocator;

impl FormatterLocator for SecretLocator {
    fn try_get_formatter(
        &self,
        ty: &'static TypeInfo,
        step: LocatorStep,
        _policy: &Arc<SerializationPolicy>,
        _allow_weak_fallback: bool,
    ) -> SerialResult<Option<Arc<dyn Formatter>>> {
        if step != LocatorStep::BeforeRegisteredFormatters || ty != Secret::type_info() {
            return Ok(None);
        }
        Ok(Some(Arc::new(EmptyTypeFormatter::new(ty))))
    }
}

inventory::submit! {
    LocatorRegistration {
        name: "caches::SecretLocator",
        priority: 10,
        create: || Box::new(SecretLocator),
    }
}

#[test]
fn locators_are_asked_by_priority() {
    let locators: Vec<_> = formatter::locators().collect();
    assert_eq!(locators[0], ("caches::SecretLocator", 10));
    assert!(locators.windows(2).all(|pair| pair[0].1 >= pair[1].1));
    assert!(locators.iter().any(|(name, _)| *name == "vc_serial::SelfFormatterLocator"));
}

#[test]
fn registered_formatters_take_over_a_type() {
    assert!(
        formatter::registrations()
            .iter()
            .any(|registration| registration.name == "caches::MillimeterFormatter")
    );

    let tokens = to_tokens(&Meters { value: 1.25 }, SerializationContext::default()).unwrap();
    assert!(tokens.contains(&Token::Integer {
        name: Some("mm".into()),
        value: IntegerValue::Signed(1250),
    }));

    let read: Meters = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read, Meters { value: 1.25 });
}

#[test]
fn custom_locators_run_first() {
    let secret = Secret {
        code: "1234".into(),
    };
    let tokens = to_tokens(&secret, SerializationContext::default()).unwrap();
    assert!(tokens.iter().all(|token| token.name() != Some("code")));

    let read: Secret = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert!(read.code.is_empty());
}

//! Encodings, persisted token streams and references to objects outside the graph.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use std::time::Duration;

use vc_serial::Serial;
use vc_serial::context::{DeserializationContext, ExternalResolvers, SerializationContext};
use vc_serial::context::{ExternalGuidResolver, ExternalIndexResolver, ExternalStringResolver};
use vc_serial::stream::Token;
use vc_serial::utility::{from_bytes, from_tokens, to_bytes, to_tokens};
use vc_serial::value::{Guid, Obj, ObjectRef, TypeRef};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Serial, Default, Debug, PartialEq)]
struct Catalog {
    pub title: String,
    pub initial: char,
    pub id: Guid,
    pub scores: Vec<f32>,
    pub tags: BTreeMap<u32, String>,
    pub stock: HashMap<String, i64>,
    pub limit: Option<i32>,
    pub missing: Option<i32>,
    pub timeout: Duration,
    pub kind: TypeRef,
}

fn sample_catalog() -> Catalog {
    Catalog {
        title: "spring".into(),
        initial: 's',
        id: Guid::from_u128(0x1234_5678_9abc_def0_0fed_cba9_8765_4321),
        scores: vec![0.5, -1.25, 3.0],
        tags: BTreeMap::from([(1, "new".into()), (7, "sale".into())]),
        stock: HashMap::from([("bolt".into(), 40), ("nut".into(), -2)]),
        limit: Some(9),
        missing: None,
        timeout: Duration::from_millis(1500),
        kind: TypeRef::of::<u32>(),
    }
}

// -----------------------------------------------------------------------------
// Encodings

#[test]
fn binary_and_token_encodings_agree() {
    let catalog = sample_catalog();

    let bytes = to_bytes(&catalog, SerializationContext::default()).unwrap();
    let from_binary: Catalog = from_bytes(&bytes, DeserializationContext::default()).unwrap();
    assert_eq!(from_binary, catalog);

    let tokens = to_tokens(&catalog, SerializationContext::default()).unwrap();
    let from_token: Catalog = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(from_token, catalog);

    let rewritten = to_tokens(&from_binary, SerializationContext::default()).unwrap();
    let reread: Catalog = from_tokens(&rewritten, DeserializationContext::default()).unwrap();
    assert_eq!(reread, catalog);
}

#[test]
fn truncated_bytes_are_an_error() {
    let bytes = to_bytes(&sample_catalog(), SerializationContext::default()).unwrap();
    let truncated = &bytes[..bytes.len() / 2];
    let result: Result<Catalog, _> = from_bytes(truncated, DeserializationContext::default());
    assert!(result.is_err());
}

#[test]
fn token_streams_persist_through_serde_formats() {
    let catalog = sample_catalog();
    let tokens = to_tokens(&catalog, SerializationContext::default()).unwrap();

    let json = serde_json::to_string(&tokens).unwrap();
    let from_json: Vec<Token> = serde_json::from_str(&json).unwrap();
    assert_eq!(from_json, tokens);

    let text = ron::to_string(&tokens).unwrap();
    let from_ron: Vec<Token> = ron::from_str(&text).unwrap();
    assert_eq!(from_ron, tokens);

    let read: Catalog = from_tokens(&from_ron, DeserializationContext::default()).unwrap();
    assert_eq!(read, catalog);
}

// -----------------------------------------------------------------------------
// External references

#[derive(Serial, Default, Debug)]
struct Texture {
    pub path: String,
}

#[derive(Serial, Default, Debug)]
struct Material {
    pub name: String,
    pub albedo: Option<Obj<Texture>>,
    pub normal: Option<Obj<Texture>>,
    pub detail: Option<Obj<Texture>>,
    pub albedo_again: Option<Obj<Texture>>,
}

/// A host table that answers for a fixed list of objects.
struct Table {
    objects: Vec<ObjectRef>,
}

impl Table {
    fn position(&self, object: &ObjectRef) -> Option<usize> {
        self.objects.iter().position(|known| known.ptr_eq(object))
    }
}

struct ByIndex(Rc<Table>);

impl ExternalIndexResolver for ByIndex {
    fn can_reference(&self, object: &ObjectRef) -> Option<i32> {
        // Only the first object is indexed.
        self.0.position(object).filter(|&at| at == 0).map(|at| at as i32)
    }

    fn try_resolve(&self, index: i32) -> Option<ObjectRef> {
        self.0.objects.get(usize::try_from(index).ok()?).cloned()
    }
}

struct ByGuid(Rc<Table>);

impl ExternalGuidResolver for ByGuid {
    fn can_reference(&self, object: &ObjectRef) -> Option<Guid> {
        self.0.position(object).filter(|&at| at == 1).map(|at| Guid::from_u128(at as u128))
    }

    fn try_resolve(&self, guid: Guid) -> Option<ObjectRef> {
        self.0.objects.get(guid.as_u128() as usize).cloned()
    }
}

struct ByString(Rc<Table>);

impl ExternalStringResolver for ByString {
    fn can_reference(&self, object: &ObjectRef) -> Option<String> {
        self.0.position(object).map(|at| format!("texture/{at}"))
    }

    fn try_resolve(&self, key: &str) -> Option<ObjectRef> {
        let at: usize = key.strip_prefix("texture/")?.parse().ok()?;
        self.0.objects.get(at).cloned()
    }
}

fn textures() -> Vec<Obj<Texture>> {
    ["albedo.png", "normal.png", "detail.png"]
        .into_iter()
        .map(|path| Obj::new(Texture { path: path.into() }))
        .collect()
}

fn resolvers(textures: &[Obj<Texture>]) -> ExternalResolvers {
    let table = Rc::new(Table {
        objects: textures.iter().map(|texture| texture.object().clone()).collect(),
    });
    ExternalResolvers {
        index: Some(Rc::new(ByIndex(table.clone()))),
        guid: Some(Rc::new(ByGuid(table.clone()))),
        string: Some(Rc::new(ByString(table))),
    }
}

#[test]
fn external_objects_are_written_by_key() {
    let textures = textures();
    let material = Material {
        name: "stone".into(),
        albedo: Some(textures[0].clone()),
        normal: Some(textures[1].clone()),
        detail: Some(textures[2].clone()),
        albedo_again: Some(textures[0].clone()),
    };

    let context = SerializationContext::default().with_externals(resolvers(&textures));
    let tokens = to_tokens(&material, context).unwrap();

    assert!(tokens.contains(&Token::ExternalReferenceByIndex {
        name: Some("albedo".into()),
        index: 0,
    }));
    assert!(tokens.contains(&Token::ExternalReferenceByGuid {
        name: Some("normal".into()),
        guid: Guid::from_u128(1),
    }));
    assert!(tokens.contains(&Token::ExternalReferenceByString {
        name: Some("detail".into()),
        key: "texture/2".into(),
    }));
    // External objects never enter the graph.
    assert!(
        tokens
            .iter()
            .all(|token| !matches!(token, Token::InternalReference { .. }))
    );
    assert!(tokens.iter().all(|token| token.name() != Some("path")));

    let context = DeserializationContext::default().with_externals(resolvers(&textures));
    let read: Material = from_tokens(&tokens, context).unwrap();
    assert!(read.albedo.unwrap().ptr_eq(&textures[0]));
    assert!(read.normal.unwrap().ptr_eq(&textures[1]));
    assert!(read.detail.unwrap().ptr_eq(&textures[2]));
    assert!(read.albedo_again.unwrap().ptr_eq(&textures[0]));
}

#[test]
fn unresolved_external_keys_read_as_null() {
    let textures = textures();
    let material = Material {
        name: "stone".into(),
        albedo: Some(textures[0].clone()),
        ..Material::default()
    };
    let context = SerializationContext::default().with_externals(resolvers(&textures));
    let tokens = to_tokens(&material, context).unwrap();

    // A reader without resolvers cannot recover the object.
    let read: Material = from_tokens(&tokens, DeserializationContext::default()).unwrap();
    assert_eq!(read.name, "stone");
    assert!(read.albedo.is_none());
}

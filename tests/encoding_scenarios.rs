//! End-to-end encoding behavior through the public API

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use firebase_common::encoding::{
    decode, encode, encode_as_object, reencode_transform, DecodeSettings, EncodeSettings, ExtensionRegistry,
    NativeValue, PlainMap, PlainValue, Polymorphic, SchemaDescriptor,
};
use firebase_common::firestore::{GeoPoint, Timestamp};
use firebase_common::{firestore_class, firestore_sealed, polymorphic_codec, value_class, ErrorKind};

value_class! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct ValueClass(pub i32);
}

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Mixed {
        pub map: HashMap<String, String>,
        pub other_map: HashMap<i32, i32> => "otherMap",
        pub flag: bool => "bool" = false,
        pub nullable_bool: Option<bool> => "nullableBool" = None,
        pub value_class: ValueClass => "valueClass",
    }
}

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Test as "test" {
        pub value: String,
    }
}

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Other as "other" {
        pub count: i64 = 0,
    }
}

firestore_sealed! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum SealedBase {
        Test(Test),
        Other(Other),
    }
}

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Circle as "circle" {
        pub radius: f64,
    }
}

firestore_sealed! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Shape as "Shape" discriminator "kind" {
        Circle(Circle),
    }
}

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Implemented as "implemented" {
        pub abstract_value: String => "abstractValue",
        pub other_value: bool => "otherValue",
    }
}

/// Open hierarchy: subtypes come from the registry, not from the type
#[derive(Debug, Clone, PartialEq)]
pub enum AbstractBase {
    Implemented(Implemented),
}

impl Polymorphic for AbstractBase {
    fn base_descriptor() -> SchemaDescriptor {
        SchemaDescriptor::polymorphic("AbstractBase")
    }

    fn as_subtype(&self) -> &dyn Any {
        match self {
            Self::Implemented(value) => value,
        }
    }
}

polymorphic_codec!(AbstractBase);

firestore_class! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Place {
        pub name: String,
        pub location: GeoPoint,
        pub created: Timestamp,
    }
}

fn object(entries: Vec<(&str, PlainValue)>) -> PlainValue {
    PlainValue::Map(entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

fn sparse() -> EncodeSettings {
    EncodeSettings::builder().encode_defaults(false).build()
}

#[test]
fn decode_then_sparse_reencode_keeps_non_default_fields() {
    let input = object(vec![
        ("map", object(vec![("key", PlainValue::from("value"))])),
        ("otherMap", object(vec![("1", PlainValue::Int(1))])),
        ("bool", PlainValue::Boolean(true)),
        ("valueClass", PlainValue::Int(42)),
    ]);

    let decoded: Mixed = decode(&input, &DecodeSettings::default()).unwrap();
    assert_eq!(decoded.other_map.get(&1), Some(&1));
    assert!(decoded.flag);
    assert_eq!(decoded.nullable_bool, None);
    assert_eq!(decoded.value_class, ValueClass(42));

    let reencoded = encode(&decoded, &sparse()).unwrap();
    assert_eq!(reencoded, input);
}

#[test]
fn sparse_reencode_drops_default_bool() {
    let input = object(vec![
        ("map", object(vec![])),
        ("otherMap", object(vec![])),
        ("bool", PlainValue::Boolean(false)),
        ("valueClass", PlainValue::Int(1)),
    ]);

    let decoded: Mixed = decode(&input, &DecodeSettings::default()).unwrap();
    let reencoded = encode_as_object(&decoded, &sparse()).unwrap();
    assert!(!reencoded.contains_key("bool"));
    assert!(!reencoded.contains_key("nullableBool"));
}

#[test]
fn sealed_variant_encodes_with_type_first() {
    let value = SealedBase::Test(Test {
        value: "value".to_string(),
    });
    let encoded = encode(&value, &EncodeSettings::default()).unwrap();

    assert_eq!(
        encoded,
        object(vec![("type", PlainValue::from("test")), ("value", PlainValue::from("value"))])
    );
    assert_eq!(decode::<SealedBase>(&encoded, &DecodeSettings::default()).unwrap(), value);
}

#[test]
fn sealed_decode_rejects_unknown_discriminator() {
    let input = object(vec![("type", PlainValue::from("missing"))]);
    let err = decode::<SealedBase>(&input, &DecodeSettings::default()).unwrap_err();
    assert!(matches!(
        err.kind(),
        ErrorKind::UnknownPolymorphicType { serial_name, .. } if serial_name == "missing"
    ));
}

#[test]
fn registered_subtype_decodes_from_open_hierarchy() {
    let registry = Arc::new(
        ExtensionRegistry::builder()
            .with_firestore_types()
            .polymorphic::<AbstractBase>(|table| {
                table.subtype::<Implemented>(AbstractBase::Implemented);
            })
            .build(),
    );
    let settings = DecodeSettings::builder().registry(Arc::clone(&registry)).build();

    let input = object(vec![
        ("type", PlainValue::from("implemented")),
        ("abstractValue", PlainValue::from("value")),
        ("otherValue", PlainValue::Boolean(true)),
    ]);
    let decoded: AbstractBase = decode(&input, &settings).unwrap();
    assert_eq!(
        decoded,
        AbstractBase::Implemented(Implemented {
            abstract_value: "value".to_string(),
            other_value: true,
        })
    );

    let encode_settings = EncodeSettings::builder().registry(registry).build();
    assert_eq!(encode(&decoded, &encode_settings).unwrap(), input);
}

#[test]
fn open_hierarchy_without_registration_fails() {
    let input = object(vec![("type", PlainValue::from("implemented"))]);
    let err = decode::<AbstractBase>(&input, &DecodeSettings::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::UnknownPolymorphicType { .. }));
}

#[test]
fn special_values_pass_through_unchanged() {
    let location = NativeValue::new(GeoPoint::new(59.9, 10.7).unwrap());
    let encoded = encode(&location, &EncodeSettings::default()).unwrap();
    let PlainValue::Special(native) = &encoded else {
        panic!("expected a special value, got {:?}", encoded);
    };
    assert!(native.ptr_eq(&location));

    let place = Place {
        name: "Oslo".to_string(),
        location: GeoPoint::new(59.9, 10.7).unwrap(),
        created: Timestamp::new(1_700_000_000, 5).unwrap(),
    };
    let encoded = encode_as_object(&place, &EncodeSettings::default()).unwrap();
    assert_eq!(
        encoded["location"].as_native().and_then(|n| n.downcast_ref::<GeoPoint>()),
        Some(&place.location)
    );
    assert_eq!(
        encoded["created"].as_native().and_then(|n| n.downcast_ref::<Timestamp>()),
        Some(&place.created)
    );

    let decoded: Place = decode(&PlainValue::Map(encoded), &DecodeSettings::default()).unwrap();
    assert_eq!(decoded, place);
}

#[test]
fn reencode_transform_rewrites_list() {
    let stored = PlainValue::List(vec!["One".into(), "Two".into(), "Three".into()]);
    let updated = reencode_transform(
        &stored,
        &DecodeSettings::default(),
        &EncodeSettings::default(),
        |items: Vec<String>| items.into_iter().map(|item| format!("new{item}")).collect(),
    )
    .unwrap();

    assert_eq!(
        updated,
        PlainValue::List(vec!["newOne".into(), "newTwo".into(), "newThree".into()])
    );
}

#[test]
fn round_trip_preserves_value() {
    let mut map = HashMap::new();
    map.insert("a".to_string(), "b".to_string());
    let mut other_map = HashMap::new();
    other_map.insert(-3, 9);
    let value = Mixed {
        map,
        other_map,
        flag: true,
        nullable_bool: Some(false),
        value_class: ValueClass(7),
    };

    let encoded = encode(&value, &EncodeSettings::default()).unwrap();
    assert_eq!(decode::<Mixed>(&encoded, &DecodeSettings::default()).unwrap(), value);
}

#[test]
fn sparse_encode_is_idempotent() {
    let value = Other { count: 0 };
    let first = encode(&value, &sparse()).unwrap();
    let second = encode(&value, &sparse()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, PlainValue::Map(PlainMap::new()));
}

#[test]
fn discriminator_is_first_key() {
    for value in [
        SealedBase::Test(Test { value: "x".to_string() }),
        SealedBase::Other(Other { count: 3 }),
    ] {
        let encoded = encode_as_object(&value, &sparse()).unwrap();
        let (key, tag) = encoded.get_index(0).unwrap();
        assert_eq!(key, "type");
        let expected = match value {
            SealedBase::Test(_) => "test",
            SealedBase::Other(_) => "other",
        };
        assert_eq!(tag, &PlainValue::from(expected));
    }
}

#[test]
fn missing_optional_field_takes_default() {
    let decoded: Other = decode(&object(vec![]), &DecodeSettings::default()).unwrap();
    assert_eq!(decoded, Other { count: 0 });

    let err = decode::<Test>(&object(vec![]), &DecodeSettings::default()).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MissingField(field) if field == "value"));
}

#[test]
fn reencode_identity_matches_direct_reencode() {
    let stored = object(vec![("type", "other".into()), ("count", PlainValue::Long(4))]);
    let decode_settings = DecodeSettings::default();
    let encode_settings = EncodeSettings::default();

    let via_transform =
        reencode_transform(&stored, &decode_settings, &encode_settings, |v: SealedBase| v).unwrap();
    let decoded: SealedBase = decode(&stored, &decode_settings).unwrap();
    assert_eq!(via_transform, encode(&decoded, &encode_settings).unwrap());
}

#[test]
fn nested_errors_carry_field_path() {
    let input = object(vec![
        ("map", object(vec![])),
        ("otherMap", object(vec![("x", PlainValue::Int(1))])),
        ("valueClass", PlainValue::Int(1)),
    ]);
    let err = decode::<Mixed>(&input, &DecodeSettings::default()).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    assert_eq!(err.path()[0].element, "otherMap");
}

#[test]
fn custom_discriminator_round_trips() {
    let shape = Shape::Circle(Circle { radius: 2.0 });
    let encoded = encode(&shape, &EncodeSettings::default()).unwrap();
    assert_eq!(
        encoded,
        object(vec![("kind", PlainValue::from("circle")), ("radius", PlainValue::Double(2.0))])
    );
    assert_eq!(decode::<Shape>(&encoded, &DecodeSettings::default()).unwrap(), shape);
}

#[test]
fn custom_discriminator_ignores_default_key() {
    let input = object(vec![("type", PlainValue::from("circle")), ("radius", PlainValue::Double(2.0))]);
    let err = decode::<Shape>(&input, &DecodeSettings::default()).unwrap_err();

    assert!(matches!(err.kind(), ErrorKind::MissingField(field) if field == "kind"));
    assert_eq!(err.path()[0].descriptor, "Shape");
}

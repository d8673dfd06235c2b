use blueentities_model::codec::{decode, decode_property, encode, validate};
use blueentities_model::{KeyCodec, ModelError, PropertyDef, PropertyType, Record, Value};
use blueentities_types::EntityId;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeMap;

// ── encode / decode ──────────────────────────────────────────────

#[test]
fn encode_each_type() {
    assert_eq!(encode(&Value::from("a.png")), "a.png");
    assert_eq!(encode(&Value::from(20)), "20");
    assert_eq!(encode(&Value::from(true)), "1");
    assert_eq!(encode(&Value::from(false)), "0");
}

#[test]
fn decode_each_type() {
    assert_eq!(decode(PropertyType::String, "a.png"), Some(Value::from("a.png")));
    assert_eq!(decode(PropertyType::Integer, "20"), Some(Value::from(20)));
    assert_eq!(decode(PropertyType::Boolean, "1"), Some(Value::from(true)));
    assert_eq!(decode(PropertyType::Boolean, "0"), Some(Value::from(false)));
}

#[test]
fn decode_property_reports_corrupt_integer() {
    let def = PropertyDef::integer("size");
    assert_eq!(
        decode_property(&def, "twenty").unwrap_err(),
        ModelError::CorruptValue {
            property: "size".into(),
            expected: PropertyType::Integer,
            value: "twenty".into(),
        }
    );
}

// ── validate ─────────────────────────────────────────────────────

#[test]
fn validate_accepts_matching_types() {
    assert!(validate("img", &PropertyDef::string("filename"), &Value::from("a")).is_ok());
    assert!(validate("img", &PropertyDef::integer("size"), &Value::from(3)).is_ok());
    assert!(validate("img", &PropertyDef::boolean("checked"), &Value::from(true)).is_ok());
}

#[test]
fn validate_rejects_integer_for_string() {
    let err = validate("img", &PropertyDef::string("filename"), &Value::from(12)).unwrap_err();
    assert_eq!(
        err,
        ModelError::TypeMismatch {
            property: "filename".into(),
            schema: "img".into(),
            expected: PropertyType::String,
            actual: "12 (integer)".into(),
        }
    );
}

#[test]
fn validate_rejects_string_for_integer() {
    let err = validate("img", &PropertyDef::integer("size"), &Value::from("badstringtype"));
    assert!(matches!(err, Err(ModelError::TypeMismatch { .. })));
}

#[test]
fn validate_rejects_integer_for_boolean() {
    let err = validate("img", &PropertyDef::boolean("checked"), &Value::from(100));
    assert!(matches!(err, Err(ModelError::TypeMismatch { .. })));
}

#[test]
fn type_mismatch_message_names_schema_and_property() {
    let err = validate("img", &PropertyDef::boolean("checked"), &Value::from(100)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "property value 100 (integer) for img.checked expected to be boolean"
    );
}

// ── Value serde ──────────────────────────────────────────────────

#[test]
fn values_deserialize_from_json_scalars() {
    let values: Vec<Value> = serde_json::from_str(r#"["a", 3, true]"#).unwrap();
    assert_eq!(values, vec![Value::from("a"), Value::from(3), Value::from(true)]);
}

#[test]
fn fractional_numbers_are_not_values() {
    assert!(serde_json::from_str::<Value>("2.5").is_err());
}

#[test]
fn record_serializes_flat_with_id() {
    let mut properties = BTreeMap::new();
    properties.insert("filename".to_string(), Value::from("a.png"));
    properties.insert("size".to_string(), Value::from(20));
    let record = Record::new(EntityId::parse("abc").unwrap(), properties);

    assert_eq!(
        serde_json::to_value(&record).unwrap(),
        serde_json::json!({ "id": "abc", "filename": "a.png", "size": 20 })
    );
    assert_eq!(record.get_str("filename"), Some("a.png"));
    assert_eq!(record.get_integer("size"), Some(20));
    assert_eq!(record.get_bool("size"), None);
}

// ── KeyCodec ─────────────────────────────────────────────────────

#[test]
fn keys_without_namespace() {
    let keys = KeyCodec::new(None);
    let id = EntityId::parse("Xy12").unwrap();
    assert_eq!(keys.record_key("img", &id), "img:Xy12");
    assert_eq!(keys.index_key("img"), "img:set");
    assert_eq!(keys.namespace(), None);
}

#[test]
fn keys_with_namespace() {
    let keys = KeyCodec::new(Some("tests"));
    let id = EntityId::parse("Xy12").unwrap();
    assert_eq!(keys.record_key("img", &id), "tests:img:Xy12");
    assert_eq!(keys.index_key("img"), "tests:img:set");
    assert_eq!(keys.namespace(), Some("tests"));
}

#[test]
fn empty_namespace_is_no_namespace() {
    assert_eq!(KeyCodec::new(Some("")), KeyCodec::new(None));
}

#[test]
fn id_extraction_uses_last_separator() {
    assert_eq!(KeyCodec::id_from_record_key("tests:img:Xy12"), "Xy12");
    assert_eq!(KeyCodec::id_from_record_key("img:Xy12"), "Xy12");
    assert_eq!(KeyCodec::id_from_record_key("plain"), "plain");
}

// ── Properties ───────────────────────────────────────────────────

fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Integer),
        any::<bool>().prop_map(Value::Boolean),
        ".{0,40}".prop_map(Value::String),
    ]
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in value_strategy()) {
        let raw = encode(&value);
        prop_assert_eq!(decode(value.value_type(), &raw), Some(value));
    }

    #[test]
    fn value_validates_against_its_own_type(value in value_strategy()) {
        let def = PropertyDef {
            name: "p".into(),
            property_type: value.value_type(),
            optional: false,
            default_value: None,
        };
        prop_assert!(validate("e", &def, &value).is_ok());
    }

    #[test]
    fn record_key_roundtrips_id(
        ns in proptest::option::of("[a-z:]{1,12}"),
        entity in "[a-z]{1,31}",
    ) {
        let keys = KeyCodec::new(ns.as_deref());
        let id = EntityId::new();
        let key = keys.record_key(&entity, &id);
        prop_assert_eq!(KeyCodec::id_from_record_key(&key), id.as_str());
    }
}

use crate::{
    record,
    value::{Value, ValueKind, canonical_cmp},
};
use std::cmp::Ordering;

#[test]
fn rank_orders_mixed_variants_deterministically() {
    let ordered = [
        Value::Null,
        Value::Bool(false),
        Value::Int(0),
        Value::Float(0.0),
        Value::Text(String::new()),
        Value::List(Vec::new()),
        Value::Record(record! {}),
    ];

    for window in ordered.windows(2) {
        assert_eq!(canonical_cmp(&window[0], &window[1]), Ordering::Less);
    }
}

#[test]
fn same_kind_values_compare_by_value() {
    assert!(Value::Int(1) < Value::Int(2));
    assert!(Value::Text("a".into()) < Value::Text("b".into()));
    assert!(Value::Float(1.5) < Value::Float(2.5));
    assert!(Value::Bool(false) < Value::Bool(true));
}

#[test]
fn int_and_float_never_compare_equal() {
    // cross-variant comparison is rank-only
    assert_ne!(Value::Int(1), Value::Float(1.0));
    assert!(Value::Int(1) < Value::Float(1.0));
}

#[test]
fn float_order_is_total() {
    assert_eq!(
        canonical_cmp(&Value::Float(f64::NAN), &Value::Float(f64::NAN)),
        Ordering::Equal
    );
    assert!(Value::Float(f64::NEG_INFINITY) < Value::Float(0.0));
    assert!(Value::Float(0.0) < Value::Float(f64::INFINITY));
    assert!(Value::Float(-0.0) < Value::Float(0.0));
}

#[test]
fn lists_compare_lexicographically_then_by_length() {
    let short = Value::list([1, 2]);
    let long = Value::list([1, 2, 3]);
    let bigger = Value::list([1, 9]);

    assert!(short < long);
    assert!(long < bigger);
}

#[test]
fn nested_records_compare_by_name_then_value() {
    let a = Value::Record(record! { "x" => 1 });
    let b = Value::Record(record! { "x" => 2 });
    let c = Value::Record(record! { "y" => 0 });

    assert!(a < b);
    assert!(b < c);
}

#[test]
fn kind_reports_variant_tag() {
    assert_eq!(Value::Int(3).kind(), ValueKind::Int);
    assert_eq!(Value::Null.kind(), ValueKind::Null);
    assert_eq!(Value::list([1]).kind(), ValueKind::List);
}

#[test]
fn json_numbers_prefer_integers() {
    let json: serde_json::Value = serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": null}"#)
        .expect("valid json");
    let value = Value::from(json);

    let record = value.as_record().expect("object becomes record");
    assert_eq!(record.field("a").expect("a"), &Value::Int(1));
    assert_eq!(record.field("b").expect("b"), &Value::Float(1.5));
    assert_eq!(record.field("c").expect("c"), &Value::Null);
}

#[test]
fn spill_codec_roundtrip_preserves_kinds() {
    let record = record! {
        "i" => 3,
        "f" => 2.5,
        "t" => "word",
        "b" => true,
        "l" => Value::list([1, 2]),
        "r" => record! { "inner" => "x" },
    };

    let bytes = serde_cbor::to_vec(&record).expect("encode");
    let decoded: crate::record::Record = serde_cbor::from_slice(&bytes).expect("decode");

    assert_eq!(decoded, record);
    assert_eq!(decoded.kind_of("i"), Some(ValueKind::Int));
    assert_eq!(decoded.kind_of("f"), Some(ValueKind::Float));
}

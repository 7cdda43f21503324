//! End-to-end coverage of the public `plankton_text` API: source text in,
//! source text out, with `plankton_object::Value` only ever touched
//! through the crate's own re-export.

use plankton_object::value_equal;
use plankton_text::{decode_text, encode_text};

#[test]
fn array_of_three_scenario_matches_the_wire_fixture() {
    let value = decode_text("[1, %n, %t]").unwrap();
    assert_eq!(encode_text(&value).unwrap(), "[1, %n, %t]");
}

#[test]
fn nested_seed_with_map_style_fields_round_trips() {
    let source = r#"@"point"("x": 1, "y": -2)"#;
    let value = decode_text(source).unwrap();
    let redecoded = decode_text(&encode_text(&value).unwrap()).unwrap();
    assert!(value_equal(&value, &redecoded));
}

#[test]
fn blob_literals_round_trip_through_both_spellings() {
    let hex = decode_text("%x[ff00]").unwrap();
    let base64 = decode_text("%[/wA=]").unwrap();
    assert!(value_equal(&hex, &base64));
    assert_eq!(encode_text(&hex).unwrap(), "%[/wA=]");
}

#[test]
fn a_cycle_through_two_arrays_round_trips() {
    let value = decode_text("$a:[$b:[$a]]").unwrap();
    let text = encode_text(&value).unwrap();
    let redecoded = decode_text(&text).unwrap();
    assert!(value_equal(&value, &redecoded));
}

#[test]
fn undefined_reference_is_rejected() {
    assert!(decode_text("[$ghost]").is_err());
}

#[test]
fn duplicate_map_keys_are_rejected() {
    let err = decode_text(r#"{"a": 1, "a": 2}"#).unwrap_err();
    assert!(err.to_string().contains("Map"));
}

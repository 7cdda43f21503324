//! End-to-end coverage of the public `plankton_object` API, exercising the
//! concrete scenarios from the wire format's test suite through
//! `decode_binary`/`encode_binary` only (no access to crate-internal
//! builder/traverser types).

use std::cell::RefCell;
use std::rc::Rc;

use plankton_object::{decode_binary, encode_binary, value_equal, SeedData, StructData, Value};

#[test]
fn struct_with_rle_round_trips_through_the_public_api() {
    let strukt = Value::Struct(Rc::new(RefCell::new(StructData {
        fields: vec![
            (0, Value::Int(10)),
            (0, Value::Int(11)),
            (0, Value::Int(12)),
        ],
    })));
    let bytes = encode_binary(&strukt).unwrap();
    assert_eq!(bytes[0], 0x88, "varint field count opcode for a non-linear tag vector");
    assert_eq!(bytes[1], 0x03, "field count");

    let decoded = decode_binary(&bytes).unwrap();
    assert!(value_equal(&strukt, &decoded));
}

#[test]
fn id_width_selection_picks_the_narrowest_representable_width() {
    let mut id = [0u8; 16];
    id[13] = 0x01; // value == 2^16
    let value = Value::Id(id);
    let bytes = encode_binary(&value).unwrap();
    assert_eq!(bytes, vec![0x15, 0x00, 0x01, 0x00, 0x00]);
    let decoded = decode_binary(&bytes).unwrap();
    assert!(value_equal(&value, &decoded));
}

#[test]
fn a_seed_whose_field_value_is_itself_round_trips() {
    let seed = Rc::new(RefCell::new(SeedData {
        header: Value::String(plankton_object::PString { bytes: b"node".to_vec(), encoding: None }),
        fields: Vec::new(),
    }));
    let self_field = Value::Seed(seed.clone());
    seed.borrow_mut().fields.push((
        Value::String(plankton_object::PString { bytes: b"self".to_vec(), encoding: None }),
        self_field,
    ));
    let value = Value::Seed(seed);

    let bytes = encode_binary(&value).unwrap();
    assert_eq!(bytes[0], 0xa0, "a self-referential seed must publish its ref slot before recursing");

    let decoded = decode_binary(&bytes).unwrap();
    assert!(value_equal(&value, &decoded));
}

#[test]
fn two_maps_referencing_each_other_round_trip() {
    let a: plankton_object::MapHandle = Rc::new(RefCell::new(Vec::new()));
    let b: plankton_object::MapHandle = Rc::new(RefCell::new(Vec::new()));
    a.borrow_mut().push((Value::Int(1), Value::Map(b.clone())));
    b.borrow_mut().push((Value::Int(2), Value::Map(a.clone())));
    let value = Value::Map(a);

    let bytes = encode_binary(&value).unwrap();
    let decoded = decode_binary(&bytes).unwrap();
    assert!(value_equal(&value, &decoded));
}

#[test]
fn large_array_uses_the_varint_length_form() {
    let items: Vec<Value> = (0..10).map(Value::Int).collect();
    let value = Value::Array(Rc::new(RefCell::new(items)));
    let bytes = encode_binary(&value).unwrap();
    assert_eq!(bytes[0], 0x28, "ARRAY_N opcode for a length past the short forms");
    assert_eq!(bytes[1], 10);

    let decoded = decode_binary(&bytes).unwrap();
    assert!(value_equal(&value, &decoded));
}

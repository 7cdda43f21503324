//! The pluggable constructor hook [`ObjectBuilder`](crate::builder::ObjectBuilder)
//! uses to turn decoded instructions into language-level values.

use crate::value::{PString, SeedData, StructData, Value};
use std::cell::RefCell;
use std::rc::Rc;

/// Constructs and mutates the values an [`ObjectBuilder`](crate::builder::ObjectBuilder)
/// assembles while decoding.
///
/// A factory is what lets the builder stay agnostic to the concrete value
/// representation: [`DefaultFactory`] produces this crate's own
/// `Rc<RefCell<_>>`-based [`Value`], but a caller who needs to move decoded
/// values across threads can supply a factory built on `Arc<Mutex<_>>`
/// instead, without touching the decoder or the builder.
pub trait Factory {
    /// The value type this factory produces.
    type Value: Clone;

    /// Constructs an empty array.
    fn new_array(&self) -> Self::Value;
    /// Constructs an empty map.
    fn new_map(&self) -> Self::Value;
    /// Constructs an id value.
    fn new_id(&self, bytes: [u8; 16]) -> Self::Value;
    /// Constructs a seed whose header has not yet been set.
    fn new_seed(&self) -> Self::Value;
    /// Constructs an empty struct.
    fn new_struct(&self) -> Self::Value;

    /// Constructs the null value.
    fn new_null(&self) -> Self::Value;
    /// Constructs a boolean value.
    fn new_bool(&self, value: bool) -> Self::Value;
    /// Constructs an integer value.
    fn new_int(&self, value: i128) -> Self::Value;
    /// Constructs a floating-point value.
    fn new_float(&self, value: f64) -> Self::Value;
    /// Constructs a string value from raw bytes and an optional encoding tag.
    fn new_string(&self, bytes: &[u8], encoding: Option<&str>) -> Self::Value;
    /// Constructs a blob value from raw bytes.
    fn new_blob(&self, bytes: &[u8]) -> Self::Value;

    /// Appends `item` to the end of `array`.
    fn array_push(&self, array: &Self::Value, item: Self::Value);
    /// Inserts `key`/`value` into `map`. Returns the rejected key back to
    /// the caller if an equal key is already present.
    fn map_insert(
        &self,
        map: &Self::Value,
        key: Self::Value,
        value: Self::Value,
    ) -> Result<(), Self::Value>;
    /// Sets `seed`'s header. Called exactly once, before any field is
    /// inserted.
    fn set_seed_header(&self, seed: &Self::Value, header: Self::Value);
    /// Appends a field/value pair to `seed`.
    fn seed_insert(&self, seed: &Self::Value, field: Self::Value, value: Self::Value);
    /// Appends a (tag, value) pair to `strukt`.
    fn struct_push(&self, strukt: &Self::Value, tag: u32, value: Self::Value);
}

/// The [`Factory`] this crate ships by default, producing its own owned
/// [`Value`] tree.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl Factory for DefaultFactory {
    type Value = Value;

    fn new_array(&self) -> Value {
        Value::Array(Rc::new(RefCell::new(Vec::new())))
    }

    fn new_map(&self) -> Value {
        Value::Map(Rc::new(RefCell::new(Vec::new())))
    }

    fn new_id(&self, bytes: [u8; 16]) -> Value {
        Value::Id(bytes)
    }

    fn new_seed(&self) -> Value {
        Value::Seed(Rc::new(RefCell::new(SeedData {
            header: Value::Null,
            fields: Vec::new(),
        })))
    }

    fn new_struct(&self) -> Value {
        Value::Struct(Rc::new(RefCell::new(StructData { fields: Vec::new() })))
    }

    fn new_null(&self) -> Value {
        Value::Null
    }

    fn new_bool(&self, value: bool) -> Value {
        Value::Bool(value)
    }

    fn new_int(&self, value: i128) -> Value {
        Value::Int(value)
    }

    fn new_float(&self, value: f64) -> Value {
        Value::Float(value)
    }

    fn new_string(&self, bytes: &[u8], encoding: Option<&str>) -> Value {
        Value::String(PString {
            bytes: bytes.to_vec(),
            encoding: encoding.map(str::to_owned),
        })
    }

    fn new_blob(&self, bytes: &[u8]) -> Value {
        Value::Blob(Rc::new(bytes.to_vec()))
    }

    fn array_push(&self, array: &Value, item: Value) {
        match array {
            Value::Array(a) => a.borrow_mut().push(item),
            other => unreachable!("array_push called on a {}", other.kind_name()),
        }
    }

    fn map_insert(&self, map: &Value, key: Value, value: Value) -> Result<(), Value> {
        match map {
            Value::Map(m) => {
                let mut pairs = m.borrow_mut();
                if pairs.iter().any(|(k, _)| crate::value::value_equal(k, &key)) {
                    return Err(key);
                }
                pairs.push((key, value));
                Ok(())
            }
            other => unreachable!("map_insert called on a {}", other.kind_name()),
        }
    }

    fn set_seed_header(&self, seed: &Value, header: Value) {
        match seed {
            Value::Seed(s) => s.borrow_mut().header = header,
            other => unreachable!("set_seed_header called on a {}", other.kind_name()),
        }
    }

    fn seed_insert(&self, seed: &Value, field: Value, value: Value) {
        match seed {
            Value::Seed(s) => s.borrow_mut().fields.push((field, value)),
            other => unreachable!("seed_insert called on a {}", other.kind_name()),
        }
    }

    fn struct_push(&self, strukt: &Value, tag: u32, value: Value) {
        match strukt {
            Value::Struct(s) => s.borrow_mut().fields.push((tag, value)),
            other => unreachable!("struct_push called on a {}", other.kind_name()),
        }
    }
}

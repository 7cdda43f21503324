//! The owned value tree this crate ships as its default [`Factory`] output.
//!
//! Composites are held behind `Rc<RefCell<_>>` so that a decoded graph can
//! contain genuine cycles (an array that contains itself, two maps that
//! reference one another through a shared id) while staying within safe
//! Rust. [`Rc::as_ptr`] doubles as the "same mutable object" identity that
//! the traversers need to detect shared structure.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// A decoded or to-be-encoded string: its raw bytes plus an optional
/// encoding tag. The binary and text codecs in this repository only ever
/// produce `None` (meaning UTF-8), but the field exists so that a value
/// tree built by a caller's own [`Factory`] can carry through whatever a
/// non-default string encoding would have meant upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PString {
    /// The string's raw bytes.
    pub bytes: Vec<u8>,
    /// The string's encoding tag, if any. `None` means UTF-8.
    pub encoding: Option<String>,
}

/// An array: an ordered, mutable sequence of values.
pub type ArrayHandle = Rc<RefCell<Vec<Value>>>;

/// A map: an ordered sequence of key/value pairs with no two equal keys.
pub type MapHandle = Rc<RefCell<Vec<(Value, Value)>>>;

/// The body of a seed: a header value plus an ordered sequence of
/// field/value pairs, keyed by arbitrary values rather than fixed tags.
#[derive(Debug)]
pub struct SeedData {
    /// The seed's header, describing the shape of the fields that follow.
    pub header: Value,
    /// The seed's fields, in wire order.
    pub fields: Vec<(Value, Value)>,
}

/// A seed handle, shared the same way arrays and maps are.
pub type SeedHandle = Rc<RefCell<SeedData>>;

/// The body of a struct: a fixed-tag, ordered sequence of values.
#[derive(Debug)]
pub struct StructData {
    /// The struct's (tag, value) pairs, in wire order.
    pub fields: Vec<(u32, Value)>,
}

/// A struct handle, shared the same way arrays and maps are.
pub type StructHandle = Rc<RefCell<StructData>>;

/// The owned, in-memory representation of a decoded (or about-to-be
/// encoded) plankton value.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed integer of arbitrary (up to 128-bit) magnitude.
    Int(i128),
    /// A floating-point number.
    Float(f64),
    /// A 128-bit opaque identifier.
    Id([u8; 16]),
    /// A string.
    String(PString),
    /// An opaque byte blob.
    Blob(Rc<Vec<u8>>),
    /// An array.
    Array(ArrayHandle),
    /// A map.
    Map(MapHandle),
    /// A seed.
    Seed(SeedHandle),
    /// A struct.
    Struct(StructHandle),
}

impl Value {
    /// A short label naming this value's kind, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Id(_) => "id",
            Value::String(_) => "string",
            Value::Blob(_) => "blob",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Seed(_) => "seed",
            Value::Struct(_) => "struct",
        }
    }

    /// The raw pointer identity of this value's backing allocation, for
    /// composites. Atoms have no shared identity and return `None`.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Array(a) => Some(Rc::as_ptr(a) as usize),
            Value::Map(m) => Some(Rc::as_ptr(m) as usize),
            Value::Seed(s) => Some(Rc::as_ptr(s) as usize),
            Value::Struct(s) => Some(Rc::as_ptr(s) as usize),
            _ => None,
        }
    }
}

/// Structural, cycle-aware equality between two values.
///
/// Composites are compared by the shape and content they hold rather than
/// by identity, but a pair of identities already on the traversal stack is
/// treated as equal on sight instead of recursing again, so that a pair of
/// equal cyclic values compares equal instead of looping forever.
pub fn value_equal(a: &Value, b: &Value) -> bool {
    let mut seen: HashSet<(usize, usize)> = HashSet::new();
    equal_inner(a, b, &mut seen)
}

fn equal_inner(a: &Value, b: &Value, seen: &mut HashSet<(usize, usize)>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Int(x), Value::Int(y)) => x == y,
        (Value::Float(x), Value::Float(y)) => x.to_bits() == y.to_bits(),
        (Value::Id(x), Value::Id(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Blob(x), Value::Blob(y)) => **x == **y,
        (Value::Array(x), Value::Array(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&key) {
                return true;
            }
            if Rc::ptr_eq(x, y) {
                return true;
            }
            seen.insert(key);
            let (xs, ys) = (x.borrow(), y.borrow());
            let result =
                xs.len() == ys.len() && xs.iter().zip(ys.iter()).all(|(i, j)| equal_inner(i, j, seen));
            seen.remove(&key);
            result
        }
        (Value::Map(x), Value::Map(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&key) {
                return true;
            }
            if Rc::ptr_eq(x, y) {
                return true;
            }
            seen.insert(key);
            let (xs, ys) = (x.borrow(), y.borrow());
            let result = xs.len() == ys.len()
                && xs.iter().all(|(xk, xv)| {
                    ys.iter()
                        .any(|(yk, yv)| equal_inner(xk, yk, seen) && equal_inner(xv, yv, seen))
                });
            seen.remove(&key);
            result
        }
        (Value::Seed(x), Value::Seed(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&key) {
                return true;
            }
            if Rc::ptr_eq(x, y) {
                return true;
            }
            seen.insert(key);
            let (xs, ys) = (x.borrow(), y.borrow());
            let result = equal_inner(&xs.header, &ys.header, seen)
                && xs.fields.len() == ys.fields.len()
                && xs
                    .fields
                    .iter()
                    .zip(ys.fields.iter())
                    .all(|((xk, xv), (yk, yv))| equal_inner(xk, yk, seen) && equal_inner(xv, yv, seen));
            seen.remove(&key);
            result
        }
        (Value::Struct(x), Value::Struct(y)) => {
            let key = (Rc::as_ptr(x) as usize, Rc::as_ptr(y) as usize);
            if seen.contains(&key) {
                return true;
            }
            if Rc::ptr_eq(x, y) {
                return true;
            }
            seen.insert(key);
            let (xs, ys) = (x.borrow(), y.borrow());
            let result = xs.fields.len() == ys.fields.len()
                && xs
                    .fields
                    .iter()
                    .zip(ys.fields.iter())
                    .all(|((xt, xv), (yt, yv))| xt == yt && equal_inner(xv, yv, seen));
            seen.remove(&key);
            result
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atoms_compare_by_value() {
        assert!(value_equal(&Value::Int(3), &Value::Int(3)));
        assert!(!value_equal(&Value::Int(3), &Value::Int(4)));
        assert!(!value_equal(&Value::Int(3), &Value::Bool(true)));
    }

    #[test]
    fn arrays_compare_structurally_not_by_identity() {
        let a: ArrayHandle = Rc::new(RefCell::new(vec![Value::Int(1), Value::Int(2)]));
        let b: ArrayHandle = Rc::new(RefCell::new(vec![Value::Int(1), Value::Int(2)]));
        assert!(value_equal(&Value::Array(a), &Value::Array(b)));
    }

    #[test]
    fn self_referential_arrays_compare_equal() {
        let a: ArrayHandle = Rc::new(RefCell::new(Vec::new()));
        a.borrow_mut().push(Value::Array(a.clone()));
        let b: ArrayHandle = Rc::new(RefCell::new(Vec::new()));
        b.borrow_mut().push(Value::Array(b.clone()));
        assert!(value_equal(&Value::Array(a), &Value::Array(b)));
    }

    #[test]
    fn maps_ignore_key_order() {
        let a: MapHandle = Rc::new(RefCell::new(vec![
            (Value::Int(1), Value::Int(10)),
            (Value::Int(2), Value::Int(20)),
        ]));
        let b: MapHandle = Rc::new(RefCell::new(vec![
            (Value::Int(2), Value::Int(20)),
            (Value::Int(1), Value::Int(10)),
        ]));
        assert!(value_equal(&Value::Map(a), &Value::Map(b)));
    }
}

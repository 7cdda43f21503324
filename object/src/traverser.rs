//! Drives a [`Visitor`] from an already-assembled [`Value`] tree.
//!
//! Two strategies are offered. [`encode_tree`] walks the value once, in
//! depth-first order, and aborts the moment it meets the same composite
//! identity twice — cheap, but unable to represent shared or cyclic
//! structure on the wire. [`encode_graph`] runs a first pass to find out
//! which composites are visited more than once, then a second pass that
//! emits `ADD_REF` the first time one of those is reached and `GET_REF`
//! every time after. [`crate::encode_binary`] and [`crate::encode_text`]
//! try the tree strategy first and fall back to the graph strategy only
//! when it reports shared structure, since the tree encoding is both
//! smaller and cheaper to produce for the overwhelmingly common case of a
//! value with no sharing at all.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use plankton_encoding::{Singleton, Visitor};

use crate::value::Value;

/// Raised by [`encode_tree`] when it meets a composite identity for the
/// second time: a signal to the caller to retry with [`encode_graph`]
/// rather than a wire-format-level error in its own right.
#[derive(Debug)]
pub enum TreeEncodeError<E> {
    SharedStructureDetected,
    Visitor(E),
}

fn visit<E>(result: Result<(), E>) -> Result<(), TreeEncodeError<E>> {
    result.map_err(TreeEncodeError::Visitor)
}

/// Walks `value` depth-first, emitting one visitor call per node, and
/// fails with [`TreeEncodeError::SharedStructureDetected`] the first time a
/// composite's identity (not its contents) repeats.
pub fn encode_tree<V: Visitor>(
    value: &Value,
    visitor: &mut V,
) -> Result<(), TreeEncodeError<V::Error>> {
    let mut seen = HashSet::new();
    encode_tree_inner(value, visitor, &mut seen)
}

fn encode_tree_inner<V: Visitor>(
    value: &Value,
    visitor: &mut V,
    seen: &mut HashSet<usize>,
) -> Result<(), TreeEncodeError<V::Error>> {
    match value {
        Value::Null => visit(visitor.on_singleton(Singleton::Null)),
        Value::Bool(b) => visit(visitor.on_singleton(if *b { Singleton::True } else { Singleton::False })),
        Value::Int(i) => visit(visitor.on_int(*i)),
        Value::Float(f) => visit(visitor.on_float(*f)),
        Value::Id(id) => visit(visitor.on_id(*id)),
        Value::String(s) => visit(visitor.on_string(&s.bytes, s.encoding.as_deref())),
        Value::Blob(b) => visit(visitor.on_blob(b)),
        Value::Array(a) => {
            if !seen.insert(Rc::as_ptr(a) as usize) {
                return Err(TreeEncodeError::SharedStructureDetected);
            }
            let items = a.borrow();
            visit(visitor.on_begin_array(items.len()))?;
            for item in items.iter() {
                encode_tree_inner(item, visitor, seen)?;
            }
            Ok(())
        }
        Value::Map(m) => {
            if !seen.insert(Rc::as_ptr(m) as usize) {
                return Err(TreeEncodeError::SharedStructureDetected);
            }
            let pairs = m.borrow();
            visit(visitor.on_begin_map(pairs.len()))?;
            for (key, value) in pairs.iter() {
                encode_tree_inner(key, visitor, seen)?;
                encode_tree_inner(value, visitor, seen)?;
            }
            Ok(())
        }
        Value::Seed(s) => {
            if !seen.insert(Rc::as_ptr(s) as usize) {
                return Err(TreeEncodeError::SharedStructureDetected);
            }
            let seed = s.borrow();
            visit(visitor.on_begin_seed(seed.fields.len()))?;
            encode_tree_inner(&seed.header, visitor, seen)?;
            for (field, value) in seed.fields.iter() {
                encode_tree_inner(field, visitor, seen)?;
                encode_tree_inner(value, visitor, seen)?;
            }
            Ok(())
        }
        Value::Struct(s) => {
            if !seen.insert(Rc::as_ptr(s) as usize) {
                return Err(TreeEncodeError::SharedStructureDetected);
            }
            let strukt = s.borrow();
            let tags: Vec<u32> = strukt.fields.iter().map(|(tag, _)| *tag).collect();
            visit(visitor.on_begin_struct(&tags))?;
            for (_, value) in strukt.fields.iter() {
                encode_tree_inner(value, visitor, seen)?;
            }
            Ok(())
        }
    }
}

fn for_each_child(value: &Value, mut f: impl FnMut(&Value)) {
    match value {
        Value::Array(a) => {
            for item in a.borrow().iter() {
                f(item);
            }
        }
        Value::Map(m) => {
            for (key, value) in m.borrow().iter() {
                f(key);
                f(value);
            }
        }
        Value::Seed(s) => {
            let seed = s.borrow();
            f(&seed.header);
            for (field, value) in seed.fields.iter() {
                f(field);
                f(value);
            }
        }
        Value::Struct(s) => {
            for (_, value) in s.borrow().fields.iter() {
                f(value);
            }
        }
        _ => {}
    }
}

fn discover(value: &Value, seen_once: &mut HashSet<usize>, seen_twice: &mut HashSet<usize>) {
    let identity = match value.identity() {
        Some(id) => id,
        None => return,
    };
    if seen_once.contains(&identity) {
        seen_twice.insert(identity);
        return;
    }
    seen_once.insert(identity);
    for_each_child(value, |child| discover(child, seen_once, seen_twice));
}

/// Walks `value` twice: once to find which composite identities recur, and
/// once to emit visitor calls, assigning a fresh ref slot and an `ADD_REF`
/// the first time a recurring identity is reached and a `GET_REF` every
/// time after (including the first time a self-referential composite
/// reaches itself, which is what makes true cycles representable).
pub fn encode_graph<V: Visitor>(value: &Value, visitor: &mut V) -> Result<(), V::Error> {
    let mut seen_once = HashSet::new();
    let mut seen_twice = HashSet::new();
    discover(value, &mut seen_once, &mut seen_twice);

    let mut ref_offsets = HashMap::new();
    let mut next_slot = 0u64;
    encode_graph_inner(value, visitor, &seen_twice, &mut ref_offsets, &mut next_slot)
}

fn encode_graph_inner<V: Visitor>(
    value: &Value,
    visitor: &mut V,
    seen_twice: &HashSet<usize>,
    ref_offsets: &mut HashMap<usize, u64>,
    next_slot: &mut u64,
) -> Result<(), V::Error> {
    if let Some(identity) = value.identity() {
        if let Some(&slot) = ref_offsets.get(&identity) {
            return visitor.on_get_ref(slot);
        }
        if seen_twice.contains(&identity) {
            let slot = *next_slot;
            *next_slot += 1;
            ref_offsets.insert(identity, slot);
            visitor.on_add_ref(slot)?;
        }
    }

    match value {
        Value::Null => visitor.on_singleton(Singleton::Null),
        Value::Bool(b) => visitor.on_singleton(if *b { Singleton::True } else { Singleton::False }),
        Value::Int(i) => visitor.on_int(*i),
        Value::Float(f) => visitor.on_float(*f),
        Value::Id(id) => visitor.on_id(*id),
        Value::String(s) => visitor.on_string(&s.bytes, s.encoding.as_deref()),
        Value::Blob(b) => visitor.on_blob(b),
        Value::Array(a) => {
            let items = a.borrow();
            visitor.on_begin_array(items.len())?;
            for item in items.iter() {
                encode_graph_inner(item, visitor, seen_twice, ref_offsets, next_slot)?;
            }
            Ok(())
        }
        Value::Map(m) => {
            let pairs = m.borrow();
            visitor.on_begin_map(pairs.len())?;
            for (key, value) in pairs.iter() {
                encode_graph_inner(key, visitor, seen_twice, ref_offsets, next_slot)?;
                encode_graph_inner(value, visitor, seen_twice, ref_offsets, next_slot)?;
            }
            Ok(())
        }
        Value::Seed(s) => {
            let seed = s.borrow();
            visitor.on_begin_seed(seed.fields.len())?;
            encode_graph_inner(&seed.header, visitor, seen_twice, ref_offsets, next_slot)?;
            for (field, value) in seed.fields.iter() {
                encode_graph_inner(field, visitor, seen_twice, ref_offsets, next_slot)?;
                encode_graph_inner(value, visitor, seen_twice, ref_offsets, next_slot)?;
            }
            Ok(())
        }
        Value::Struct(s) => {
            let strukt = s.borrow();
            let tags: Vec<u32> = strukt.fields.iter().map(|(tag, _)| *tag).collect();
            visitor.on_begin_struct(&tags)?;
            for (_, value) in strukt.fields.iter() {
                encode_graph_inner(value, visitor, seen_twice, ref_offsets, next_slot)?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Visitor for Recorder {
        type Error = std::convert::Infallible;

        fn on_int(&mut self, value: i128) -> Result<(), Self::Error> {
            self.calls.push(format!("int({value})"));
            Ok(())
        }
        fn on_singleton(&mut self, value: Singleton) -> Result<(), Self::Error> {
            self.calls.push(format!("singleton({value:?})"));
            Ok(())
        }
        fn on_float(&mut self, value: f64) -> Result<(), Self::Error> {
            self.calls.push(format!("float({value})"));
            Ok(())
        }
        fn on_id(&mut self, value: [u8; 16]) -> Result<(), Self::Error> {
            self.calls.push(format!("id({value:?})"));
            Ok(())
        }
        fn on_string(&mut self, bytes: &[u8], _encoding: Option<&str>) -> Result<(), Self::Error> {
            self.calls.push(format!("string({bytes:?})"));
            Ok(())
        }
        fn on_blob(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
            self.calls.push(format!("blob({bytes:?})"));
            Ok(())
        }
        fn on_begin_array(&mut self, len: usize) -> Result<(), Self::Error> {
            self.calls.push(format!("begin_array({len})"));
            Ok(())
        }
        fn on_begin_map(&mut self, len: usize) -> Result<(), Self::Error> {
            self.calls.push(format!("begin_map({len})"));
            Ok(())
        }
        fn on_begin_seed(&mut self, field_count: usize) -> Result<(), Self::Error> {
            self.calls.push(format!("begin_seed({field_count})"));
            Ok(())
        }
        fn on_begin_struct(&mut self, tags: &[u32]) -> Result<(), Self::Error> {
            self.calls.push(format!("begin_struct({tags:?})"));
            Ok(())
        }
        fn on_add_ref(&mut self, slot_index: u64) -> Result<(), Self::Error> {
            self.calls.push(format!("add_ref({slot_index})"));
            Ok(())
        }
        fn on_get_ref(&mut self, slot_index: u64) -> Result<(), Self::Error> {
            self.calls.push(format!("get_ref({slot_index})"));
            Ok(())
        }
    }

    #[test]
    fn tree_walk_visits_array_elements_in_order() {
        let array = Value::Array(Rc::new(RefCell::new(vec![Value::Int(1), Value::Bool(true)])));
        let mut recorder = Recorder::default();
        assert!(encode_tree(&array, &mut recorder).is_ok());
        assert_eq!(
            recorder.calls,
            vec!["begin_array(2)", "int(1)", "singleton(True)"]
        );
    }

    #[test]
    fn tree_walk_detects_shared_structure() {
        let shared = Value::Array(Rc::new(RefCell::new(vec![Value::Int(1)])));
        let outer = Value::Array(Rc::new(RefCell::new(vec![shared.clone(), shared])));
        let mut recorder = Recorder::default();
        match encode_tree(&outer, &mut recorder) {
            Err(TreeEncodeError::SharedStructureDetected) => {}
            _ => panic!("expected shared structure to be detected"),
        }
    }

    #[test]
    fn graph_walk_emits_add_ref_then_get_ref_for_shared_structure() {
        let shared = Value::Array(Rc::new(RefCell::new(vec![Value::Int(1)])));
        let outer = Value::Array(Rc::new(RefCell::new(vec![shared.clone(), shared])));
        let mut recorder = Recorder::default();
        encode_graph(&outer, &mut recorder).unwrap();
        assert_eq!(
            recorder.calls,
            vec![
                "begin_array(2)",
                "add_ref(0)",
                "begin_array(1)",
                "int(1)",
                "get_ref(0)",
            ]
        );
    }

    #[test]
    fn graph_walk_handles_self_referential_array() {
        let cell: ArrayCell = Rc::new(RefCell::new(Vec::new()));
        cell.borrow_mut().push(Value::Array(cell.clone()));
        let value = Value::Array(cell);
        let mut recorder = Recorder::default();
        encode_graph(&value, &mut recorder).unwrap();
        assert_eq!(
            recorder.calls,
            vec!["add_ref(0)", "begin_array(1)", "get_ref(0)"]
        );
    }

    type ArrayCell = Rc<RefCell<Vec<Value>>>;
}

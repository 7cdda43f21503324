//! The stack-based [`Visitor`] that turns a stream of decoded instructions
//! into a single assembled value.

use std::collections::HashMap;

use plankton_encoding::{Singleton, Visitor};
use snafu::OptionExt;

use crate::error::{DuplicateMapKeySnafu, Error, InvalidReferenceSnafu};
use crate::factory::Factory;

/// What to do with a composite's children once all of them have arrived.
enum Finisher<V> {
    /// The bottom-most frame. Never completes; its presence alone is what
    /// lets [`ObjectBuilder::has_result`] be a plain length check instead of
    /// a special case for "stack is empty".
    Sentinel,
    /// The second-from-bottom frame: receives exactly the root value and
    /// records it as the decode's result.
    StoreResult,
    FillArray { array: V },
    FillMap { map: V },
    SetSeedHeader { seed: V, field_count: usize },
    FillSeed { seed: V },
    FillStruct { strukt: V, tags: Vec<u32> },
}

struct Frame<V> {
    expected_count: usize,
    received_count: usize,
    finisher: Finisher<V>,
}

/// Assembles a single value out of the instruction calls a
/// [`plankton_encoding::Decoder`] (or a text parser driving the same
/// [`Visitor`] contract) makes against it.
///
/// Two stacks do the work: `values` holds every child value that has
/// finished but not yet been claimed by its parent, and `pending` holds one
/// frame per composite still waiting on children, each tracking how many
/// children it still needs and what to do once they've all arrived. A
/// composite's identity is published to the ref table the moment it is
/// created — before any of its children are visited — so that a child which
/// turns out to be a reference back to an ancestor resolves to a live,
/// still-being-filled value rather than one that doesn't exist yet.
pub struct ObjectBuilder<F: Factory> {
    factory: F,
    refs: HashMap<u64, F::Value>,
    values: Vec<F::Value>,
    pending: Vec<Frame<F::Value>>,
    pending_ref: Option<u64>,
    result: Option<F::Value>,
}

impl<F: Factory> ObjectBuilder<F> {
    /// Creates a builder that constructs values through `factory`.
    pub fn new(factory: F) -> Self {
        ObjectBuilder {
            factory,
            refs: HashMap::new(),
            values: Vec::new(),
            pending: vec![
                Frame {
                    expected_count: 2,
                    received_count: 0,
                    finisher: Finisher::Sentinel,
                },
                Frame {
                    expected_count: 1,
                    received_count: 0,
                    finisher: Finisher::StoreResult,
                },
            ],
            pending_ref: None,
            result: None,
        }
    }

    /// True once a full value has been assembled and no composite is still
    /// waiting on children.
    pub fn has_result(&self) -> bool {
        self.pending.len() == 1
    }

    /// Consumes the builder, returning the assembled value.
    ///
    /// Panics if [`Self::has_result`] is false; callers are expected to
    /// drive decoding in a loop that checks it after every instruction.
    pub fn into_result(mut self) -> F::Value {
        self.result.take().expect("decode did not produce a result")
    }

    fn maybe_add_ref(&mut self, value: &F::Value) {
        if let Some(slot) = self.pending_ref.take() {
            self.refs.insert(slot, value.clone());
        }
    }

    fn push_value(&mut self, value: F::Value) -> Result<(), Error> {
        self.values.push(value);
        let top = self
            .pending
            .last_mut()
            .expect("the sentinel frame is never popped");
        top.received_count += 1;
        if top.received_count != top.expected_count {
            return Ok(());
        }
        let frame = self.pending.pop().expect("just checked non-empty");
        let start = self.values.len() - frame.expected_count;
        let collected = self.values.split_off(start);
        self.finish(frame.finisher, collected)
    }

    fn finish(&mut self, finisher: Finisher<F::Value>, collected: Vec<F::Value>) -> Result<(), Error> {
        match finisher {
            Finisher::Sentinel => unreachable!("the sentinel frame never completes"),
            Finisher::StoreResult => {
                let mut values = collected.into_iter();
                self.result = values.next();
                let placeholder = self.factory.new_null();
                self.push_value(placeholder)
            }
            Finisher::FillArray { array } => {
                for item in collected {
                    self.factory.array_push(&array, item);
                }
                self.push_value(array)
            }
            Finisher::FillMap { map } => {
                let mut values = collected.into_iter();
                while let (Some(key), Some(value)) = (values.next(), values.next()) {
                    if let Err(key) = self.factory.map_insert(&map, key, value) {
                        return DuplicateMapKeySnafu {
                            description: describe(&key),
                        }
                        .fail();
                    }
                }
                self.push_value(map)
            }
            Finisher::SetSeedHeader { seed, field_count } => {
                let header = collected.into_iter().next().expect("exactly one header value");
                self.factory.set_seed_header(&seed, header);
                if field_count == 0 {
                    self.push_value(seed)
                } else {
                    self.pending.push(Frame {
                        expected_count: 2 * field_count,
                        received_count: 0,
                        finisher: Finisher::FillSeed { seed },
                    });
                    Ok(())
                }
            }
            Finisher::FillSeed { seed } => {
                let mut values = collected.into_iter();
                while let (Some(field), Some(value)) = (values.next(), values.next()) {
                    self.factory.seed_insert(&seed, field, value);
                }
                self.push_value(seed)
            }
            Finisher::FillStruct { strukt, tags } => {
                for (tag, value) in tags.into_iter().zip(collected) {
                    self.factory.struct_push(&strukt, tag, value);
                }
                self.push_value(strukt)
            }
        }
    }
}

fn describe<V>(_value: &V) -> String {
    "a previously inserted key".to_owned()
}

impl<F: Factory> Visitor for ObjectBuilder<F> {
    type Error = Error;

    fn on_int(&mut self, value: i128) -> Result<(), Error> {
        let v = self.factory.new_int(value);
        self.push_value(v)
    }

    fn on_singleton(&mut self, value: Singleton) -> Result<(), Error> {
        let v = match value {
            Singleton::Null => self.factory.new_null(),
            Singleton::True => self.factory.new_bool(true),
            Singleton::False => self.factory.new_bool(false),
        };
        self.push_value(v)
    }

    fn on_float(&mut self, value: f64) -> Result<(), Error> {
        let v = self.factory.new_float(value);
        self.push_value(v)
    }

    fn on_id(&mut self, value: [u8; 16]) -> Result<(), Error> {
        let v = self.factory.new_id(value);
        self.push_value(v)
    }

    fn on_string(&mut self, bytes: &[u8], encoding: Option<&str>) -> Result<(), Error> {
        let v = self.factory.new_string(bytes, encoding);
        self.push_value(v)
    }

    fn on_blob(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let v = self.factory.new_blob(bytes);
        self.push_value(v)
    }

    fn on_begin_array(&mut self, len: usize) -> Result<(), Error> {
        let array = self.factory.new_array();
        self.maybe_add_ref(&array);
        if len == 0 {
            self.push_value(array)
        } else {
            self.pending.push(Frame {
                expected_count: len,
                received_count: 0,
                finisher: Finisher::FillArray { array },
            });
            Ok(())
        }
    }

    fn on_begin_map(&mut self, len: usize) -> Result<(), Error> {
        let map = self.factory.new_map();
        self.maybe_add_ref(&map);
        if len == 0 {
            self.push_value(map)
        } else {
            self.pending.push(Frame {
                expected_count: 2 * len,
                received_count: 0,
                finisher: Finisher::FillMap { map },
            });
            Ok(())
        }
    }

    fn on_begin_seed(&mut self, field_count: usize) -> Result<(), Error> {
        let seed = self.factory.new_seed();
        self.maybe_add_ref(&seed);
        self.pending.push(Frame {
            expected_count: 1,
            received_count: 0,
            finisher: Finisher::SetSeedHeader { seed, field_count },
        });
        Ok(())
    }

    fn on_begin_struct(&mut self, tags: &[u32]) -> Result<(), Error> {
        let strukt = self.factory.new_struct();
        self.maybe_add_ref(&strukt);
        if tags.is_empty() {
            self.push_value(strukt)
        } else {
            self.pending.push(Frame {
                expected_count: tags.len(),
                received_count: 0,
                finisher: Finisher::FillStruct {
                    strukt,
                    tags: tags.to_vec(),
                },
            });
            Ok(())
        }
    }

    fn on_add_ref(&mut self, slot_index: u64) -> Result<(), Error> {
        self.pending_ref = Some(slot_index);
        Ok(())
    }

    fn on_get_ref(&mut self, slot_index: u64) -> Result<(), Error> {
        let value = self
            .refs
            .get(&slot_index)
            .cloned()
            .context(InvalidReferenceSnafu { slot: slot_index })?;
        self.push_value(value)
    }

    fn on_invalid_instruction(&mut self, _opcode: u8) -> Result<(), Error> {
        Ok(())
    }

    fn has_result(&self) -> bool {
        ObjectBuilder::has_result(self)
    }
}

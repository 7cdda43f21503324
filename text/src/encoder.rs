//! The tton [`Visitor`] implementation: turns decoder/traverser calls into
//! formatted text instead of wire bytes.
//!
//! Composites arrive the same prefix-length, no-end-marker way they do on
//! the binary side, so this encoder is a stack-based builder shaped exactly
//! like [`plankton_object::ObjectBuilder`] — only here the "values" on the
//! stack are already-formatted `String` fragments rather than assembled
//! [`plankton_object::Value`]s, and a completed composite's finisher joins
//! its children with `", "` and wraps them in the right bracket pair
//! instead of pushing them into a factory-built container.

use itertools::Itertools;
use plankton_core::id;
use plankton_encoding::{Singleton, Visitor};

use crate::error::{Error, FloatUnsupportedSnafu, StructUnsupportedSnafu};

enum Finisher {
    Sentinel,
    StoreResult,
    FinishArray { ref_slot: Option<u64> },
    FinishMap { ref_slot: Option<u64> },
    FinishSeedHeader { ref_slot: Option<u64>, field_count: usize },
    FinishSeed { ref_slot: Option<u64>, header: String },
}

struct Frame {
    expected_count: usize,
    received_count: usize,
    finisher: Finisher,
}

/// Formats a single value as tton as visitor calls arrive.
///
/// Construct one with [`TextEncoder::new`], drive it with
/// [`plankton_object::encode_tree`] or [`plankton_object::encode_graph`],
/// then call [`TextEncoder::into_result`].
pub struct TextEncoder {
    values: Vec<String>,
    pending: Vec<Frame>,
    pending_ref: Option<u64>,
    result: Option<String>,
}

impl TextEncoder {
    /// Creates an encoder with nothing written yet.
    pub fn new() -> Self {
        TextEncoder {
            values: Vec::new(),
            pending: vec![
                Frame { expected_count: 2, received_count: 0, finisher: Finisher::Sentinel },
                Frame { expected_count: 1, received_count: 0, finisher: Finisher::StoreResult },
            ],
            pending_ref: None,
            result: None,
        }
    }

    /// Consumes the encoder, returning the formatted text.
    ///
    /// Panics if the root value was never completed; callers are expected
    /// to drive a full traversal (tree or graph) before calling this.
    pub fn into_result(mut self) -> String {
        self.result.take().expect("traversal did not produce a result")
    }

    fn maybe_add_ref(&self, ref_slot: Option<u64>, text: String) -> String {
        match ref_slot {
            Some(slot) => format!("${slot}:{text}"),
            None => text,
        }
    }

    fn push_value(&mut self, value: String) -> Result<(), Error> {
        self.values.push(value);
        let top = self.pending.last_mut().expect("the sentinel frame is never popped");
        top.received_count += 1;
        if top.received_count != top.expected_count {
            return Ok(());
        }
        let frame = self.pending.pop().expect("just checked non-empty");
        let start = self.values.len() - frame.expected_count;
        let collected = self.values.split_off(start);
        self.finish(frame.finisher, collected)
    }

    fn finish(&mut self, finisher: Finisher, collected: Vec<String>) -> Result<(), Error> {
        match finisher {
            Finisher::Sentinel => unreachable!("the sentinel frame never completes"),
            Finisher::StoreResult => {
                let mut values = collected.into_iter();
                self.result = values.next();
                self.push_value(String::new())
            }
            Finisher::FinishArray { ref_slot } => {
                let text = format!("[{}]", collected.iter().join(", "));
                self.push_value(self.maybe_add_ref(ref_slot, text))
            }
            Finisher::FinishMap { ref_slot } => {
                let text = format!("{{{}}}", pairs(&collected));
                self.push_value(self.maybe_add_ref(ref_slot, text))
            }
            Finisher::FinishSeedHeader { ref_slot, field_count } => {
                let header = collected.into_iter().next().expect("exactly one header value");
                if field_count == 0 {
                    let text = format!("@{header}");
                    self.push_value(self.maybe_add_ref(ref_slot, text))
                } else {
                    self.pending.push(Frame {
                        expected_count: 2 * field_count,
                        received_count: 0,
                        finisher: Finisher::FinishSeed { ref_slot, header },
                    });
                    Ok(())
                }
            }
            Finisher::FinishSeed { ref_slot, header } => {
                let text = format!("@{header}({})", pairs(&collected));
                self.push_value(self.maybe_add_ref(ref_slot, text))
            }
        }
    }
}

impl Default for TextEncoder {
    fn default() -> Self {
        Self::new()
    }
}

fn pairs(collected: &[String]) -> String {
    collected
        .chunks_exact(2)
        .map(|pair| format!("{}: {}", pair[0], pair[1]))
        .join(", ")
}

impl Visitor for TextEncoder {
    type Error = Error;

    fn on_int(&mut self, value: i128) -> Result<(), Error> {
        self.push_value(value.to_string())
    }

    fn on_singleton(&mut self, value: Singleton) -> Result<(), Error> {
        let text = match value {
            Singleton::Null => "%n",
            Singleton::True => "%t",
            Singleton::False => "%f",
        };
        self.push_value(text.to_owned())
    }

    fn on_float(&mut self, _value: f64) -> Result<(), Error> {
        FloatUnsupportedSnafu.fail()
    }

    fn on_id(&mut self, value: [u8; 16]) -> Result<(), Error> {
        let width = id::select_width(&value);
        let text = format!("&{}", hex::encode(id::truncate(&value, width)));
        self.push_value(text)
    }

    fn on_string(&mut self, bytes: &[u8], _encoding: Option<&str>) -> Result<(), Error> {
        let text = format!("\"{}\"", String::from_utf8_lossy(bytes));
        self.push_value(text)
    }

    fn on_blob(&mut self, bytes: &[u8]) -> Result<(), Error> {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        self.push_value(format!("%[{encoded}]"))
    }

    fn on_begin_array(&mut self, len: usize) -> Result<(), Error> {
        let ref_slot = self.pending_ref.take();
        if len == 0 {
            let text = self.maybe_add_ref(ref_slot, "[]".to_owned());
            self.push_value(text)
        } else {
            self.pending.push(Frame { expected_count: len, received_count: 0, finisher: Finisher::FinishArray { ref_slot } });
            Ok(())
        }
    }

    fn on_begin_map(&mut self, len: usize) -> Result<(), Error> {
        let ref_slot = self.pending_ref.take();
        if len == 0 {
            let text = self.maybe_add_ref(ref_slot, "{}".to_owned());
            self.push_value(text)
        } else {
            self.pending.push(Frame { expected_count: 2 * len, received_count: 0, finisher: Finisher::FinishMap { ref_slot } });
            Ok(())
        }
    }

    fn on_begin_seed(&mut self, field_count: usize) -> Result<(), Error> {
        let ref_slot = self.pending_ref.take();
        self.pending.push(Frame {
            expected_count: 1,
            received_count: 0,
            finisher: Finisher::FinishSeedHeader { ref_slot, field_count },
        });
        Ok(())
    }

    fn on_begin_struct(&mut self, _tag_vector: &[u32]) -> Result<(), Error> {
        StructUnsupportedSnafu.fail()
    }

    fn on_add_ref(&mut self, slot_index: u64) -> Result<(), Error> {
        self.pending_ref = Some(slot_index);
        Ok(())
    }

    fn on_get_ref(&mut self, slot_index: u64) -> Result<(), Error> {
        self.push_value(format!("${slot_index}"))
    }

    fn on_invalid_instruction(&mut self, _opcode: u8) -> Result<(), Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(f: impl FnOnce(&mut TextEncoder) -> Result<(), Error>) -> String {
        let mut encoder = TextEncoder::new();
        f(&mut encoder).unwrap();
        encoder.into_result()
    }

    #[test]
    fn tiny_int() {
        assert_eq!(encode(|e| e.on_int(3)), "3");
    }

    #[test]
    fn array_of_three() {
        let text = encode(|e| {
            e.on_begin_array(3)?;
            e.on_int(1)?;
            e.on_singleton(Singleton::Null)?;
            e.on_singleton(Singleton::True)
        });
        assert_eq!(text, "[1, %n, %t]");
    }

    #[test]
    fn empty_array() {
        assert_eq!(encode(|e| e.on_begin_array(0)), "[]");
    }

    #[test]
    fn a_map() {
        let text = encode(|e| {
            e.on_begin_map(1)?;
            e.on_string(b"a", None)?;
            e.on_int(1)
        });
        assert_eq!(text, r#"{"a": 1}"#);
    }

    #[test]
    fn a_ref_cycle() {
        let text = encode(|e| {
            e.on_add_ref(0)?;
            e.on_begin_array(1)?;
            e.on_get_ref(0)
        });
        assert_eq!(text, "$0:[$0]");
    }

    #[test]
    fn a_headerless_seed() {
        let text = encode(|e| {
            e.on_begin_seed(0)?;
            e.on_int(1)
        });
        assert_eq!(text, "@1");
    }

    #[test]
    fn structs_are_rejected() {
        assert!(encode(|e| e.on_begin_struct(&[0, 1])).is_err());
    }

    #[test]
    fn floats_are_rejected() {
        let mut encoder = TextEncoder::new();
        assert!(encoder.on_float(1.5).is_err());
    }

    #[test]
    fn id_renders_as_minimal_hex() {
        let mut id = [0u8; 16];
        id[15] = 0xff;
        assert_eq!(encode(|e| e.on_id(id)), "&00ff");
    }
}

//! The instruction stream decoder: turns a byte stream into [`Visitor`]
//! calls.
//!
//! The decoder's cursor model is the simple one: every handler consumes
//! its own opcode byte, then any operand bytes, leaving the stream
//! positioned exactly on the next opcode for the following call. There is
//! no lookahead byte to reason about.
//!
//! Varints and nibble-packed struct tags are read by growing a small
//! buffer one byte at a time and re-trying [`plankton_core::varint::read_unsigned`]
//! / [`plankton_core::nibble::decode_struct_tags`] against it until they
//! stop reporting "ran out of input" — those functions already embody the
//! bias-1 and delta/RLE algorithms bit-for-bit, so the stream-oriented
//! decoder reuses them instead of re-deriving the same arithmetic against
//! a `Read` source.

use crate::error::{self, Error, Result};
use crate::visitor::{Singleton, Visitor};
use plankton_core::{id, nibble, tag, varint};
use snafu::{ensure, ResultExt};
use std::io::Read;

/// Reads one complete binary instruction stream and dispatches visitor
/// calls for it.
///
/// Owns nothing but a byte source and the monotonic `next_slot` counter
/// ref slots are assigned from.
#[derive(Debug)]
pub struct Decoder<R> {
    input: R,
    next_slot: u64,
}

impl<R: Read> Decoder<R> {
    /// Wraps `input` for instruction-at-a-time decoding.
    pub fn new(input: R) -> Self {
        Decoder {
            input,
            next_slot: 0,
        }
    }

    /// Reads and dispatches exactly one instruction, invoking exactly one
    /// `on_*` method on `visitor`.
    pub fn decode_next<V: Visitor>(&mut self, visitor: &mut V) -> Result<()> {
        let opcode = self.read_byte()?;
        self.dispatch(opcode, visitor)
    }

    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.input
            .read_exact(&mut byte)
            .context(error::UnexpectedEofSnafu)?;
        Ok(byte[0])
    }

    fn read_exact_bytes(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.input
            .read_exact(&mut buf)
            .context(error::UnexpectedEofSnafu)?;
        Ok(buf)
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut buf = Vec::new();
        loop {
            match varint::read_unsigned(&buf) {
                Ok((value, _consumed)) => return Ok(value),
                Err(plankton_core::Error::UnexpectedEof { .. }) => {
                    buf.push(self.read_byte()?);
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    fn read_struct_tags(&mut self, tag_count: usize) -> Result<Vec<u32>> {
        let mut buf = Vec::new();
        loop {
            match nibble::decode_struct_tags(&buf, tag_count) {
                Ok((tags, _consumed)) => return Ok(tags),
                Err(plankton_core::Error::UnexpectedEof { .. }) => {
                    buf.push(self.read_byte()?);
                }
                Err(other) => {
                    return Err(Error::StructTags {
                        source: other,
                        backtrace: snafu::Backtrace::new(),
                    })
                }
            }
        }
    }

    fn assign_ref_slot(&mut self) -> u64 {
        let slot = self.next_slot;
        self.next_slot += 1;
        slot
    }

    fn resolve_backref(&self, offset: u64) -> Result<u64> {
        ensure!(
            offset < self.next_slot,
            error::RefOffsetOutOfRangeSnafu {
                offset,
                assigned: self.next_slot,
            }
        );
        Ok(self.next_slot - offset - 1)
    }

    fn dispatch<V: Visitor>(&mut self, opcode: u8, visitor: &mut V) -> Result<()> {
        use tag::*;
        match opcode {
            INT_0..=INT_5 | INT_M3..=INT_M1 => {
                let value = tag::int_literal(opcode).expect("opcode in literal range");
                visit(visitor.on_int(value as i128))
            }
            INT_P => {
                let value = self.read_varint()?;
                visit(visitor.on_int(value as i128))
            }
            INT_M => {
                let value = self.read_varint()?;
                visit(visitor.on_int(-(value as i128) - 1))
            }
            SINGLETON_NULL => visit(visitor.on_singleton(Singleton::Null)),
            SINGLETON_TRUE => visit(visitor.on_singleton(Singleton::True)),
            SINGLETON_FALSE => visit(visitor.on_singleton(Singleton::False)),
            ID_16 | ID_32 | ID_64 | ID_128 => {
                let len = match opcode {
                    ID_16 => 2,
                    ID_32 => 4,
                    ID_64 => 8,
                    _ => 16,
                };
                let bytes = self.read_exact_bytes(len)?;
                let widened = id::widen(&bytes).context(error::PrimitiveSnafu)?;
                visit(visitor.on_id(widened))
            }
            FLOAT32 => {
                let bytes = self.read_exact_bytes(4)?;
                let value = f32::from_le_bytes(bytes.try_into().unwrap()) as f64;
                visit(visitor.on_float(value))
            }
            FLOAT64 => {
                let bytes = self.read_exact_bytes(8)?;
                let value = f64::from_le_bytes(bytes.try_into().unwrap());
                visit(visitor.on_float(value))
            }
            ARRAY_0..=ARRAY_3 => {
                let len = (opcode - ARRAY_0) as usize;
                visit(visitor.on_begin_array(len))
            }
            ARRAY_N => {
                let len = self.read_varint()? as usize;
                visit(visitor.on_begin_array(len))
            }
            MAP_0..=MAP_3 => {
                let len = (opcode - MAP_0) as usize;
                visit(visitor.on_begin_map(len))
            }
            MAP_N => {
                let len = self.read_varint()? as usize;
                visit(visitor.on_begin_map(len))
            }
            BLOB_N => {
                let len = self.read_varint()? as usize;
                let bytes = self.read_exact_bytes(len)?;
                visit(visitor.on_blob(&bytes))
            }
            STRING_0..=STRING_7 => {
                let len = (opcode - STRING_0) as usize;
                let bytes = self.read_exact_bytes(len)?;
                visit(visitor.on_string(&bytes, None))
            }
            STRING_N => {
                let len = self.read_varint()? as usize;
                let bytes = self.read_exact_bytes(len)?;
                visit(visitor.on_string(&bytes, None))
            }
            SEED_0..=SEED_3 => {
                let field_count = (opcode - SEED_0) as usize;
                visit(visitor.on_begin_seed(field_count))
            }
            SEED_N => {
                let field_count = self.read_varint()? as usize;
                visit(visitor.on_begin_seed(field_count))
            }
            STRUCT_LINEAR_0..=STRUCT_LINEAR_7 => {
                let count = (opcode - STRUCT_LINEAR_0) as usize;
                let tags: Vec<u32> = (0..count as u32).collect();
                visit(visitor.on_begin_struct(&tags))
            }
            STRUCT_N => {
                let count = self.read_varint()? as usize;
                let tags = self.read_struct_tags(count)?;
                visit(visitor.on_begin_struct(&tags))
            }
            ADD_REF => {
                let slot = self.assign_ref_slot();
                visit(visitor.on_add_ref(slot))
            }
            GET_REF => {
                let offset = self.read_varint()?;
                let resolved = self.resolve_backref(offset)?;
                visit(visitor.on_get_ref(resolved))
            }
            other => {
                visit(visitor.on_invalid_instruction(other))?;
                error::InvalidInstructionSnafu { opcode: other }.fail()
            }
        }
    }
}

/// Converts a visitor callback's own `Result` into this crate's error
/// type, stringifying the visitor's error (visitor error types are
/// caller-defined and need not implement `std::error::Error` uniformly
/// across call sites).
fn visit<E: std::fmt::Display>(result: std::result::Result<(), E>) -> Result<()> {
    result.map_err(|message| Error::Visitor {
        message: message.to_string(),
        backtrace: snafu::Backtrace::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visitor::Singleton;

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Vec<String>,
        done: bool,
    }

    impl Visitor for Recorder {
        type Error = std::convert::Infallible;

        fn on_int(&mut self, value: i128) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("int({value})"));
            self.done = true;
            Ok(())
        }
        fn on_singleton(&mut self, value: Singleton) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("singleton({value:?})"));
            self.done = true;
            Ok(())
        }
        fn on_float(&mut self, value: f64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("float({value})"));
            self.done = true;
            Ok(())
        }
        fn on_id(&mut self, value: [u8; 16]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("id({value:?})"));
            self.done = true;
            Ok(())
        }
        fn on_string(
            &mut self,
            bytes: &[u8],
            encoding: Option<&str>,
        ) -> std::result::Result<(), Self::Error> {
            self.calls
                .push(format!("string({bytes:?}, {encoding:?})"));
            Ok(())
        }
        fn on_blob(&mut self, bytes: &[u8]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("blob({bytes:?})"));
            self.done = true;
            Ok(())
        }
        fn on_begin_array(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_array({len})"));
            if len == 0 {
                self.done = true;
            }
            Ok(())
        }
        fn on_begin_map(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_map({len})"));
            Ok(())
        }
        fn on_begin_seed(&mut self, field_count: usize) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_seed({field_count})"));
            Ok(())
        }
        fn on_begin_struct(&mut self, tags: &[u32]) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("begin_struct({tags:?})"));
            Ok(())
        }
        fn on_add_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("add_ref({slot_index})"));
            Ok(())
        }
        fn on_get_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
            self.calls.push(format!("get_ref({slot_index})"));
            self.done = true;
            Ok(())
        }
        fn on_invalid_instruction(&mut self, _opcode: u8) -> std::result::Result<(), Self::Error> {
            Ok(())
        }
        fn has_result(&self) -> bool {
            self.done
        }
    }

    #[test]
    fn decodes_tiny_int() {
        let mut decoder = Decoder::new(&[0x03u8][..]);
        let mut visitor = Recorder::default();
        decoder.decode_next(&mut visitor).unwrap();
        assert_eq!(visitor.calls, vec!["int(3)"]);
    }

    #[test]
    fn decodes_array_of_three() {
        let bytes = [0x23u8, 0x01, 0x10, 0x11];
        let mut decoder = Decoder::new(&bytes[..]);
        let mut visitor = Recorder::default();
        while !visitor.has_result() {
            decoder.decode_next(&mut visitor).unwrap();
        }
        assert_eq!(
            visitor.calls,
            vec!["begin_array(3)", "int(1)", "singleton(Null)", "singleton(True)"]
        );
    }

    #[test]
    fn invalid_opcode_is_an_error() {
        let mut decoder = Decoder::new(&[0x07u8][..]);
        let mut visitor = Recorder::default();
        assert!(decoder.decode_next(&mut visitor).is_err());
    }

    #[test]
    fn get_ref_resolves_relative_offset() {
        // add_ref, array-2, add_ref, array-0, get_ref(0) -> graph fixture "[a, a]"
        let bytes = [0xa0u8, 0x22, 0xa0, 0x20, 0xa1, 0x00];
        let mut decoder = Decoder::new(&bytes[..]);
        let mut visitor = Recorder::default();
        while !visitor.has_result() {
            decoder.decode_next(&mut visitor).unwrap();
        }
        assert!(visitor.calls.contains(&"get_ref(0)".to_string()));
    }
}

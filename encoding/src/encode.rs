//! The binary encoder: a [`Visitor`] implementation that writes the
//! bit-exact wire form directly to a byte sink, choosing short-form
//! opcodes whenever the table in `plankton_core::tag` offers one.

use crate::error::{IntTooLargeSnafu, Result};
use crate::visitor::{Singleton, Visitor};
use plankton_core::{float, id, nibble, tag, varint};
use snafu::OptionExt;
use std::io::Write;

/// Writes binary instructions to `out` as visitor calls arrive.
///
/// Tracks only `emitted_ref_count`, the number of `ADD_REF`s written so
/// far — enough to translate an absolute `GET_REF` target into the
/// relative on-wire offset (`(emitted_ref_count - 1) - absolute_slot`).
#[derive(Debug)]
pub struct Encoder<W> {
    out: W,
    emitted_ref_count: u64,
    pending_ref: Option<u64>,
}

impl<W: Write> Encoder<W> {
    /// Wraps `out` for visitor-driven binary encoding.
    pub fn new(out: W) -> Self {
        Encoder {
            out,
            emitted_ref_count: 0,
            pending_ref: None,
        }
    }

    /// Consumes the encoder, returning the underlying sink.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_byte(&mut self, byte: u8) -> Result<()> {
        self.out.write_all(&[byte])?;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        Ok(())
    }

    fn write_varint(&mut self, value: u64) -> Result<()> {
        let mut buf = Vec::new();
        varint::write_unsigned(value, &mut buf);
        self.write_bytes(&buf)
    }

    /// Emits `ADD_REF` first if a ref slot was just announced via
    /// [`Visitor::on_add_ref`], then dispatches to `write_opcode`.
    fn begin_composite(&mut self, write_opcode: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.pending_ref.take().is_some() {
            self.write_byte(tag::ADD_REF)?;
        }
        write_opcode(self)
    }
}

impl<W: Write> Visitor for Encoder<W> {
    type Error = crate::error::Error;

    fn on_int(&mut self, value: i128) -> Result<()> {
        if let Ok(small) = i64::try_from(value) {
            if let Some(opcode) = tag::opcode_for_int_literal(small) {
                return self.write_byte(opcode);
            }
        }
        if value >= 0 {
            let magnitude = u64::try_from(value).ok().context(IntTooLargeSnafu { value })?;
            self.write_byte(tag::INT_P)?;
            self.write_varint(magnitude)
        } else {
            let magnitude = u64::try_from(-(value + 1))
                .ok()
                .context(IntTooLargeSnafu { value })?;
            self.write_byte(tag::INT_M)?;
            self.write_varint(magnitude)
        }
    }

    fn on_singleton(&mut self, value: Singleton) -> Result<()> {
        let opcode = match value {
            Singleton::Null => tag::SINGLETON_NULL,
            Singleton::True => tag::SINGLETON_TRUE,
            Singleton::False => tag::SINGLETON_FALSE,
        };
        self.write_byte(opcode)
    }

    fn on_float(&mut self, value: f64) -> Result<()> {
        if float::is_single_precision_representable(value) {
            self.write_byte(tag::FLOAT32)?;
            self.write_bytes(&(value as f32).to_le_bytes())
        } else {
            self.write_byte(tag::FLOAT64)?;
            self.write_bytes(&value.to_le_bytes())
        }
    }

    fn on_id(&mut self, value: [u8; 16]) -> Result<()> {
        let width = id::select_width(&value);
        let opcode = match width {
            id::IdWidth::W16 => tag::ID_16,
            id::IdWidth::W32 => tag::ID_32,
            id::IdWidth::W64 => tag::ID_64,
            id::IdWidth::W128 => tag::ID_128,
        };
        self.write_byte(opcode)?;
        let trailing = id::truncate(&value, width).to_vec();
        self.write_bytes(&trailing)
    }

    fn on_string(&mut self, bytes: &[u8], _encoding: Option<&str>) -> Result<()> {
        let (opcode, has_varint) = tag::short_form(bytes.len(), tag::STRING_0, tag::STRING_N);
        self.write_byte(opcode)?;
        if has_varint {
            self.write_varint(bytes.len() as u64)?;
        }
        self.write_bytes(bytes)
    }

    fn on_blob(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_byte(tag::BLOB_N)?;
        self.write_varint(bytes.len() as u64)?;
        self.write_bytes(bytes)
    }

    fn on_begin_array(&mut self, len: usize) -> Result<()> {
        self.begin_composite(|this| {
            let (opcode, has_varint) = tag::short_form(len, tag::ARRAY_0, tag::ARRAY_N);
            this.write_byte(opcode)?;
            if has_varint {
                this.write_varint(len as u64)?;
            }
            Ok(())
        })
    }

    fn on_begin_map(&mut self, len: usize) -> Result<()> {
        self.begin_composite(|this| {
            let (opcode, has_varint) = tag::short_form(len, tag::MAP_0, tag::MAP_N);
            this.write_byte(opcode)?;
            if has_varint {
                this.write_varint(len as u64)?;
            }
            Ok(())
        })
    }

    fn on_begin_seed(&mut self, field_count: usize) -> Result<()> {
        self.begin_composite(|this| {
            let (opcode, has_varint) = tag::short_form(field_count, tag::SEED_0, tag::SEED_N);
            this.write_byte(opcode)?;
            if has_varint {
                this.write_varint(field_count as u64)?;
            }
            Ok(())
        })
    }

    fn on_begin_struct(&mut self, tag_vector: &[u32]) -> Result<()> {
        self.begin_composite(|this| {
            if tag_vector.len() <= 7 && tag_vector.iter().enumerate().all(|(i, &t)| t == i as u32) {
                this.write_byte(tag::STRUCT_LINEAR_TAGS[tag_vector.len()])
            } else {
                this.write_byte(tag::STRUCT_N)?;
                this.write_varint(tag_vector.len() as u64)?;
                this.write_bytes(&nibble::encode_struct_tags(tag_vector))
            }
        })
    }

    fn on_add_ref(&mut self, slot_index: u64) -> Result<()> {
        debug_assert_eq!(slot_index, self.emitted_ref_count);
        self.pending_ref = Some(slot_index);
        self.emitted_ref_count += 1;
        Ok(())
    }

    fn on_get_ref(&mut self, slot_index: u64) -> Result<()> {
        self.write_byte(tag::GET_REF)?;
        let relative = (self.emitted_ref_count - 1) - slot_index;
        self.write_varint(relative)
    }

    fn on_invalid_instruction(&mut self, opcode: u8) -> Result<()> {
        crate::error::InvalidInstructionSnafu { opcode }.fail()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn encode(f: impl FnOnce(&mut Encoder<Vec<u8>>) -> Result<()>) -> Vec<u8> {
        let mut encoder = Encoder::new(Vec::new());
        f(&mut encoder).unwrap();
        encoder.into_inner()
    }

    #[test]
    fn tiny_int_is_one_byte() {
        assert_eq!(encode(|e| e.on_int(3)), vec![0x03]);
    }

    #[rstest]
    #[case(5, vec![0x05])]
    #[case(6, vec![0x08, 0x06])]
    #[case(-3, vec![0x0d])]
    #[case(-4, vec![0x09, 0x03])]
    #[case(127, vec![0x08, 0x7f])]
    #[case(128, vec![0x08, 0x80, 0x00])]
    fn int_boundaries(#[case] value: i128, #[case] wire: Vec<u8>) {
        assert_eq!(encode(|e| e.on_int(value)), wire);
    }

    #[test]
    fn int_above_u64_max_is_rejected_not_truncated() {
        let mut encoder = Encoder::new(Vec::new());
        let result = encoder.on_int(1i128 << 64);
        assert!(matches!(result, Err(crate::error::Error::IntTooLarge { .. })));

        let mut encoder = Encoder::new(Vec::new());
        let result = encoder.on_int(-(1i128 << 64));
        assert!(matches!(result, Err(crate::error::Error::IntTooLarge { .. })));
    }

    #[test]
    fn int_at_u64_max_still_encodes() {
        let bytes = encode(|e| e.on_int(u64::MAX as i128));
        assert_eq!(bytes[0], tag::INT_P);
    }

    #[test]
    fn array_of_three() {
        let bytes = encode(|e| {
            e.on_begin_array(3)?;
            e.on_int(1)?;
            e.on_singleton(Singleton::Null)?;
            e.on_singleton(Singleton::True)
        });
        assert_eq!(bytes, vec![0x23, 0x01, 0x10, 0x11]);
    }

    #[test]
    fn string_short_form_boundary() {
        assert_eq!(
            encode(|e| e.on_string(&[0u8; 7], None))[0],
            tag::STRING_0 + 7
        );
        assert_eq!(encode(|e| e.on_string(&[0u8; 8], None))[0], tag::STRING_N);
    }

    #[test]
    fn ref_cycle_roundtrip_bytes() {
        // x = []; x.append(x) -> a0 21 a1 00
        let bytes = encode(|e| {
            e.on_add_ref(0)?;
            e.on_begin_array(1)?;
            e.on_get_ref(0)
        });
        assert_eq!(bytes, vec![0xa0, 0x21, 0xa1, 0x00]);
    }

    #[test]
    fn shared_array_pair() {
        // [a, a] graph encoding -> 22 a0 20 a1 00
        let bytes = encode(|e| {
            e.on_begin_array(2)?;
            e.on_add_ref(0)?;
            e.on_begin_array(0)?;
            e.on_get_ref(0)
        });
        assert_eq!(bytes, vec![0x22, 0xa0, 0x20, 0xa1, 0x00]);
    }

    #[test]
    fn struct_with_rle() {
        let bytes = encode(|e| {
            e.on_begin_struct(&[0, 0, 0])?;
            e.on_int(10)?;
            e.on_int(11)?;
            e.on_int(12)
        });
        assert_eq!(bytes[0], tag::STRUCT_N);
        assert_eq!(bytes[1], 0x03);
    }

    #[test]
    fn id_width_selection() {
        let mut id = [0u8; 16];
        id[13] = 0x01;
        let bytes = encode(|e| e.on_id(id));
        assert_eq!(bytes, vec![tag::ID_32, 0x00, 0x01, 0x00, 0x00]);
    }
}

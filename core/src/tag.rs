//! The wire format's opcode table.
//!
//! Every instruction in a bton stream begins with one of these tag bytes.
//! A handful of opcodes pack a small length or a small literal value into
//! the opcode itself (the "short forms"); the rest are followed by operand
//! bytes. This module only holds the constant assignment — dispatching on
//! it is the decoder's job (`plankton_encoding::decode`).

/// A single wire-format opcode byte.
pub type Opcode = u8;

/// Int literal 0.
pub const INT_0: Opcode = 0x00;
/// Int literal 1.
pub const INT_1: Opcode = 0x01;
/// Int literal 2.
pub const INT_2: Opcode = 0x02;
/// Int literal 3.
pub const INT_3: Opcode = 0x03;
/// Int literal 4.
pub const INT_4: Opcode = 0x04;
/// Int literal 5.
pub const INT_5: Opcode = 0x05;
/// Int, positive: followed by an unsigned varint `n`, value = n.
pub const INT_P: Opcode = 0x08;
/// Int, negative: followed by an unsigned varint `n`, value = -(n+1).
pub const INT_M: Opcode = 0x09;
/// Int literal -3.
pub const INT_M3: Opcode = 0x0d;
/// Int literal -2.
pub const INT_M2: Opcode = 0x0e;
/// Int literal -1.
pub const INT_M1: Opcode = 0x0f;

/// The null singleton.
pub const SINGLETON_NULL: Opcode = 0x10;
/// The boolean `true` singleton.
pub const SINGLETON_TRUE: Opcode = 0x11;
/// The boolean `false` singleton.
pub const SINGLETON_FALSE: Opcode = 0x12;

/// Id with 2 trailing bytes.
pub const ID_16: Opcode = 0x14;
/// Id with 4 trailing bytes.
pub const ID_32: Opcode = 0x15;
/// Id with 8 trailing bytes.
pub const ID_64: Opcode = 0x16;
/// Id with 16 trailing bytes.
pub const ID_128: Opcode = 0x17;

/// Float32: 4 trailing little-endian IEEE-754 bytes.
pub const FLOAT32: Opcode = 0x1a;
/// Float64: 8 trailing little-endian IEEE-754 bytes.
pub const FLOAT64: Opcode = 0x1b;

/// Array of length 0.
pub const ARRAY_0: Opcode = 0x20;
/// Array of length 1.
pub const ARRAY_1: Opcode = 0x21;
/// Array of length 2.
pub const ARRAY_2: Opcode = 0x22;
/// Array of length 3.
pub const ARRAY_3: Opcode = 0x23;
/// Array of length = following unsigned varint.
pub const ARRAY_N: Opcode = 0x28;

/// Map of length 0 (0 pairs).
pub const MAP_0: Opcode = 0x30;
/// Map of length 1 (1 pair).
pub const MAP_1: Opcode = 0x31;
/// Map of length 2 (2 pairs).
pub const MAP_2: Opcode = 0x32;
/// Map of length 3 (3 pairs).
pub const MAP_3: Opcode = 0x33;
/// Map of length = following unsigned varint (in pairs).
pub const MAP_N: Opcode = 0x38;

/// Blob: varint length, then raw bytes.
pub const BLOB_N: Opcode = 0x48;

/// Default-encoding string of byte-length 0.
pub const STRING_0: Opcode = 0x50;
/// Default-encoding string of byte-length 1.
pub const STRING_1: Opcode = 0x51;
/// Default-encoding string of byte-length 2.
pub const STRING_2: Opcode = 0x52;
/// Default-encoding string of byte-length 3.
pub const STRING_3: Opcode = 0x53;
/// Default-encoding string of byte-length 4.
pub const STRING_4: Opcode = 0x54;
/// Default-encoding string of byte-length 5.
pub const STRING_5: Opcode = 0x55;
/// Default-encoding string of byte-length 6.
pub const STRING_6: Opcode = 0x56;
/// Default-encoding string of byte-length 7.
pub const STRING_7: Opcode = 0x57;
/// Default-encoding string of varint byte-length.
pub const STRING_N: Opcode = 0x58;

/// Seed with 0 field pairs.
pub const SEED_0: Opcode = 0x60;
/// Seed with 1 field pair.
pub const SEED_1: Opcode = 0x61;
/// Seed with 2 field pairs.
pub const SEED_2: Opcode = 0x62;
/// Seed with 3 field pairs.
pub const SEED_3: Opcode = 0x63;
/// Seed with varint field-pair count.
pub const SEED_N: Opcode = 0x68;

/// Struct with linear tags `[]`.
pub const STRUCT_LINEAR_0: Opcode = 0x80;
/// Struct with linear tags `[0]`.
pub const STRUCT_LINEAR_1: Opcode = 0x81;
/// Struct with linear tags `[0, 1]`.
pub const STRUCT_LINEAR_2: Opcode = 0x82;
/// Struct with linear tags `[0, 1, 2]`.
pub const STRUCT_LINEAR_3: Opcode = 0x83;
/// Struct with linear tags `[0, 1, 2, 3]`.
pub const STRUCT_LINEAR_4: Opcode = 0x84;
/// Struct with linear tags `[0, 1, 2, 3, 4]`.
pub const STRUCT_LINEAR_5: Opcode = 0x85;
/// Struct with linear tags `[0, 1, 2, 3, 4, 5]`.
pub const STRUCT_LINEAR_6: Opcode = 0x86;
/// Struct with linear tags `[0, 1, 2, 3, 4, 5, 6]`.
pub const STRUCT_LINEAR_7: Opcode = 0x87;
/// Struct with varint field count, followed by a nibble-packed tag sequence.
pub const STRUCT_N: Opcode = 0x88;

/// Marks that the next composite publishes a new reference slot.
pub const ADD_REF: Opcode = 0xa0;
/// Followed by an unsigned varint: the relative offset back from `next_slot - 1`.
pub const GET_REF: Opcode = 0xa1;

/// The linear struct short forms, indexed by field count (0..=7).
///
/// `STRUCT_LINEAR_TAGS[k]` is the opcode for a struct whose tag vector is
/// `[0, 1, ..., k-1]`.
pub const STRUCT_LINEAR_TAGS: [Opcode; 8] = [
    STRUCT_LINEAR_0,
    STRUCT_LINEAR_1,
    STRUCT_LINEAR_2,
    STRUCT_LINEAR_3,
    STRUCT_LINEAR_4,
    STRUCT_LINEAR_5,
    STRUCT_LINEAR_6,
    STRUCT_LINEAR_7,
];

/// If `opcode` is one of the literal small-int short forms, its value.
pub const fn int_literal(opcode: Opcode) -> Option<i64> {
    match opcode {
        INT_0 => Some(0),
        INT_1 => Some(1),
        INT_2 => Some(2),
        INT_3 => Some(3),
        INT_4 => Some(4),
        INT_5 => Some(5),
        INT_M3 => Some(-3),
        INT_M2 => Some(-2),
        INT_M1 => Some(-1),
        _ => None,
    }
}

/// The opcode for an integer literal in -3..=5, if one exists.
pub const fn opcode_for_int_literal(value: i64) -> Option<Opcode> {
    match value {
        0 => Some(INT_0),
        1 => Some(INT_1),
        2 => Some(INT_2),
        3 => Some(INT_3),
        4 => Some(INT_4),
        5 => Some(INT_5),
        -3 => Some(INT_M3),
        -2 => Some(INT_M2),
        -1 => Some(INT_M1),
        _ => None,
    }
}

/// The short-form opcode for a length in 0..=3, given the base opcode for
/// length 0 and the `_N` opcode for everything else.
pub const fn short_form(len: usize, zero: Opcode, n: Opcode) -> (Opcode, bool) {
    match len {
        0 => (zero, false),
        1 => (zero + 1, false),
        2 => (zero + 2, false),
        3 => (zero + 3, false),
        _ => (n, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_literal_round_trips() {
        for v in -3..=5 {
            let op = opcode_for_int_literal(v).unwrap();
            assert_eq!(int_literal(op), Some(v));
        }
        assert_eq!(opcode_for_int_literal(6), None);
        assert_eq!(opcode_for_int_literal(-4), None);
    }

    #[test]
    fn short_form_boundaries() {
        assert_eq!(short_form(0, ARRAY_0, ARRAY_N), (ARRAY_0, false));
        assert_eq!(short_form(3, ARRAY_0, ARRAY_N), (ARRAY_3, false));
        assert_eq!(short_form(4, ARRAY_0, ARRAY_N), (ARRAY_N, true));
    }
}

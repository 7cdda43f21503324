//! The bias-1 base-128 unsigned varint used throughout the binary wire
//! format, plus its 4-bit sibling used only by the struct-tag stream.
//!
//! To encode `n`: while `n >= 0x80`, emit `(n & 0x7F) | 0x80` and rebias
//! the remainder downward (`n = (n >> 7) - 1`); emit the final `n` as-is.
//! The rebias is what lets values just above a power-of-two boundary
//! (e.g. 128) cost the same number of bytes as the boundary itself,
//! unlike plain LEB128.
//!
//! Decoding is the inverse of that rebias, which runs back-to-front: scan
//! forward collecting each continuation byte's 7-bit payload until the
//! terminal (non-continuation) byte is found, then fold the payloads in
//! reverse, each step undoing one rebias: `acc = (acc + 1) * 128 + r`,
//! seeded with the terminal byte's value.

use crate::error::{self, Result};
use smallvec::SmallVec;
use snafu::ensure;

const CONTINUE_BIT: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// The maximum number of continuation bytes a `u64` varint can need; past
/// this the value could not have come from [`write_unsigned`].
const MAX_CONTINUATIONS: usize = 9;

/// Writes `value` to `out` as a bias-1 base-128 varint.
pub fn write_unsigned(mut value: u64, out: &mut Vec<u8>) {
    while value >= 0x80 {
        out.push((value as u8 & PAYLOAD_MASK) | CONTINUE_BIT);
        value = (value >> 7) - 1;
    }
    out.push(value as u8);
}

/// Reads a bias-1 base-128 varint from `bytes`, returning the value and
/// the number of bytes consumed.
pub fn read_unsigned(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut payloads: SmallVec<[u8; MAX_CONTINUATIONS]> = SmallVec::new();
    for (i, &byte) in bytes.iter().enumerate() {
        if byte & CONTINUE_BIT == 0 {
            let mut acc = byte as u64;
            for &r in payloads.iter().rev() {
                acc = (acc + 1) * 0x80 + r as u64;
            }
            return Ok((acc, i + 1));
        }
        ensure!(payloads.len() < MAX_CONTINUATIONS, error::VarintOverflowSnafu);
        payloads.push(byte & PAYLOAD_MASK);
    }
    error::UnexpectedEofSnafu { what: "varint" }.fail()
}

const NIBBLE_CONTINUE_BIT: u8 = 0x8;
const NIBBLE_PAYLOAD_MASK: u8 = 0x7;
const MAX_NIBBLE_CONTINUATIONS: usize = 20;

/// Writes `value` to `out` as a sequence of bias-1 base-8 nibble-varint
/// digits, one nibble per output byte (packing two per wire byte is the
/// caller's job — see [`crate::nibble`]).
pub fn write_nibbles(mut value: u32, out: &mut Vec<u8>) {
    while value >= 0x8 {
        out.push((value as u8 & NIBBLE_PAYLOAD_MASK) | NIBBLE_CONTINUE_BIT);
        value = (value >> 3) - 1;
    }
    out.push(value as u8);
}

/// Reads one nibble-varint from a sequence of already-split nibbles,
/// returning the value and how many nibbles were consumed.
pub fn read_nibbles(nibbles: &[u8]) -> Result<(u32, usize)> {
    let mut payloads: SmallVec<[u8; MAX_NIBBLE_CONTINUATIONS]> = SmallVec::new();
    for (i, &nibble) in nibbles.iter().enumerate() {
        if nibble & NIBBLE_CONTINUE_BIT == 0 {
            let mut acc = nibble as u32;
            for &r in payloads.iter().rev() {
                acc = (acc + 1) * 0x8 + r as u32;
            }
            return Ok((acc, i + 1));
        }
        ensure!(
            payloads.len() < MAX_NIBBLE_CONTINUATIONS,
            error::VarintOverflowSnafu
        );
        payloads.push(nibble & NIBBLE_PAYLOAD_MASK);
    }
    error::UnexpectedEofSnafu {
        what: "nibble varint",
    }
    .fail()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, &[0x00])]
    #[case(1, &[0x01])]
    #[case(127, &[0x7f])]
    #[case(128, &[0x80, 0x00])]
    #[case(129, &[0x81, 0x00])]
    #[case(255, &[0xff, 0x00])]
    #[case(16383, &[0xff, 0x7e])]
    #[case(16384, &[0x80, 0x7f])]
    fn varint_round_trips(#[case] value: u64, #[case] wire: &[u8]) {
        let mut out = Vec::new();
        write_unsigned(value, &mut out);
        assert_eq!(out, wire);
        let (decoded, consumed) = read_unsigned(&out).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, wire.len());
    }

    #[test]
    fn varint_truncated_is_eof() {
        assert!(read_unsigned(&[0x80, 0x80]).is_err());
        assert!(read_unsigned(&[]).is_err());
    }

    #[test]
    fn varint_trailing_bytes_are_ignored() {
        let (value, consumed) = read_unsigned(&[0x00, 0xff, 0xff]).unwrap();
        assert_eq!(value, 0);
        assert_eq!(consumed, 1);
    }

    #[rstest]
    #[case(0)]
    #[case(7)]
    #[case(8)]
    #[case(63)]
    #[case(64)]
    #[case(1000)]
    fn nibble_varint_round_trips(#[case] value: u32) {
        let mut out = Vec::new();
        write_nibbles(value, &mut out);
        let (decoded, consumed) = read_nibbles(&out).unwrap();
        assert_eq!(decoded, value);
        assert_eq!(consumed, out.len());
    }
}

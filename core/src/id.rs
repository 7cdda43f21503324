//! Width selection for the 16-byte id type: an id is always 128 bits of
//! value, but the wire form truncates leading zero bytes down to 2, 4, 8
//! or 16 bytes depending on magnitude.

use crate::error::{self, Result};
use snafu::ensure;

/// A 128-bit identifier, stored as 16 big-endian bytes.
pub type IdBytes = [u8; 16];

/// The wire byte-width an id would be emitted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdWidth {
    /// 2 trailing bytes (tag `ID_16`).
    W16,
    /// 4 trailing bytes (tag `ID_32`).
    W32,
    /// 8 trailing bytes (tag `ID_64`).
    W64,
    /// 16 trailing bytes (tag `ID_128`).
    W128,
}

impl IdWidth {
    /// The number of bytes this width occupies on the wire.
    pub const fn byte_len(self) -> usize {
        match self {
            IdWidth::W16 => 2,
            IdWidth::W32 => 4,
            IdWidth::W64 => 8,
            IdWidth::W128 => 16,
        }
    }

    /// Resolves a byte width (2, 4, 8 or 16) to an [`IdWidth`].
    pub fn from_byte_len(len: usize) -> Result<Self> {
        match len {
            2 => Ok(IdWidth::W16),
            4 => Ok(IdWidth::W32),
            8 => Ok(IdWidth::W64),
            16 => Ok(IdWidth::W128),
            _ => error::InvalidIdWidthSnafu { width: len }.fail(),
        }
    }
}

/// Picks the narrowest width that can hold `id` without losing any
/// leading (most-significant) nonzero byte.
pub fn select_width(id: &IdBytes) -> IdWidth {
    if id[..8].iter().any(|&b| b != 0) {
        IdWidth::W128
    } else if id[8..12].iter().any(|&b| b != 0) {
        IdWidth::W64
    } else if id[12..14].iter().any(|&b| b != 0) {
        IdWidth::W32
    } else {
        IdWidth::W16
    }
}

/// Truncates `id` down to its selected width's trailing bytes, for
/// writing to the wire.
pub fn truncate(id: &IdBytes, width: IdWidth) -> &[u8] {
    let len = width.byte_len();
    &id[16 - len..]
}

/// Left-pads a wire-width id back out to 16 bytes.
pub fn widen(bytes: &[u8]) -> Result<IdBytes> {
    let width = IdWidth::from_byte_len(bytes.len())?;
    ensure!(
        bytes.len() == width.byte_len(),
        error::InvalidIdWidthSnafu {
            width: bytes.len()
        }
    );
    let mut out = [0u8; 16];
    out[16 - bytes.len()..].copy_from_slice(bytes);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_from_u128(v: u128) -> IdBytes {
        v.to_be_bytes()
    }

    #[test]
    fn width_selection_boundaries() {
        assert_eq!(select_width(&id_from_u128(0)), IdWidth::W16);
        assert_eq!(select_width(&id_from_u128(0xffff)), IdWidth::W16);
        assert_eq!(select_width(&id_from_u128(0x1_0000)), IdWidth::W32);
        assert_eq!(select_width(&id_from_u128(0xffff_ffff)), IdWidth::W32);
        assert_eq!(select_width(&id_from_u128(0x1_0000_0000)), IdWidth::W64);
        assert_eq!(
            select_width(&id_from_u128(0xffff_ffff_ffff_ffff)),
            IdWidth::W64
        );
        assert_eq!(
            select_width(&id_from_u128(0x1_0000_0000_0000_0000)),
            IdWidth::W128
        );
    }

    #[test]
    fn truncate_and_widen_round_trip() {
        let id = id_from_u128(0x1234_5678);
        let width = select_width(&id);
        assert_eq!(width, IdWidth::W32);
        let wire = truncate(&id, width);
        assert_eq!(wire, [0x00, 0x00, 0x12, 0x34, 0x56, 0x78][2..]);
        let widened = widen(wire).unwrap();
        assert_eq!(widened, id);
    }

    #[test]
    fn invalid_width_is_an_error() {
        assert!(widen(&[0u8; 3]).is_err());
    }
}

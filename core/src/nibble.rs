//! Packing of nibble-varints into bytes, and the delta/run-length stream
//! used to encode a struct's tag vector.
//!
//! A struct tag vector is monotonically non-decreasing (tags are field
//! indices assigned in ascending declaration order) which makes a
//! delta-plus-run-length encoding effective: most fields differ from
//! their predecessor by exactly one, and repeated tags (an array of
//! homogeneous struct instances sharing one schema image) collapse to a
//! single run.

use crate::error::{self, Result};
use smallvec::SmallVec;
use snafu::{ensure, OptionExt};

const NIBBLE_CONTINUE_BIT: u8 = 0x8;
const NIBBLE_PAYLOAD_MASK: u8 = 0x7;
const MAX_CONTINUATIONS: usize = 20;

/// Accumulates 4-bit nibbles into packed bytes, high nibble first.
#[derive(Debug, Default)]
pub struct NibbleWriter {
    bytes: Vec<u8>,
    pending_high: Option<u8>,
}

impl NibbleWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single 4-bit nibble (only the low 4 bits of `nibble` are
    /// used).
    pub fn push_nibble(&mut self, nibble: u8) {
        match self.pending_high.take() {
            Some(high) => self.bytes.push((high << 4) | (nibble & 0xf)),
            None => self.pending_high = Some(nibble & 0xf),
        }
    }

    /// Appends the nibble-varint encoding of `value`.
    pub fn write_varint(&mut self, mut value: u32) {
        while value >= 0x8 {
            self.push_nibble((value as u8 & NIBBLE_PAYLOAD_MASK) | NIBBLE_CONTINUE_BIT);
            value = (value >> 3) - 1;
        }
        self.push_nibble(value as u8);
    }

    /// Flushes any odd trailing nibble as a zero-padded low nibble and
    /// returns the packed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.pending_high.is_some() {
            self.push_nibble(0);
        }
        self.bytes
    }
}

/// Reads 4-bit nibbles out of packed bytes, high nibble first.
#[derive(Debug)]
pub struct NibbleReader<'a> {
    bytes: &'a [u8],
    byte_index: usize,
    high_consumed: bool,
}

impl<'a> NibbleReader<'a> {
    /// Wraps `bytes` for nibble-at-a-time reading.
    pub fn new(bytes: &'a [u8]) -> Self {
        NibbleReader {
            bytes,
            byte_index: 0,
            high_consumed: false,
        }
    }

    /// The number of whole bytes consumed so far (an in-progress half
    /// byte counts as consumed).
    pub fn bytes_consumed(&self) -> usize {
        if self.high_consumed {
            self.byte_index + 1
        } else {
            self.byte_index
        }
    }

    fn next_nibble(&mut self) -> Result<u8> {
        let byte = self
            .bytes
            .get(self.byte_index)
            .copied()
            .context(error::UnexpectedEofSnafu { what: "nibble" })?;
        if !self.high_consumed {
            self.high_consumed = true;
            Ok(byte >> 4)
        } else {
            self.high_consumed = false;
            self.byte_index += 1;
            Ok(byte & 0xf)
        }
    }

    /// Reads one nibble-varint, following the same bias-1 base-8 scheme
    /// as [`crate::varint`]'s 7-bit variant.
    pub fn read_varint(&mut self) -> Result<u32> {
        let mut payloads: SmallVec<[u8; MAX_CONTINUATIONS]> = SmallVec::new();
        loop {
            let nibble = self.next_nibble()?;
            if nibble & NIBBLE_CONTINUE_BIT == 0 {
                let mut acc = nibble as u32;
                for &r in payloads.iter().rev() {
                    acc = (acc + 1) * 0x8 + r as u32;
                }
                return Ok(acc);
            }
            ensure!(payloads.len() < MAX_CONTINUATIONS, error::VarintOverflowSnafu);
            payloads.push(nibble & NIBBLE_PAYLOAD_MASK);
        }
    }
}

/// Encodes a struct's tag vector as a delta stream with a run-length
/// escape, packed two nibbles per byte.
///
/// `tags` must be non-empty and monotonically non-decreasing; callers
/// build it from field declaration order, which already guarantees this.
pub fn encode_struct_tags(tags: &[u32]) -> Vec<u8> {
    let mut writer = NibbleWriter::new();
    if tags.is_empty() {
        return writer.finish();
    }
    writer.write_varint(tags[0]);
    let mut last = tags[0];
    let mut i = 1;
    while i < tags.len() {
        if tags[i] == last {
            let run_start = i;
            while i < tags.len() && tags[i] == last {
                i += 1;
            }
            let run_len = (i - run_start) as u32;
            writer.write_varint(0);
            writer.write_varint(run_len);
        } else {
            writer.write_varint(tags[i] - last);
            last = tags[i];
            i += 1;
        }
    }
    writer.finish()
}

/// Decodes `tag_count` tags from a packed nibble stream, returning the
/// tag vector and the number of bytes the stream occupied.
pub fn decode_struct_tags(bytes: &[u8], tag_count: usize) -> Result<(Vec<u32>, usize)> {
    let mut reader = NibbleReader::new(bytes);
    if tag_count == 0 {
        return Ok((Vec::new(), 0));
    }
    let mut tags = Vec::with_capacity(tag_count);
    let first = reader.read_varint()?;
    tags.push(first);
    let mut last = first;
    while tags.len() < tag_count {
        let delta = reader.read_varint()?;
        if delta == 0 {
            let run_len = reader.read_varint()? as usize;
            ensure!(
                tags.len() + run_len <= tag_count,
                error::StructTagCountMismatchSnafu {
                    produced: tags.len() + run_len,
                    expected: tag_count,
                }
            );
            tags.extend(std::iter::repeat(last).take(run_len));
        } else {
            last += delta;
            tags.push(last);
        }
    }
    ensure!(
        tags.len() == tag_count,
        error::StructTagCountMismatchSnafu {
            produced: tags.len(),
            expected: tag_count,
        }
    );
    Ok((tags, reader.bytes_consumed()))
}

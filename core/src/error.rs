//! Error types shared by every primitive in this crate.
//!
//! Decoding errors specific to the instruction stream or the object builder
//! live in their own crates; this enum only covers the byte-level primitives
//! (`varint`, `nibble`, `float`, `id`) that those crates build on.

use snafu::{Backtrace, Snafu};

/// The result type returned by this crate's fallible primitives.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while encoding or decoding a single wire-level primitive.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// An unsigned varint continued past the maximum number of bytes a
    /// `u64` can represent.
    #[snafu(display("Varint is too long to fit in a u64."))]
    VarintOverflow {
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// The byte stream ended in the middle of a varint, nibble stream, or
    /// fixed-width field.
    #[snafu(display("Unexpected end of input while reading {what}."))]
    UnexpectedEof {
        /// What was being read when the input ran out.
        what: &'static str,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A nibble-packed struct tag stream decoded to a tag count different
    /// from the one declared by the struct's opcode.
    #[snafu(display(
        "Struct tag stream produced {produced} tags, expected {expected}."
    ))]
    StructTagCountMismatch {
        /// The number of tags the nibble stream actually produced.
        produced: usize,
        /// The number of tags the struct's opcode declared.
        expected: usize,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// An id's declared byte width was not one of 2, 4, 8 or 16.
    #[snafu(display("{width} is not a valid id width."))]
    InvalidIdWidth {
        /// The offending width, in bytes.
        width: usize,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },
}

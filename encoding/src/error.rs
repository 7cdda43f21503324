//! Errors produced while decoding or encoding the binary instruction
//! stream.

use snafu::{Backtrace, Snafu};

/// The result type returned by this crate's decoder and encoder.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while turning a byte stream into visitor calls,
/// or visitor calls back into bytes.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The stream ended before a complete instruction could be read.
    #[snafu(display("Unexpected end of input while decoding an instruction: {}", source))]
    UnexpectedEof {
        /// The underlying I/O error (typically `std::io::ErrorKind::UnexpectedEof`).
        source: std::io::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A byte-level primitive (varint, nibble stream, id width) failed to
    /// decode.
    #[snafu(display("Failed to decode a wire primitive: {}", source))]
    Primitive {
        /// The underlying primitive error.
        source: plankton_core::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// The opcode byte did not match any assigned instruction.
    #[snafu(display("Opcode 0x{:02x} is not a valid instruction.", opcode))]
    InvalidInstruction {
        /// The offending opcode byte.
        opcode: u8,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A `GET_REF` instruction's relative offset resolved to a slot that
    /// has not been assigned yet (or never will be).
    #[snafu(display(
        "GET_REF offset {} is out of range: only {} ref slots have been assigned so far.",
        offset,
        assigned
    ))]
    RefOffsetOutOfRange {
        /// The relative offset as read off the wire.
        offset: u64,
        /// The number of ref slots assigned at the point of the error.
        assigned: u64,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A struct's declared field count did not match the number of tags
    /// its nibble stream produced.
    #[snafu(display("Failed to decode a struct's tag stream: {}", source))]
    StructTags {
        /// The underlying primitive error.
        source: plankton_core::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// An `Int` value's magnitude exceeds what this encoder's `u64`
    /// varint writer can represent. The abstract model is
    /// arbitrary-precision, but producers are allowed to be fixed-width
    /// as long as they reject rather than silently wrap values that
    /// don't fit.
    #[snafu(display("Integer {value} is too large to encode: magnitude exceeds u64::MAX"))]
    IntTooLarge {
        /// The offending value.
        value: i128,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// Writing encoded bytes to the output sink failed.
    #[snafu(display("Failed to write encoded output: {}", source))]
    Io {
        /// The underlying I/O error.
        source: std::io::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// The visitor receiving decoded instructions returned an error of
    /// its own.
    #[snafu(display("The visitor rejected a decoded instruction: {}", message))]
    Visitor {
        /// The visitor's own error, rendered to a string (visitor error
        /// types are caller-defined and need not implement
        /// `std::error::Error` uniformly across call sites).
        message: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },
}

impl From<plankton_core::Error> for Error {
    fn from(source: plankton_core::Error) -> Self {
        use snafu::IntoError;
        PrimitiveSnafu.into_error(source)
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        use snafu::IntoError;
        IoSnafu.into_error(source)
    }
}

//! Errors produced while tokenizing, parsing or emitting tton.

use snafu::{Backtrace, Snafu};

/// The result type returned by this crate's public API.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can surface from [`crate::decode_text`], [`crate::encode_text`]
/// and the tokenizer/parser/encoder they're built from.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// The tokenizer or parser rejected the input at a given character
    /// offset.
    #[snafu(display("Syntax error at offset {offset}: {description}"))]
    Syntax {
        /// The character offset the error was detected at.
        offset: usize,
        /// What went wrong.
        description: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A `$name` use appeared with no matching `$name:` definition
    /// anywhere earlier in the document.
    #[snafu(display("Reference '${name}' is never defined."))]
    UndefinedReference {
        /// The undefined reference's name.
        name: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A `%[...]` blob literal's contents were not valid base64.
    #[snafu(display("Invalid base64 blob literal: {source}"))]
    InvalidBase64 {
        /// The underlying decode error.
        source: base64::DecodeError,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A `%x[...]` blob literal, or an `&...` id literal, was not valid
    /// hex.
    #[snafu(display("Invalid hex literal: {source}"))]
    InvalidHex {
        /// The underlying decode error.
        source: hex::FromHexError,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A decimal integer or float literal did not fit the type it was
    /// parsed into.
    #[snafu(display("Invalid numeric literal '{text}': {description}"))]
    InvalidNumber {
        /// The offending literal, as written.
        text: String,
        /// Why it was rejected.
        description: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// tton has no surface syntax for structs; attempting to encode one
    /// fails cleanly here rather than silently emitting nothing for it.
    #[snafu(display("Structs have no tton representation."))]
    StructUnsupported {
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// tton's grammar has no float literal syntax; attempting to encode
    /// a float fails cleanly here rather than silently truncating it to
    /// an integer or emitting a binary-only marker no tton parser reads.
    #[snafu(display("Floats have no tton representation."))]
    FloatUnsupported {
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A caller-supplied [`plankton_encoding::Visitor`] rejected an
    /// instruction this crate tried to deliver to it.
    #[snafu(display("Visitor rejected an instruction: {message}"))]
    Visitor {
        /// The visitor's own error, stringified (the visitor's error type
        /// is caller-defined and need not implement anything beyond
        /// `Display`).
        message: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },
}

/// Converts a visitor's own `Result` into this crate's [`Result`], folding
/// the visitor's error (whatever type it is) into [`Error::Visitor`].
pub(crate) fn visit<E: std::fmt::Display>(result: std::result::Result<(), E>) -> Result<()> {
    result.map_err(|e| VisitorSnafu { message: e.to_string() }.build())
}

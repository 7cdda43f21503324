//! Errors produced while building, traversing or serializing the owned
//! value tree.

use snafu::{Backtrace, Snafu};

/// The result type returned by this crate's public API.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can surface from [`crate::decode_binary`], [`crate::encode_binary`]
/// and the lower-level builder/traverser types they're built from.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    /// A `GET_REF` instruction resolved to a slot that was never assigned
    /// (or not yet, outside of a cycle).
    #[snafu(display("GET_REF resolved to ref slot {slot}, which has no assigned value."))]
    InvalidReference {
        /// The unresolved slot index.
        slot: u64,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// A map's instruction stream introduced a key equal to one already
    /// inserted into that map.
    #[snafu(display("Map already contains an equal key: {description}"))]
    DuplicateMapKey {
        /// A debug rendering of the duplicate key.
        description: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// The traverser met a language-level value that none of the
    /// classifier's predicates recognized as an atom or a composite.
    #[snafu(display("{description} matches no known value kind"))]
    InvalidValue {
        /// A debug rendering of the unclassifiable value.
        description: String,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// Reading the binary instruction stream failed.
    #[snafu(display("Failed to decode a binary value: {source}"))]
    Decode {
        /// The underlying decode error.
        source: plankton_encoding::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },

    /// Writing the binary instruction stream failed.
    #[snafu(display("Failed to encode a binary value: {source}"))]
    Encode {
        /// The underlying encode error.
        source: plankton_encoding::Error,
        /// The backtrace to this error.
        backtrace: Backtrace,
    },
}

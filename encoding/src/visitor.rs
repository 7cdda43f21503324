//! The visitor contract that both the binary and text decoders drive,
//! and that both encoders (and the object builder) implement or consume.
//!
//! Decoding a stream never constructs an intermediate AST: the decoder
//! reads bytes and calls exactly one of these methods per instruction.
//! Whoever implements [`Visitor`] decides what happens next — building an
//! owned [`plankton_object`](../plankton_object/index.html)-style value
//! tree is one consumer; re-encoding straight into another wire format
//! without ever materializing a tree is another.

/// One of the three singleton values the format knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Singleton {
    /// The null value.
    Null,
    /// The boolean `true`.
    True,
    /// The boolean `false`.
    False,
}

/// Receives one call per decoded instruction.
///
/// All methods return `Result<(), Self::Error>` so an implementer can
/// abort decoding early (a duplicate map key, a schema mismatch, a
/// resource limit) without the decoder needing to know anything about
/// those failure modes.
pub trait Visitor {
    /// The error type this visitor can fail with.
    type Error: std::fmt::Display;

    /// A signed integer literal.
    fn on_int(&mut self, value: i128) -> Result<(), Self::Error>;

    /// One of the three singleton values.
    fn on_singleton(&mut self, value: Singleton) -> Result<(), Self::Error>;

    /// A floating-point value. The decoder has already normalized the
    /// wire width away; callers that care can recover it from the value
    /// itself via [`plankton_core::float::is_single_precision_representable`].
    fn on_float(&mut self, value: f64) -> Result<(), Self::Error>;

    /// A 128-bit id, left-padded to 16 bytes.
    fn on_id(&mut self, value: [u8; 16]) -> Result<(), Self::Error>;

    /// A string's raw bytes plus an optional non-default encoding label.
    fn on_string(&mut self, bytes: &[u8], encoding: Option<&str>) -> Result<(), Self::Error>;

    /// An opaque binary blob.
    fn on_blob(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// The start of an array of `len` elements. The following `len`
    /// visitor calls (recursively, for composite elements) are the
    /// array's contents.
    fn on_begin_array(&mut self, len: usize) -> Result<(), Self::Error>;

    /// The start of a map of `len` key/value pairs. The following `2 *
    /// len` visitor calls are the alternating keys and values.
    fn on_begin_map(&mut self, len: usize) -> Result<(), Self::Error>;

    /// The start of a seed: a header sub-value followed by `field_count`
    /// key/value pairs.
    fn on_begin_seed(&mut self, field_count: usize) -> Result<(), Self::Error>;

    /// The start of a struct whose fields carry the given tag vector.
    /// The following `tag_vector.len()` visitor calls are the field
    /// values, in the same order as the tags.
    fn on_begin_struct(&mut self, tag_vector: &[u32]) -> Result<(), Self::Error>;

    /// Announces that the *next* `on_begin_array`/`on_begin_map`/
    /// `on_begin_seed`/`on_begin_struct` call publishes a new ref slot,
    /// identified by `slot_index` (a monotonically increasing counter
    /// starting at 0).
    fn on_add_ref(&mut self, slot_index: u64) -> Result<(), Self::Error>;

    /// A back-reference to a previously published ref slot. `slot_index`
    /// is already resolved to an absolute index, not the on-wire
    /// relative offset.
    fn on_get_ref(&mut self, slot_index: u64) -> Result<(), Self::Error>;

    /// The decoder read an opcode byte that does not correspond to any
    /// assigned instruction.
    fn on_invalid_instruction(&mut self, opcode: u8) -> Result<(), Self::Error>;

    /// Whether the visitor has received everything it needs and decoding
    /// should stop without consuming any further bytes.
    ///
    /// The default implementation never stops early; a builder that
    /// decodes a single top-level value overrides this to return `true`
    /// once that value (and everything nested inside it) is complete.
    fn has_result(&self) -> bool {
        false
    }
}

//! The crate's public entry points: turning a byte stream into a [`Value`]
//! and a [`Value`] back into bytes.

use plankton_encoding::{Decoder, Encoder};

use crate::builder::ObjectBuilder;
use crate::error::{DecodeSnafu, EncodeSnafu, Result};
use crate::factory::{DefaultFactory, Factory};
use crate::traverser::{encode_graph, encode_tree, TreeEncodeError};
use crate::value::Value;
use snafu::ResultExt;

/// Options controlling [`decode_binary`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions<F = DefaultFactory> {
    /// The factory used to construct decoded values. Defaults to
    /// [`DefaultFactory`], which produces this crate's own [`Value`] tree.
    pub factory: F,
}

/// Options controlling [`encode_binary`].
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Whether to attempt the cheaper tree encoding before falling back to
    /// the graph encoding. Disabling this always goes straight to the
    /// graph strategy, which is mostly useful for testing.
    pub try_tree_first: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions { try_tree_first: true }
    }
}

/// Decodes a single binary (bton) value from `input`.
pub fn decode_binary(input: &[u8]) -> Result<Value> {
    decode_binary_with(input, DecodeOptions::default())
}

/// Decodes a single binary (bton) value from `input`, using a
/// caller-supplied [`Factory`] (and, through it, a possibly non-default
/// value representation).
pub fn decode_binary_with<F: Factory>(input: &[u8], options: DecodeOptions<F>) -> Result<F::Value> {
    let mut decoder = Decoder::new(input);
    let mut builder = ObjectBuilder::new(options.factory);
    while !builder.has_result() {
        decoder.decode_next(&mut builder).context(DecodeSnafu)?;
    }
    Ok(builder.into_result())
}

/// Encodes `value` to binary (bton), trying the compact tree encoding
/// first and retrying with the graph encoding if `value` turns out to
/// contain shared or cyclic structure.
pub fn encode_binary(value: &Value) -> Result<Vec<u8>> {
    encode_binary_with(value, EncodeOptions::default())
}

/// Encodes `value` to binary (bton) under explicit [`EncodeOptions`].
pub fn encode_binary_with(value: &Value, options: EncodeOptions) -> Result<Vec<u8>> {
    if options.try_tree_first {
        let mut encoder = Encoder::new(Vec::new());
        match encode_tree(value, &mut encoder) {
            Ok(()) => return Ok(encoder.into_inner()),
            Err(TreeEncodeError::Visitor(e)) => {
                use snafu::IntoError;
                return Err(EncodeSnafu.into_error(e));
            }
            Err(TreeEncodeError::SharedStructureDetected) => {
                tracing::debug!("value has shared structure, retrying with the graph encoding");
                // Discard the partial tree-encoded buffer; the graph
                // encoding below starts from a clean sink so a caller
                // never sees a truncated tree attempt.
            }
        }
    }
    let mut encoder = Encoder::new(Vec::new());
    encode_graph(value, &mut encoder).context(EncodeSnafu)?;
    Ok(encoder.into_inner())
}

#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, missing_docs, unused_import_braces)]

//! A tokenizer, recursive-descent parser and text emitter for tton, the
//! human-readable sibling of the plankton binary (bton) format.
//!
//! This crate is a thin layer over [`plankton_encoding::Visitor`] and
//! [`plankton_object::ObjectBuilder`]: [`parser::parse`] drives a visitor
//! from source text the same way [`plankton_encoding::Decoder`] drives one
//! from bytes, and [`encoder::TextEncoder`] implements [`Visitor`] the same
//! way [`plankton_encoding::Encoder`] does, just emitting formatted text
//! instead of wire bytes. Neither the tokenizer nor the parser does
//! anything a systems-engineering audience would find interesting — the
//! hard problems (shared-structure detection, the object builder's
//! completion stack, the wire format itself) live in `plankton_encoding`
//! and `plankton_object` and are reused here unchanged.

mod encoder;
mod error;
mod parser;
mod tokenizer;

use plankton_encoding::Visitor;
use plankton_object::{encode_graph, encode_tree, DefaultFactory, Factory, ObjectBuilder, TreeEncodeError, Value};

pub use encoder::TextEncoder;
pub use error::{Error, Result};

/// Options controlling [`decode_text`].
#[derive(Debug, Clone)]
pub struct DecodeOptions<F = DefaultFactory> {
    /// The factory used to construct decoded values. Defaults to
    /// [`DefaultFactory`], which produces [`plankton_object::Value`].
    pub factory: F,
    /// The encoding tag attached to every plain `"..."` string literal.
    /// tton has no syntax for tagging an individual string with a
    /// non-default encoding, so this is the only way a caller can mark
    /// decoded strings as anything other than the default (`None`, taken
    /// to mean UTF-8).
    pub default_string_encoding: Option<String>,
}

impl<F: Default> Default for DecodeOptions<F> {
    fn default() -> Self {
        DecodeOptions { factory: F::default(), default_string_encoding: None }
    }
}

/// Options controlling [`encode_text`].
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

/// Decodes a single tton value from `input`.
pub fn decode_text(input: &str) -> Result<Value> {
    decode_text_with(input, DecodeOptions::default())
}

/// Decodes a single tton value from `input`, using a caller-supplied
/// [`Factory`].
pub fn decode_text_with<F: Factory>(input: &str, options: DecodeOptions<F>) -> Result<F::Value> {
    let mut builder = StringTaggingBuilder {
        inner: ObjectBuilder::new(options.factory),
        default_string_encoding: options.default_string_encoding,
    };
    parser::parse(input, &mut builder)?;
    Ok(builder.inner.into_result())
}

/// Wraps [`ObjectBuilder`] to apply [`DecodeOptions::default_string_encoding`]
/// to every string the parser hands it, without the parser itself needing
/// to know that knob exists.
struct StringTaggingBuilder<F: Factory> {
    inner: ObjectBuilder<F>,
    default_string_encoding: Option<String>,
}

impl<F: Factory> Visitor for StringTaggingBuilder<F> {
    type Error = plankton_object::Error;

    fn on_int(&mut self, value: i128) -> std::result::Result<(), Self::Error> {
        self.inner.on_int(value)
    }
    fn on_singleton(&mut self, value: plankton_encoding::Singleton) -> std::result::Result<(), Self::Error> {
        self.inner.on_singleton(value)
    }
    fn on_float(&mut self, value: f64) -> std::result::Result<(), Self::Error> {
        self.inner.on_float(value)
    }
    fn on_id(&mut self, value: [u8; 16]) -> std::result::Result<(), Self::Error> {
        self.inner.on_id(value)
    }
    fn on_string(&mut self, bytes: &[u8], _encoding: Option<&str>) -> std::result::Result<(), Self::Error> {
        self.inner.on_string(bytes, self.default_string_encoding.as_deref())
    }
    fn on_blob(&mut self, bytes: &[u8]) -> std::result::Result<(), Self::Error> {
        self.inner.on_blob(bytes)
    }
    fn on_begin_array(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
        self.inner.on_begin_array(len)
    }
    fn on_begin_map(&mut self, len: usize) -> std::result::Result<(), Self::Error> {
        self.inner.on_begin_map(len)
    }
    fn on_begin_seed(&mut self, field_count: usize) -> std::result::Result<(), Self::Error> {
        self.inner.on_begin_seed(field_count)
    }
    fn on_begin_struct(&mut self, tag_vector: &[u32]) -> std::result::Result<(), Self::Error> {
        self.inner.on_begin_struct(tag_vector)
    }
    fn on_add_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
        self.inner.on_add_ref(slot_index)
    }
    fn on_get_ref(&mut self, slot_index: u64) -> std::result::Result<(), Self::Error> {
        self.inner.on_get_ref(slot_index)
    }
    fn on_invalid_instruction(&mut self, opcode: u8) -> std::result::Result<(), Self::Error> {
        self.inner.on_invalid_instruction(opcode)
    }
    fn has_result(&self) -> bool {
        self.inner.has_result()
    }
}

/// Encodes `value` to tton, trying the compact tree encoding first and
/// retrying with the graph encoding if `value` turns out to contain shared
/// or cyclic structure.
pub fn encode_text(value: &Value) -> Result<String> {
    encode_text_with(value, EncodeOptions::default())
}

/// Encodes `value` to tton under explicit [`EncodeOptions`].
pub fn encode_text_with(value: &Value, options: EncodeOptions) -> Result<String> {
    if options.try_tree_first {
        let mut encoder = TextEncoder::new();
        match encode_tree(value, &mut encoder) {
            Ok(()) => return Ok(encoder.into_result()),
            Err(TreeEncodeError::Visitor(e)) => return Err(e),
            Err(TreeEncodeError::SharedStructureDetected) => {
                tracing::debug!("value has shared structure, retrying with the graph encoding");
            }
        }
    }
    let mut encoder = TextEncoder::new();
    encode_graph(value, &mut encoder)?;
    Ok(encoder.into_result())
}

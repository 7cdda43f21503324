#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, missing_docs, unused_import_braces)]

//! The instruction-stream decoder, binary encoder and shared [`Visitor`]
//! contract for the plankton binary (bton) format.
//!
//! This crate knows how to turn bytes into visitor calls and visitor
//! calls back into bytes; it has no opinion about what a decoded value
//! ends up looking like in memory — that is `plankton_object`'s job, and
//! the text codec (`plankton_text`) drives the exact same [`Visitor`]
//! trait from its own tokenizer instead of from bytes.

pub mod decode;
pub mod encode;
pub mod error;
pub mod visitor;

pub use decode::Decoder;
pub use encode::Encoder;
pub use error::{Error, Result};
pub use visitor::{Singleton, Visitor};

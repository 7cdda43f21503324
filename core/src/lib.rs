#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, missing_docs, unused_import_braces)]

//! Core data model, tag registry and byte-level primitives shared by the
//! plankton binary (bton) and text (tton) codecs.
//!
//! This crate deliberately contains no decoding or encoding logic of its
//! own — that lives in `plankton-encoding` — only the constant tables and
//! bit-twiddling routines that both the binary wire format and its
//! higher-level consumers need to agree on.

pub mod error;
pub mod float;
pub mod id;
pub mod nibble;
pub mod tag;
pub mod varint;

pub use error::{Error, Result};
pub use tag::Opcode;

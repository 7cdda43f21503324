#![crate_type = "lib"]
#![deny(trivial_casts, trivial_numeric_casts, unsafe_code, unstable_features)]
#![warn(missing_debug_implementations, missing_docs, unused_import_braces)]

//! An owned, `Rc`-backed value tree for the plankton serialization format,
//! the stack-based builder that assembles one from a decoded instruction
//! stream, and the two traversal strategies (tree and graph) that turn an
//! assembled value back into instructions.
//!
//! This crate is single-threaded by design: [`Value`]'s composites are
//! `Rc<RefCell<_>>`, which is what lets a decoded graph contain genuine
//! cycles without `unsafe`. A caller who needs to move decoded values
//! across threads supplies their own [`Factory`] built on `Arc`/`Mutex`
//! instead — the builder and traversers are generic over it and need no
//! changes to support that.

pub mod api;
pub mod builder;
pub mod classifier;
pub mod error;
pub mod factory;
pub mod traverser;
pub mod value;

pub use api::{decode_binary, decode_binary_with, encode_binary, encode_binary_with, DecodeOptions, EncodeOptions};
pub use builder::ObjectBuilder;
pub use classifier::{Classifier, DefaultClassifier};
pub use error::{Error, Result};
pub use factory::{DefaultFactory, Factory};
pub use traverser::{encode_graph, encode_tree, TreeEncodeError};
pub use value::{value_equal, ArrayHandle, MapHandle, PString, SeedData, SeedHandle, StructData, StructHandle, Value};

//! The pluggable predicate hook the traversers in this crate are built
//! around conceptually, even though [`crate::traverser`] specializes its
//! two strategies directly to this crate's own [`Value`] for now (see
//! `DESIGN.md`).
//!
//! A [`Classifier`] tells a traverser what kind of thing a given value is:
//! an array, a map, a seed, a struct, or something else entirely. The
//! default implementation recognizes exactly the shapes [`Value`] itself
//! can take.

use crate::value::Value;

/// Recognizes the composite shape (if any) a value takes.
pub trait Classifier {
    /// The value type this classifier recognizes.
    type Value;

    /// Whether `value` should be treated as an array.
    fn is_array(&self, value: &Self::Value) -> bool;
    /// Whether `value` should be treated as a map.
    fn is_map(&self, value: &Self::Value) -> bool;
    /// Whether `value` should be treated as a seed.
    fn is_seed(&self, value: &Self::Value) -> bool;
    /// Whether `value` should be treated as a struct.
    fn is_struct(&self, value: &Self::Value) -> bool;
}

/// The [`Classifier`] this crate ships by default, recognizing this
/// crate's own [`Value`] variants.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultClassifier;

impl Classifier for DefaultClassifier {
    type Value = Value;

    fn is_array(&self, value: &Value) -> bool {
        matches!(value, Value::Array(_))
    }

    fn is_map(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_))
    }

    fn is_seed(&self, value: &Value) -> bool {
        matches!(value, Value::Seed(_))
    }

    fn is_struct(&self, value: &Value) -> bool {
        matches!(value, Value::Struct(_))
    }
}

//! Larva measurements
//!
//! The eight named model inputs and the fixed-order vector handed to the model.

pub mod measurement;
pub mod vector;

pub use measurement::Feature;
pub use vector::{parse_value, FeatureVector};

//! Prediction workflow
//!
//! Validates a feature vector, runs the model and turns the result into a
//! user-facing outcome.

pub mod workflow;

pub use workflow::{format_outcome, run_prediction, PredictionOutcome};

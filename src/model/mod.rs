//! Regression model
//!
//! The [`Regressor`] trait is the only thing the prediction workflow sees;
//! [`XgbRegressor`] evaluates a gradient-boosted tree ensemble exported by
//! XGBoost's `save_model("*.json")`.

pub mod xgboost;

pub use xgboost::{ModelSummary, Objective, XgbRegressor};

use crate::{FeatureVector, Result};

/// A trained model mapping one feature vector to a scalar
///
/// Implementations are immutable once loaded so a single instance can serve
/// every request for the life of the process.
pub trait Regressor {
    /// Predict time to death in seconds
    ///
    /// Missing measurements are passed through as NaN; any error is reported
    /// to the user as a failed prediction.
    fn predict(&self, features: &FeatureVector) -> Result<f32>;

    /// Number of inputs the model was trained on
    fn num_features(&self) -> usize;
}

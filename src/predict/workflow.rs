//! Validate-then-predict for a single request

use serde::Serialize;
use std::fmt;

use crate::model::Regressor;
use crate::FeatureVector;

pub const ALL_MISSING_MESSAGE: &str =
    "All features are missing! Please enter at least one value before predicting.";
pub const MISSING_CAVEAT: &str =
    "Some feature values are missing. The prediction might be less accurate.";
pub const FAILURE_PREFIX: &str = "Prediction Failed! Please check your input again!";

/// Result of one prediction request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PredictionOutcome {
    /// Nothing was entered; the model was not called
    AllMissingError,
    /// Predicted time to death in seconds
    Success {
        value: f32,
        /// Some (not all) inputs were missing, so accuracy may suffer
        had_missing_inputs: bool,
    },
    /// The model rejected the input or failed internally
    PredictionFailure { message: String },
}

impl PredictionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionOutcome::Success { .. })
    }

    pub fn value(&self) -> Option<f32> {
        match self {
            PredictionOutcome::Success { value, .. } => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for PredictionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictionOutcome::AllMissingError => write!(f, "{}", ALL_MISSING_MESSAGE),
            PredictionOutcome::Success { value, .. } => {
                write!(f, "Time to death: {:.4} seconds", value)
            }
            PredictionOutcome::PredictionFailure { message } => {
                write!(f, "{}: {}", FAILURE_PREFIX, message)
            }
        }
    }
}

/// Run one prediction request against a loaded model
///
/// The model is only invoked when at least one measurement is present.
/// Missing values are passed through as NaN for the model to route.
pub fn run_prediction<R: Regressor + ?Sized>(
    model: &R,
    features: &FeatureVector,
) -> PredictionOutcome {
    if features.all_missing() {
        log::debug!("All features missing, skipping model");
        return PredictionOutcome::AllMissingError;
    }

    log::debug!("Predicting for {:?}", features.as_slice());

    match model.predict(features) {
        Ok(value) => {
            let had_missing_inputs = features.any_missing();
            if had_missing_inputs {
                let missing: Vec<_> = features
                    .missing_features()
                    .iter()
                    .map(|f| f.label())
                    .collect();
                log::warn!("Predicting with missing inputs: {}", missing.join(", "));
            }
            PredictionOutcome::Success {
                value,
                had_missing_inputs,
            }
        }
        Err(e) => {
            let mut message = e.to_string();
            if message.is_empty() {
                message = "unknown model error".to_string();
            }
            log::warn!("Prediction failed: {}", message);
            PredictionOutcome::PredictionFailure { message }
        }
    }
}

/// Format an outcome for display, including the missing-data caveat
pub fn format_outcome(outcome: &PredictionOutcome) -> String {
    match outcome {
        PredictionOutcome::AllMissingError => format!("❌ {}", outcome),
        PredictionOutcome::Success {
            had_missing_inputs, ..
        } => {
            if *had_missing_inputs {
                format!("✅ {}\n⚠️  {}", outcome, MISSING_CAVEAT)
            } else {
                format!("✅ {}", outcome)
            }
        }
        PredictionOutcome::PredictionFailure { .. } => format!("❌ {}", outcome),
    }
}

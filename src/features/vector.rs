//! Fixed-order model input with NaN as the missing marker

use super::Feature;
use crate::{LarvaError, Result};

/// The eight model inputs for one prediction request
///
/// A missing measurement is stored as `f32::NAN`, which the booster routes
/// down each split's default branch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f32; Feature::COUNT],
}

impl FeatureVector {
    pub fn new(values: [f32; Feature::COUNT]) -> Self {
        FeatureVector { values }
    }

    /// A vector where no measurement has been entered yet
    pub fn all_missing_vector() -> Self {
        FeatureVector {
            values: [f32::NAN; Feature::COUNT],
        }
    }

    /// Build a vector from user-typed values
    ///
    /// Features without a value stay missing, and every feature listed in
    /// `missing` is forced to missing even when a value was typed for it.
    pub fn from_inputs<'a, I>(values: I, missing: &[Feature]) -> Result<Self>
    where
        I: IntoIterator<Item = (Feature, &'a str)>,
    {
        let mut features = Self::all_missing_vector();
        for (feature, raw) in values {
            features.set(feature, parse_value(feature, raw)?);
        }
        for feature in missing {
            features.mark_missing(*feature);
        }
        Ok(features)
    }

    pub fn get(&self, feature: Feature) -> f32 {
        self.values[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f32) {
        self.values[feature.index()] = value;
    }

    pub fn mark_missing(&mut self, feature: Feature) {
        self.set(feature, f32::NAN);
    }

    pub fn is_missing(&self, feature: Feature) -> bool {
        self.get(feature).is_nan()
    }

    /// True when no measurement at all was supplied
    pub fn all_missing(&self) -> bool {
        self.values.iter().all(|v| v.is_nan())
    }

    /// True when at least one measurement was left out
    pub fn any_missing(&self) -> bool {
        self.values.iter().any(|v| v.is_nan())
    }

    pub fn missing_features(&self) -> Vec<Feature> {
        Feature::ALL
            .into_iter()
            .filter(|f| self.is_missing(*f))
            .collect()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::all_missing_vector()
    }
}

/// Parse one value as typed by the user
///
/// Blank input and the usual NaN spellings mean "missing". Infinite values
/// are rejected since the model was never trained on them.
pub fn parse_value(feature: Feature, text: &str) -> Result<f32> {
    let text = text.trim();
    let invalid = |message: String| LarvaError::InvalidInput {
        feature: feature.label().to_string(),
        message,
    };

    match text.to_lowercase().as_str() {
        "" | "nan" | "na" | "-" => return Ok(f32::NAN),
        _ => {}
    }

    let value: f32 = text
        .parse()
        .map_err(|_| invalid(format!("'{}' is not a number", text)))?;

    if value.is_infinite() {
        return Err(invalid("value must be finite".to_string()));
    }

    Ok(value)
}

//! Mealworm larva time-to-death prediction
//!
//! Collects eight biological measurements, runs them through a pretrained
//! XGBoost regression model and reports the predicted time to death.

pub mod features;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use features::{Feature, FeatureVector};
pub use model::{Regressor, XgbRegressor};
pub use predict::PredictionOutcome;

/// Application-wide errors
#[derive(Debug, Error)]
pub enum LarvaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model: {0}")]
    Model(String),

    #[error("{0}")]
    Prediction(String),

    #[error("Invalid value for {feature}: {message}")]
    InvalidInput { feature: String, message: String },
}

pub type Result<T> = std::result::Result<T, LarvaError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// XGBoost model saved with `save_model("*.json")`
    pub path: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                path: "xgb_model.json".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LarvaError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| LarvaError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LarvaError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

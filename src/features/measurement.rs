//! The measured and derived quantities the model was trained on

use std::fmt;

/// A single model input, in training column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Fresh weight in grams
    Weight,
    /// Weight loss in grams
    WeightLoss,
    /// Body length in centimetres
    Length,
    /// Initial moisture content, percent
    InitialMoisture,
    /// Moisture content loss, percent
    MoistureLoss,
    /// Body surface area over volume
    AreaToVolume,
    /// First death temperature reading, °C
    DeathTempT1,
    /// Second death temperature reading, °C
    DeathTempT2,
}

impl Feature {
    /// Number of model inputs
    pub const COUNT: usize = 8;

    /// All features in model column order
    pub const ALL: [Feature; Feature::COUNT] = [
        Feature::Weight,
        Feature::WeightLoss,
        Feature::Length,
        Feature::InitialMoisture,
        Feature::MoistureLoss,
        Feature::AreaToVolume,
        Feature::DeathTempT1,
        Feature::DeathTempT2,
    ];

    /// Column index in the feature vector
    pub fn index(&self) -> usize {
        match self {
            Feature::Weight => 0,
            Feature::WeightLoss => 1,
            Feature::Length => 2,
            Feature::InitialMoisture => 3,
            Feature::MoistureLoss => 4,
            Feature::AreaToVolume => 5,
            Feature::DeathTempT1 => 6,
            Feature::DeathTempT2 => 7,
        }
    }

    /// Label shown on the input form (matches the training data headers)
    pub fn label(&self) -> &'static str {
        match self {
            Feature::Weight => "Wt. (fresh)/g",
            Feature::WeightLoss => "Weight Loss/g",
            Feature::Length => "Len/cm",
            Feature::InitialMoisture => "Initial M.C./%",
            Feature::MoistureLoss => "M.C. Loss/%",
            Feature::AreaToVolume => "Area-to-Volume Ratio",
            Feature::DeathTempT1 => "Death Temp (T1)/°C",
            Feature::DeathTempT2 => "Death Temp (T2)/°C",
        }
    }

    /// Command-line key, e.g. `--weight-loss`
    pub fn key(&self) -> &'static str {
        match self {
            Feature::Weight => "weight",
            Feature::WeightLoss => "weight-loss",
            Feature::Length => "length",
            Feature::InitialMoisture => "initial-moisture",
            Feature::MoistureLoss => "moisture-loss",
            Feature::AreaToVolume => "area-to-volume",
            Feature::DeathTempT1 => "death-temp-t1",
            Feature::DeathTempT2 => "death-temp-t2",
        }
    }

    /// Decimal places the measurement is recorded with
    pub fn precision(&self) -> usize {
        match self {
            Feature::Weight | Feature::WeightLoss => 4,
            Feature::Length | Feature::InitialMoisture | Feature::MoistureLoss => 2,
            Feature::AreaToVolume => 3,
            Feature::DeathTempT1 | Feature::DeathTempT2 => 1,
        }
    }

    /// Look up a feature by its command-line key (`_` and case are ignored)
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase().replace('_', "-");
        Feature::ALL.into_iter().find(|f| f.key() == key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Feature::from_key(s).ok_or_else(|| {
            let keys: Vec<_> = Feature::ALL.iter().map(|f| f.key()).collect();
            format!("Unknown feature: {}. Use one of: {}", s, keys.join(", "))
        })
    }
}

use crate::{
    adpcm::{Padding, ScaleFallback, MAX_COEFFICIENT_PAIRS},
    dsp::HeaderLayout,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use thiserror::Error;

/// Settings for one encode, from the size of the coefficient table down to the
/// container layout it is written with.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// How many coefficient pairs to train. The legacy encoders used 8 or 16.
    pub coefficient_count: usize,
    pub padding: Padding,
    pub scale_fallback: ScaleFallback,
    pub layout: HeaderLayout,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            coefficient_count: 8,
            padding: Padding::default(),
            scale_fallback: ScaleFallback::default(),
            layout: HeaderLayout::default(),
        }
    }
}

/// Possible errors that can be produced when loading an [`EncoderConfig`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An [IO](std::io) error.
    #[error("could not read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse ron config: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("could not parse json config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] InvalidConfig),
}

#[derive(Error, Debug, Eq, PartialEq)]
pub enum InvalidConfig {
    #[error("coefficient count {0} is outside 1..=16")]
    CoefficientCount(usize),
    #[error("the {layout:?} layout holds at most {slots} coefficient pairs, not {count}")]
    LayoutTooSmall {
        layout: HeaderLayout,
        slots: usize,
        count: usize,
    },
    #[error("unsupported config file extension {0:?}, expected \"ron\" or \"json\"")]
    Extension(String),
}

impl EncoderConfig {
    /// Loads a config from a `.ron` or `.json` file. Missing fields take their
    /// default values.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let config = match extension.as_str() {
            "ron" => Self::from_ron_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            _ => return Err(InvalidConfig::Extension(extension).into()),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn from_ron_str(s: &str) -> Result<Self, ConfigError> {
        Ok(ron::de::from_str(s)?)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Checks that the coefficient table fits a block header and the chosen
    /// container layout.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        if !(1..=MAX_COEFFICIENT_PAIRS).contains(&self.coefficient_count) {
            return Err(InvalidConfig::CoefficientCount(self.coefficient_count));
        }

        let slots = self.layout.coefficient_slots();
        if self.coefficient_count > slots {
            return Err(InvalidConfig::LayoutTooSmall {
                layout: self.layout,
                slots,
                count: self.coefficient_count,
            });
        }

        Ok(())
    }
}

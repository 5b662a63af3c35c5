use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::highlight::OpacityTiers;
use crate::model::{DEFAULT_DENYLIST, Denylist, IngestSettings};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    pub root_name: String,
    pub delimiter: String,
    pub denylist: Vec<String>,
    pub tension: f64,
    pub radius_step: f64,
    pub opacity: OpacityTiers,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root_name: "Model".to_owned(),
            delimiter: ".".to_owned(),
            denylist: DEFAULT_DENYLIST.iter().map(|&p| p.to_owned()).collect(),
            tension: 0.85,
            radius_step: 100.0,
            opacity: OpacityTiers::default(),
        }
    }
}

impl EngineConfig {
    /// Missing keys fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.tension) {
            return Err(ConfigError::InvalidTension(self.tension));
        }
        if !(self.radius_step.is_finite() && self.radius_step > 0.0) {
            return Err(ConfigError::InvalidRadiusStep(self.radius_step));
        }
        Ok(())
    }

    pub fn ingest_settings(&self) -> Result<IngestSettings, ConfigError> {
        Ok(IngestSettings {
            root_name: self.root_name.clone(),
            delimiter: self.delimiter.clone(),
            denylist: Denylist::new(&self.denylist)?,
        })
    }
}

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_yml;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::metering_mercury::structs::{ENERGY_TARIFF_FIRST, ENERGY_TARIFF_LAST};

const CONFIG_PATHS: [&str; 2] = ["config/mercury230.yaml", "mercury230.yaml"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unable to read the config on config/mercury230.yaml or mercury230.yaml")]
    NotFound,
    #[error("Unable to read config file {0}: {1}")]
    Io(PathBuf, std::io::Error),
    #[error("Unable to parse config file: {0}")]
    Parse(#[from] serde_yml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

fn serial_baud_rate_default() -> u32 { return 9600 }
fn serial_timeout_ms_default() -> u64 { return 300 }

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct SerialConfig {
    pub port: String,
    #[serde(default="serial_baud_rate_default")]
    pub baud_rate: u32,
    #[serde(default="serial_timeout_ms_default")]
    pub timeout_ms: u64,
}

/// Meter models a driver exists for
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum MeterModel {
    Mercury230,
}

impl MeterModel {
    pub fn to_string(&self) -> String {
        match self {
            MeterModel::Mercury230 => "Mercury230".to_string(),
        }
    }
}

fn meter_model_default() -> MeterModel { return MeterModel::Mercury230 }
fn meter_read_interval_default() -> u64 { return 60 }
fn meter_energy_tariffs_default() -> Vec<u8> { return vec![ENERGY_TARIFF_FIRST] }

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MeterConfig {
    pub name: String,
    #[serde(default="meter_model_default")]
    pub model: MeterModel,
    pub address: u8,
    #[serde(default="meter_read_interval_default")]
    pub read_interval: u64,             // Seconds between reads
    #[serde(default="meter_energy_tariffs_default")]
    pub energy_tariffs: Vec<u8>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub serial: SerialConfig,
    pub meters: Vec<MeterConfig>,
}

impl Config {
    /// Loads the given file or, without one, the first of the default locations
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => CONFIG_PATHS.iter()
                .map(PathBuf::from)
                .find(|p| p.exists())
                .ok_or(ConfigError::NotFound)?,
        };

        info!("Loading config from {}", path.display());
        let contents = fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let config = Self::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let c: Config = serde_yml::from_str(contents)?;
        debug!("Config with {} meters on {}", c.meters.len(), c.serial.port);
        Ok(c)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.meters.is_empty() {
            return Err(ConfigError::Invalid("no meters configured".to_string()));
        }

        for meter in &self.meters {
            if meter.read_interval == 0 {
                return Err(ConfigError::Invalid(format!("{}: read_interval must be positive", meter.name)));
            }
            if let Some(t) = meter.energy_tariffs.iter()
                .find(|t| !(ENERGY_TARIFF_FIRST..=ENERGY_TARIFF_LAST).contains(*t)) {
                return Err(ConfigError::Invalid(format!("{}: tariff {} out of range 1..=4", meter.name, t)));
            }
        }
        Ok(())
    }
}

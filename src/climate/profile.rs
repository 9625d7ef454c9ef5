use std::{collections::HashSet, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::state::{ClimateState, FanMode, OperationMode, SwingMode};
use crate::encoding::CommandsEncoding;

// Tolerance when checking a temperature against the precision grid
const PRECISION_EPSILON: f32 = 1e-3;

/*
{
   "manufacturer":"Electra",
   "supportedModels":[
      "RC-3"
   ],
   "supportedController":"MQTT",
   "commandsEncoding":"Raw",
   "minTemperature":16.0,
   "maxTemperature":30.0,
   "precision":1,
   "operationModes":[
      "auto",
      "cool",
      ...
   ],
   "fanModes":[
      "auto",
      "high",
      ...
   ],
   "swingModes": [...],
   "commands": {...}
*/

/// The on-disk device description.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFile {
    pub manufacturer: String,
    pub supported_models: Vec<String>,
    pub supported_controller: Controller,
    pub commands_encoding: CommandsEncoding,
    pub min_temperature: f32,
    pub max_temperature: f32,
    pub precision: f32,
    pub operation_modes: Vec<String>,
    pub fan_modes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swing_modes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<serde_json::Value>,
}

/// Kind of transmitter the commands are meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum Controller {
    Broadlink,
    Xiaomi,
    #[serde(rename = "MQTT")]
    #[strum(serialize = "MQTT")]
    Mqtt,
    #[serde(rename = "LOOKin")]
    #[strum(serialize = "LOOKin")]
    Lookin,
    #[serde(rename = "ESPHome")]
    #[strum(serialize = "ESPHome")]
    Esphome,
}

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid device description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("minimum temperature {min} is above maximum {max}")]
    InvalidTemperatureRange { min: f32, max: f32 },
    #[error("precision must be positive, got {0}")]
    InvalidPrecision(f32),
    #[error("device description declares no fan modes")]
    NoFanModes,
    #[error("device description has no command table")]
    MissingCommands,
    #[error("appliance {0} needs a device code")]
    MissingDeviceCode(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("operation mode {0} is not supported by this device")]
    UnsupportedMode(OperationMode),
    #[error("fan mode {0} is not supported by this device")]
    UnsupportedFanMode(FanMode),
    #[error("swing mode {0} is not supported by this device")]
    UnsupportedSwingMode(SwingMode),
    #[error("a target temperature is required in {0} mode")]
    MissingTemperature(OperationMode),
    #[error("temperature {value} is out of range. Must be between {min} and {max}")]
    TemperatureOutOfRange { value: f32, min: f32, max: f32 },
    #[error("temperature {value} is not on the {precision} degree grid starting at {min}")]
    TemperatureNotAligned { value: f32, precision: f32, min: f32 },
}

impl ValidationError {
    /// True for temperature problems, false for unsupported mode/fan/swing values.
    pub fn is_temperature(&self) -> bool {
        matches!(
            self,
            ValidationError::MissingTemperature(_)
                | ValidationError::TemperatureOutOfRange { .. }
                | ValidationError::TemperatureNotAligned { .. }
        )
    }
}

/// Static capabilities of one appliance model. Read-only once built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    pub(crate) manufacturer: String,
    pub(crate) supported_models: Vec<String>,
    pub(crate) supported_controller: Controller,
    pub(crate) commands_encoding: CommandsEncoding,
    pub(crate) min_temperature: f32,
    pub(crate) max_temperature: f32,
    pub(crate) precision: f32,
    pub(crate) operation_modes: Vec<OperationMode>,
    pub(crate) fan_modes: Vec<FanMode>,
    pub(crate) swing_modes: Vec<SwingMode>,
}

impl DeviceProfile {
    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let file: ProfileFile = serde_json::from_str(json)?;
        (&file).try_into()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Self::from_json(&read_description(path.as_ref())?)
    }

    pub fn manufacturer(&self) -> &str {
        &self.manufacturer
    }

    pub fn supported_models(&self) -> &[String] {
        &self.supported_models
    }

    pub fn supported_controller(&self) -> Controller {
        self.supported_controller
    }

    pub fn commands_encoding(&self) -> CommandsEncoding {
        self.commands_encoding
    }

    pub fn min_temperature(&self) -> f32 {
        self.min_temperature
    }

    pub fn max_temperature(&self) -> f32 {
        self.max_temperature
    }

    pub fn precision(&self) -> f32 {
        self.precision
    }

    pub fn operation_modes(&self) -> &[OperationMode] {
        &self.operation_modes
    }

    pub fn fan_modes(&self) -> &[FanMode] {
        &self.fan_modes
    }

    pub fn swing_modes(&self) -> &[SwingMode] {
        &self.swing_modes
    }

    pub fn supports_swing(&self) -> bool {
        !self.swing_modes.is_empty()
    }

    /// Every temperature on the precision grid, from min to max.
    pub fn temperatures(&self) -> impl Iterator<Item = f32> + '_ {
        let steps = ((self.max_temperature - self.min_temperature) / self.precision).round() as u32;
        (0..=steps).map(move |i| self.min_temperature + i as f32 * self.precision)
    }

    /// Snaps a requested temperature onto the precision grid. Range is not
    /// enforced here.
    pub fn round_temperature(&self, temperature: f32) -> f32 {
        let steps = ((temperature - self.min_temperature) / self.precision).round();
        self.min_temperature + steps * self.precision
    }

    pub fn state_is_valid(&self, state: &ClimateState) -> bool {
        self.validate(state).is_ok()
    }

    pub fn validate(&self, state: &ClimateState) -> Result<(), ValidationError> {
        if !self.operation_modes.contains(&state.operation_mode) {
            return Err(ValidationError::UnsupportedMode(state.operation_mode));
        }

        if let Some(fan) = &state.fan_mode {
            if !self.fan_modes.contains(fan) {
                return Err(ValidationError::UnsupportedFanMode(fan.clone()));
            }
        }

        if let Some(swing) = &state.swing_mode {
            if !self.swing_modes.contains(swing) {
                return Err(ValidationError::UnsupportedSwingMode(swing.clone()));
            }
        }

        if state.is_off() {
            return Ok(());
        }

        let value = state
            .target_temperature
            .ok_or(ValidationError::MissingTemperature(state.operation_mode))?;

        if !(self.min_temperature..=self.max_temperature).contains(&value) {
            return Err(ValidationError::TemperatureOutOfRange {
                value,
                min: self.min_temperature,
                max: self.max_temperature,
            });
        }

        let steps = (value - self.min_temperature) / self.precision;
        if (steps - steps.round()).abs() > PRECISION_EPSILON {
            return Err(ValidationError::TemperatureNotAligned {
                value,
                precision: self.precision,
                min: self.min_temperature,
            });
        }

        Ok(())
    }

    /// Describes this profile in the on-disk format.
    pub fn to_file(&self, commands: Option<serde_json::Value>) -> ProfileFile {
        ProfileFile {
            manufacturer: self.manufacturer.clone(),
            supported_models: self.supported_models.clone(),
            supported_controller: self.supported_controller,
            commands_encoding: self.commands_encoding,
            min_temperature: self.min_temperature,
            max_temperature: self.max_temperature,
            precision: self.precision,
            operation_modes: self
                .operation_modes
                .iter()
                .filter(|&&m| m != OperationMode::Off)
                .map(|m| m.as_ref().to_owned())
                .collect(),
            fan_modes: self.fan_modes.iter().map(|f| f.as_str().to_owned()).collect(),
            swing_modes: self
                .supports_swing()
                .then(|| self.swing_modes.iter().map(|s| s.as_str().to_owned()).collect()),
            commands,
        }
    }
}

impl TryFrom<&ProfileFile> for DeviceProfile {
    type Error = ProfileError;

    fn try_from(file: &ProfileFile) -> Result<Self, ProfileError> {
        if file.min_temperature > file.max_temperature {
            return Err(ProfileError::InvalidTemperatureRange {
                min: file.min_temperature,
                max: file.max_temperature,
            });
        }

        if !(file.precision > 0.0) {
            return Err(ProfileError::InvalidPrecision(file.precision));
        }

        if file.fan_modes.is_empty() {
            return Err(ProfileError::NoFanModes);
        }

        // Off is always available, whatever the file lists
        let mut operation_modes = vec![OperationMode::Off];
        for name in &file.operation_modes {
            match name.parse::<OperationMode>() {
                Ok(mode) if !operation_modes.contains(&mode) => operation_modes.push(mode),
                Ok(_) => {}
                Err(_) => warn!(mode = %name, "ignoring unknown operation mode"),
            }
        }

        Ok(DeviceProfile {
            manufacturer: file.manufacturer.clone(),
            supported_models: file.supported_models.clone(),
            supported_controller: file.supported_controller,
            commands_encoding: file.commands_encoding,
            min_temperature: file.min_temperature,
            max_temperature: file.max_temperature,
            precision: file.precision,
            operation_modes,
            fan_modes: dedup(&file.fan_modes).map(FanMode::new).collect(),
            swing_modes: dedup(file.swing_modes.as_deref().unwrap_or_default())
                .map(SwingMode::new)
                .collect(),
        })
    }
}

fn dedup(names: &[String]) -> impl Iterator<Item = &str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(String::as_str)
        .filter(move |name| seen.insert(*name))
}

pub(crate) fn read_description(path: &Path) -> Result<String, ProfileError> {
    fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.display().to_string(),
        source,
    })
}

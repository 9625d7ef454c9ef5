//! Codec backed by a table of pre-captured commands.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use super::{ClimateCodec, EncodeError};
use crate::{
    climate::{profile::read_description, ClimateState, DeviceProfile, ProfileError, ProfileFile},
    encoding::{create_format, decode_value, CodeFormat},
    signal::RawSignal,
};

const OFF_KEY: &str = "off";
const ON_KEY: &str = "on";

/// Looks commands up by mode, fan, swing (when the device has any) and
/// temperature, in that nesting order.
pub struct TableCodec {
    profile: DeviceProfile,
    commands: Value,
    format: Box<dyn CodeFormat + Send + Sync>,
}

impl TableCodec {
    pub fn from_file(file: &ProfileFile) -> Result<Self, ProfileError> {
        let profile = DeviceProfile::try_from(file)?;
        let commands = match &file.commands {
            Some(commands @ Value::Object(_)) => commands.clone(),
            _ => return Err(ProfileError::MissingCommands),
        };

        Ok(Self {
            format: create_format(profile.commands_encoding()),
            profile,
            commands,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, ProfileError> {
        let file: ProfileFile = serde_json::from_str(json)?;
        Self::from_file(&file)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Self::from_json(&read_description(path.as_ref())?)
    }

    fn lookup(&self, path: &[&str]) -> Result<RawSignal, EncodeError> {
        let value = path
            .iter()
            .try_fold(&self.commands, |node, key| node.get(*key))
            .ok_or_else(|| EncodeError::LookupMiss(path.join("/")))?;

        debug!(path = %path.join("/"), "found stored command");
        Ok(decode_value(self.format.as_ref(), value)?)
    }
}

impl ClimateCodec for TableCodec {
    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn encode(
        &self,
        target: &ClimateState,
        _previous: Option<&ClimateState>,
    ) -> Result<Vec<RawSignal>, EncodeError> {
        if target.is_off() {
            return Ok(vec![self.lookup(&[OFF_KEY])?]);
        }

        let mut signals = Vec::with_capacity(2);
        if self.commands.get(ON_KEY).is_some() {
            signals.push(self.lookup(&[ON_KEY])?);
        }

        let fan = target
            .fan_mode
            .as_ref()
            .ok_or(EncodeError::MissingField("fan_mode"))?;
        let temperature = target
            .target_temperature
            .ok_or(EncodeError::MissingField("target_temperature"))?
            .to_string();

        let mut path = vec![target.operation_mode.as_ref(), fan.as_str()];
        if self.profile.supports_swing() {
            let swing = target
                .swing_mode
                .as_ref()
                .ok_or(EncodeError::MissingField("swing_mode"))?;
            path.push(swing.as_str());
        }
        path.push(&temperature);

        signals.push(self.lookup(&path)?);
        Ok(signals)
    }
}

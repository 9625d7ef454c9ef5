use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    climate::{profile::read_description, ClimateState, DeviceProfile, ProfileError, ValidationError},
    codec::{ClimateCodec, ElectraRc3, EncodeError, TableCodec, ZhJt03},
    signal::RawSignal,
};

const DEFAULT_CODES_DIR: &str = "codes/climate";

/// Where an appliance's profile and codec come from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Pre-captured command table, `<codes_dir>/<device_code>.json`
    #[default]
    File,
    ElectraRc3,
    ZhJt03,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplianceConfig {
    pub id: String,
    #[serde(default)]
    pub provider: Provider,
    #[serde(default)]
    pub device_code: Option<u32>,
    #[serde(default = "default_codes_dir")]
    pub codes_dir: PathBuf,
}

fn default_codes_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CODES_DIR)
}

impl ApplianceConfig {
    pub fn new(id: impl Into<String>, provider: Provider) -> Self {
        Self {
            id: id.into(),
            provider,
            device_code: None,
            codes_dir: default_codes_dir(),
        }
    }

    pub fn description_path(&self) -> Option<PathBuf> {
        self.device_code
            .map(|code| self.codes_dir.join(format!("{}.json", code)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    pub appliances: Vec<ApplianceConfig>,
}

impl SelectorConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        Ok(serde_json::from_str(&read_description(path.as_ref())?)?)
    }
}

pub fn create_codec(config: &ApplianceConfig) -> Result<Box<dyn ClimateCodec>, ProfileError> {
    Ok(match config.provider {
        Provider::File => {
            let path = config
                .description_path()
                .ok_or_else(|| ProfileError::MissingDeviceCode(config.id.clone()))?;
            Box::new(TableCodec::from_path(path)?)
        }
        Provider::ElectraRc3 => Box::new(ElectraRc3::new()),
        Provider::ZhJt03 => Box::new(ZhJt03::new()),
    })
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown appliance: {0}")]
    UnknownAppliance(String),
    #[error("appliance {0} is already registered")]
    DuplicateAppliance(String),
    #[error("failed to load appliance: {0}")]
    Profile(#[from] ProfileError),
    #[error("invalid state: {0}")]
    Validation(#[from] ValidationError),
    #[error("failed to encode: {0}")]
    Encode(#[from] EncodeError),
}

/// Resolves appliances to their codec and checks states before encoding.
#[derive(Default)]
pub struct Selector {
    appliances: HashMap<String, Box<dyn ClimateCodec>>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &SelectorConfig) -> Result<Self, Error> {
        let mut selector = Self::new();
        for appliance in &config.appliances {
            selector.register(appliance.id.clone(), create_codec(appliance)?)?;
        }
        Ok(selector)
    }

    pub fn register(
        &mut self,
        id: impl Into<String>,
        codec: Box<dyn ClimateCodec>,
    ) -> Result<(), Error> {
        let id = id.into();
        if self.appliances.contains_key(&id) {
            return Err(Error::DuplicateAppliance(id));
        }

        let profile = codec.profile();
        info!(
            appliance = %id,
            manufacturer = profile.manufacturer(),
            models = ?profile.supported_models(),
            "registered appliance"
        );
        self.appliances.insert(id, codec);
        Ok(())
    }

    pub fn codec(&self, id: &str) -> Result<&dyn ClimateCodec, Error> {
        self.appliances
            .get(id)
            .map(|codec| codec.as_ref())
            .ok_or_else(|| Error::UnknownAppliance(id.to_owned()))
    }

    pub fn profile(&self, id: &str) -> Result<&DeviceProfile, Error> {
        Ok(self.codec(id)?.profile())
    }

    /// Validates `target` against the appliance's profile, then encodes it.
    pub fn encode(
        &self,
        id: &str,
        target: &ClimateState,
        previous: Option<&ClimateState>,
    ) -> Result<Vec<RawSignal>, Error> {
        let codec = self.codec(id)?;
        codec.profile().validate(target)?;
        Ok(codec.encode(target, previous)?)
    }
}

use std::str::FromStr;

use thiserror::Error;

use crate::{
    climate::{ClimateState, DeviceProfile},
    encoding::EncodingError,
    signal::{RawSignal, SignalError},
};

pub mod electra;
pub mod table;
pub mod zh_jt03;

pub use electra::ElectraRc3;
pub use table::TableCodec;
pub use zh_jt03::ZhJt03;

/// Turns climate states into signals for one appliance model.
///
/// Implementations hold no mutable state, so one instance can serve
/// concurrent callers. Anything that depends on the previous transmission is
/// derived from the `previous` argument.
pub trait ClimateCodec: Send + Sync {
    fn profile(&self) -> &DeviceProfile;

    /// Encodes `target` into one or more signals, to be sent in order.
    /// `previous` is the state last sent to the appliance, if known.
    fn encode(
        &self,
        target: &ClimateState,
        previous: Option<&ClimateState>,
    ) -> Result<Vec<RawSignal>, EncodeError>;
}

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("{field} value {value:?} has no protocol code")]
    UnmappedValue { field: &'static str, value: String },

    #[error("{0} is required by this protocol")]
    MissingField(&'static str),

    #[error("{field} value {value} does not fit in {width} bits")]
    FieldOverflow {
        field: &'static str,
        value: i64,
        width: u32,
    },

    #[error("no stored command for {0}")]
    LookupMiss(String),

    #[error("stored command is invalid: {0}")]
    InvalidCommand(#[from] EncodingError),

    #[error("encoded signal is invalid: {0}")]
    InvalidSignal(#[from] SignalError),
}

impl EncodeError {
    pub fn is_lookup_miss(&self) -> bool {
        matches!(self, EncodeError::LookupMiss(_))
    }
}

/// Maps a mode name onto a protocol code table.
pub(crate) fn protocol_code<T: FromStr>(field: &'static str, value: &str) -> Result<T, EncodeError> {
    value.parse().map_err(|_| EncodeError::UnmappedValue {
        field,
        value: value.to_owned(),
    })
}

/// Checks that `value` fits an unsigned field of `width` bits.
pub(crate) fn field_value(field: &'static str, value: i64, width: u32) -> Result<u8, EncodeError> {
    if (0..1 << width).contains(&value) {
        Ok(value as u8)
    } else {
        Err(EncodeError::FieldOverflow {
            field,
            value,
            width,
        })
    }
}

/// Temperature as whole degrees. Off states always use the profile minimum,
/// since their temperature is never validated.
pub(crate) fn whole_degrees(target: &ClimateState, profile: &DeviceProfile) -> i64 {
    let temperature = match target.target_temperature {
        Some(temperature) if !target.is_off() => temperature,
        _ => profile.min_temperature(),
    };
    temperature.floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value() {
        assert_eq!(field_value("temperature", 15, 4).unwrap(), 15);
        assert!(matches!(
            field_value("temperature", 16, 4),
            Err(EncodeError::FieldOverflow { value: 16, .. })
        ));
        assert!(field_value("temperature", -1, 4).is_err());
    }
}

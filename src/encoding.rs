use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    broadlink::Recording,
    signal::{RawSignal, SignalError},
};

/// How commands are stored in a device description, and how encoded signals
/// are handed to a controller.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    clap::ValueEnum,
    strum::EnumString,
    strum::Display,
)]
#[strum(ascii_case_insensitive)]
pub enum CommandsEncoding {
    Base64,
    Hex,
    Raw,
}

pub trait CodeFormat {
    fn decode(&self, input: &str) -> Result<RawSignal, EncodingError>;
    fn encode(&self, signal: &RawSignal) -> Result<String, EncodingError>;
}

pub fn create_format(ty: CommandsEncoding) -> Box<dyn CodeFormat + Send + Sync> {
    match ty {
        CommandsEncoding::Base64 => Box::new(BroadlinkBase64),
        CommandsEncoding::Hex => Box::new(BroadlinkHex),
        CommandsEncoding::Raw => Box::new(Raw),
    }
}

#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("failed to decode hex string: {0}")]
    HexDecodeError(#[from] hex::FromHexError),
    #[error("failed to decode base64 string: {0}")]
    Base64DecodeError(#[from] base64::DecodeError),
    #[error("failed to parse broadlink message: {0}")]
    BroadlinkParseError(#[from] crate::broadlink::ParseError),
    #[error("invalid signal: {0}")]
    SignalError(#[from] SignalError),
    #[error("failed to decode raw string")]
    RawParseError,
    #[error("unsupported command value: {0}")]
    UnsupportedValue(String),
    #[error("empty input")]
    EmptyInput,
}

/// Decodes a stored command, which is either a string in `format` or an
/// inline array of signed durations.
pub fn decode_value(format: &dyn CodeFormat, value: &Value) -> Result<RawSignal, EncodingError> {
    match value {
        Value::String(s) => format.decode(s),
        Value::Array(items) => {
            let pulses = items
                .iter()
                .map(|v| {
                    v.as_i64()
                        .and_then(|p| i32::try_from(p).ok())
                        .ok_or(EncodingError::RawParseError)
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(RawSignal::new(pulses)?)
        }
        other => Err(EncodingError::UnsupportedValue(other.to_string())),
    }
}

pub struct BroadlinkHex;
impl CodeFormat for BroadlinkHex {
    fn decode(&self, input: &str) -> Result<RawSignal, EncodingError> {
        let decoded = hex::decode(input.trim())?;
        if decoded.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        let recording = Recording::from_bytes(Bytes::from(decoded))?;
        Ok(recording.to_signal()?)
    }

    fn encode(&self, signal: &RawSignal) -> Result<String, EncodingError> {
        Ok(hex::encode(Recording::from_signal(signal).to_bytes()))
    }
}

pub struct BroadlinkBase64;
impl CodeFormat for BroadlinkBase64 {
    fn decode(&self, input: &str) -> Result<RawSignal, EncodingError> {
        let decoded = base64::decode(input.trim())?;
        if decoded.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        let recording = Recording::from_bytes(Bytes::from(decoded))?;
        Ok(recording.to_signal()?)
    }

    fn encode(&self, signal: &RawSignal) -> Result<String, EncodingError> {
        Ok(base64::encode(Recording::from_signal(signal).to_bytes()))
    }
}

/// Plain signed durations, either as a JSON array or in the `+mark -space`
/// notation (optionally wrapped as IrTransmogrifier's `Freq=38400Hz[...]`).
pub struct Raw;
impl CodeFormat for Raw {
    fn decode(&self, input: &str) -> Result<RawSignal, EncodingError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        if input.starts_with('[') && !input.contains('+') {
            let pulses: Vec<i32> =
                serde_json::from_str(input).or(Err(EncodingError::RawParseError))?;
            return Ok(RawSignal::new(pulses)?);
        }

        let input = if input.starts_with("Freq=") {
            let mut parts = input.splitn(2, '[');
            parts.next();
            let untrimmed = parts.next().ok_or(EncodingError::RawParseError)?;
            untrimmed.split(']').next().ok_or(EncodingError::RawParseError)?
        } else {
            input
        };

        let msg = irp::Message::parse(input).or(Err(EncodingError::RawParseError))?;
        let pulses = msg
            .raw
            .into_iter()
            .enumerate()
            .map(|(i, t)| {
                let t = t as i32;
                if i % 2 == 0 {
                    t
                } else {
                    -t
                }
            })
            .collect();
        Ok(RawSignal::new(pulses)?)
    }

    fn encode(&self, signal: &RawSignal) -> Result<String, EncodingError> {
        Ok(signal.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal() -> RawSignal {
        RawSignal::new(vec![3000, -4000, 1000, -1000, 2000, -1000]).unwrap()
    }

    #[test]
    fn test_raw_json() {
        let raw = create_format(CommandsEncoding::Raw);
        let encoded = raw.encode(&signal()).unwrap();
        assert_eq!(encoded, "[3000, -4000, 1000, -1000, 2000, -1000]");
        assert_eq!(raw.decode(&encoded).unwrap(), signal());
    }

    #[test]
    fn test_raw_rejects_garbage() {
        let raw = create_format(CommandsEncoding::Raw);
        assert!(matches!(raw.decode("[1, -2, x]"), Err(EncodingError::RawParseError)));
        assert!(matches!(raw.decode("  "), Err(EncodingError::EmptyInput)));
    }

    #[test]
    fn test_broadlink_formats() {
        for ty in [CommandsEncoding::Base64, CommandsEncoding::Hex] {
            let format = create_format(ty);
            let encoded = format.encode(&signal()).unwrap();
            let decoded = format.decode(&encoded).unwrap();
            assert_eq!(decoded.pulses().len(), signal().pulses().len());
            for (a, b) in decoded.pulses().iter().zip(signal().pulses()) {
                assert_eq!(a.signum(), b.signum());
                assert!((a - b).abs() <= 31);
            }
        }
    }

    #[test]
    fn test_base64_prefix() {
        let encoded = BroadlinkBase64.encode(&signal()).unwrap();
        // Every broadlink IR packet starts with 0x26 0x00
        assert!(encoded.starts_with("JgA"));
    }

    #[test]
    fn test_decode_value() {
        let value = serde_json::json!([560, -560, 560]);
        let decoded = decode_value(&Raw, &value).unwrap();
        assert_eq!(decoded.pulses(), &[560, -560, 560]);

        let value = serde_json::json!({"nested": true});
        assert!(matches!(
            decode_value(&Raw, &value),
            Err(EncodingError::UnsupportedValue(_))
        ));
    }

    #[test]
    fn test_encoding_names() {
        let parsed: CommandsEncoding = serde_json::from_str("\"Base64\"").unwrap();
        assert_eq!(parsed, CommandsEncoding::Base64);
        assert_eq!("raw".parse::<CommandsEncoding>().unwrap(), CommandsEncoding::Raw);
    }
}

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A transmittable waveform: positive values are marks, negative values are
/// spaces, both in the owning protocol's tick unit (microseconds for every
/// protocol in this crate).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<i32>", into = "Vec<i32>")]
pub struct RawSignal(Vec<i32>);

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignalError {
    #[error("a signal needs at least one pulse")]
    Empty,
    #[error("zero-length pulse at index {0}")]
    ZeroPulse(usize),
}

impl RawSignal {
    pub fn new(pulses: Vec<i32>) -> Result<Self, SignalError> {
        if pulses.is_empty() {
            return Err(SignalError::Empty);
        }
        if let Some(i) = pulses.iter().position(|&p| p == 0) {
            return Err(SignalError::ZeroPulse(i));
        }
        Ok(Self(pulses))
    }

    /// Builds a signal from unsigned on/off durations, starting with a mark.
    pub fn from_durations<'a>(
        durations: impl IntoIterator<Item = &'a Duration>,
    ) -> Result<Self, SignalError> {
        let pulses = durations
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                let micros = d.as_micros() as i32;
                if i % 2 == 0 {
                    micros
                } else {
                    -micros
                }
            })
            .collect();
        Self::new(pulses)
    }

    pub fn pulses(&self) -> &[i32] {
        &self.0
    }

    pub fn into_pulses(self) -> Vec<i32> {
        self.0
    }

    pub fn to_durations(&self) -> Vec<Duration> {
        self.0
            .iter()
            .map(|p| Duration::from_micros(p.unsigned_abs() as _))
            .collect()
    }
}

impl TryFrom<Vec<i32>> for RawSignal {
    type Error = SignalError;

    fn try_from(pulses: Vec<i32>) -> Result<Self, SignalError> {
        Self::new(pulses)
    }
}

impl From<RawSignal> for Vec<i32> {
    fn from(signal: RawSignal) -> Self {
        signal.0
    }
}

impl fmt::Display for RawSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, p) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, "]")
    }
}

/// Appends `segment`, growing the last entry instead when both are marks or
/// both are spaces.
pub fn push_coalesced(pulses: &mut Vec<i32>, segment: i32) {
    match pulses.last_mut() {
        Some(last) if last.signum() == segment.signum() => *last += segment,
        _ => pulses.push(segment),
    }
}

/// Folds `segments` onto `init`, merging runs of equal sign.
pub fn coalesce(init: Vec<i32>, segments: impl IntoIterator<Item = i32>) -> Vec<i32> {
    segments.into_iter().fold(init, |mut acc, segment| {
        push_coalesced(&mut acc, segment);
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid() {
        assert_eq!(RawSignal::new(vec![]), Err(SignalError::Empty));
        assert_eq!(RawSignal::new(vec![10, 0, 10]), Err(SignalError::ZeroPulse(1)));
    }

    #[test]
    fn test_coalesce() {
        let merged = coalesce(vec![3, -3], [-1, 1, 1, -1, 1, -1]);
        assert_eq!(merged, vec![3, -4, 2, -1, 1, -1]);
    }

    #[test]
    fn test_durations() {
        let signal = RawSignal::new(vec![560, -1690, 560]).unwrap();
        let durations = signal.to_durations();
        assert_eq!(durations[1], Duration::from_micros(1690));
        assert_eq!(RawSignal::from_durations(&durations).unwrap(), signal);
    }

    #[test]
    fn test_display() {
        let signal = RawSignal::new(vec![9000, -4500, 560]).unwrap();
        assert_eq!(signal.to_string(), "[9000, -4500, 560]");
    }

    #[test]
    fn test_deserialize_checks_pulses() {
        assert!(serde_json::from_str::<RawSignal>("[1, -2]").is_ok());
        assert!(serde_json::from_str::<RawSignal>("[]").is_err());
    }
}

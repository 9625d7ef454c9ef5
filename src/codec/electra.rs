//! Electra RC-3 remote: a 34-bit word sent as Manchester-style unit pairs.
//!
//! Each bit is one unit of space then mark for a 1, mark then space for a 0.
//! Adjacent units of the same kind are sent as one longer pulse, so a frame
//! always alternates between marks and spaces.

use bitfield::bitfield;
use tracing::debug;

use super::{field_value, protocol_code, whole_degrees, ClimateCodec, EncodeError};
use crate::{
    climate::{ClimateState, Controller, DeviceProfile, FanMode, OperationMode, SwingMode},
    encoding::CommandsEncoding,
    signal::{self, RawSignal},
};

const TIME_UNIT: i32 = 1000;
const WORD_BITS: u32 = 34;
const TEMPERATURE_OFFSET: i64 = 15;
const TEMPERATURE_WIDTH: u32 = 4;
const FRAME_REPEATS: usize = 3;

const HEADER: [i32; 2] = [3 * TIME_UNIT, -3 * TIME_UNIT];
const CLOSING_MARK: i32 = 4 * TIME_UNIT;

bitfield! {
    pub struct ElectraWord(u64);
    impl Debug;
    pub power, set_power: 33;
    pub u8, mode, set_mode: 32, 30;
    pub u8, fan, set_fan: 29, 28;
    pub mini_swing, set_mini_swing: 26;
    pub auto_swing, set_auto_swing: 25;
    pub ifeel, set_ifeel: 24;
    pub u8, temperature, set_temperature: 22, 19;
    pub sleep, set_sleep: 18;
    pub marker, set_marker: 1;
}

impl Clone for ElectraWord {
    fn clone(&self) -> Self {
        ElectraWord(self.0)
    }
}

impl Copy for ElectraWord {}

impl ElectraWord {
    pub fn new() -> Self {
        let mut word = ElectraWord(0);
        word.set_marker(true);
        word
    }
}

impl Default for ElectraWord {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Mode {
    Cool = 0b001,
    Heat = 0b010,
    Auto = 0b011,
    Dry = 0b100,
    FanOnly = 0b101,
    Off = 0b111,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Fan {
    Low = 0b00,
    Mid = 0b01,
    High = 0b10,
    Auto = 0b11,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Swing {
    Off,
    On,
}

pub struct ElectraRc3 {
    profile: DeviceProfile,
}

impl ElectraRc3 {
    pub fn new() -> Self {
        Self::with_profile(Self::default_profile())
    }

    pub fn with_profile(profile: DeviceProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> DeviceProfile {
        use OperationMode::*;

        DeviceProfile {
            manufacturer: "Electra".into(),
            supported_models: vec!["RC-3".into()],
            supported_controller: Controller::Mqtt,
            commands_encoding: CommandsEncoding::Raw,
            min_temperature: 16.0,
            max_temperature: 30.0,
            precision: 1.0,
            operation_modes: vec![Off, Auto, Cool, Heat, FanOnly, Dry],
            fan_modes: ["auto", "low", "mid", "high"].map(FanMode::from).to_vec(),
            swing_modes: ["off", "on"].map(SwingMode::from).to_vec(),
        }
    }

    /// Packs `target` into the protocol word.
    pub fn word(
        &self,
        target: &ClimateState,
        previous: Option<&ClimateState>,
    ) -> Result<ElectraWord, EncodeError> {
        let mut word = ElectraWord::new();

        let temperature = whole_degrees(target, &self.profile) - TEMPERATURE_OFFSET;
        word.set_temperature(field_value("temperature", temperature, TEMPERATURE_WIDTH)?);

        let fan = target
            .fan_mode
            .as_ref()
            .ok_or(EncodeError::MissingField("fan_mode"))?;
        word.set_fan(protocol_code::<Fan>("fan_mode", fan.as_str())? as u8);

        let mode: Mode = protocol_code("operation_mode", target.operation_mode.as_ref())?;
        word.set_mode(mode as u8);

        if let Some(swing) = &target.swing_mode {
            let swing: Swing = protocol_code("swing_mode", swing.as_str())?;
            word.set_auto_swing(swing == Swing::On);
        }

        // The unit toggles power on each asserted bit, so only an off -> on
        // transition may set it.
        let turning_on = previous.map_or(false, ClimateState::is_off) && !target.is_off();
        word.set_power(turning_on);

        Ok(word)
    }

    /// One transmission of `word`: header then the coalesced bit units.
    fn frame(word: &ElectraWord) -> Vec<i32> {
        let units = (0..WORD_BITS).rev().flat_map(|pos| {
            if (word.0 >> pos) & 1 == 1 {
                [-TIME_UNIT, TIME_UNIT]
            } else {
                [TIME_UNIT, -TIME_UNIT]
            }
        });
        signal::coalesce(HEADER.to_vec(), units)
    }
}

impl Default for ElectraRc3 {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateCodec for ElectraRc3 {
    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn encode(
        &self,
        target: &ClimateState,
        previous: Option<&ClimateState>,
    ) -> Result<Vec<RawSignal>, EncodeError> {
        let word = self.word(target, previous)?;
        debug!(word = format_args!("{:#011x}", word.0), power = word.power(), "electra word");

        let mut pulses = Self::frame(&word).repeat(FRAME_REPEATS);
        pulses.push(CLOSING_MARK);

        Ok(vec![RawSignal::new(pulses)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cool() -> ClimateState {
        ClimateState::new(OperationMode::Cool)
            .with_fan("high")
            .with_swing("off")
            .with_temperature(24.0)
    }

    /// Expands a signal back into unit steps and reads each frame's word.
    fn decode_frames(pulses: &[i32]) -> Vec<u64> {
        let units: Vec<i32> = pulses
            .iter()
            .flat_map(|&p| std::iter::repeat(p.signum()).take((p.abs() / TIME_UNIT) as usize))
            .collect();

        let (body, closing) = units.split_at(units.len() - 4);
        assert_eq!(closing, &[1, 1, 1, 1]);

        let frame_units = 6 + 2 * WORD_BITS as usize;
        assert_eq!(body.len(), FRAME_REPEATS * frame_units);

        body.chunks(frame_units)
            .map(|frame| {
                assert_eq!(&frame[..6], &[1, 1, 1, -1, -1, -1]);
                frame[6..].chunks(2).fold(0u64, |acc, pair| match pair {
                    [-1, 1] => acc << 1 | 1,
                    [1, -1] => acc << 1,
                    other => panic!("invalid bit units {:?}", other),
                })
            })
            .collect()
    }

    #[test]
    fn test_word_fields() {
        let codec = ElectraRc3::new();
        let word = codec.word(&cool(), Some(&ClimateState::off())).unwrap();

        assert_eq!(word.temperature(), 9);
        assert_eq!(word.fan(), Fan::High as u8);
        assert_eq!(word.mode(), Mode::Cool as u8);
        assert!(word.power());
        assert!(!word.auto_swing());
        assert!(word.marker());
        assert_eq!(word.0, 0x2_6048_0002);
    }

    #[test]
    fn test_power_toggle() {
        let codec = ElectraRc3::new();
        let off = ClimateState::off().with_fan("auto");
        let heat = ClimateState::new(OperationMode::Heat)
            .with_fan("auto")
            .with_temperature(24.0);

        assert!(codec.word(&cool(), Some(&off)).unwrap().power());
        assert!(!codec.word(&heat, Some(&cool())).unwrap().power());
        assert!(!codec.word(&cool(), None).unwrap().power());
        assert!(!codec.word(&cool().with_temperature(25.0), Some(&cool())).unwrap().power());
        // Turning off leaves the bit alone, the off mode code does the work
        let word = codec.word(&off, Some(&cool())).unwrap();
        assert!(!word.power());
        assert_eq!(word.mode(), Mode::Off as u8);
    }

    #[test]
    fn test_swing() {
        let codec = ElectraRc3::new();
        let word = codec.word(&cool().with_swing("on"), None).unwrap();
        assert!(word.auto_swing());
        assert!(!word.mini_swing());
    }

    #[test]
    fn test_encode() {
        let codec = ElectraRc3::new();
        let signals = codec.encode(&cool(), Some(&ClimateState::off())).unwrap();
        assert_eq!(signals.len(), 1);

        let pulses = signals[0].pulses();
        assert_eq!(*pulses.last().unwrap(), 4 * TIME_UNIT);
        // The power bit's space merges into the header space, and its mark
        // into the leading mark of the first mode bit
        assert_eq!(&pulses[..4], &[3 * TIME_UNIT, -4 * TIME_UNIT, 2 * TIME_UNIT, -TIME_UNIT]);

        let frames = decode_frames(pulses);
        assert_eq!(frames, vec![0x2_6048_0002; 3]);
    }

    #[test]
    fn test_alternates() {
        let codec = ElectraRc3::new();
        for previous in [None, Some(ClimateState::off())] {
            let signals = codec.encode(&cool(), previous.as_ref()).unwrap();
            let pulses = signals[0].pulses();
            for pair in pulses.windows(2) {
                assert_ne!(pair[0].signum(), pair[1].signum(), "{:?}", pulses);
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let codec = ElectraRc3::new();
        let a = codec.encode(&cool(), Some(&ClimateState::off())).unwrap();
        let b = codec.encode(&cool(), Some(&ClimateState::off())).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unmapped() {
        let codec = ElectraRc3::new();
        let err = codec.encode(&cool().with_fan("turbo"), None).unwrap_err();
        assert!(matches!(err, EncodeError::UnmappedValue { field: "fan_mode", .. }));

        let heat_cool = ClimateState::new(OperationMode::HeatCool)
            .with_fan("auto")
            .with_temperature(22.0);
        assert!(matches!(
            codec.encode(&heat_cool, None),
            Err(EncodeError::UnmappedValue { field: "operation_mode", .. })
        ));

        let mut no_fan = cool();
        no_fan.fan_mode = None;
        assert!(matches!(
            codec.encode(&no_fan, None),
            Err(EncodeError::MissingField("fan_mode"))
        ));
    }

    #[test]
    fn test_temperature_overflow() {
        let codec = ElectraRc3::new();
        assert!(matches!(
            codec.encode(&cool().with_temperature(31.0), None),
            Err(EncodeError::FieldOverflow { field: "temperature", .. })
        ));
    }
}

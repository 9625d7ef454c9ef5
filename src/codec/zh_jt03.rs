//! Chigo ZH-JT-03 remote: six bytes, each followed by its complement.

use bitfield::bitfield;
use tracing::debug;

use super::{field_value, protocol_code, whole_degrees, ClimateCodec, EncodeError};
use crate::{
    climate::{ClimateState, Controller, DeviceProfile, FanMode, OperationMode, SwingMode},
    encoding::CommandsEncoding,
    pwm::{BitOrder, Timing},
    signal::RawSignal,
};

const TICK: u32 = 620;
const BIT_MARK: u32 = TICK;
const ONE_SPACE: u32 = TICK;
const ZERO_SPACE: u32 = TICK * 3;
const HEADER_MARK: u32 = TICK * 11;
const HEADER_SPACE: u32 = TICK * 11;

const TIMING: Timing = Timing::new(BIT_MARK, ONE_SPACE, BIT_MARK, ZERO_SPACE);

const FRAME_BYTES: u32 = 6;
const TEMPERATURE_WIDTH: u32 = 4;
const END_FRAME: u8 = 0xD5;
// Command selector for a full state frame (the remote's on/off key)
const COMMAND_STATE: u8 = 0x0;

bitfield! {
    pub struct Jt03Frame(u64);
    impl Debug;
    pub u8, timer_duration, set_timer_duration: 4, 0;
    pub u8, timer_switch, set_timer_switch: 7, 5;
    pub lamp, set_lamp: 8;
    pub hold, set_hold: 10;
    pub turbo, set_turbo: 11;
    pub u8, command, set_command: 19, 16;
    pub sleep, set_sleep: 24;
    pub power, set_power: 25;
    pub u8, swing, set_swing: 27, 26;
    pub airflow, set_airflow: 28;
    pub u8, fan, set_fan: 30, 29;
    pub u8, temperature, set_temperature: 35, 32;
    pub u8, mode, set_mode: 39, 37;
    pub u8, end_frame, set_end_frame: 47, 40;
}

impl Clone for Jt03Frame {
    fn clone(&self) -> Self {
        Jt03Frame(self.0)
    }
}

impl Copy for Jt03Frame {}

impl Jt03Frame {
    pub fn new() -> Self {
        let mut frame = Jt03Frame(0);
        frame.set_command(COMMAND_STATE);
        frame.set_end_frame(END_FRAME);
        frame
    }

    /// Frame bytes in transmission order.
    pub fn bytes(&self) -> impl Iterator<Item = u8> + '_ {
        (0..FRAME_BYTES).map(move |i| (self.0 >> (8 * i)) as u8)
    }
}

impl Default for Jt03Frame {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Mode {
    Auto = 0x00,
    Cool = 0x01,
    Dry = 0x02,
    FanOnly = 0x03,
    Heat = 0x04,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Fan {
    Auto = 0x00,
    High = 0x01,
    Mid = 0x02,
    Low = 0x03,
}

// The remote sends 0x12 for off; only the low two bits reach the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
enum Swing {
    Fast = 0b00,
    Slow = 0b01,
    Off = 0b10,
}

pub struct ZhJt03 {
    profile: DeviceProfile,
}

impl ZhJt03 {
    pub fn new() -> Self {
        Self::with_profile(Self::default_profile())
    }

    pub fn with_profile(profile: DeviceProfile) -> Self {
        Self { profile }
    }

    pub fn default_profile() -> DeviceProfile {
        use OperationMode::*;

        DeviceProfile {
            manufacturer: "Chigo".into(),
            supported_models: vec!["ZH-JT-03".into()],
            supported_controller: Controller::Mqtt,
            commands_encoding: CommandsEncoding::Raw,
            min_temperature: 16.0,
            // 32 would wrap the 4-bit temperature field
            max_temperature: 31.0,
            precision: 1.0,
            operation_modes: vec![Off, Auto, Cool, Heat, FanOnly, Dry],
            fan_modes: ["auto", "low", "mid", "high"].map(FanMode::from).to_vec(),
            swing_modes: ["off", "fast", "slow"].map(SwingMode::from).to_vec(),
        }
    }

    /// Packs `target` into the six frame bytes.
    pub fn frame(&self, target: &ClimateState) -> Result<Jt03Frame, EncodeError> {
        let mut frame = Jt03Frame::new();

        let temperature = whole_degrees(target, &self.profile) - self.profile.min_temperature() as i64;
        frame.set_temperature(field_value("temperature", temperature, TEMPERATURE_WIDTH)?);

        if let Some(fan) = &target.fan_mode {
            frame.set_fan(protocol_code::<Fan>("fan_mode", fan.as_str())? as u8);
        }

        if let Some(swing) = &target.swing_mode {
            frame.set_swing(protocol_code::<Swing>("swing_mode", swing.as_str())? as u8);
        }

        if target.is_off() {
            frame.set_power(false);
        } else {
            let mode: Mode = protocol_code("operation_mode", target.operation_mode.as_ref())?;
            frame.set_power(true);
            frame.set_mode(mode as u8);
        }

        Ok(frame)
    }
}

impl Default for ZhJt03 {
    fn default() -> Self {
        Self::new()
    }
}

impl ClimateCodec for ZhJt03 {
    fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    fn encode(
        &self,
        target: &ClimateState,
        _previous: Option<&ClimateState>,
    ) -> Result<Vec<RawSignal>, EncodeError> {
        let frame = self.frame(target)?;
        debug!(frame = format_args!("{:#014x}", frame.0), "zh-jt-03 frame");

        let mut pulses = Vec::with_capacity(2 + FRAME_BYTES as usize * 32 + 3);
        pulses.extend([HEADER_MARK as i32, -(HEADER_SPACE as i32)]);

        for byte in frame.bytes() {
            pulses.extend(TIMING.pulses(byte as u64, 8, BitOrder::LsbFirst));
            pulses.extend(TIMING.pulses(!byte as u64, 8, BitOrder::LsbFirst));
        }

        pulses.extend([BIT_MARK as i32, -(HEADER_SPACE as i32), BIT_MARK as i32]);

        Ok(vec![RawSignal::new(pulses)?])
    }
}

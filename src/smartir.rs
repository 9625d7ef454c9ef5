use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::{
    climate::{ClimateState, FanMode, OperationMode, ProfileFile, SwingMode},
    codec::ClimateCodec,
    encoding::{create_format, CodeFormat, CommandsEncoding},
};

/// Generates a SmartIR code file covering every state `codec` supports, so the
/// appliance can be driven by a plain table lookup.
///
/// Commands are nested mode -> fan -> (swing ->) temperature. Each entry is
/// encoded without a previous state, so protocols with edge-triggered bits
/// get their steady-state form.
pub fn generate_table(
    codec: &dyn ClimateCodec,
    encoding: CommandsEncoding,
) -> anyhow::Result<ProfileFile> {
    let generator = TableGenerator {
        codec,
        format: create_format(encoding),
        encoding,
    };
    let profile = codec.profile();

    let mut all_commands = Map::new();
    for mode in OperationMode::iter() {
        if mode == OperationMode::Off || !profile.operation_modes().contains(&mode) {
            continue;
        }

        let mut fan_map = Map::new();
        for fan in profile.fan_modes() {
            let entry = if profile.supports_swing() {
                let mut swing_map = Map::new();
                for swing in profile.swing_modes() {
                    let temperatures = generator.temperatures(mode, fan, Some(swing))?;
                    swing_map.insert(swing.to_string(), temperatures.into());
                }
                swing_map
            } else {
                generator.temperatures(mode, fan, None)?
            };
            fan_map.insert(fan.to_string(), entry.into());
        }
        all_commands.insert(mode.to_string(), fan_map.into());
    }

    // Add "Off" state
    let off_state = ClimateState {
        operation_mode: OperationMode::Off,
        fan_mode: profile.fan_modes().first().cloned(),
        swing_mode: profile.swing_modes().first().cloned(),
        target_temperature: None,
    };
    all_commands.insert("off".into(), generator.encode_state(&off_state)?);

    let mut file = profile.to_file(Some(all_commands.into()));
    file.commands_encoding = encoding;
    Ok(file)
}

struct TableGenerator<'a> {
    codec: &'a dyn ClimateCodec,
    format: Box<dyn CodeFormat + Send + Sync>,
    encoding: CommandsEncoding,
}

impl TableGenerator<'_> {
    fn temperatures(
        &self,
        mode: OperationMode,
        fan: &FanMode,
        swing: Option<&SwingMode>,
    ) -> anyhow::Result<Map<String, Value>> {
        let mut map = Map::new();
        for temperature in self.codec.profile().temperatures() {
            let state = ClimateState {
                operation_mode: mode,
                fan_mode: Some(fan.clone()),
                swing_mode: swing.cloned(),
                target_temperature: Some(temperature),
            };
            map.insert(temperature.to_string(), self.encode_state(&state)?);
        }
        Ok(map)
    }

    fn encode_state(&self, state: &ClimateState) -> anyhow::Result<Value> {
        // A table entry holds exactly one command
        let signal = self
            .codec
            .encode(state, None)?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("no signal produced for {:?}", state))?;

        Ok(match self.encoding {
            CommandsEncoding::Raw => signal.into_pulses().into(),
            _ => self.format.encode(&signal)?.into(),
        })
    }
}

use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use climate_ir::{
    climate::ProfileFile,
    encoding::{create_format, CommandsEncoding},
    selector::create_codec,
    smartir, ApplianceConfig, ClimateState, OperationMode, Provider, Selector,
};

/// Encode climate appliance states into IR/RF signals
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode a state and print one signal per line
    Encode {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        state: StateArgs,

        /// Mode last sent to the appliance, if known
        #[arg(long)]
        previous_mode: Option<OperationMode>,

        /// Output format for each signal
        #[arg(long, value_enum, default_value_t = CommandsEncoding::Raw)]
        format: CommandsEncoding,
    },

    /// Print the device profile as a description file
    Profile {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Generate a lookup table description from a protocol encoder
    GenTable {
        #[command(flatten)]
        device: DeviceArgs,

        #[arg(long, value_enum, default_value_t = CommandsEncoding::Base64)]
        format: CommandsEncoding,
    },
}

#[derive(Args, Debug)]
struct DeviceArgs {
    #[arg(long, value_enum, default_value_t = Provider::File)]
    provider: Provider,

    /// Device code of the description file (file provider only)
    #[arg(long)]
    device_code: Option<u32>,

    #[arg(long, default_value = "codes/climate")]
    codes_dir: PathBuf,
}

impl DeviceArgs {
    fn config(&self) -> ApplianceConfig {
        let mut config = ApplianceConfig::new("cli", self.provider);
        config.device_code = self.device_code;
        config.codes_dir = self.codes_dir.clone();
        config
    }
}

#[derive(Args, Debug)]
struct StateArgs {
    #[arg(long)]
    mode: OperationMode,

    #[arg(long)]
    fan: Option<String>,

    #[arg(long)]
    swing: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,
}

impl StateArgs {
    fn state(&self) -> ClimateState {
        ClimateState {
            operation_mode: self.mode,
            fan_mode: self.fan.as_deref().map(Into::into),
            swing_mode: self.swing.as_deref().map(Into::into),
            target_temperature: self.temperature,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();

    match cli.command {
        Command::Encode {
            device,
            state,
            previous_mode,
            format,
        } => {
            let config = device.config();
            let mut selector = Selector::new();
            selector.register(config.id.clone(), create_codec(&config)?)?;

            let mut target = state.state();
            if let Some(temperature) = target.target_temperature {
                target.target_temperature =
                    Some(selector.profile(&config.id)?.round_temperature(temperature));
            }

            // Only the mode matters for transitions, the rest mirrors the target
            let previous = previous_mode.map(|mode| ClimateState {
                operation_mode: mode,
                ..target.clone()
            });

            let signals = selector.encode(&config.id, &target, previous.as_ref())?;
            let format = create_format(format);
            for signal in &signals {
                writeln!(stdout, "{}", format.encode(signal)?)?;
            }
        }
        Command::Profile { device } => {
            let codec = create_codec(&device.config())?;
            let file: ProfileFile = codec.profile().to_file(None);
            writeln!(stdout, "{}", serde_json::to_string_pretty(&file)?)?;
        }
        Command::GenTable { device, format } => {
            let codec = create_codec(&device.config())?;
            let file = smartir::generate_table(codec.as_ref(), format)?;
            writeln!(stdout, "{}", serde_json::to_string_pretty(&file)?)?;
        }
    }

    stdout.flush()?;
    Ok(())
}

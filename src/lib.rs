pub mod broadlink;
pub mod climate;
pub mod codec;
pub mod encoding;
pub mod pwm;
pub mod selector;
pub mod signal;
pub mod smartir;

pub use climate::{ClimateState, DeviceProfile, FanMode, OperationMode, SwingMode};
pub use codec::{ClimateCodec, EncodeError};
pub use selector::{ApplianceConfig, Provider, Selector, SelectorConfig};
pub use signal::RawSignal;

pub mod profile;
pub mod state;

pub use profile::{Controller, DeviceProfile, ProfileError, ProfileFile, ValidationError};
pub use state::{ClimateState, FanMode, OperationMode, SwingMode};

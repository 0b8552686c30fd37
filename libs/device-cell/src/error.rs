use thiserror::Error;

use vitals_cell::VitalsError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeviceError {
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Device not found: {0}")]
    NotFound(String),

    #[error("Device {0} is already registered")]
    AlreadyRegistered(String),

    #[error("Unsupported device type: {0}")]
    InvalidDeviceType(String),

    #[error("Sampling interval must be one of 1, 5, 10, 30 or 60 seconds, got {0}")]
    InvalidSamplingInterval(u32),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Vitals(#[from] VitalsError),
}

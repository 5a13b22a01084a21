//! Board errors

use mimic_display::GeometryError;
use thiserror::Error;

/// Board description could not be loaded or does not describe a valid board
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read board description: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid board description: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("uart name must not be empty")]
    EmptyUartName,

    #[error("uart `{0}` is defined twice")]
    DuplicateUart(String),

    #[error("{device} is wired to unknown uart `{uart}`")]
    UnknownUart { device: &'static str, uart: String },

    #[error("uart `{0}` already has a device attached")]
    UartInUse(String),

    #[error("i2c address {0:#04x} is used by more than one device")]
    DuplicateAddress(u8),

    #[error("i2c address {0:#04x} is not a 7-bit address")]
    InvalidAddress(u8),

    #[error("invalid sh1106 geometry: {0:?}")]
    Geometry(GeometryError),

    #[error("sht31 initial {0} is out of range")]
    OutOfRange(&'static str),
}

impl From<GeometryError> for ConfigError {
    fn from(e: GeometryError) -> Self {
        ConfigError::Geometry(e)
    }
}

/// I2C transaction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BusError {
    /// No device answers at this address
    #[error("no device at i2c address {0:#04x}")]
    Nack(u8),
}

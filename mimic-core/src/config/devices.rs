//! Device configuration definitions

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum peripheral name length
pub const MAX_NAME_LEN: usize = 16;

/// Default USART kernel clock (Hz)
pub const DEFAULT_USART_FREQUENCY: u32 = 8_000_000;

/// Default ticks between active-mode particulate readings
pub const DEFAULT_PMS5003_PERIOD: u32 = 5;

/// Default SGP41 I2C address
pub const DEFAULT_SGP41_ADDRESS: u8 = 0x59;

/// Default SGP41 serial number
pub const DEFAULT_SGP41_SERIAL: u64 = 0xAABB_CCDD_EEFF;

/// Default SHT31 I2C address
pub const DEFAULT_SHT31_ADDRESS: u8 = 0x44;

/// Default SH1106 I2C address
pub const DEFAULT_SH1106_ADDRESS: u8 = 0x3C;

/// Default SH1106 panel width (pixels)
pub const DEFAULT_SH1106_WIDTH: u16 = 128;

/// Default SH1106 panel height (pixels)
pub const DEFAULT_SH1106_HEIGHT: u16 = 64;

/// STM32 USART configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct UsartConfig {
    /// Name sensors use to attach to this USART
    pub name: String<MAX_NAME_LEN>,
    /// Kernel clock frequency (Hz)
    pub frequency: u32,
}

impl Default for UsartConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            frequency: DEFAULT_USART_FREQUENCY,
        }
    }
}

/// PMS5003 particulate sensor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Pms5003Config {
    /// USART the sensor is wired to
    pub uart: String<MAX_NAME_LEN>,
    /// Ticks between active-mode readings
    pub period_ticks: u32,
    /// Initial PM2.5 concentration (µg/m³, clamped to 16 bits)
    pub pm2_5: u32,
}

impl Default for Pms5003Config {
    fn default() -> Self {
        Self {
            uart: String::new(),
            period_ticks: DEFAULT_PMS5003_PERIOD,
            pm2_5: 0,
        }
    }
}

/// S8 LP CO2 sensor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct S8lpConfig {
    /// USART the sensor is wired to
    pub uart: String<MAX_NAME_LEN>,
    /// Initial CO2 concentration (ppm, clamped to 16 bits)
    pub co2: u32,
}

/// SGP41 VOC/NOx sensor configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Sgp41Config {
    /// I2C address
    pub address: u8,
    /// Initial raw VOC signal (clamped to 16 bits)
    pub voc_ticks: u32,
    /// Initial raw NOx signal (clamped to 16 bits)
    pub nox_ticks: u32,
    /// Serial number (clamped to 48 bits)
    pub serial_number: u64,
}

impl Default for Sgp41Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_SGP41_ADDRESS,
            voc_ticks: 0,
            nox_ticks: 0,
            serial_number: DEFAULT_SGP41_SERIAL,
        }
    }
}

/// SHT31 temperature/humidity sensor configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Sht31Config {
    /// I2C address
    pub address: u8,
    /// Initial temperature (°C)
    pub temperature: f32,
    /// Initial relative humidity (%)
    pub humidity: f32,
    /// Serial number (clamped to 16 bits)
    pub serial_number: u32,
}

impl Default for Sht31Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_SHT31_ADDRESS,
            temperature: 0.0,
            humidity: 0.0,
            serial_number: 0,
        }
    }
}

/// SH1106 OLED controller configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct Sh1106Config {
    /// I2C address
    pub address: u8,
    /// Panel width (pixels)
    pub width: u16,
    /// Panel height (pixels, multiple of 8)
    pub height: u16,
}

impl Default for Sh1106Config {
    fn default() -> Self {
        Self {
            address: DEFAULT_SH1106_ADDRESS,
            width: DEFAULT_SH1106_WIDTH,
            height: DEFAULT_SH1106_HEIGHT,
        }
    }
}

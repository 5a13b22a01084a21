//! Board description
//!
//! A board is described in TOML: a list of USARTs plus at most one of each
//! emulated peripheral. Every section is optional.
//!
//! ```toml
//! [[uart]]
//! name = "usart2"
//!
//! [pms5003]
//! uart = "usart2"
//! pm2_5 = 12
//!
//! [sht31]
//! temperature = 21.5
//! humidity = 40.0
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use mimic_core::config::{
    Pms5003Config, S8lpConfig, Sgp41Config, Sh1106Config, Sht31Config, UsartConfig,
};
use mimic_core::units::{humidity_to_raw, temperature_to_raw};
use mimic_display::PixelBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigError;

/// Highest 7-bit I2C address
const MAX_I2C_ADDRESS: u8 = 0x7F;

/// Complete board description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoardConfig {
    /// STM32 USARTs, referenced by name from UART sensors
    #[serde(rename = "uart")]
    pub uarts: Vec<UsartConfig>,
    pub pms5003: Option<Pms5003Config>,
    pub s8lp: Option<S8lpConfig>,
    pub sgp41: Option<Sgp41Config>,
    pub sht31: Option<Sht31Config>,
    pub sh1106: Option<Sh1106Config>,
}

impl BoardConfig {
    /// Parse and validate a board description
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = toml::from_str(toml_str)?;
        config.validate()?;
        log_config_summary(&config);
        Ok(config)
    }

    /// Read, parse and validate a board description file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!("Loading board description from {}", path.display());
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Check cross-references and initial values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names = BTreeSet::new();
        for usart in &self.uarts {
            if usart.name.is_empty() {
                return Err(ConfigError::EmptyUartName);
            }
            if !names.insert(usart.name.as_str()) {
                return Err(ConfigError::DuplicateUart(usart.name.to_string()));
            }
        }

        let mut wired = BTreeSet::new();
        let uart_users = [
            ("pms5003", self.pms5003.as_ref().map(|c| c.uart.as_str())),
            ("s8lp", self.s8lp.as_ref().map(|c| c.uart.as_str())),
        ];
        for (device, uart) in uart_users {
            let Some(uart) = uart else { continue };
            if !names.contains(uart) {
                return Err(ConfigError::UnknownUart {
                    device,
                    uart: uart.to_string(),
                });
            }
            if !wired.insert(uart) {
                return Err(ConfigError::UartInUse(uart.to_string()));
            }
        }

        let mut addresses = BTreeSet::new();
        for address in self.i2c_addresses() {
            if address > MAX_I2C_ADDRESS {
                return Err(ConfigError::InvalidAddress(address));
            }
            if !addresses.insert(address) {
                return Err(ConfigError::DuplicateAddress(address));
            }
        }

        if let Some(sht31) = &self.sht31 {
            temperature_to_raw(sht31.temperature)
                .map_err(|_| ConfigError::OutOfRange("temperature"))?;
            humidity_to_raw(sht31.humidity).map_err(|_| ConfigError::OutOfRange("humidity"))?;
        }

        if let Some(sh1106) = &self.sh1106 {
            PixelBuffer::new(sh1106.width, sh1106.height)?;
        }

        Ok(())
    }

    fn i2c_addresses(&self) -> impl Iterator<Item = u8> + '_ {
        let sgp41 = self.sgp41.as_ref().map(|c| c.address);
        let sht31 = self.sht31.as_ref().map(|c| c.address);
        let sh1106 = self.sh1106.as_ref().map(|c| c.address);
        [sgp41, sht31, sh1106].into_iter().flatten()
    }
}

/// Log a summary of the loaded description
fn log_config_summary(config: &BoardConfig) {
    info!("Board description loaded");
    debug!("  {} uarts", config.uarts.len());
    if let Some(pms5003) = &config.pms5003 {
        debug!("  pms5003 on {}", pms5003.uart);
    }
    if let Some(s8lp) = &config.s8lp {
        debug!("  s8lp on {}", s8lp.uart);
    }
    for address in config.i2c_addresses() {
        debug!("  i2c device at {:#04x}", address);
    }
}

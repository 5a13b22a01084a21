//! Emulated air-quality sensors
//!
//! Each sensor speaks the same bytes as the real part so firmware drivers
//! can run unmodified against it:
//!
//! - PMS5003 particulate sensor (UART, sum-16 frames, sleep/active modes)
//! - Senseair S8 LP CO2 sensor (UART, Modbus with CRC-16)
//! - Sensirion SGP41 VOC/NOx sensor (I2C, CRC-8 word chunks)
//! - Sensirion SHT31 temperature/humidity sensor (I2C, CRC-8 word chunks)
//!
//! Physical quantities are injected through plain setters; they survive
//! resets, only transient buffers and modes do not.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod pms5003;
pub mod s8lp;
pub mod sgp41;
pub mod sht31;

pub use pms5003::Pms5003;
pub use s8lp::S8lp;
pub use sgp41::Sgp41;
pub use sht31::Sht31;

use mimic_protocol::{CommandRegistry, Pattern};

/// Build a device's command registry from its static table
///
/// A rejected table is logged and leaves the device with no commands.
pub(crate) fn command_registry<H: Copy, const N: usize>(
    table: &[(Pattern, H)],
) -> CommandRegistry<H, N> {
    match CommandRegistry::from_table(table) {
        Ok(registry) => registry,
        Err(err) => {
            error!("command table rejected: {:?}", err);
            CommandRegistry::new()
        }
    }
}

//! Raw/physical unit conversion
//!
//! Sensirion humidity sensors report 16-bit raw words that map linearly
//! onto a physical range:
//! - temperature °C = -45 + 175 * raw / 65535
//! - relative humidity % = 100 * raw / 65535
//!
//! Physical values are validated against the sensor's rated range before
//! conversion. Raw values are truncated, not rounded.

use core::ops::RangeInclusive;

/// Errors from injecting a physical quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Value outside the sensor's rated range (or not a number)
    OutOfRange,
}

/// Full scale of a raw word
const RAW_FULL_SCALE: f32 = 65535.0;

/// Rated temperature range (°C)
pub const TEMPERATURE_RANGE: RangeInclusive<f32> = -40.0..=85.0;

/// Rated humidity range (%RH)
pub const HUMIDITY_RANGE: RangeInclusive<f32> = 0.0..=100.0;

/// Convert °C to a raw temperature word
pub fn temperature_to_raw(celsius: f32) -> Result<u16, SensorError> {
    if !TEMPERATURE_RANGE.contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok((RAW_FULL_SCALE * (celsius + 45.0) / 175.0) as u16)
}

/// Convert a raw temperature word to °C
pub fn raw_to_temperature(raw: u16) -> f32 {
    -45.0 + 175.0 * raw as f32 / RAW_FULL_SCALE
}

/// Convert %RH to a raw humidity word
pub fn humidity_to_raw(percent: f32) -> Result<u16, SensorError> {
    if !HUMIDITY_RANGE.contains(&percent) {
        return Err(SensorError::OutOfRange);
    }
    Ok((RAW_FULL_SCALE * percent / 100.0) as u16)
}

/// Convert a raw humidity word to %RH
pub fn raw_to_humidity(raw: u16) -> f32 {
    100.0 * raw as f32 / RAW_FULL_SCALE
}

/// Clamp a wide value into a 16-bit register
pub fn clamp_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

/// Largest value a 48-bit serial number can hold
pub const SERIAL48_MAX: u64 = 0xFFFF_FFFF_FFFF;

/// Clamp a serial number into 48 bits
pub fn clamp_serial48(value: u64) -> u64 {
    value.min(SERIAL48_MAX)
}

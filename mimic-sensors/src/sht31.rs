//! Sensirion SHT31 temperature/humidity sensor (I2C)
//!
//! Measurement results are two CRC-8 chunks: raw temperature then raw
//! humidity. Single-shot commands are matched on their first byte only, so
//! every repeatability setting gives the same answer.

use heapless::Vec;
use mimic_core::config::Sht31Config;
use mimic_core::units::{
    clamp_u16, humidity_to_raw, raw_to_humidity, raw_to_temperature, temperature_to_raw,
};
use mimic_core::{MalformedKind, Outcome, Rejection, SensorError};
use mimic_hal::{I2cPeripheral, ReadBuffer, Resettable, MAX_READ_LEN};
use mimic_protocol::chunk::push_words;
use mimic_protocol::{CommandRegistry, Matcher, Pattern};

use crate::command_registry;

/// Command opcodes
pub mod cmd {
    /// Single shot, no clock stretching (second byte selects repeatability)
    pub const SINGLE_SHOT: u8 = 0x24;
    /// Single shot, clock stretching
    pub const SINGLE_SHOT_STRETCH: u8 = 0x2C;
    /// Fetch data (periodic mode)
    pub const FETCH_DATA: [u8; 2] = [0xE0, 0x00];
    /// Soft reset
    pub const SOFT_RESET: [u8; 2] = [0x30, 0xA2];
    /// Clear status register
    pub const CLEAR_STATUS: [u8; 2] = [0x30, 0x41];
    /// Read status register
    pub const READ_STATUS: [u8; 2] = [0xF3, 0x2D];
    /// Read serial number
    pub const READ_SERIAL: [u8; 2] = [0x37, 0x80];
}

/// Status register bits
pub mod status {
    /// System reset detected since last clear
    pub const RESET_DETECTED: u16 = 1 << 4;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    Measure,
    FetchData,
    SoftReset,
    ClearStatus,
    ReadStatus,
    ReadSerial,
}

const fn opcode(bytes: [u8; 2]) -> Pattern {
    Pattern::two(Matcher::exact(bytes[0]), Matcher::exact(bytes[1]))
}

const COMMANDS: [(Pattern, Opcode); 7] = [
    (Pattern::one(Matcher::exact(cmd::SINGLE_SHOT)), Opcode::Measure),
    (Pattern::one(Matcher::exact(cmd::SINGLE_SHOT_STRETCH)), Opcode::Measure),
    (opcode(cmd::FETCH_DATA), Opcode::FetchData),
    (opcode(cmd::SOFT_RESET), Opcode::SoftReset),
    (opcode(cmd::CLEAR_STATUS), Opcode::ClearStatus),
    (opcode(cmd::READ_STATUS), Opcode::ReadStatus),
    (opcode(cmd::READ_SERIAL), Opcode::ReadSerial),
];

/// Emulated SHT31
pub struct Sht31 {
    commands: CommandRegistry<Opcode, 7>,
    output: Vec<u8, MAX_READ_LEN>,
    status: u16,
    temperature_raw: u16,
    humidity_raw: u16,
    serial_number: u16,
}

impl Sht31 {
    /// Create a sensor from its configuration
    ///
    /// Fails if the initial temperature or humidity is out of range.
    pub fn new(config: &Sht31Config) -> Result<Self, SensorError> {
        Ok(Self {
            commands: command_registry(&COMMANDS),
            output: Vec::new(),
            status: status::RESET_DETECTED,
            temperature_raw: temperature_to_raw(config.temperature)?,
            humidity_raw: humidity_to_raw(config.humidity)?,
            serial_number: clamp_u16(config.serial_number),
        })
    }

    /// Temperature (°C)
    pub fn temperature(&self) -> f32 {
        raw_to_temperature(self.temperature_raw)
    }

    /// Set the temperature; must be within -40..=85 °C
    pub fn set_temperature(&mut self, celsius: f32) -> Result<(), SensorError> {
        self.temperature_raw = temperature_to_raw(celsius)?;
        Ok(())
    }

    /// Relative humidity (%)
    pub fn humidity(&self) -> f32 {
        raw_to_humidity(self.humidity_raw)
    }

    /// Set the relative humidity; must be within 0..=100 %
    pub fn set_humidity(&mut self, percent: f32) -> Result<(), SensorError> {
        self.humidity_raw = humidity_to_raw(percent)?;
        Ok(())
    }

    /// Raw temperature word as sent on the bus
    pub fn temperature_raw(&self) -> u16 {
        self.temperature_raw
    }

    /// Raw humidity word as sent on the bus
    pub fn humidity_raw(&self) -> u16 {
        self.humidity_raw
    }

    /// 16-bit serial number
    pub fn serial_number(&self) -> u16 {
        self.serial_number
    }

    /// Set the serial number, clamped to 16 bits
    pub fn set_serial_number(&mut self, serial: u32) {
        self.serial_number = clamp_u16(serial);
    }

    /// Status register
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.output.len()
    }

    /// Handle a write transaction
    pub fn handle_write(&mut self, data: &[u8]) -> Outcome {
        trace!("sht31: write {:?}", data);
        let outcome = Outcome::from(self.dispatch(data));
        if let Some(rejection) = outcome.rejection() {
            warn!("sht31: ignoring {:?}: {:?}", data, rejection);
        }
        outcome
    }

    fn dispatch(&mut self, data: &[u8]) -> Result<(), Rejection> {
        let opcode = self
            .commands
            .lookup(data)
            .ok_or(Rejection::UnknownCommand)?;

        match opcode {
            Opcode::Measure | Opcode::FetchData => {
                self.respond(&[self.temperature_raw, self.humidity_raw])
            }
            Opcode::SoftReset => {
                self.reset();
                Ok(())
            }
            Opcode::ClearStatus => {
                debug!("sht31: status cleared");
                self.status = 0;
                Ok(())
            }
            Opcode::ReadStatus => self.respond(&[self.status]),
            Opcode::ReadSerial => self.respond(&[self.serial_number]),
        }
    }

    fn respond(&mut self, words: &[u16]) -> Result<(), Rejection> {
        push_words(&mut self.output, words)
            .map_err(|_| Rejection::Malformed(MalformedKind::Overflow))
    }
}

impl I2cPeripheral for Sht31 {
    fn write(&mut self, data: &[u8]) {
        self.handle_write(data);
    }

    fn read(&mut self, _count: usize) -> ReadBuffer {
        trace!("sht31: read {} bytes", self.output.len());
        core::mem::take(&mut self.output)
    }
}

impl Resettable for Sht31 {
    fn reset(&mut self) {
        debug!("sht31: reset");
        self.output.clear();
        self.status = status::RESET_DETECTED;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_protocol::crc8;
    use proptest::prelude::*;

    fn sensor() -> Sht31 {
        Sht31::new(&Sht31Config::default()).unwrap()
    }

    #[test]
    fn test_command_table_is_valid() {
        let registry: Result<CommandRegistry<Opcode, 7>, _> = CommandRegistry::from_table(&COMMANDS);
        assert!(registry.is_ok());
    }

    #[test]
    fn test_single_shot_any_repeatability() {
        let mut sensor = sensor();
        sensor.set_temperature(25.0).unwrap();
        sensor.set_humidity(50.0).unwrap();

        for repeatability in [0x00, 0x0B, 0x16] {
            assert_eq!(sensor.handle_write(&[cmd::SINGLE_SHOT, repeatability]), Outcome::Handled);
            assert_eq!(
                &sensor.read(6)[..],
                &[0x66, 0x66, 0x93, 0x7F, 0xFF, 0x8F]
            );
        }

        sensor.handle_write(&[cmd::SINGLE_SHOT_STRETCH, 0x06]);
        assert_eq!(sensor.pending(), 6);
    }

    #[test]
    fn test_fetch_data() {
        let mut sensor = sensor();
        sensor.set_temperature(-40.0).unwrap();
        sensor.handle_write(&cmd::FETCH_DATA);

        let data = sensor.read(6);
        let raw = u16::from_be_bytes([data[0], data[1]]);
        assert_eq!(raw, sensor.temperature_raw());
        assert_eq!(data[2], crc8(&[data[0], data[1]]));
    }

    #[test]
    fn test_out_of_range_rejected_and_kept() {
        let mut sensor = sensor();
        sensor.set_temperature(30.0).unwrap();
        let raw = sensor.temperature_raw();

        assert_eq!(sensor.set_temperature(85.5), Err(SensorError::OutOfRange));
        assert_eq!(sensor.set_temperature(-41.0), Err(SensorError::OutOfRange));
        assert_eq!(sensor.set_humidity(101.0), Err(SensorError::OutOfRange));
        assert_eq!(sensor.set_humidity(-1.0), Err(SensorError::OutOfRange));
        assert_eq!(sensor.temperature_raw(), raw);
    }

    #[test]
    fn test_bad_initial_config() {
        let config = Sht31Config {
            humidity: 120.0,
            ..Default::default()
        };
        assert!(matches!(Sht31::new(&config), Err(SensorError::OutOfRange)));
    }

    #[test]
    fn test_status_reset_bit() {
        let mut sensor = sensor();
        sensor.handle_write(&cmd::READ_STATUS);
        assert_eq!(&sensor.read(3)[..2], &[0x00, 0x10]);

        sensor.handle_write(&cmd::CLEAR_STATUS);
        sensor.handle_write(&cmd::READ_STATUS);
        assert_eq!(&sensor.read(3)[..], &[0x00, 0x00, 0x81]);

        sensor.handle_write(&cmd::SOFT_RESET);
        assert_eq!(sensor.status(), status::RESET_DETECTED);
    }

    #[test]
    fn test_serial_number_single_chunk() {
        let mut sensor = sensor();
        sensor.set_serial_number(0x1_BEEF);
        assert_eq!(sensor.serial_number(), 0xFFFF);

        sensor.set_serial_number(0xBEEF);
        sensor.handle_write(&cmd::READ_SERIAL);
        assert_eq!(&sensor.read(3)[..], &[0xBE, 0xEF, 0x92]);
    }

    #[test]
    fn test_soft_reset_keeps_values() {
        let mut sensor = sensor();
        sensor.set_humidity(40.0).unwrap();
        sensor.handle_write(&cmd::FETCH_DATA);
        sensor.handle_write(&cmd::SOFT_RESET);

        assert_eq!(sensor.pending(), 0);
        assert!((sensor.humidity() - 40.0).abs() < 0.01);
    }

    #[test]
    fn test_unknown_command() {
        let mut sensor = sensor();
        assert_eq!(
            sensor.handle_write(&[0x30, 0x00]),
            Outcome::Rejected(Rejection::UnknownCommand)
        );
        assert_eq!(sensor.pending(), 0);
    }

    proptest! {
        #[test]
        fn prop_setter_round_trip(celsius in -40.0f32..=85.0, percent in 0.0f32..=100.0) {
            let mut sensor = sensor();
            sensor.set_temperature(celsius).unwrap();
            sensor.set_humidity(percent).unwrap();
            prop_assert!((sensor.temperature() - celsius).abs() <= 0.01);
            prop_assert!((sensor.humidity() - percent).abs() <= 0.01);
        }
    }
}

//! Sensirion SGP41 VOC/NOx sensor (I2C)
//!
//! Commands are 2-byte opcodes, optionally followed by argument words in
//! CRC-8 chunks (relative humidity and temperature compensation). Results
//! are queued as CRC-8 chunks and handed out on the next read.

use heapless::Vec;
use mimic_core::config::Sgp41Config;
use mimic_core::units::{clamp_serial48, clamp_u16};
use mimic_core::{MalformedKind, Outcome, Rejection};
use mimic_hal::{I2cPeripheral, ReadBuffer, Resettable, MAX_READ_LEN};
use mimic_protocol::chunk::{decode_words, push_words};
use mimic_protocol::{CommandRegistry, Matcher, Pattern};

use crate::command_registry;

/// Command opcodes
pub mod cmd {
    pub const SOFT_RESET: [u8; 2] = [0x00, 0x06];
    pub const EXECUTE_CONDITIONING: [u8; 2] = [0x26, 0x12];
    pub const MEASURE_RAW_SIGNALS: [u8; 2] = [0x26, 0x19];
    pub const EXECUTE_SELF_TEST: [u8; 2] = [0x28, 0x0E];
    pub const TURN_HEATER_OFF: [u8; 2] = [0x36, 0x15];
    pub const GET_SERIAL_NUMBER: [u8; 2] = [0x36, 0x82];
}

/// Most argument words any command takes
const MAX_ARGS: usize = 2;

/// Self test result word; zero means every check passed
const SELF_TEST_PASSED: u16 = 0x0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    SoftReset,
    ExecuteConditioning,
    MeasureRawSignals,
    ExecuteSelfTest,
    TurnHeaterOff,
    GetSerialNumber,
}

const fn opcode(bytes: [u8; 2]) -> Pattern {
    Pattern::two(Matcher::exact(bytes[0]), Matcher::exact(bytes[1]))
}

const COMMANDS: [(Pattern, Opcode); 6] = [
    (opcode(cmd::SOFT_RESET), Opcode::SoftReset),
    (opcode(cmd::EXECUTE_CONDITIONING), Opcode::ExecuteConditioning),
    (opcode(cmd::MEASURE_RAW_SIGNALS), Opcode::MeasureRawSignals),
    (opcode(cmd::EXECUTE_SELF_TEST), Opcode::ExecuteSelfTest),
    (opcode(cmd::TURN_HEATER_OFF), Opcode::TurnHeaterOff),
    (opcode(cmd::GET_SERIAL_NUMBER), Opcode::GetSerialNumber),
];

/// Emulated SGP41
pub struct Sgp41 {
    commands: CommandRegistry<Opcode, 6>,
    output: Vec<u8, MAX_READ_LEN>,
    voc_ticks: u16,
    nox_ticks: u16,
    serial_number: u64,
}

impl Sgp41 {
    /// Create a sensor with an empty output buffer
    pub fn new(config: &Sgp41Config) -> Self {
        Self {
            commands: command_registry(&COMMANDS),
            output: Vec::new(),
            voc_ticks: clamp_u16(config.voc_ticks),
            nox_ticks: clamp_u16(config.nox_ticks),
            serial_number: clamp_serial48(config.serial_number),
        }
    }

    /// Raw VOC signal
    pub fn voc_ticks(&self) -> u16 {
        self.voc_ticks
    }

    /// Set the raw VOC signal, clamped to 16 bits
    pub fn set_voc_ticks(&mut self, ticks: u32) {
        self.voc_ticks = clamp_u16(ticks);
    }

    /// Raw NOx signal
    pub fn nox_ticks(&self) -> u16 {
        self.nox_ticks
    }

    /// Set the raw NOx signal, clamped to 16 bits
    pub fn set_nox_ticks(&mut self, ticks: u32) {
        self.nox_ticks = clamp_u16(ticks);
    }

    /// 48-bit serial number
    pub fn serial_number(&self) -> u64 {
        self.serial_number
    }

    /// Set the serial number, clamped to 48 bits
    pub fn set_serial_number(&mut self, serial: u64) {
        self.serial_number = clamp_serial48(serial);
    }

    /// Bytes waiting to be read
    pub fn pending(&self) -> usize {
        self.output.len()
    }

    /// Handle a write transaction
    pub fn handle_write(&mut self, data: &[u8]) -> Outcome {
        trace!("sgp41: write {:?}", data);
        let outcome = Outcome::from(self.dispatch(data));
        if let Some(rejection) = outcome.rejection() {
            warn!("sgp41: ignoring {:?}: {:?}", data, rejection);
        }
        outcome
    }

    fn dispatch(&mut self, data: &[u8]) -> Result<(), Rejection> {
        let opcode = self
            .commands
            .lookup(data)
            .ok_or(Rejection::UnknownCommand)?;
        let args: Vec<u16, MAX_ARGS> = decode_words(&data[2..])?;

        match opcode {
            Opcode::SoftReset => {
                debug!("sgp41: soft reset");
                self.output.clear();
                Ok(())
            }
            Opcode::ExecuteConditioning => {
                trace!("sgp41: conditioning, compensation {:?}", &args[..]);
                self.respond(&[0x0000])
            }
            Opcode::MeasureRawSignals => {
                trace!("sgp41: measure, compensation {:?}", &args[..]);
                self.respond(&[self.voc_ticks, self.nox_ticks])
            }
            Opcode::ExecuteSelfTest => self.respond(&[SELF_TEST_PASSED]),
            Opcode::TurnHeaterOff => {
                debug!("sgp41: heater off, idle");
                Ok(())
            }
            Opcode::GetSerialNumber => {
                let serial = self.serial_number;
                self.respond(&[(serial >> 32) as u16, (serial >> 16) as u16, serial as u16])
            }
        }
    }

    fn respond(&mut self, words: &[u16]) -> Result<(), Rejection> {
        push_words(&mut self.output, words)
            .map_err(|_| Rejection::Malformed(MalformedKind::Overflow))
    }
}

impl I2cPeripheral for Sgp41 {
    fn write(&mut self, data: &[u8]) {
        self.handle_write(data);
    }

    fn read(&mut self, _count: usize) -> ReadBuffer {
        trace!("sgp41: read {} bytes", self.output.len());
        core::mem::take(&mut self.output)
    }
}

impl Resettable for Sgp41 {
    fn reset(&mut self) {
        debug!("sgp41: reset");
        self.output.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_protocol::chunk::encode_word;
    use mimic_protocol::crc8;
    use proptest::prelude::*;

    fn sensor() -> Sgp41 {
        Sgp41::new(&Sgp41Config::default())
    }

    #[test]
    fn test_command_table_is_valid() {
        let registry: Result<CommandRegistry<Opcode, 6>, _> = CommandRegistry::from_table(&COMMANDS);
        assert!(registry.is_ok());
    }

    #[test]
    fn test_serial_number_three_chunks() {
        let mut sensor = sensor();
        assert_eq!(sensor.handle_write(&cmd::GET_SERIAL_NUMBER), Outcome::Handled);

        let data = sensor.read(9);
        assert_eq!(data.len(), 9);
        assert_eq!(&data[0..2], &[0xAA, 0xBB]);
        assert_eq!(data[2], 0xC5);
        assert_eq!(&data[3..5], &[0xCC, 0xDD]);
        assert_eq!(data[5], 0xD7);
        assert_eq!(&data[6..8], &[0xEE, 0xFF]);
        assert_eq!(data[8], crc8(&[0xEE, 0xFF]));
    }

    #[test]
    fn test_read_drains_buffer() {
        let mut sensor = sensor();
        sensor.handle_write(&cmd::EXECUTE_SELF_TEST);
        assert_eq!(&sensor.read(3)[..], &[0x00, 0x00, 0x81]);
        assert!(sensor.read(3).is_empty());
    }

    #[test]
    fn test_measure_with_compensation() {
        let mut sensor = sensor();
        sensor.set_voc_ticks(0x6666);
        sensor.set_nox_ticks(0x7FFF);

        let mut write = cmd::MEASURE_RAW_SIGNALS.to_vec();
        write.extend_from_slice(&encode_word(0x8000));
        write.extend_from_slice(&encode_word(0x6666));
        assert_eq!(sensor.handle_write(&write), Outcome::Handled);

        assert_eq!(&sensor.read(6)[..], &[0x66, 0x66, 0x93, 0x7F, 0xFF, 0x8F]);
    }

    #[test]
    fn test_bad_argument_crc_rejected() {
        let mut sensor = sensor();
        let write = [0x26, 0x12, 0x80, 0x00, 0xA3, 0x66, 0x66, 0x93];
        assert_eq!(
            sensor.handle_write(&write),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadChecksum))
        );
        assert_eq!(sensor.pending(), 0);
    }

    #[test]
    fn test_partial_argument_rejected() {
        let mut sensor = sensor();
        assert_eq!(
            sensor.handle_write(&[0x26, 0x12, 0x80, 0x00]),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadLength))
        );
    }

    #[test]
    fn test_conditioning_and_heater_off() {
        let mut sensor = sensor();
        sensor.handle_write(&cmd::EXECUTE_CONDITIONING);
        assert_eq!(sensor.pending(), 3);
        sensor.read(3);

        assert_eq!(sensor.handle_write(&cmd::TURN_HEATER_OFF), Outcome::Handled);
        assert_eq!(sensor.pending(), 0);
    }

    #[test]
    fn test_unknown_command() {
        let mut sensor = sensor();
        assert_eq!(
            sensor.handle_write(&[0x26, 0x13]),
            Outcome::Rejected(Rejection::UnknownCommand)
        );
        assert_eq!(
            sensor.handle_write(&[0x26]),
            Outcome::Rejected(Rejection::UnknownCommand)
        );
    }

    #[test]
    fn test_soft_reset_clears_output_keeps_values() {
        let mut sensor = sensor();
        sensor.set_voc_ticks(100);
        sensor.handle_write(&cmd::MEASURE_RAW_SIGNALS);
        sensor.handle_write(&cmd::SOFT_RESET);

        assert_eq!(sensor.pending(), 0);
        assert_eq!(sensor.voc_ticks(), 100);
    }

    #[test]
    fn test_full_output_rejects_response() {
        let mut sensor = sensor();
        // 3 serial reads fill 27 of 32 bytes; a fourth does not fit
        for _ in 0..3 {
            sensor.handle_write(&cmd::GET_SERIAL_NUMBER);
        }
        assert_eq!(
            sensor.handle_write(&cmd::GET_SERIAL_NUMBER),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::Overflow))
        );
        assert_eq!(sensor.pending(), 27);
    }

    #[test]
    fn test_value_clamps() {
        let mut sensor = sensor();
        sensor.set_serial_number(u64::MAX);
        assert_eq!(sensor.serial_number(), 0xFFFF_FFFF_FFFF);
        sensor.set_nox_ticks(u32::MAX);
        assert_eq!(sensor.nox_ticks(), 0xFFFF);
    }

    proptest! {
        #[test]
        fn prop_every_chunk_carries_its_crc(voc in any::<u16>(), nox in any::<u16>()) {
            let mut sensor = sensor();
            sensor.set_voc_ticks(voc as u32);
            sensor.set_nox_ticks(nox as u32);
            sensor.handle_write(&cmd::MEASURE_RAW_SIGNALS);

            let data = sensor.read(6);
            prop_assert_eq!(data.len(), 6);
            for chunk in data.chunks(3) {
                prop_assert_eq!(chunk[2], crc8(&[chunk[0], chunk[1]]));
            }
            prop_assert!(sensor.read(6).is_empty());
        }
    }
}

//! Senseair S8 LP CO2 sensor (UART, Modbus)
//!
//! Firmware polls the sensor with an 8-byte "read input registers" request
//! (`FE 04 <start> <count> <crc lo> <crc hi>`). The emulation answers every
//! well-headed request with the CO2 register:
//!
//! ```text
//! FE 04 02 <co2 hi> <co2 lo> <crc lo> <crc hi>
//! ```
//!
//! The CRC-16/MODBUS trailer is the one little-endian field in any of the
//! emulated protocols.

use heapless::Deque;
use mimic_core::config::S8lpConfig;
use mimic_core::units::clamp_u16;
use mimic_core::{MalformedKind, Outcome, Rejection};
use mimic_hal::{Resettable, UartConfig, UartDevice};
use mimic_protocol::{FrameAssembler, FrameError, FrameTemplate, LengthField, Trailer};

/// Modbus address + function code (any address, read input registers)
pub const HEADER: [u8; 2] = [0xFE, 0x04];

/// Request frame length
pub const REQUEST_LEN: usize = 8;

/// Response frame length
pub const RESPONSE_LEN: usize = 7;

/// Outbound queue depth
pub const OUTPUT_QUEUE_SIZE: usize = 32;

const RESPONSE: FrameTemplate =
    FrameTemplate::new(&HEADER, LengthField::PayloadU8, Trailer::Crc16Modbus);

/// Emulated S8 LP
pub struct S8lp {
    rx: FrameAssembler<REQUEST_LEN>,
    tx: Deque<u8, OUTPUT_QUEUE_SIZE>,
    co2: u16,
}

impl S8lp {
    /// Create a sensor with an empty line
    pub fn new(config: &S8lpConfig) -> Self {
        Self {
            rx: FrameAssembler::new(&HEADER),
            tx: Deque::new(),
            co2: clamp_u16(config.co2),
        }
    }

    /// CO2 concentration (ppm)
    pub fn co2(&self) -> u16 {
        self.co2
    }

    /// Set the CO2 concentration, clamped to 16 bits
    pub fn set_co2(&mut self, ppm: u32) {
        self.co2 = clamp_u16(ppm);
    }

    /// Feed one byte from the line
    pub fn feed(&mut self, byte: u8) -> Outcome {
        if self.rx.push(byte).is_err() {
            warn!("s8lp: receive queue full, dropping {:#x}", byte);
        }

        match self.rx.next_frame() {
            Ok(frame) => {
                trace!("s8lp: request {:?}", frame);
                let outcome = Outcome::from(self.send_reading());
                if let Some(rejection) = outcome.rejection() {
                    warn!("s8lp: request dropped: {:?}", rejection);
                }
                outcome
            }
            Err(FrameError::Incomplete) => Outcome::Pending,
            Err(err) => {
                warn!("s8lp: discarding request: {:?}", err);
                Outcome::Rejected(Rejection::from(err))
            }
        }
    }

    fn send_reading(&mut self) -> Result<(), Rejection> {
        let frame = RESPONSE.encode(&self.co2.to_be_bytes())?;
        if self.tx.capacity() - self.tx.len() < frame.len() {
            warn!("s8lp: output queue full");
            return Err(Rejection::Malformed(MalformedKind::Overflow));
        }

        trace!("s8lp: sending {:?}", &frame[..]);
        for &byte in frame.iter() {
            let _ = self.tx.push_back(byte);
        }
        Ok(())
    }
}

impl UartDevice for S8lp {
    fn receive_byte(&mut self, byte: u8) {
        self.feed(byte);
    }

    fn transmit_byte(&mut self) -> Option<u8> {
        self.tx.pop_front()
    }

    fn line_config(&self) -> UartConfig {
        UartConfig::FIXED_RATE
    }

    fn pending(&self) -> usize {
        self.tx.len()
    }
}

impl Resettable for S8lp {
    fn reset(&mut self) {
        debug!("s8lp: reset");
        self.rx.clear();
        self.tx.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Read IR4 (space CO2), as sent by real firmware
    const READ_CO2: [u8; 8] = [0xFE, 0x04, 0x00, 0x03, 0x00, 0x01, 0xD5, 0xC5];

    fn send(sensor: &mut S8lp, frame: &[u8]) -> Outcome {
        frame
            .iter()
            .fold(Outcome::Pending, |_, &byte| sensor.feed(byte))
    }

    fn drain(sensor: &mut S8lp) -> Vec<u8> {
        core::iter::from_fn(|| sensor.transmit_byte()).collect()
    }

    #[test]
    fn test_zero_reading() {
        let mut sensor = S8lp::new(&S8lpConfig::default());
        assert_eq!(send(&mut sensor, &READ_CO2), Outcome::Handled);
        assert_eq!(
            drain(&mut sensor),
            vec![0xFE, 0x04, 0x02, 0x00, 0x00, 0xAD, 0x24]
        );
    }

    #[test]
    fn test_reading_420_ppm() {
        let mut sensor = S8lp::new(&S8lpConfig::default());
        sensor.set_co2(420);
        send(&mut sensor, &READ_CO2);
        assert_eq!(
            drain(&mut sensor),
            vec![0xFE, 0x04, 0x02, 0x01, 0xA4, 0xAD, 0x0F]
        );
    }

    #[test]
    fn test_co2_clamped() {
        let mut sensor = S8lp::new(&S8lpConfig {
            co2: 100_000,
            ..Default::default()
        });
        assert_eq!(sensor.co2(), 0xFFFF);
        sensor.set_co2(800);
        assert_eq!(sensor.co2(), 800);
    }

    #[test]
    fn test_bad_header_silent() {
        let mut sensor = S8lp::new(&S8lpConfig::default());
        assert_eq!(
            send(&mut sensor, &[0xFE, 0x03, 0x00, 0x03, 0x00, 0x01, 0x00, 0x00]),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadHeader))
        );
        assert_eq!(sensor.pending(), 0);
    }

    #[test]
    fn test_short_request_pending() {
        let mut sensor = S8lp::new(&S8lpConfig::default());
        assert_eq!(send(&mut sensor, &READ_CO2[..7]), Outcome::Pending);
        assert_eq!(sensor.pending(), 0);
    }

    #[test]
    fn test_reset_drops_partial_request() {
        let mut sensor = S8lp::new(&S8lpConfig::default());
        sensor.set_co2(600);
        send(&mut sensor, &READ_CO2[..4]);
        sensor.reset();

        assert_eq!(send(&mut sensor, &READ_CO2), Outcome::Handled);
        assert_eq!(sensor.pending(), RESPONSE_LEN);
        assert_eq!(sensor.co2(), 600);
    }

    #[test]
    fn test_line_config() {
        let sensor = S8lp::new(&S8lpConfig::default());
        assert_eq!(sensor.line_config(), UartConfig::FIXED_RATE);
    }
}

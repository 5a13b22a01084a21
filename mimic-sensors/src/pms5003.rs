//! Plantower PMS5003 particulate sensor (UART)
//!
//! # Protocol
//!
//! Requests are 7 bytes: `42 4D CMD DATAH DATAL CHKH CHKL`.
//! - `E4`: sleep (`DATAL == 0`) or wake
//! - `E1`: passive (`DATAL == 0`) or active output mode
//! - `E2`: read one sample in passive mode
//!
//! Mode changes and sleep are acknowledged with an 8-byte frame. Readings
//! are 32-byte frames whose length field counts the whole frame, a quirk
//! of the part. Both carry a big-endian sum-16 trailer.
//!
//! In active mode a reading is pushed every `period_ticks` host ticks.
//! Waking never acknowledges; the very first wake pushes one reading
//! immediately.

use heapless::Deque;
use mimic_core::config::Pms5003Config;
use mimic_core::state::{Ack, Effects, OutputMode, ParticleCommand, ParticleState, Power};
use mimic_core::units::clamp_u16;
use mimic_core::{MalformedKind, Outcome, Rejection};
use mimic_hal::{Clocked, LimitTimer, Resettable, UartConfig, UartDevice};
use mimic_protocol::{
    CommandRegistry, FrameAssembler, FrameError, FrameTemplate, LengthField, Matcher, Pattern,
    Trailer,
};

use crate::command_registry;

/// Frame magic
pub const HEADER: [u8; 2] = [0x42, 0x4D];

/// Request frame length
pub const REQUEST_LEN: usize = 7;

/// Complete reading frame length
pub const DATA_FRAME_LEN: usize = 32;

/// Outbound queue depth (a few frames)
pub const OUTPUT_QUEUE_SIZE: usize = 128;

/// Command opcodes (request byte 2)
pub mod cmd {
    /// Change output mode
    pub const CHANGE_MODE: u8 = 0xE1;
    /// Passive read
    pub const READ: u8 = 0xE2;
    /// Sleep/wake
    pub const SLEEP: u8 = 0xE4;
}

/// Mode change and sleep acknowledgements
const ACK_FRAME: FrameTemplate =
    FrameTemplate::new(&HEADER, LengthField::PayloadAndTrailerU16, Trailer::Sum16);

/// Readings
const DATA_FRAME: FrameTemplate =
    FrameTemplate::new(&HEADER, LengthField::FrameTotalU16, Trailer::Sum16);

/// Payload bytes of a reading (between length field and trailer)
const DATA_PAYLOAD_LEN: usize = DATA_FRAME_LEN - 6;

/// PM2.5 (atmospheric) position within the reading payload (frame bytes 12-13)
const PM2_5_OFFSET: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Opcode {
    Sleep,
    ChangeMode,
    Read,
}

const COMMANDS: [(Pattern, Opcode); 3] = [
    (Pattern::one(Matcher::exact(cmd::SLEEP)), Opcode::Sleep),
    (Pattern::one(Matcher::exact(cmd::CHANGE_MODE)), Opcode::ChangeMode),
    (Pattern::one(Matcher::exact(cmd::READ)), Opcode::Read),
];

/// Emulated PMS5003
pub struct Pms5003 {
    rx: FrameAssembler<REQUEST_LEN>,
    tx: Deque<u8, OUTPUT_QUEUE_SIZE>,
    commands: CommandRegistry<Opcode, 3>,
    state: ParticleState,
    timer: LimitTimer,
    pm2_5: u16,
}

impl Pms5003 {
    /// Create a sensor in its power-on state
    pub fn new(config: &Pms5003Config) -> Self {
        Self {
            rx: FrameAssembler::new(&HEADER),
            tx: Deque::new(),
            commands: command_registry(&COMMANDS),
            state: ParticleState::new(),
            timer: LimitTimer::new(config.period_ticks),
            pm2_5: clamp_u16(config.pm2_5),
        }
    }

    /// PM2.5 concentration (µg/m³)
    pub fn pm2_5(&self) -> u16 {
        self.pm2_5
    }

    /// Set the PM2.5 concentration, clamped to 16 bits
    pub fn set_pm2_5(&mut self, value: u32) {
        self.pm2_5 = clamp_u16(value);
    }

    /// Mode state
    pub fn state(&self) -> &ParticleState {
        &self.state
    }

    /// Active-mode output timer
    pub fn timer(&self) -> &LimitTimer {
        &self.timer
    }

    /// Feed one byte from the line
    ///
    /// Dispatches a request once seven bytes are buffered.
    pub fn feed(&mut self, byte: u8) -> Outcome {
        if self.rx.push(byte).is_err() {
            warn!("pms5003: receive queue full, dropping {:#x}", byte);
        }

        let frame = match self.rx.next_frame() {
            Ok(frame) => frame,
            Err(FrameError::Incomplete) => return Outcome::Pending,
            Err(err) => {
                warn!("pms5003: discarding request: {:?}", err);
                return Outcome::Rejected(Rejection::from(err));
            }
        };

        trace!("pms5003: request {:?}", frame);
        let outcome = Outcome::from(self.dispatch(&frame));
        if let Some(rejection) = outcome.rejection() {
            warn!("pms5003: command {:#x} rejected: {:?}", frame[2], rejection);
        }
        outcome
    }

    fn dispatch(&mut self, frame: &[u8; REQUEST_LEN]) -> Result<(), Rejection> {
        let opcode = self
            .commands
            .lookup(&frame[2..])
            .ok_or(Rejection::UnknownCommand)?;
        let data = frame[4];

        let command = match opcode {
            Opcode::Sleep if data == 0 => ParticleCommand::SetPower(Power::Sleep),
            Opcode::Sleep => ParticleCommand::SetPower(Power::Wake),
            Opcode::ChangeMode if data == 0 => ParticleCommand::SetMode(OutputMode::Passive),
            Opcode::ChangeMode => ParticleCommand::SetMode(OutputMode::Active),
            Opcode::Read => ParticleCommand::ReadPassive,
        };

        let effects = self.state.handle(command)?;
        self.apply(effects)
    }

    fn apply(&mut self, effects: Effects) -> Result<(), Rejection> {
        if let Some(enabled) = effects.timer {
            debug!(
                "pms5003: {:?}+{:?}, output timer {}",
                self.state.power(),
                self.state.mode(),
                enabled
            );
            self.timer.set_enabled(enabled);
        }
        if let Some(ack) = effects.ack {
            self.send_ack(ack)?;
        }
        if effects.send_reading {
            self.send_reading()?;
        }
        Ok(())
    }

    fn send_ack(&mut self, ack: Ack) -> Result<(), Rejection> {
        let payload = match ack {
            Ack::Sleep => [cmd::SLEEP, 0x00],
            Ack::Passive => [cmd::CHANGE_MODE, 0x00],
            Ack::Active => [cmd::CHANGE_MODE, 0x01],
        };
        let frame = ACK_FRAME.encode(&payload)?;
        self.transmit(&frame)
    }

    fn send_reading(&mut self) -> Result<(), Rejection> {
        let mut payload = [0u8; DATA_PAYLOAD_LEN];
        payload[PM2_5_OFFSET..PM2_5_OFFSET + 2].copy_from_slice(&self.pm2_5.to_be_bytes());
        let frame = DATA_FRAME.encode(&payload)?;
        self.transmit(&frame)
    }

    fn transmit(&mut self, frame: &[u8]) -> Result<(), Rejection> {
        if self.tx.capacity() - self.tx.len() < frame.len() {
            warn!("pms5003: output queue full, dropping {} byte frame", frame.len());
            return Err(Rejection::Malformed(MalformedKind::Overflow));
        }
        trace!("pms5003: sending {:?}", frame);
        for &byte in frame {
            // Room was checked above
            let _ = self.tx.push_back(byte);
        }
        Ok(())
    }
}

impl UartDevice for Pms5003 {
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

impl Clocked for Pms5003 {
    fn tick(&mut self, ticks: u32) {
        let fired = self.timer.advance(ticks);
        for _ in 0..fired {
            if !self.state.is_streaming() {
                break;
            }
            trace!("pms5003: output timer fired");
            if self.send_reading().is_err() {
                break;
            }
        }
    }
}

impl Resettable for Pms5003 {
    fn reset(&mut self) {
        debug!("pms5003: reset");
        self.rx.clear();
        self.tx.clear();
        self.state.reset();
        self.timer.reset();
    }
}

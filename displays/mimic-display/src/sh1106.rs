//! SH1106 OLED controller (I2C)
//!
//! Every write starts with a control byte selecting the command or data
//! register. Command writes carry:
//! - 1 byte: a single command, matched on its high bits (page, column,
//!   on/off, ...)
//! - 2 bytes: a command with one argument (contrast, multiplex, ...)
//! - 3 bytes: page address plus both column nibbles in one go
//!
//! Data writes fill a whole page row: one byte per column. A page address
//! must be latched first and each data write consumes the latch.
//!
//! The controller is write-only; reads return nothing.

use mimic_core::config::Sh1106Config;
use mimic_core::state::{DisplayCommand, DisplayState};
use mimic_core::{MalformedKind, Outcome, Rejection};
use mimic_hal::{I2cPeripheral, ReadBuffer, Resettable};
use mimic_protocol::{CommandRegistry, Matcher, Pattern};

use crate::framebuffer::{GeometryError, PixelBuffer};

/// Control byte values
pub mod control {
    /// Following bytes are commands
    pub const COMMAND: u8 = 0x00;
    /// Following bytes are display data
    pub const DATA: u8 = 0x40;
}

/// SH1106 commands
pub mod cmd {
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_SEG_REMAP: u8 = 0xA0;
    pub const ENTIRE_DISPLAY_OFF: u8 = 0xA4;
    pub const ENTIRE_DISPLAY_ON: u8 = 0xA5;
    pub const SET_NORMAL: u8 = 0xA6;
    pub const SET_INVERSE: u8 = 0xA7;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_CHARGE_PUMP: u8 = 0xAD;
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_PAGE_ADDR: u8 = 0xB0;
    pub const SET_COM_SCAN_INC: u8 = 0xC0;
    pub const SET_COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_VCOM_DETECT: u8 = 0xDB;
}

/// Column address the SH1106 RAM starts at for a 128-pixel panel
const COLUMN_OFFSET: [u8; 2] = [0x02, 0x10];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Single {
    PageAddress,
    ColumnLow,
    ColumnHigh,
    Power,
    EntireOn,
    Inverse,
    SegmentRemap,
    ComScanDirection,
    StartLine,
}

/// Single-byte commands, argument bits masked off
const SINGLE_COMMANDS: [(Pattern, Single); 9] = [
    (Pattern::one(Matcher::masked(cmd::SET_PAGE_ADDR, 0xF0)), Single::PageAddress),
    (Pattern::one(Matcher::masked(cmd::SET_LOW_COLUMN, 0xF0)), Single::ColumnLow),
    (Pattern::one(Matcher::masked(cmd::SET_HIGH_COLUMN, 0xF0)), Single::ColumnHigh),
    (Pattern::one(Matcher::masked(cmd::DISPLAY_OFF, 0xFE)), Single::Power),
    (Pattern::one(Matcher::masked(cmd::ENTIRE_DISPLAY_OFF, 0xFE)), Single::EntireOn),
    (Pattern::one(Matcher::masked(cmd::SET_NORMAL, 0xFE)), Single::Inverse),
    (Pattern::one(Matcher::masked(cmd::SET_SEG_REMAP, 0xFE)), Single::SegmentRemap),
    (Pattern::one(Matcher::masked(cmd::SET_COM_SCAN_INC, 0xF7)), Single::ComScanDirection),
    (Pattern::one(Matcher::masked(cmd::SET_START_LINE, 0xC0)), Single::StartLine),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Setting {
    Contrast,
    Multiplex,
    DisplayOffset,
    ComPins,
    ClockDivide,
    PreCharge,
    VcomDeselect,
    ChargePump,
}

/// Commands taking one argument byte
const SETTINGS: [(Pattern, Setting); 8] = [
    (Pattern::one(Matcher::exact(cmd::SET_CONTRAST)), Setting::Contrast),
    (Pattern::one(Matcher::exact(cmd::SET_MUX_RATIO)), Setting::Multiplex),
    (Pattern::one(Matcher::exact(cmd::SET_DISPLAY_OFFSET)), Setting::DisplayOffset),
    (Pattern::one(Matcher::exact(cmd::SET_COM_PINS)), Setting::ComPins),
    (Pattern::one(Matcher::exact(cmd::SET_CLOCK_DIV)), Setting::ClockDivide),
    (Pattern::one(Matcher::exact(cmd::SET_PRECHARGE)), Setting::PreCharge),
    (Pattern::one(Matcher::exact(cmd::SET_VCOM_DETECT)), Setting::VcomDeselect),
    (Pattern::one(Matcher::exact(cmd::SET_CHARGE_PUMP)), Setting::ChargePump),
];

fn registry<H: Copy, const N: usize>(table: &[(Pattern, H)]) -> CommandRegistry<H, N> {
    match CommandRegistry::from_table(table) {
        Ok(registry) => registry,
        Err(err) => {
            error!("sh1106: command table rejected: {:?}", err);
            CommandRegistry::new()
        }
    }
}

/// Emulated SH1106
pub struct Sh1106 {
    singles: CommandRegistry<Single, 9>,
    settings: CommandRegistry<Setting, 8>,
    state: DisplayState,
    register: Option<u8>,
    buffer: PixelBuffer,
}

impl Sh1106 {
    /// Create a controller for a panel of the configured size
    pub fn new(config: &Sh1106Config) -> Result<Self, GeometryError> {
        Ok(Self {
            singles: registry(&SINGLE_COMMANDS),
            settings: registry(&SETTINGS),
            state: DisplayState::new(),
            register: None,
            buffer: PixelBuffer::new(config.width, config.height)?,
        })
    }

    /// Panel memory
    pub fn pixels(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Controller mode state
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Register selected by the current transaction
    pub fn register(&self) -> Option<u8> {
        self.register
    }

    /// Handle a write transaction
    pub fn handle_write(&mut self, data: &[u8]) -> Outcome {
        let result = match data {
            [control::COMMAND, command @ ..] if !command.is_empty() => {
                self.register = Some(control::COMMAND);
                self.write_command(command)
            }
            [control::DATA, columns @ ..] if !columns.is_empty() => {
                self.register = Some(control::DATA);
                self.write_data(columns)
            }
            _ => {
                error!("sh1106: invalid write {:?}", data);
                Err(Rejection::Malformed(if data.len() < 2 {
                    MalformedKind::BadLength
                } else {
                    MalformedKind::BadRegister
                }))
            }
        };

        let outcome = Outcome::from(result);
        if let Some(rejection) = outcome.rejection() {
            warn!("sh1106: write rejected: {:?}", rejection);
        }
        outcome
    }

    fn write_command(&mut self, command: &[u8]) -> Result<(), Rejection> {
        trace!("sh1106: command {:?}", command);
        match *command {
            [op] => self.single(op),
            [op, arg] => self.setting(op, arg),
            [page, low, high] if page & 0xF0 == cmd::SET_PAGE_ADDR => {
                if [low, high] != COLUMN_OFFSET {
                    warn!("sh1106: unsupported column address {:#x} {:#x}", low, high);
                }
                self.state
                    .handle(DisplayCommand::PageColumn { page, low, high })
            }
            _ => Err(Rejection::UnknownCommand),
        }
    }

    fn single(&mut self, op: u8) -> Result<(), Rejection> {
        let command = match self.singles.lookup(&[op]).ok_or(Rejection::UnknownCommand)? {
            Single::PageAddress => DisplayCommand::PageAddress(op & 0x0F),
            Single::ColumnLow => DisplayCommand::ColumnLow(op & 0x0F),
            Single::ColumnHigh => DisplayCommand::ColumnHigh(op & 0x0F),
            Single::Power => DisplayCommand::Power(op & 0x01 != 0),
            Single::EntireOn => DisplayCommand::EntireOn(op & 0x01 != 0),
            Single::Inverse => DisplayCommand::Inverse(op & 0x01 != 0),
            Single::SegmentRemap => DisplayCommand::SegmentRemap,
            Single::ComScanDirection => DisplayCommand::ComScanDirection,
            Single::StartLine => {
                let line = op & 0x3F;
                if line != 0 {
                    warn!("sh1106: unsupported start line {}", line);
                }
                DisplayCommand::StartLine(line)
            }
        };

        if let DisplayCommand::Power(on) = command {
            debug!("sh1106: display {}", if on { "on" } else { "off" });
        }
        self.state.handle(command)
    }

    fn setting(&mut self, op: u8, arg: u8) -> Result<(), Rejection> {
        let setting = self.settings.lookup(&[op]).ok_or(Rejection::UnknownCommand)?;
        match setting {
            Setting::Multiplex if arg as usize != self.buffer.height() - 1 => {
                warn!("sh1106: unsupported multiplex ratio {}", arg);
            }
            Setting::DisplayOffset if arg != 0 => {
                warn!("sh1106: unsupported display offset {}", arg);
            }
            _ => trace!("sh1106: {:?} = {:#x}", setting, arg),
        }
        Ok(())
    }

    fn write_data(&mut self, columns: &[u8]) -> Result<(), Rejection> {
        let page = self.state.begin_data_write()?;
        if columns.len() != self.buffer.width() {
            return Err(Rejection::Malformed(MalformedKind::BadLength));
        }

        trace!("sh1106: data page {}", page);
        if !self.buffer.write_page(page as usize, columns) {
            return Err(Rejection::Malformed(MalformedKind::BadAddress));
        }
        Ok(())
    }
}

impl I2cPeripheral for Sh1106 {
    fn write(&mut self, data: &[u8]) {
        self.handle_write(data);
    }

    fn read(&mut self, _count: usize) -> ReadBuffer {
        warn!("sh1106: reading is not supported");
        ReadBuffer::new()
    }

    fn finish_transmission(&mut self) {
        self.register = None;
    }
}

impl Resettable for Sh1106 {
    fn reset(&mut self) {
        debug!("sh1106: reset");
        self.state.reset();
        self.register = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{PIXEL_OFF, PIXEL_ON};
    use mimic_core::ModeGate;
    use proptest::prelude::*;

    const WIDTH: usize = 128;

    fn display() -> Sh1106 {
        Sh1106::new(&Sh1106Config::default()).unwrap()
    }

    fn command(display: &mut Sh1106, bytes: &[u8]) -> Outcome {
        let mut write = vec![control::COMMAND];
        write.extend_from_slice(bytes);
        display.handle_write(&write)
    }

    fn data(display: &mut Sh1106, columns: &[u8]) -> Outcome {
        let mut write = vec![control::DATA];
        write.extend_from_slice(columns);
        display.handle_write(&write)
    }

    fn all_dark(display: &Sh1106) -> bool {
        display.pixels().as_slice().iter().all(|&p| p == PIXEL_OFF)
    }

    #[test]
    fn test_command_tables_are_valid() {
        let singles: Result<CommandRegistry<Single, 9>, _> =
            CommandRegistry::from_table(&SINGLE_COMMANDS);
        let settings: Result<CommandRegistry<Setting, 8>, _> =
            CommandRegistry::from_table(&SETTINGS);
        assert!(singles.is_ok());
        assert!(settings.is_ok());
    }

    #[test]
    fn test_data_without_page_rejected() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);

        assert_eq!(
            data(&mut display, &[0xFF; WIDTH]),
            Outcome::Rejected(Rejection::IllegalInMode(ModeGate::MissingPage))
        );
        assert!(all_dark(&display));
    }

    #[test]
    fn test_data_wrong_length_rejected() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);
        command(&mut display, &[cmd::SET_PAGE_ADDR | 2]);

        assert_eq!(
            data(&mut display, &[0xFF; WIDTH - 1]),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadLength))
        );
        assert!(all_dark(&display));

        // The failed attempt consumed the latch
        assert_eq!(
            data(&mut display, &[0xFF; WIDTH]),
            Outcome::Rejected(Rejection::IllegalInMode(ModeGate::MissingPage))
        );
    }

    #[test]
    fn test_paged_write_sets_one_row_band() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);
        command(&mut display, &[cmd::SET_PAGE_ADDR | 3, 0x02, 0x10]);

        let mut columns = [0u8; WIDTH];
        columns[0] = 0b0000_0001;
        columns[127] = 0b1000_0000;
        assert_eq!(data(&mut display, &columns), Outcome::Handled);

        let pixels = display.pixels();
        assert_eq!(pixels.pixel(0, 24), Some(PIXEL_ON));
        assert_eq!(pixels.pixel(127, 31), Some(PIXEL_ON));
        assert_eq!(pixels.pixel(0, 25), Some(PIXEL_OFF));
        assert_eq!(
            pixels.as_slice().iter().filter(|&&p| p == PIXEL_ON).count(),
            2
        );
    }

    #[test]
    fn test_display_off_blocks_drawing() {
        let mut display = display();
        assert_eq!(
            command(&mut display, &[cmd::SET_PAGE_ADDR]),
            Outcome::Rejected(Rejection::IllegalInMode(ModeGate::DisplayOff))
        );

        // Compound page write latches even while off, the data is refused
        command(&mut display, &[cmd::SET_PAGE_ADDR, 0x02, 0x10]);
        assert_eq!(
            data(&mut display, &[0xFF; WIDTH]),
            Outcome::Rejected(Rejection::IllegalInMode(ModeGate::DisplayOff))
        );
        assert!(all_dark(&display));
    }

    #[test]
    fn test_single_command_decoding() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);
        command(&mut display, &[cmd::SET_INVERSE]);
        command(&mut display, &[cmd::ENTIRE_DISPLAY_ON]);
        command(&mut display, &[cmd::SET_LOW_COLUMN | 0x2]);
        command(&mut display, &[cmd::SET_HIGH_COLUMN | 0x1]);

        let state = display.state();
        assert!(state.is_on());
        assert!(state.is_inverted());
        assert!(state.is_entire_on());
        assert_eq!(state.column(), 0x12);

        assert_eq!(command(&mut display, &[cmd::SET_SEG_REMAP | 1]), Outcome::Handled);
        assert_eq!(command(&mut display, &[cmd::SET_COM_SCAN_DEC]), Outcome::Handled);
        assert_eq!(command(&mut display, &[cmd::SET_START_LINE | 4]), Outcome::Handled);
    }

    #[test]
    fn test_settings_accepted() {
        let mut display = display();
        for op in [
            cmd::SET_CONTRAST,
            cmd::SET_MUX_RATIO,
            cmd::SET_DISPLAY_OFFSET,
            cmd::SET_COM_PINS,
            cmd::SET_CLOCK_DIV,
            cmd::SET_PRECHARGE,
            cmd::SET_VCOM_DETECT,
            cmd::SET_CHARGE_PUMP,
        ] {
            assert_eq!(command(&mut display, &[op, 0x3F]), Outcome::Handled);
        }
        assert_eq!(
            command(&mut display, &[0x8D, 0x14]),
            Outcome::Rejected(Rejection::UnknownCommand)
        );
    }

    #[test]
    fn test_invalid_writes() {
        let mut display = display();
        assert_eq!(
            display.handle_write(&[control::COMMAND]),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadLength))
        );
        assert_eq!(
            display.handle_write(&[0x80, 0xAF]),
            Outcome::Rejected(Rejection::Malformed(MalformedKind::BadRegister))
        );
        assert_eq!(
            command(&mut display, &[0xB0, 0x02, 0x10, 0x00]),
            Outcome::Rejected(Rejection::UnknownCommand)
        );
    }

    #[test]
    fn test_read_unsupported_and_finish() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);
        assert_eq!(display.register(), Some(control::COMMAND));

        assert!(display.read(1).is_empty());
        display.finish_transmission();
        assert_eq!(display.register(), None);
    }

    #[test]
    fn test_reset_keeps_pixels() {
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_ON]);
        command(&mut display, &[cmd::SET_PAGE_ADDR]);
        data(&mut display, &[0xFF; WIDTH]);
        command(&mut display, &[cmd::SET_PAGE_ADDR | 1]);

        display.reset();
        assert_eq!(display.state(), &DisplayState::new());
        assert_eq!(display.pixels().pixel(5, 5), Some(PIXEL_ON));
    }

    #[test]
    fn test_firmware_flush_sequence() {
        // Per-page flush as done by SH1106 drivers: page, column low/high,
        // then a full row of data
        let mut display = display();
        command(&mut display, &[cmd::DISPLAY_OFF]);
        command(&mut display, &[cmd::SET_CLOCK_DIV, 0x80]);
        command(&mut display, &[cmd::SET_MUX_RATIO, 0x3F]);
        command(&mut display, &[cmd::DISPLAY_ON]);

        for page in 0..8u8 {
            command(&mut display, &[cmd::SET_PAGE_ADDR | page]);
            command(&mut display, &[cmd::SET_LOW_COLUMN | 2]);
            command(&mut display, &[cmd::SET_HIGH_COLUMN]);
            assert_eq!(data(&mut display, &[0xAA; WIDTH]), Outcome::Handled);
        }

        let pixels = display.pixels();
        assert!((0..64).all(|y| pixels.pixel(10, y)
            == Some(if y % 2 == 1 { PIXEL_ON } else { PIXEL_OFF })));
    }

    proptest! {
        #[test]
        fn prop_write_touches_only_its_page(page in 0u8..8, columns in proptest::collection::vec(any::<u8>(), WIDTH)) {
            let mut display = display();
            command(&mut display, &[cmd::DISPLAY_ON]);
            command(&mut display, &[cmd::SET_PAGE_ADDR | page]);
            prop_assert_eq!(data(&mut display, &columns), Outcome::Handled);

            let pixels = display.pixels();
            for y in 0..64usize {
                for x in 0..WIDTH {
                    let expected = if y / 8 == page as usize && columns[x] & (1 << (y % 8)) != 0 {
                        PIXEL_ON
                    } else {
                        PIXEL_OFF
                    };
                    prop_assert_eq!(pixels.pixel(x, y), Some(expected));
                }
            }
        }
    }
}

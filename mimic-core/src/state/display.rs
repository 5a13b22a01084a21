//! OLED controller state machine
//!
//! The panel is either on or off. Addressing commands only take effect
//! while it is on; data writes additionally need a page latched by a page
//! address command, and each write attempt consumes the latch.

use crate::outcome::{ModeGate, Rejection};

/// Decoded display controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayCommand {
    /// Select page (row of 8 pixels)
    PageAddress(u8),
    /// Lower nibble of the column address
    ColumnLow(u8),
    /// Upper nibble of the column address
    ColumnHigh(u8),
    /// Page and both column nibbles in one write
    PageColumn { page: u8, low: u8, high: u8 },
    /// Switch the panel on or off
    Power(bool),
    /// Force every pixel on regardless of RAM
    EntireOn(bool),
    /// Inverse video
    Inverse(bool),
    /// Segment remap (accepted, no effect)
    SegmentRemap,
    /// COM output scan direction (accepted, no effect)
    ComScanDirection,
    /// Display start line
    StartLine(u8),
}

/// Display controller mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayState {
    on: bool,
    entire_on: bool,
    inverted: bool,
    page: u8,
    column: u8,
    page_latched: bool,
}

impl DisplayState {
    /// Reset state: panel off, nothing latched
    pub const fn new() -> Self {
        Self {
            on: false,
            entire_on: false,
            inverted: false,
            page: 0,
            column: 0,
            page_latched: false,
        }
    }

    /// Check if the panel is on
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Check if entire-display-on is forced
    pub fn is_entire_on(&self) -> bool {
        self.entire_on
    }

    /// Check if inverse video is selected
    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Current draw page
    pub fn page(&self) -> u8 {
        self.page
    }

    /// Current column address
    pub fn column(&self) -> u8 {
        self.column
    }

    /// Check if a page is latched for the next data write
    pub fn has_page_latched(&self) -> bool {
        self.page_latched
    }

    /// Apply a command
    pub fn handle(&mut self, command: DisplayCommand) -> Result<(), Rejection> {
        use DisplayCommand::*;

        match command {
            PageAddress(_) | ColumnLow(_) | ColumnHigh(_) if !self.on => {
                return Err(Rejection::IllegalInMode(ModeGate::DisplayOff));
            }
            PageAddress(page) => {
                self.page = page & 0x0F;
                self.page_latched = true;
            }
            ColumnLow(nibble) => self.column = nibble & 0x0F,
            ColumnHigh(nibble) => self.column |= (nibble & 0x0F) << 4,
            PageColumn { page, .. } => {
                self.page = page & 0x0F;
                self.page_latched = true;
            }
            Power(on) => self.on = on,
            EntireOn(on) => self.entire_on = on,
            Inverse(on) => self.inverted = on,
            SegmentRemap | ComScanDirection | StartLine(_) => {}
        }
        Ok(())
    }

    /// Start a data write
    ///
    /// Consumes the page latch whether or not the write goes ahead, and
    /// returns the page to draw into.
    pub fn begin_data_write(&mut self) -> Result<u8, Rejection> {
        let latched = core::mem::take(&mut self.page_latched);
        if !latched {
            return Err(Rejection::IllegalInMode(ModeGate::MissingPage));
        }
        if !self.on {
            return Err(Rejection::IllegalInMode(ModeGate::DisplayOff));
        }
        Ok(self.page)
    }

    /// Return to the reset state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

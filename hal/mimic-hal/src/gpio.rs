//! GPIO line abstractions
//!
//! Emulated peripherals drive interrupt and status lines through
//! [`OutputPin`]. [`IrqLine`] is the plain in-memory line the host samples.

/// Digital output pin
///
/// Implemented by whatever the host wires a peripheral's output to.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Toggle the pin state
    fn toggle(&mut self);

    /// Set the pin to a specific state
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;

    /// Check if the pin is currently set low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Interrupt request line
///
/// Level-driven line that also counts rising edges, so a host can tell
/// that an interrupt was raised even if it was lowered again before it
/// sampled the level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine {
    level: bool,
    rising_edges: u32,
}

impl IrqLine {
    /// Create a line that starts low
    pub const fn new() -> Self {
        Self {
            level: false,
            rising_edges: 0,
        }
    }

    /// Number of low-to-high transitions seen so far
    pub fn rising_edges(&self) -> u32 {
        self.rising_edges
    }
}

impl OutputPin for IrqLine {
    fn set_high(&mut self) {
        if !self.level {
            self.rising_edges = self.rising_edges.wrapping_add(1);
        }
        self.level = true;
    }

    fn set_low(&mut self) {
        self.level = false;
    }

    fn toggle(&mut self) {
        let high = !self.level;
        self.set_state(high);
    }

    fn is_set_high(&self) -> bool {
        self.level
    }
}

//! Periodic timer abstractions
//!
//! The host simulation owns the clock. It forwards elapsed ticks to
//! peripherals through [`Clocked`]; peripherals that do something
//! periodically keep a [`LimitTimer`] to turn ticks into events.

/// Receiver of host timer ticks
pub trait Clocked {
    /// Advance the peripheral's notion of time by `ticks`
    fn tick(&mut self, ticks: u32);
}

/// Periodic limit timer
///
/// Counts ticks while enabled and reports every time the count reaches the
/// limit, then starts over. Disabling pauses the count; it is only rewound
/// by [`reset`](Self::reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LimitTimer {
    limit: u32,
    value: u32,
    enabled: bool,
}

impl LimitTimer {
    /// Create a disabled timer firing every `limit` ticks
    ///
    /// A limit of zero is treated as one.
    pub const fn new(limit: u32) -> Self {
        Self {
            limit: if limit == 0 { 1 } else { limit },
            value: 0,
            enabled: false,
        }
    }

    /// Ticks between events
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Ticks counted toward the next event
    pub fn value(&self) -> u32 {
        self.value
    }

    /// Check if the timer is counting
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Start or pause counting
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Disable and rewind
    pub fn reset(&mut self) {
        self.enabled = false;
        self.value = 0;
    }

    /// Advance by `ticks`
    ///
    /// Returns how many times the limit was reached. Always zero while
    /// disabled.
    pub fn advance(&mut self, ticks: u32) -> u32 {
        if !self.enabled {
            return 0;
        }

        let total = self.value as u64 + ticks as u64;
        let limit = self.limit as u64;
        self.value = (total % limit) as u32;
        (total / limit) as u32
    }
}

//! Mimic Hardware Abstraction Layer
//!
//! This crate defines the seams between an emulated peripheral and the
//! host simulation that drives it. Peripherals implement these traits; the
//! host (see `mimic-board`) owns the bus transport, the clock and the reset
//! lifecycle and calls into them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Host simulation (mimic-board, tests)   │
//! └─────────────────────────────────────────┘
//!        │ bytes        │ ticks      │ reset
//!        ▼              ▼            ▼
//! ┌─────────────────────────────────────────┐
//! │  mimic-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//!                     │
//!      ┌──────────────┼──────────────┐
//!      ▼              ▼              ▼
//! ┌──────────┐  ┌──────────┐  ┌─────────────┐
//! │ sensors  │  │ display  │  │ hal-stm32   │
//! └──────────┘  └──────────┘  └─────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::UartDevice`] - Byte-at-a-time serial endpoint
//! - [`i2c::I2cPeripheral`] - Transaction-oriented I2C target
//! - [`gpio::OutputPin`] - Interrupt/GPIO output line
//! - [`timer::Clocked`] - Periodic timer input
//! - [`Resettable`] - Host lifecycle reset

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{IrqLine, OutputPin};
pub use i2c::{I2cPeripheral, ReadBuffer, MAX_READ_LEN};
pub use timer::{Clocked, LimitTimer};
pub use uart::{UartConfig, UartDevice};

/// Host lifecycle reset
///
/// Called by the host when the emulated machine is reset. Implementations
/// return transient state (buffers, modes) to its power-on value and keep
/// externally injected physical quantities.
pub trait Resettable {
    /// Reset to power-on state
    fn reset(&mut self);
}

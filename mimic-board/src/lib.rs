//! Emulated boards for Mimic
//!
//! Assembles the emulated peripherals into a board from a TOML
//! description and plays the host simulation's part around them.
//!
//! # Architecture
//!
//! ```text
//! board.toml ──► BoardConfig ──► Board
//!                                 ├── USARTs ◄──► PMS5003 / S8 LP   (pump, tick)
//!                                 └── I2C bus ──► SGP41 / SHT31 / SH1106
//! ```
//!
//! Firmware tests drive the USART registers and I2C transactions; the board
//! delivers the bytes, forwards timer ticks and resets everything together.

pub mod board;
pub mod config;
pub mod error;

pub use board::Board;
pub use config::BoardConfig;
pub use error::{BusError, ConfigError};

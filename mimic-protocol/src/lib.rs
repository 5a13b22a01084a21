//! Wire protocol kernel shared by all Mimic peripherals
//!
//! Every emulated device speaks some variation of the same thing: requests
//! arrive byte-by-byte, get assembled into frames, matched against a table
//! of commands, and answered with a framed, checksummed response.
//!
//! # Frame Shapes
//!
//! UART sensors answer with a header/length/payload/trailer frame:
//! ```text
//! ┌──────────┬──────────┬─────────────┬──────────┐
//! │ HEADER   │ LENGTH   │ PAYLOAD     │ TRAILER  │
//! │ 1-2B     │ 0-2B     │ 0-58B       │ 0-2B     │
//! └──────────┴──────────┴─────────────┴──────────┘
//! ```
//!
//! I2C sensors answer with 16-bit words, each followed by its own CRC:
//! ```text
//! ┌────┬────┬─────┐┌────┬────┬─────┐
//! │ HI │ LO │ CRC ││ HI │ LO │ CRC │ ...
//! └────┴────┴─────┘└────┴────┴─────┘
//! ```
//!
//! Everything here is pure and reentrant; device state lives in the
//! adapters that use it.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod checksum;
pub mod chunk;
pub mod command;
pub mod frame;

pub use checksum::{crc16_modbus, crc8, sum16};
pub use command::{CommandRegistry, Matcher, Pattern, RegistryError, MAX_PATTERN_LEN};
pub use frame::{
    FrameAssembler, FrameError, FrameTemplate, LengthField, Trailer, MAX_FRAME_SIZE,
    MAX_PAYLOAD_SIZE, RX_QUEUE_SIZE,
};

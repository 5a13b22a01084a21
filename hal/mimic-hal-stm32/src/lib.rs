//! STM32-specific peripherals for Mimic
//!
//! Unlike the sensors, these are not command devices on a bus: firmware
//! talks to them through 32-bit memory-mapped registers. This crate
//! provides:
//!
//! - `Stm32Usart` - STM32F1/F4-style USART (SR, DR, BRR, CR1, CR2)
//!
//! # Usage
//!
//! The host forwards the firmware's register accesses to
//! [`Stm32Usart::read`] / [`Stm32Usart::write`] and connects the line side
//! (the [`mimic_hal::UartDevice`] impl) to whatever sensor sits on the other
//! end of the wire.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod usart;

pub use usart::{Stm32Usart, RX_FIFO_SIZE, TX_QUEUE_SIZE, WINDOW_SIZE};

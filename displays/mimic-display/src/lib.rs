//! Emulated display controllers for Mimic
//!
//! This crate provides:
//! - `PixelBuffer`, the panel memory as one byte per pixel
//! - `Sh1106`, an I2C OLED controller that draws into it
//!
//! # Architecture
//!
//! Firmware drives the controller exactly as it would drive the real part:
//! command writes set modes and addresses, data writes fill one page (a row
//! of 8 pixels) at a time. Hosts read the result back from the pixel buffer
//! and present it however they like.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod fmt;

pub mod framebuffer;
pub mod sh1106;

// Re-export key types
pub use framebuffer::{GeometryError, PixelBuffer, MAX_PIXELS, PIXEL_OFF, PIXEL_ON};
pub use sh1106::Sh1106;

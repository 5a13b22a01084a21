//! Device-agnostic core logic for Mimic peripherals
//!
//! This crate holds everything about an emulated device that does not
//! depend on how bytes reach it:
//!
//! - Mode state machines gating which commands are legal
//! - Rejection taxonomy for frames that get no response
//! - Raw/physical unit conversion with range validation
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod outcome;
pub mod state;
pub mod units;

pub use outcome::{MalformedKind, ModeGate, Outcome, Rejection};
pub use units::SensorError;

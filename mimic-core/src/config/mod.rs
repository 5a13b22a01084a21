//! Configuration types
//!
//! Per-device settings for an emulated board. Hosts deserialize these from
//! a board description; every field has a documented default.

pub mod devices;

pub use devices::*;

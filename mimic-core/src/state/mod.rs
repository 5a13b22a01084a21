//! Device mode state machines
//!
//! Each modal device keeps an explicit state struct. Commands are decoded
//! by the adapter, then applied here; the state decides whether the
//! command is legal and what the adapter should do about it.

pub mod display;
pub mod particle;

pub use display::{DisplayCommand, DisplayState};
pub use particle::{Ack, Effects, OutputMode, ParticleCommand, ParticleState, Power};

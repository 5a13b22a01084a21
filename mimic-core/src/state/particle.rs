//! Particulate sensor state machine
//!
//! Two independent axes: power (Sleep/Wake) and output mode
//! (Passive/Active). Wake+Active streams readings on a timer; Passive
//! answers on request. The sleep/wake command is legal everywhere and sets
//! both axes at once.

use crate::outcome::{ModeGate, Rejection};

/// Power state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Power {
    Sleep,
    Wake,
}

/// Output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputMode {
    /// Readings only on request
    Passive,
    /// Readings pushed periodically
    Active,
}

/// Decoded particulate sensor command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParticleCommand {
    /// Sleep or wake
    SetPower(Power),
    /// Change output mode
    SetMode(OutputMode),
    /// Request one reading in passive mode
    ReadPassive,
}

/// Acknowledgement frame to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    Sleep,
    Passive,
    Active,
}

/// Side effects of an accepted command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Effects {
    /// Acknowledgement to send, if any
    pub ack: Option<Ack>,
    /// New output timer state, if it changes
    pub timer: Option<bool>,
    /// Send a data frame
    pub send_reading: bool,
}

/// Particulate sensor mode state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ParticleState {
    power: Power,
    mode: OutputMode,
    /// Set once the first wake has pushed its reading
    woken: bool,
}

impl ParticleState {
    /// Power-on state: awake, active, never woken by a command
    pub const fn new() -> Self {
        Self {
            power: Power::Wake,
            mode: OutputMode::Active,
            woken: false,
        }
    }

    /// Current power state
    pub fn power(&self) -> Power {
        self.power
    }

    /// Current output mode
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Check if the first-wake push has happened
    pub fn has_woken(&self) -> bool {
        self.woken
    }

    /// Check if timer pushes should go out
    pub fn is_streaming(&self) -> bool {
        self.power == Power::Wake && self.mode == OutputMode::Active
    }

    /// Apply a command
    ///
    /// Returns the side effects to carry out, or why the command was
    /// refused. A refused command leaves the state untouched.
    pub fn handle(&mut self, command: ParticleCommand) -> Result<Effects, Rejection> {
        use ParticleCommand::*;

        match (self.power, command) {
            (_, SetPower(Power::Sleep)) => {
                self.power = Power::Sleep;
                self.mode = OutputMode::Passive;
                Ok(Effects {
                    ack: Some(Ack::Sleep),
                    timer: Some(false),
                    send_reading: false,
                })
            }
            (_, SetPower(Power::Wake)) => {
                self.power = Power::Wake;
                self.mode = OutputMode::Active;
                let first = !self.woken;
                self.woken = true;
                Ok(Effects {
                    ack: None,
                    timer: Some(true),
                    send_reading: first,
                })
            }
            (Power::Sleep, SetMode(_)) | (Power::Sleep, ReadPassive) => {
                Err(Rejection::IllegalInMode(ModeGate::Asleep))
            }
            (Power::Wake, SetMode(mode)) => {
                self.mode = mode;
                let (ack, streaming) = match mode {
                    OutputMode::Passive => (Ack::Passive, false),
                    OutputMode::Active => (Ack::Active, true),
                };
                Ok(Effects {
                    ack: Some(ack),
                    timer: Some(streaming),
                    send_reading: false,
                })
            }
            (Power::Wake, ReadPassive) => match self.mode {
                OutputMode::Active => Err(Rejection::IllegalInMode(ModeGate::ActiveOutput)),
                OutputMode::Passive => Ok(Effects {
                    send_reading: true,
                    ..Effects::default()
                }),
            },
        }
    }

    /// Return to the power-on state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ParticleState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_default_state() {
        let state = ParticleState::new();
        assert_eq!(state.power(), Power::Wake);
        assert_eq!(state.mode(), OutputMode::Active);
        assert!(state.is_streaming());
        assert!(!state.has_woken());
    }

    #[test]
    fn test_sleep_from_anywhere() {
        let mut state = ParticleState::new();
        let effects = state.handle(ParticleCommand::SetPower(Power::Sleep)).unwrap();

        assert_eq!(effects.ack, Some(Ack::Sleep));
        assert_eq!(effects.timer, Some(false));
        assert_eq!(state.power(), Power::Sleep);
        assert_eq!(state.mode(), OutputMode::Passive);

        // Sleeping again is still accepted
        assert!(state.handle(ParticleCommand::SetPower(Power::Sleep)).is_ok());
    }

    #[test]
    fn test_first_wake_pushes_once() {
        let mut state = ParticleState::new();

        let first = state.handle(ParticleCommand::SetPower(Power::Wake)).unwrap();
        assert!(first.send_reading);
        assert_eq!(first.ack, None);
        assert_eq!(first.timer, Some(true));

        state.handle(ParticleCommand::SetPower(Power::Sleep)).unwrap();
        let second = state.handle(ParticleCommand::SetPower(Power::Wake)).unwrap();
        assert!(!second.send_reading);
    }

    #[test]
    fn test_reset_rearms_first_wake() {
        let mut state = ParticleState::new();
        state.handle(ParticleCommand::SetPower(Power::Wake)).unwrap();
        state.reset();

        let effects = state.handle(ParticleCommand::SetPower(Power::Wake)).unwrap();
        assert!(effects.send_reading);
    }

    #[test]
    fn test_asleep_rejects_mode_and_read() {
        let mut state = ParticleState::new();
        state.handle(ParticleCommand::SetPower(Power::Sleep)).unwrap();
        let before = state;

        assert_eq!(
            state.handle(ParticleCommand::SetMode(OutputMode::Active)),
            Err(Rejection::IllegalInMode(ModeGate::Asleep))
        );
        assert_eq!(
            state.handle(ParticleCommand::ReadPassive),
            Err(Rejection::IllegalInMode(ModeGate::Asleep))
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_passive_read() {
        let mut state = ParticleState::new();

        assert_eq!(
            state.handle(ParticleCommand::ReadPassive),
            Err(Rejection::IllegalInMode(ModeGate::ActiveOutput))
        );

        let effects = state.handle(ParticleCommand::SetMode(OutputMode::Passive)).unwrap();
        assert_eq!(effects.ack, Some(Ack::Passive));
        assert_eq!(effects.timer, Some(false));

        let effects = state.handle(ParticleCommand::ReadPassive).unwrap();
        assert!(effects.send_reading);
        assert_eq!(effects.ack, None);
    }

    fn command() -> impl Strategy<Value = ParticleCommand> {
        prop_oneof![
            Just(ParticleCommand::SetPower(Power::Sleep)),
            Just(ParticleCommand::SetPower(Power::Wake)),
            Just(ParticleCommand::SetMode(OutputMode::Passive)),
            Just(ParticleCommand::SetMode(OutputMode::Active)),
            Just(ParticleCommand::ReadPassive),
        ]
    }

    proptest! {
        #[test]
        fn prop_wake_push_fires_at_most_once(commands in proptest::collection::vec(command(), 0..40)) {
            let mut state = ParticleState::new();
            let mut wake_pushes = 0;

            for command in commands {
                if let Ok(effects) = state.handle(command) {
                    if effects.send_reading && command == ParticleCommand::SetPower(Power::Wake) {
                        wake_pushes += 1;
                    }
                }
                // Sleep always implies passive
                if state.power() == Power::Sleep {
                    prop_assert_eq!(state.mode(), OutputMode::Passive);
                }
            }

            prop_assert!(wake_pushes <= 1);
        }
    }
}

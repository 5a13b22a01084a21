//! Frame handling outcomes
//!
//! A device never answers a frame it refuses. Externally a malformed frame,
//! an unknown opcode and a command that is illegal in the current mode all
//! look the same (silence), but they are kept apart here so hosts and tests
//! can tell why nothing came back.

use mimic_protocol::FrameError;

/// Why a frame was structurally unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MalformedKind {
    /// Header bytes did not match the device magic
    BadHeader,
    /// Frame or write had the wrong number of bytes
    BadLength,
    /// Embedded checksum did not match
    BadChecksum,
    /// Register/control byte not recognised
    BadRegister,
    /// Address outside the device's memory
    BadAddress,
    /// Response did not fit the output buffer
    Overflow,
}

/// Mode condition that made a command illegal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeGate {
    /// Device is asleep
    Asleep,
    /// Device is streaming on its own
    ActiveOutput,
    /// Display is switched off
    DisplayOff,
    /// No page address latched before a data write
    MissingPage,
}

/// Reason a frame produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Frame was malformed
    Malformed(MalformedKind),
    /// Opcode is not in the device's command table
    UnknownCommand,
    /// Command exists but is not accepted in the current mode
    IllegalInMode(ModeGate),
}

impl From<FrameError> for Rejection {
    fn from(err: FrameError) -> Self {
        let kind = match err {
            FrameError::BadHeader => MalformedKind::BadHeader,
            FrameError::BadChecksum => MalformedKind::BadChecksum,
            FrameError::Incomplete | FrameError::BadLength => MalformedKind::BadLength,
            FrameError::PayloadTooLarge | FrameError::BufferTooSmall => MalformedKind::Overflow,
        };
        Rejection::Malformed(kind)
    }
}

/// Result of feeding a device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Not enough bytes for a frame yet
    Pending,
    /// Frame accepted and acted upon
    Handled,
    /// Frame discarded
    Rejected(Rejection),
}

impl Outcome {
    /// Check if the frame was accepted
    pub fn is_handled(&self) -> bool {
        matches!(self, Outcome::Handled)
    }

    /// The rejection, if any
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Outcome::Rejected(rejection) => Some(*rejection),
            _ => None,
        }
    }
}

impl From<Result<(), Rejection>> for Outcome {
    fn from(result: Result<(), Rejection>) -> Self {
        match result {
            Ok(()) => Outcome::Handled,
            Err(rejection) => Outcome::Rejected(rejection),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_error_mapping() {
        assert_eq!(
            Rejection::from(FrameError::BadHeader),
            Rejection::Malformed(MalformedKind::BadHeader)
        );
        assert_eq!(
            Rejection::from(FrameError::BadChecksum),
            Rejection::Malformed(MalformedKind::BadChecksum)
        );
    }

    #[test]
    fn test_outcome_from_result() {
        assert!(Outcome::from(Ok(())).is_handled());

        let outcome = Outcome::from(Err(Rejection::UnknownCommand));
        assert!(!outcome.is_handled());
        assert_eq!(outcome.rejection(), Some(Rejection::UnknownCommand));
        assert_eq!(Outcome::Pending.rejection(), None);
    }
}

//! Motor error taxonomy
//!
//! Every failure is scoped to one channel or one operation; none of them is
//! fatal to the host.

use motorsys_hal::{IoError, PinError};

/// Errors reported by motor operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotorError {
    /// Speed, position or magnitude out of range; previous value kept
    InvalidArgument,
    /// No channel with the requested name (or the channel was torn down)
    ChannelNotFound,
    /// A pin or PWM write failed
    IoFailure(IoError),
    /// The operation is not available on this motor variant
    Unsupported,
    /// No room left in a fixed-capacity table
    RegistryFull,
    /// A pin is already owned by another channel
    PinConflict(PinError),
}

impl MotorError {
    /// Short static description, suitable for an attribute error message
    pub fn as_str(&self) -> &'static str {
        match self {
            MotorError::InvalidArgument => "invalid argument",
            MotorError::ChannelNotFound => "no such channel",
            MotorError::IoFailure(_) => "i/o failure",
            MotorError::Unsupported => "operation not available",
            MotorError::RegistryFull => "registry full",
            MotorError::PinConflict(_) => "pin in use",
        }
    }
}

impl From<IoError> for MotorError {
    fn from(e: IoError) -> Self {
        MotorError::IoFailure(e)
    }
}

impl From<PinError> for MotorError {
    fn from(e: PinError) -> Self {
        MotorError::PinConflict(e)
    }
}

impl core::fmt::Display for MotorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(
            MotorError::from(IoError::WriteFailed(3)),
            MotorError::IoFailure(IoError::WriteFailed(3))
        );
        assert_eq!(
            MotorError::from(PinError::InUse(18)),
            MotorError::PinConflict(PinError::InUse(18))
        );
    }

    #[test]
    fn test_unsupported_message() {
        assert_eq!(MotorError::Unsupported.as_str(), "operation not available");
    }
}

//! Motor device trait
//!
//! Every motor variant (single-channel stepper, multi-channel stepper, DC,
//! multi-channel DC) is controlled through [`MotorDevice`]. Capabilities a
//! variant lacks are reported as [`MotorError::Unsupported`] rather than
//! attempted.
//!
//! Methods take `&self`: a device is shared between the command context and
//! the board's timer and actuation tasks, so implementations keep their
//! mutable state behind a blocking mutex.

use crate::error::MotorError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Motor type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorType {
    /// Type not known
    #[default]
    Unknown,
    /// Brushed DC motor
    Dc,
    /// Stepper motor
    Stepper,
    /// Hobby servo
    Servo,
}

impl MotorType {
    /// Human-readable type name
    pub fn as_str(self) -> &'static str {
        match self {
            MotorType::Dc => "dc motor",
            MotorType::Stepper => "stepper motor",
            MotorType::Servo => "servo motor",
            MotorType::Unknown => "unknown",
        }
    }
}

/// Motor state, used both as a control command and as a state report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MotorState {
    /// All drive pins de-energized
    #[default]
    Standby,
    /// Initialization
    Init,
    /// Mount
    Mount,
    /// Unmount
    Unmount,
    /// Rotate forward
    Forward,
    /// Rotate backward
    Backward,
    /// Energized and braking
    Hold,
}

impl MotorState {
    /// Every state, in keyword order
    pub const ALL: [MotorState; 7] = [
        MotorState::Standby,
        MotorState::Init,
        MotorState::Mount,
        MotorState::Unmount,
        MotorState::Forward,
        MotorState::Backward,
        MotorState::Hold,
    ];

    /// Keyword for this state
    pub fn as_str(self) -> &'static str {
        match self {
            MotorState::Standby => "standby",
            MotorState::Init => "init",
            MotorState::Mount => "mount",
            MotorState::Unmount => "unmount",
            MotorState::Forward => "forward",
            MotorState::Backward => "backward",
            MotorState::Hold => "hold",
        }
    }

    /// Parse a keyword
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == word)
    }
}

/// Uniform command surface of a motor
pub trait MotorDevice {
    /// Device name, unique within a motor class
    fn name(&self) -> &str;

    /// Motor type
    fn motor_type(&self) -> MotorType;

    /// Whether the device must be put in standby on suspend
    fn supports_suspend(&self) -> bool {
        false
    }

    /// Command a direction with a magnitude
    ///
    /// For steppers the magnitude is a step count; DC motors ignore it.
    /// Directions a variant does not implement produce standby output.
    fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError>;

    /// Current state
    fn state(&self) -> Result<MotorState, MotorError>;

    /// Set the speed (pulses per second for steppers, duty percent for DC)
    ///
    /// Out-of-range values are rejected and the previous value is kept.
    fn set_speed(&self, value: u32) -> Result<(), MotorError>;

    /// Current speed setting
    fn speed(&self) -> Result<u32, MotorError>;

    /// Set a position target, clamped to the device's travel bounds
    fn set_position(&self, _value: i32) -> Result<(), MotorError> {
        Err(MotorError::Unsupported)
    }

    /// Current position (remaining dead-reckoned steps)
    fn position(&self) -> Result<i32, MotorError> {
        Err(MotorError::Unsupported)
    }
}

impl<T: MotorDevice + ?Sized> MotorDevice for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn motor_type(&self) -> MotorType {
        (**self).motor_type()
    }

    fn supports_suspend(&self) -> bool {
        (**self).supports_suspend()
    }

    fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError> {
        (**self).control(command, magnitude)
    }

    fn state(&self) -> Result<MotorState, MotorError> {
        (**self).state()
    }

    fn set_speed(&self, value: u32) -> Result<(), MotorError> {
        (**self).set_speed(value)
    }

    fn speed(&self) -> Result<u32, MotorError> {
        (**self).speed()
    }

    fn set_position(&self, value: i32) -> Result<(), MotorError> {
        (**self).set_position(value)
    }

    fn position(&self) -> Result<i32, MotorError> {
        (**self).position()
    }
}

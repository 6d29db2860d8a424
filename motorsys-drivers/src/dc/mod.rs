//! DC motor drivers
//!
//! A DC channel has no counter and no timer: a command maps straight to the
//! levels of its two terminal pins.
//!
//! | command  | positive | negative |
//! |----------|----------|----------|
//! | forward  | high     | low      |
//! | backward | low      | high     |
//! | hold     | high     | high     |
//! | other    | low      | low      |
//!
//! The enable pin, when present, is high whenever either terminal is. State
//! is read back from the mirrored levels.

pub mod bank;
pub mod simple;

use motorsys_core::{DcPins, MotorState};
use motorsys_hal::{IoError, Level, OutputBus};

/// Commanded terminal levels of a DC channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Levels {
    pub positive: Level,
    pub negative: Level,
}

impl Levels {
    /// Both terminals low
    pub const STANDBY: Levels = Levels {
        positive: Level::Low,
        negative: Level::Low,
    };

    /// Levels for a control command
    pub fn for_command(command: MotorState) -> Self {
        let (positive, negative) = match command {
            MotorState::Forward => (Level::High, Level::Low),
            MotorState::Backward => (Level::Low, Level::High),
            MotorState::Hold => (Level::High, Level::High),
            _ => (Level::Low, Level::Low),
        };
        Self { positive, negative }
    }

    /// State reported for these levels
    pub fn state(&self) -> MotorState {
        match (self.positive, self.negative) {
            (Level::High, Level::Low) => MotorState::Forward,
            (Level::Low, Level::High) => MotorState::Backward,
            (Level::High, Level::High) => MotorState::Hold,
            (Level::Low, Level::Low) => MotorState::Standby,
        }
    }

    /// Check if either terminal is driven
    pub fn is_driven(&self) -> bool {
        self.positive.is_high() || self.negative.is_high()
    }
}

/// Write terminal and enable pins; every pin is written, the first failure
/// is returned
pub(crate) fn drive<B: OutputBus>(bus: &mut B, pins: &DcPins, levels: Levels) -> Result<(), IoError> {
    let enable = pins
        .enable
        .map(|pin| (pin, Level::from(levels.is_driven())));
    let writes = [
        Some((pins.positive, levels.positive)),
        Some((pins.negative, levels.negative)),
        enable,
    ];
    let mut first = Ok(());
    for (pin, level) in writes.into_iter().flatten() {
        if let Err(e) = bus.set_pin(pin, level) {
            warn!("dc pin {} write failed: {}", pin, e);
            if first.is_ok() {
                first = Err(e);
            }
        }
    }
    first
}

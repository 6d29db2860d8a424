//! Phase actuator
//!
//! Turns a sequence index into four pin writes. An index outside the table
//! drives every lead low.

use motorsys_hal::{IoError, Level, OutputBus};

use crate::channel::PinSet;
use crate::table::{Lead, PhasePattern, StepTable};

/// Applies phase patterns to a channel's pins
#[derive(Debug, Clone, Copy)]
pub struct PhaseActuator {
    pins: PinSet,
    table: &'static StepTable,
}

impl PhaseActuator {
    pub fn new(pins: PinSet, table: &'static StepTable) -> Self {
        Self { pins, table }
    }

    /// Drive the pins for `index`, or standby if `index` is outside the table
    ///
    /// All four pins are written even if one fails. Failures are logged and
    /// the first one is returned.
    pub fn apply<B: OutputBus>(&self, bus: &mut B, index: i32) -> Result<(), IoError> {
        let pattern = self.table.get(index).unwrap_or(PhasePattern::STANDBY);
        self.write(bus, pattern)
    }

    /// Drive every lead low
    pub fn standby<B: OutputBus>(&self, bus: &mut B) -> Result<(), IoError> {
        self.write(bus, PhasePattern::STANDBY)
    }

    fn write<B: OutputBus>(&self, bus: &mut B, pattern: PhasePattern) -> Result<(), IoError> {
        let mut first = Ok(());
        for lead in Lead::ALL {
            let pin = self.pins.pin(lead);
            let level = Level::from(pattern.is_energized(lead));
            if let Err(e) = bus.set_pin(pin, level) {
                warn!("pin {} write failed: {}", pin, e);
                if first.is_ok() {
                    first = Err(e);
                }
            }
        }
        first
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }
}

//! Per-channel stepper state
//!
//! [`ChannelState`] is the plain counter machine behind one stepper channel.
//! It knows nothing about timers or pins; [`crate::scheduler`] owns the
//! locking and decides when to call [`ChannelState::advance`].
//!
//! The remaining step count is signed: positive runs forward, negative runs
//! backward, zero is idle. A forward tick walks the phase table backwards and
//! a backward tick walks it forwards, one entry per tick.

use core::time::Duration;

use motorsys_hal::PinId;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::device::MotorState;
use crate::error::MotorError;
use crate::table::{Lead, StepTable};

/// Largest step count a single command can request
///
/// Larger magnitudes are capped when the command is accepted.
pub const MAX_TRAVEL: u32 = 204_000;

/// Slowest accepted pulse rate (pulses per second)
pub const MIN_PULSE_RATE: u32 = 1;

/// Fastest accepted pulse rate (pulses per second)
pub const MAX_PULSE_RATE: u32 = 5000;

/// Pulse rate of a freshly created channel
pub const DEFAULT_PULSE_RATE: u32 = 200;

/// Coil lead pin assignment of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinSet {
    /// Lead A
    pub forward_a: PinId,
    /// Lead B
    pub forward_b: PinId,
    /// Lead /A
    pub reverse_a: PinId,
    /// Lead /B
    pub reverse_b: PinId,
}

impl PinSet {
    /// Create a pin set in lead order A, B, /A, /B
    pub const fn new(forward_a: PinId, forward_b: PinId, reverse_a: PinId, reverse_b: PinId) -> Self {
        Self {
            forward_a,
            forward_b,
            reverse_a,
            reverse_b,
        }
    }

    /// Pin driving a lead
    pub const fn pin(&self, lead: Lead) -> PinId {
        match lead {
            Lead::A => self.forward_a,
            Lead::B => self.forward_b,
            Lead::ANot => self.reverse_a,
            Lead::BNot => self.reverse_b,
        }
    }

    /// All four pins in lead order
    pub const fn as_array(&self) -> [PinId; 4] {
        [self.forward_a, self.forward_b, self.reverse_a, self.reverse_b]
    }
}

/// Travel bounds for position targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    /// Lowest accepted target
    pub min_position: i32,
    /// Highest accepted target
    pub max_position: i32,
}

impl Bounds {
    /// Create bounds
    pub const fn new(min_position: i32, max_position: i32) -> Self {
        Self {
            min_position,
            max_position,
        }
    }

    /// Check that the range is not inverted
    pub fn validate(&self) -> Result<(), MotorError> {
        if self.min_position > self.max_position {
            return Err(MotorError::InvalidArgument);
        }
        Ok(())
    }

    /// Clamp a target into the range
    pub fn clamp(&self, target: i32) -> i32 {
        target.clamp(self.min_position, self.max_position)
    }
}

/// Mutable state of one stepper channel
#[derive(Debug, Clone)]
pub struct ChannelState {
    remaining_steps: i32,
    sequence_index: usize,
    pulse_rate: u32,
    pins: PinSet,
    bounds: Option<Bounds>,
    table: &'static StepTable,
}

impl ChannelState {
    /// Create an idle channel at the default pulse rate
    pub fn new(pins: PinSet, table: &'static StepTable) -> Self {
        Self {
            remaining_steps: 0,
            sequence_index: 0,
            pulse_rate: DEFAULT_PULSE_RATE,
            pins,
            bounds: None,
            table,
        }
    }

    /// Attach travel bounds
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    /// Accept a control command
    ///
    /// Forward and backward set a signed step count capped at
    /// [`MAX_TRAVEL`]; every other command stops the channel. The sequence
    /// index is left alone so motion redirects from the current phase.
    pub fn command(&mut self, command: MotorState, magnitude: u32) {
        let steps = magnitude.min(MAX_TRAVEL) as i32;
        self.remaining_steps = match command {
            MotorState::Forward => steps,
            MotorState::Backward => -steps,
            _ => 0,
        };
    }

    /// Run one tick: move the count one step toward zero and the index one
    /// entry along the table
    ///
    /// Returns the remaining step count. An idle channel is left untouched.
    pub fn advance(&mut self) -> i32 {
        if self.remaining_steps > 0 {
            self.remaining_steps -= 1;
            self.sequence_index = self.table.previous(self.sequence_index);
        } else if self.remaining_steps < 0 {
            self.remaining_steps += 1;
            self.sequence_index = self.table.next(self.sequence_index);
        }
        self.remaining_steps
    }

    /// Index to actuate: the current table entry, or `-1` (standby) when idle
    pub fn phase_index(&self) -> i32 {
        if self.remaining_steps == 0 {
            -1
        } else {
            self.sequence_index as i32
        }
    }

    /// Tick interval at the current pulse rate
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.pulse_rate.max(MIN_PULSE_RATE)))
    }

    /// Set the pulse rate, keeping the previous one if out of range
    pub fn set_pulse_rate(&mut self, rate: u32) -> Result<(), MotorError> {
        if !(MIN_PULSE_RATE..=MAX_PULSE_RATE).contains(&rate) {
            return Err(MotorError::InvalidArgument);
        }
        self.pulse_rate = rate;
        Ok(())
    }

    /// Assign a position target as the remaining step count
    ///
    /// The target is clamped into the travel bounds, or to `±MAX_TRAVEL` on
    /// a channel without bounds. Returns the value assigned.
    pub fn set_target(&mut self, target: i32) -> i32 {
        let limit = MAX_TRAVEL as i32;
        let clamped = match self.bounds {
            Some(bounds) => bounds.clamp(target),
            None => target,
        }
        .clamp(-limit, limit);
        self.remaining_steps = clamped;
        clamped
    }

    /// Stop without touching the sequence index
    pub fn stop(&mut self) {
        self.remaining_steps = 0;
    }

    /// Direction derived from the sign of the remaining count
    pub fn state(&self) -> MotorState {
        match self.remaining_steps {
            n if n > 0 => MotorState::Forward,
            n if n < 0 => MotorState::Backward,
            _ => MotorState::Standby,
        }
    }

    /// Signed steps left
    pub fn remaining_steps(&self) -> i32 {
        self.remaining_steps
    }

    /// Current table entry, always in `[0, table.len())`
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// Pulse rate in pulses per second
    pub fn pulse_rate(&self) -> u32 {
        self.pulse_rate
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    pub fn table(&self) -> &'static StepTable {
        self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{HALF_STEP, TWO_PHASE};
    use proptest::prelude::*;

    const PINS: PinSet = PinSet::new(18, 23, 24, 25);

    fn ticks_to_idle(state: &mut ChannelState) -> u32 {
        let mut ticks = 0;
        while state.remaining_steps() != 0 {
            state.advance();
            ticks += 1;
        }
        ticks
    }

    #[test]
    fn test_new_channel_is_idle() {
        let state = ChannelState::new(PINS, &TWO_PHASE);
        assert_eq!(state.remaining_steps(), 0);
        assert_eq!(state.phase_index(), -1);
        assert_eq!(state.state(), MotorState::Standby);
        assert_eq!(state.pulse_rate(), DEFAULT_PULSE_RATE);
    }

    #[test]
    fn test_forward_walks_table_backwards() {
        let mut state = ChannelState::new(PINS, &TWO_PHASE);
        state.command(MotorState::Forward, 4);
        assert_eq!(state.phase_index(), 0);

        let mut seen = [0i32; 4];
        for slot in seen.iter_mut() {
            state.advance();
            *slot = state.phase_index();
        }
        assert_eq!(seen, [3, 2, 1, -1]);
        assert_eq!(state.sequence_index(), 0);
    }

    #[test]
    fn test_backward_walks_table_forwards() {
        let mut state = ChannelState::new(PINS, &HALF_STEP);
        state.command(MotorState::Backward, 3);
        assert_eq!(state.state(), MotorState::Backward);
        state.advance();
        assert_eq!(state.phase_index(), 1);
        state.advance();
        assert_eq!(state.phase_index(), 2);
        assert_eq!(state.advance(), 0);
        assert_eq!(state.sequence_index(), 3);
    }

    #[test]
    fn test_non_motion_commands_stop() {
        let mut state = ChannelState::new(PINS, &TWO_PHASE);
        for command in [
            MotorState::Standby,
            MotorState::Init,
            MotorState::Mount,
            MotorState::Unmount,
            MotorState::Hold,
        ] {
            state.command(MotorState::Forward, 10);
            state.command(command, 10);
            assert_eq!(state.remaining_steps(), 0);
        }
    }

    #[test]
    fn test_magnitude_capped_at_max_travel() {
        let mut state = ChannelState::new(PINS, &TWO_PHASE);
        state.command(MotorState::Backward, u32::MAX);
        assert_eq!(state.remaining_steps(), -(MAX_TRAVEL as i32));
        assert_eq!(ticks_to_idle(&mut state), MAX_TRAVEL);
    }

    #[test]
    fn test_idle_advance_is_noop() {
        let mut state = ChannelState::new(PINS, &TWO_PHASE);
        assert_eq!(state.advance(), 0);
        assert_eq!(state.sequence_index(), 0);
    }

    #[test]
    fn test_pulse_rate_bounds() {
        let mut state = ChannelState::new(PINS, &TWO_PHASE);
        assert_eq!(state.set_pulse_rate(0), Err(MotorError::InvalidArgument));
        assert_eq!(state.set_pulse_rate(5001), Err(MotorError::InvalidArgument));
        assert_eq!(state.pulse_rate(), DEFAULT_PULSE_RATE);
        state.set_pulse_rate(MAX_PULSE_RATE).unwrap();
        assert_eq!(state.interval(), Duration::from_micros(200));
        state.set_pulse_rate(MIN_PULSE_RATE).unwrap();
        assert_eq!(state.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_target_clamped_into_bounds() {
        let mut state = ChannelState::new(PINS, &HALF_STEP).with_bounds(Bounds::new(-100, 500));
        assert_eq!(state.set_target(800), 500);
        assert_eq!(state.remaining_steps(), 500);
        assert_eq!(state.set_target(-300), -100);
        assert_eq!(state.state(), MotorState::Backward);
        assert_eq!(state.set_target(42), 42);
    }

    #[test]
    fn test_target_without_bounds_capped_at_travel() {
        let mut state = ChannelState::new(PINS, &HALF_STEP);
        assert_eq!(state.set_target(i32::MIN), -(MAX_TRAVEL as i32));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        assert_eq!(Bounds::new(5, -5).validate(), Err(MotorError::InvalidArgument));
        assert!(Bounds::new(-5, 5).validate().is_ok());
    }

    #[test]
    fn test_pin_set_lead_order() {
        assert_eq!(PINS.as_array(), [18, 23, 24, 25]);
        assert_eq!(PINS.pin(Lead::BNot), 25);
        assert_eq!(PINS.pin(Lead::ANot), 24);
    }

    proptest! {
        #[test]
        fn prop_ticks_to_idle_is_capped_magnitude(magnitude in 0u32..300_000, forward: bool) {
            let mut state = ChannelState::new(PINS, &TWO_PHASE);
            let command = if forward { MotorState::Forward } else { MotorState::Backward };
            state.command(command, magnitude);
            prop_assert_eq!(ticks_to_idle(&mut state), magnitude.min(MAX_TRAVEL));
        }

        #[test]
        fn prop_index_stays_in_table(
            half_step: bool,
            commands in proptest::collection::vec((0u8..3, 0u32..20, 0usize..30), 1..20),
        ) {
            let table = if half_step { &HALF_STEP } else { &TWO_PHASE };
            let mut state = ChannelState::new(PINS, table);
            for (dir, magnitude, ticks) in commands {
                let command = match dir {
                    0 => MotorState::Forward,
                    1 => MotorState::Backward,
                    _ => MotorState::Standby,
                };
                state.command(command, magnitude);
                for _ in 0..ticks {
                    let before = state.sequence_index();
                    let moving = state.remaining_steps() != 0;
                    state.advance();
                    let after = state.sequence_index();
                    prop_assert!(after < table.len());
                    if moving {
                        prop_assert!(after == table.next(before) || after == table.previous(before));
                    } else {
                        prop_assert_eq!(after, before);
                    }
                }
            }
        }
    }
}

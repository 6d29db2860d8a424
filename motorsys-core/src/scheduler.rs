//! Step scheduler
//!
//! [`StepChannel`] ties a [`ChannelState`] to its output pins and to one
//! periodic timer. Three contexts touch it:
//!
//! ```text
//!  command ──control()──► state ◄──tick()── timer
//!     │                      │
//!     └─ first actuation     └─ schedule ──► deferred ──► actuate_now()
//! ```
//!
//! - Command context: `control`, `set_pulse_rate`, `set_position`. Arms the
//!   timer when the channel leaves idle and performs the first actuation
//!   synchronously.
//! - Tick context: `tick`. Only moves counters and schedules a deferred
//!   actuation. Never writes pins.
//! - Actuation context: `run_deferred` / `next_deferred`. Writes the pins for
//!   whatever the channel's index is when it runs.
//!
//! Lock order is always bus then state. `armed` is only cleared under the
//! state lock, after a tick has observed a zero count, so a command that
//! makes the count non-zero either sees `armed` still set (and the next tick
//! carries on) or wins the compare-and-set and arms exactly once.
//!
//! `teardown` sets `retired` while holding both locks. Commands check it under
//! the state lock and the timer is only started under the bus lock, so no
//! timer can be left running on a retired channel.

use core::cell::RefCell;
use core::time::Duration;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_hal::{IoError, OutputBus};
use portable_atomic::{AtomicBool, Ordering};

use crate::actuator::PhaseActuator;
use crate::channel::ChannelState;
use crate::deferred::DeferredActuation;
use crate::device::MotorState;
use crate::error::MotorError;

/// One-shot timer driving a channel's ticks
///
/// The owner calls [`StepChannel::tick`] when the timer fires and restarts it
/// with the returned interval while the outcome is [`TickOutcome::Rearm`].
pub trait TickTimer {
    /// Fire once after `after`
    fn start(&self, after: Duration);

    /// Stop; a tick already running may still complete
    fn cancel(&self);
}

impl<T: TickTimer + ?Sized> TickTimer for &T {
    fn start(&self, after: Duration) {
        (**self).start(after)
    }

    fn cancel(&self) {
        (**self).cancel()
    }
}

/// What the timer should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Fire again after this interval, measured from now
    Rearm(Duration),
    /// The channel is idle; stop
    Disarm,
}

/// A stepper channel with its pins, timer and deferred actuation slot
pub struct StepChannel<M: RawMutex, B, T> {
    state: Mutex<M, RefCell<ChannelState>>,
    bus: Mutex<M, RefCell<B>>,
    actuator: PhaseActuator,
    deferred: DeferredActuation<M>,
    timer: T,
    armed: AtomicBool,
    retired: AtomicBool,
}

impl<M: RawMutex, B: OutputBus, T: TickTimer> StepChannel<M, B, T> {
    pub fn new(state: ChannelState, bus: B, timer: T) -> Self {
        let actuator = PhaseActuator::new(*state.pins(), state.table());
        Self {
            state: Mutex::new(RefCell::new(state)),
            bus: Mutex::new(RefCell::new(bus)),
            actuator,
            deferred: DeferredActuation::new(),
            timer,
            armed: AtomicBool::new(false),
            retired: AtomicBool::new(false),
        }
    }

    /// Accept a control command, arming the timer if the channel was idle
    pub fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError> {
        let moving = self.with_live_state(|s| {
            s.command(command, magnitude);
            s.remaining_steps() != 0
        })?;
        if moving {
            self.arm();
        }
        Ok(())
    }

    /// Assign a clamped position target as the remaining count and start
    /// moving towards it
    pub fn set_position(&self, target: i32) -> Result<(), MotorError> {
        let assigned = self.with_live_state(|s| s.set_target(target))?;
        if assigned != target {
            debug!("position {} clamped to {}", target, assigned);
        }
        if assigned != 0 {
            self.arm();
        }
        Ok(())
    }

    pub fn position(&self) -> i32 {
        self.with_state(|s| s.remaining_steps())
    }

    /// Change the pulse rate; takes effect at the next rearm
    pub fn set_pulse_rate(&self, rate: u32) -> Result<(), MotorError> {
        self.with_live_state(|s| s.set_pulse_rate(rate))?
    }

    pub fn pulse_rate(&self) -> u32 {
        self.with_state(|s| s.pulse_rate())
    }

    /// Direction derived from the remaining count
    pub fn motor_state(&self) -> MotorState {
        self.with_state(|s| s.state())
    }

    /// Copy of the channel's counters
    pub fn snapshot(&self) -> ChannelState {
        self.with_state(|s| s.clone())
    }

    /// Advance one step
    ///
    /// Runs in the timer context: no pin writes, only counters and a
    /// deferred actuation request.
    pub fn tick(&self) -> TickOutcome {
        if self.retired.load(Ordering::SeqCst) {
            return TickOutcome::Disarm;
        }
        let outcome = self.with_state(|s| {
            if s.advance() == 0 {
                self.armed.store(false, Ordering::Release);
                TickOutcome::Disarm
            } else {
                TickOutcome::Rearm(s.interval())
            }
        });
        if !self.retired.load(Ordering::Acquire) {
            self.deferred.schedule();
        }
        if outcome == TickOutcome::Disarm {
            debug!("channel disarmed");
        }
        outcome
    }

    /// Perform a pending deferred actuation, if any
    ///
    /// Returns whether one was pending.
    pub fn run_deferred(&self) -> bool {
        if !self.deferred.try_take() {
            return false;
        }
        let _ = self.actuate_now();
        true
    }

    /// Wait for a deferred actuation request and perform it
    pub async fn next_deferred(&self) -> Result<(), IoError> {
        self.deferred.wait().await;
        self.actuate_now()
    }

    /// Write the pins for the channel's current index
    ///
    /// A retired channel is never written.
    pub fn actuate_now(&self) -> Result<(), IoError> {
        self.bus.lock(|bus| {
            if self.retired.load(Ordering::SeqCst) {
                return Ok(());
            }
            let index = self.with_state(|s| s.phase_index());
            self.actuator.apply(&mut *bus.borrow_mut(), index)
        })
    }

    /// Force standby and stop the channel for good
    ///
    /// Stops the counter, writes standby, then cancels the timer and any
    /// pending deferred actuation. Once this returns no further pin writes
    /// happen, even from a tick or actuation already in flight. Pins may be
    /// released afterwards.
    pub fn teardown(&self) -> Result<(), MotorError> {
        let result = self.bus.lock(|bus| {
            self.with_state(|s| {
                self.retired.store(true, Ordering::SeqCst);
                s.stop();
            });
            self.actuator.standby(&mut *bus.borrow_mut())
        });
        self.timer.cancel();
        self.deferred.cancel();
        self.armed.store(false, Ordering::Release);
        info!("channel torn down");
        result.map_err(MotorError::from)
    }

    /// Check if the timer is scheduled
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Check if the channel has been torn down
    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    /// Run `f` with exclusive access to the channel's output bus
    pub fn with_bus<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.bus.lock(|bus| f(&mut bus.borrow_mut()))
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn deferred(&self) -> &DeferredActuation<M> {
        &self.deferred
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> R {
        self.state.lock(|s| f(&mut s.borrow_mut()))
    }

    /// Like `with_state`, but refuses a retired channel
    ///
    /// `teardown` retires under the state lock, so a closure that runs here
    /// always sees a live channel.
    fn with_live_state<R>(&self, f: impl FnOnce(&mut ChannelState) -> R) -> Result<R, MotorError> {
        self.with_state(|s| {
            if self.retired.load(Ordering::SeqCst) {
                return Err(MotorError::ChannelNotFound);
            }
            Ok(f(s))
        })
    }

    fn arm(&self) {
        if self
            .armed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        // The timer is started under the bus lock, where teardown retires the
        // channel; a teardown that gets the lock first leaves nothing to start,
        // one that gets it later cancels what was started here.
        let started = self.bus.lock(|bus| {
            if self.retired.load(Ordering::SeqCst) {
                return false;
            }
            let (index, interval) = self.with_state(|s| (s.phase_index(), s.interval()));
            // failures are already logged per pin; the next tick re-drives the pins
            let _ = self.actuator.apply(&mut *bus.borrow_mut(), index);
            self.timer.start(interval);
            true
        });
        if started {
            debug!("channel armed");
        } else {
            self.armed.store(false, Ordering::Release);
        }
    }
}

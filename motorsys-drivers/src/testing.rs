//! Recording fakes shared by the driver tests

use core::time::Duration;
use std::vec::Vec;

use motorsys_core::{StepChannel, TickOutcome, TickTimer};
use motorsys_hal::{IoError, Level, OutputBus, PinId, PwmBus, PwmId};
use portable_atomic::{AtomicBool, AtomicU32, Ordering};

pub use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex as TestMutex;

/// Every pin and PWM operation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Pin(PinId, Level),
    Configure(PwmId, u8, u32),
    Enable(PwmId),
    Disable(PwmId),
}

#[derive(Default)]
pub struct FakeBus {
    pub ops: Vec<Op>,
    pub broken_pin: Option<PinId>,
}

impl FakeBus {
    /// Last level written to `pin`
    pub fn level(&self, pin: PinId) -> Option<Level> {
        self.ops.iter().rev().find_map(|op| match op {
            Op::Pin(p, level) if *p == pin => Some(*level),
            _ => None,
        })
    }

    pub fn pin_writes(&self) -> usize {
        self.ops.iter().filter(|op| matches!(op, Op::Pin(..))).count()
    }
}

impl OutputBus for FakeBus {
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        self.ops.push(Op::Pin(pin, level));
        if self.broken_pin == Some(pin) {
            return Err(IoError::WriteFailed(pin));
        }
        Ok(())
    }
}

impl PwmBus for FakeBus {
    fn configure(&mut self, channel: PwmId, duty_percent: u8, period_ns: u32) -> Result<(), IoError> {
        self.ops.push(Op::Configure(channel, duty_percent, period_ns));
        Ok(())
    }

    fn enable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.ops.push(Op::Enable(channel));
        Ok(())
    }

    fn disable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.ops.push(Op::Disable(channel));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTimer {
    pub starts: AtomicU32,
    pub running: AtomicBool,
}

impl FakeTimer {
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl TickTimer for FakeTimer {
    fn start(&self, _after: Duration) {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.running.store(true, Ordering::SeqCst);
    }

    fn cancel(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Fire the timer until the channel goes idle; returns the tick count
pub fn run_to_idle<B: OutputBus>(ch: &StepChannel<TestMutex, B, FakeTimer>) -> u32 {
    let mut ticks = 0;
    while ch.timer().is_running() {
        if ch.tick() == TickOutcome::Disarm {
            ch.timer().running.store(false, Ordering::SeqCst);
        }
        ch.run_deferred();
        ticks += 1;
    }
    ticks
}

//! Shared output bus
//!
//! Multi-channel drivers put several channels on one set of GPIO and PWM
//! peripherals. Each channel gets a [`SharedBus`] handle; every write locks
//! the shared peripherals for the duration of that one write.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_hal::{IoError, Level, OutputBus, PinId, PwmBus, PwmId};

/// Handle onto peripherals shared between channels
pub struct SharedBus<'a, M: RawMutex, B> {
    inner: &'a Mutex<M, RefCell<B>>,
}

impl<M: RawMutex, B> Clone for SharedBus<'_, M, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: RawMutex, B> Copy for SharedBus<'_, M, B> {}

impl<'a, M: RawMutex, B> SharedBus<'a, M, B> {
    pub fn new(inner: &'a Mutex<M, RefCell<B>>) -> Self {
        Self { inner }
    }

    /// Run `f` with exclusive access to the peripherals
    pub fn with<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}

impl<M: RawMutex, B: OutputBus> OutputBus for SharedBus<'_, M, B> {
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        self.with(|bus| bus.set_pin(pin, level))
    }
}

impl<M: RawMutex, B: PwmBus> PwmBus for SharedBus<'_, M, B> {
    fn configure(
        &mut self,
        channel: PwmId,
        duty_percent: u8,
        period_ns: u32,
    ) -> Result<(), IoError> {
        self.with(|bus| bus.configure(channel, duty_percent, period_ns))
    }

    fn enable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.with(|bus| bus.enable(channel))
    }

    fn disable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.with(|bus| bus.disable(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::tests::RecordingBus;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn test_handles_write_to_one_bus() {
        let shared: Mutex<CriticalSectionRawMutex, _> = Mutex::new(RefCell::new(RecordingBus::default()));
        let mut left = SharedBus::new(&shared);
        let mut right = left;
        left.set_pin(9, Level::High).unwrap();
        right.set_pin(27, Level::Low).unwrap();
        let writes = left.with(|bus| bus.writes.clone());
        assert_eq!(writes, [(9, Level::High), (27, Level::Low)]);
    }
}

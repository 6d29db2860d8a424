//! PWM duty-cycle abstractions
//!
//! DC motor channels reconfigure their duty cycle synchronously when the
//! speed changes, and enable or disable the PWM output with the motor.

use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;

use crate::gpio::IoError;

/// PWM channel number
pub type PwmId = u8;

/// Duty-cycle configuration by PWM channel number
pub trait PwmBus {
    /// Configure the duty cycle (0-100%) and period of a channel
    fn configure(&mut self, channel: PwmId, duty_percent: u8, period_ns: u32)
        -> Result<(), IoError>;

    /// Start driving the configured duty cycle
    fn enable(&mut self, channel: PwmId) -> Result<(), IoError>;

    /// Stop driving the output (held low)
    fn disable(&mut self, channel: PwmId) -> Result<(), IoError>;
}

impl<T: PwmBus + ?Sized> PwmBus for &mut T {
    fn configure(
        &mut self,
        channel: PwmId,
        duty_percent: u8,
        period_ns: u32,
    ) -> Result<(), IoError> {
        (**self).configure(channel, duty_percent, period_ns)
    }

    fn enable(&mut self, channel: PwmId) -> Result<(), IoError> {
        (**self).enable(channel)
    }

    fn disable(&mut self, channel: PwmId) -> Result<(), IoError> {
        (**self).disable(channel)
    }
}

/// State of one PWM output in a [`PwmBank`]
struct PwmSlot<P> {
    id: PwmId,
    out: P,
    duty_percent: u8,
    enabled: bool,
}

/// A fixed set of `embedded-hal` PWM outputs addressed by channel number
///
/// The period is fixed when the underlying peripheral is set up, so
/// `configure` only applies the duty cycle. A disabled channel is held fully
/// off and remembers its duty cycle for the next `enable`.
pub struct PwmBank<P, const N: usize> {
    slots: Vec<PwmSlot<P>, N>,
}

impl<P: SetDutyCycle, const N: usize> Default for PwmBank<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SetDutyCycle, const N: usize> PwmBank<P, N> {
    /// Create an empty bank
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Attach a PWM output under its channel number, initially disabled
    pub fn attach(&mut self, id: PwmId, out: P) -> Result<(), P> {
        if self.slots.iter().any(|s| s.id == id) {
            return Err(out);
        }
        self.slots
            .push(PwmSlot {
                id,
                out,
                duty_percent: 100,
                enabled: false,
            })
            .map_err(|slot| slot.out)
    }

    /// Get the last configured duty cycle of a channel
    pub fn duty_percent(&self, id: PwmId) -> Option<u8> {
        self.slots
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.duty_percent)
    }

    /// Check if a channel is enabled
    pub fn is_enabled(&self, id: PwmId) -> bool {
        self.slots.iter().any(|s| s.id == id && s.enabled)
    }

    fn slot(&mut self, id: PwmId) -> Result<&mut PwmSlot<P>, IoError> {
        self.slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(IoError::UnknownPwm(id))
    }
}

impl<P: SetDutyCycle, const N: usize> PwmBus for PwmBank<P, N> {
    fn configure(
        &mut self,
        channel: PwmId,
        duty_percent: u8,
        _period_ns: u32,
    ) -> Result<(), IoError> {
        let slot = self.slot(channel)?;
        slot.duty_percent = duty_percent.min(100);
        if slot.enabled {
            slot.out
                .set_duty_cycle_percent(slot.duty_percent)
                .map_err(|_| IoError::PwmFailed(channel))?;
        }
        Ok(())
    }

    fn enable(&mut self, channel: PwmId) -> Result<(), IoError> {
        let slot = self.slot(channel)?;
        slot.out
            .set_duty_cycle_percent(slot.duty_percent)
            .map_err(|_| IoError::PwmFailed(channel))?;
        slot.enabled = true;
        Ok(())
    }

    fn disable(&mut self, channel: PwmId) -> Result<(), IoError> {
        let slot = self.slot(channel)?;
        slot.enabled = false;
        slot.out
            .set_duty_cycle_fully_off()
            .map_err(|_| IoError::PwmFailed(channel))
    }
}

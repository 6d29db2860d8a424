//! Board output bus
//!
//! All motor GPIO and PWM outputs of the board, addressed by the numbers the
//! drivers are configured with.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_rp::pwm::PwmOutput;
use motorsys_hal::{IoError, Level, OutputBus, PinBank, PinId, PwmBank, PwmBus, PwmId};

/// Motor GPIO count, enable pins included
pub const MAX_PINS: usize = 24;

/// PWM outputs used for DC speed
pub const MAX_PWMS: usize = 2;

pub struct BoardBus {
    pins: PinBank<Output<'static>, MAX_PINS>,
    pwm: PwmBank<PwmOutput<'static>, MAX_PWMS>,
}

impl BoardBus {
    pub const fn new() -> Self {
        Self {
            pins: PinBank::new(),
            pwm: PwmBank::new(),
        }
    }

    /// Attach an output pin under its GPIO number
    pub fn attach_pin(&mut self, id: PinId, pin: Output<'static>) {
        if self.pins.attach(id, pin).is_err() {
            error!("GPIO{} not attached", id);
        }
    }

    /// Attach a PWM output under its driver channel number
    pub fn attach_pwm(&mut self, id: PwmId, out: Option<PwmOutput<'static>>) {
        match out {
            Some(out) => {
                if self.pwm.attach(id, out).is_err() {
                    error!("PWM {} not attached", id);
                }
            }
            None => error!("PWM {} has no output", id),
        }
    }

    pub fn pin_count(&self) -> usize {
        self.pins.len()
    }
}

impl OutputBus for BoardBus {
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        self.pins.set_pin(pin, level)
    }
}

impl PwmBus for BoardBus {
    fn configure(&mut self, channel: PwmId, duty_percent: u8, period_ns: u32) -> Result<(), IoError> {
        self.pwm.configure(channel, duty_percent, period_ns)
    }

    fn enable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.pwm.enable(channel)
    }

    fn disable(&mut self, channel: PwmId) -> Result<(), IoError> {
        self.pwm.disable(channel)
    }
}

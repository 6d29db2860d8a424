//! Channel configuration types
//!
//! Board definitions describe each motor channel with one of these structs.
//! Drivers validate a config before claiming any pin.

use heapless::Vec;
use motorsys_hal::{PinId, PwmId};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::channel::{Bounds, PinSet, DEFAULT_PULSE_RATE, MAX_PULSE_RATE, MIN_PULSE_RATE};
use crate::error::MotorError;
use crate::registry::{motor_name, MotorName};
use crate::table::StepMode;

/// Default PWM period for DC channels (50 us)
pub const DEFAULT_PWM_PERIOD_NS: u32 = 50_000;

/// Stepper channel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepperChannelConfig {
    /// Channel name
    pub name: MotorName,
    /// Coil lead pins
    pub pins: PinSet,
    /// Phase table
    pub mode: StepMode,
    /// Initial pulse rate (pulses per second)
    pub pulse_rate: u32,
    /// Travel bounds for position targets on bank channels; unbounded
    /// targets are capped at `MAX_TRAVEL`
    pub bounds: Option<Bounds>,
    /// Put the channel in standby on suspend
    pub suspend: bool,
}

impl StepperChannelConfig {
    /// Two-phase channel at the default pulse rate
    pub fn new(name: &str, pins: PinSet) -> Result<Self, MotorError> {
        Ok(Self {
            name: motor_name(name)?,
            pins,
            mode: StepMode::TwoPhase,
            pulse_rate: DEFAULT_PULSE_RATE,
            bounds: None,
            suspend: false,
        })
    }

    pub fn with_mode(mut self, mode: StepMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_pulse_rate(mut self, pulse_rate: u32) -> Self {
        self.pulse_rate = pulse_rate;
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_suspend(mut self, suspend: bool) -> Self {
        self.suspend = suspend;
        self
    }

    /// Check pulse rate, bounds and that the four pins are distinct
    pub fn validate(&self) -> Result<(), MotorError> {
        if !(MIN_PULSE_RATE..=MAX_PULSE_RATE).contains(&self.pulse_rate) {
            return Err(MotorError::InvalidArgument);
        }
        if let Some(bounds) = self.bounds {
            bounds.validate()?;
        }
        ensure_distinct(&self.pins.as_array())
    }
}

/// DC channel pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DcPins {
    /// Positive terminal (high for forward)
    pub positive: PinId,
    /// Negative terminal (high for backward)
    pub negative: PinId,
    /// Driver enable, high while the channel is driven
    pub enable: Option<PinId>,
}

impl DcPins {
    pub const fn new(positive: PinId, negative: PinId) -> Self {
        Self {
            positive,
            negative,
            enable: None,
        }
    }

    pub const fn with_enable(mut self, enable: PinId) -> Self {
        self.enable = Some(enable);
        self
    }

    /// Every pin the channel owns
    pub fn as_vec(&self) -> Vec<PinId, 3> {
        let mut pins = Vec::new();
        for pin in [Some(self.positive), Some(self.negative), self.enable]
            .into_iter()
            .flatten()
        {
            // capacity 3 matches the three possible pins
            let _ = pins.push(pin);
        }
        pins
    }
}

/// PWM channel used for DC speed control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PwmBinding {
    /// PWM channel number
    pub channel: PwmId,
    /// Period in nanoseconds
    pub period_ns: u32,
}

impl PwmBinding {
    pub const fn new(channel: PwmId) -> Self {
        Self {
            channel,
            period_ns: DEFAULT_PWM_PERIOD_NS,
        }
    }
}

/// DC channel configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DcChannelConfig {
    /// Channel name
    pub name: MotorName,
    /// Direction and enable pins
    pub pins: DcPins,
    /// Dedicated PWM channel; `None` uses the bank's shared PWM
    pub pwm: Option<PwmBinding>,
    /// Initial duty cycle in percent
    pub duty: u8,
    /// Put the channel in standby on suspend
    pub suspend: bool,
}

impl DcChannelConfig {
    /// Channel at full duty with no dedicated PWM
    pub fn new(name: &str, pins: DcPins) -> Result<Self, MotorError> {
        Ok(Self {
            name: motor_name(name)?,
            pins,
            pwm: None,
            duty: 100,
            suspend: false,
        })
    }

    pub fn with_pwm(mut self, pwm: PwmBinding) -> Self {
        self.pwm = Some(pwm);
        self
    }

    pub fn with_duty(mut self, duty: u8) -> Self {
        self.duty = duty;
        self
    }

    pub fn with_suspend(mut self, suspend: bool) -> Self {
        self.suspend = suspend;
        self
    }

    /// Check duty, PWM period and that the pins are distinct
    pub fn validate(&self) -> Result<(), MotorError> {
        if self.duty > 100 {
            return Err(MotorError::InvalidArgument);
        }
        if self.pwm.is_some_and(|pwm| pwm.period_ns == 0) {
            return Err(MotorError::InvalidArgument);
        }
        ensure_distinct(&self.pins.as_vec())
    }
}

fn ensure_distinct(pins: &[PinId]) -> Result<(), MotorError> {
    for (i, pin) in pins.iter().enumerate() {
        if pins[i + 1..].contains(pin) {
            return Err(MotorError::InvalidArgument);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepper_config_defaults() {
        let cfg = StepperChannelConfig::new("stepper", PinSet::new(18, 23, 24, 25)).unwrap();
        assert_eq!(cfg.mode, StepMode::TwoPhase);
        assert_eq!(cfg.pulse_rate, 200);
        assert!(cfg.bounds.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_stepper_config_rejects() {
        let pins = PinSet::new(18, 23, 24, 25);
        let cfg = StepperChannelConfig::new("s", pins).unwrap();
        assert!(cfg.clone().with_pulse_rate(0).validate().is_err());
        assert!(cfg.clone().with_pulse_rate(6000).validate().is_err());
        assert!(cfg
            .clone()
            .with_bounds(Bounds::new(10, -10))
            .validate()
            .is_err());
        let dup = StepperChannelConfig::new("s", PinSet::new(1, 2, 3, 1)).unwrap();
        assert_eq!(dup.validate(), Err(MotorError::InvalidArgument));
        assert!(StepperChannelConfig::new("", pins).is_err());
    }

    #[test]
    fn test_dc_config() {
        let pins = DcPins::new(9, 11).with_enable(10);
        assert_eq!(pins.as_vec().as_slice(), &[9, 11, 10]);
        let cfg = DcChannelConfig::new("wheel-right", pins)
            .unwrap()
            .with_pwm(PwmBinding::new(1));
        assert_eq!(cfg.pwm.map(|p| p.period_ns), Some(DEFAULT_PWM_PERIOD_NS));
        assert!(cfg.validate().is_ok());
        assert!(cfg.clone().with_duty(101).validate().is_err());
        let clash = DcChannelConfig::new("x", DcPins::new(9, 9)).unwrap();
        assert!(clash.validate().is_err());
    }
}

//! Board definition
//!
//! Pin and PWM assignments for a Raspberry Pi Pico driving:
//!
//! | motor         | driver  | pins                      |
//! |---------------|---------|---------------------------|
//! | `stepper`     | ULN2003 | GPIO2-5                   |
//! | `pan`, `tilt` | ULN2003 | GPIO6-9, GPIO10-13        |
//! | `dc`          | L9110   | GPIO14, GPIO15            |
//! | `wheel-right` | L293D   | GPIO16, GPIO17, PWM 1     |
//! | `wheel-left`  | L293D   | GPIO19, GPIO20, EN GPIO21 |
//!
//! PWM 1 is slice 1 output A on GPIO18, PWM 0 (shared by the bank) is slice 3
//! output A on GPIO22. The console is UART0 on GPIO0/GPIO1.

use motorsys_core::{
    Bounds, DcChannelConfig, DcPins, MotorError, PinSet, PwmBinding, StepMode,
    StepperChannelConfig, DEFAULT_PWM_PERIOD_NS,
};
use motorsys_hal::PwmId;

/// Stepper on its own GPIO
pub const STEPPER_PINS: PinSet = PinSet::new(2, 3, 4, 5);

/// Pan/tilt bank
pub const PAN_PINS: PinSet = PinSet::new(6, 7, 8, 9);
pub const TILT_PINS: PinSet = PinSet::new(10, 11, 12, 13);

/// Tilt travel, in half steps
pub const TILT_BOUNDS: Bounds = Bounds::new(-1024, 1024);

/// Simple DC motor
pub const DC_PINS: DcPins = DcPins::new(14, 15);

/// DC bank
pub const WHEEL_RIGHT_PINS: DcPins = DcPins::new(16, 17);
pub const WHEEL_LEFT_PINS: DcPins = DcPins::new(19, 20).with_enable(21);

/// PWM channel numbers as seen by the drivers
pub const SHARED_PWM: PwmId = 0;
pub const WHEEL_RIGHT_PWM: PwmId = 1;

/// System clock the PWM `top` values are derived from
pub const SYS_CLOCK_HZ: u32 = 125_000_000;

/// PWM counter wrap for the default period
pub const PWM_TOP: u16 = (SYS_CLOCK_HZ / 1_000 * (DEFAULT_PWM_PERIOD_NS / 1_000) / 1_000 - 1) as u16;

/// Console baud rate
pub const CONSOLE_BAUD: u32 = 115_200;

pub fn stepper() -> Result<StepperChannelConfig, MotorError> {
    Ok(StepperChannelConfig::new("stepper", STEPPER_PINS)?.with_suspend(true))
}

pub fn pan() -> Result<StepperChannelConfig, MotorError> {
    Ok(StepperChannelConfig::new("pan", PAN_PINS)?
        .with_mode(StepMode::HalfStep)
        .with_suspend(true))
}

pub fn tilt() -> Result<StepperChannelConfig, MotorError> {
    Ok(StepperChannelConfig::new("tilt", TILT_PINS)?
        .with_mode(StepMode::HalfStep)
        .with_pulse_rate(400)
        .with_bounds(TILT_BOUNDS)
        .with_suspend(true))
}

pub fn dc() -> Result<DcChannelConfig, MotorError> {
    DcChannelConfig::new("dc", DC_PINS)
}

pub fn wheel_right() -> Result<DcChannelConfig, MotorError> {
    Ok(DcChannelConfig::new("wheel-right", WHEEL_RIGHT_PINS)?
        .with_pwm(PwmBinding::new(WHEEL_RIGHT_PWM))
        .with_duty(60)
        .with_suspend(true))
}

pub fn wheel_left() -> Result<DcChannelConfig, MotorError> {
    Ok(DcChannelConfig::new("wheel-left", WHEEL_LEFT_PINS)?.with_suspend(true))
}


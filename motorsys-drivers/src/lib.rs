//! Motor drivers
//!
//! Four variants share the [`MotorDevice`](motorsys_core::MotorDevice)
//! command surface:
//!
//! | variant | module | channels | speed | position |
//! |---------|--------|----------|-------|----------|
//! | unipolar stepper | [`stepper::unipolar`] | one | pulses/s | no |
//! | stepper bank | [`stepper::bank`] | named | pulses/s | yes |
//! | DC motor | [`dc::simple`] | one | duty 1-100 % | no |
//! | DC bank | [`dc::bank`] | named | duty 0-100 % via PWM | no |
//!
//! Drivers claim their pins from a [`PinAllocator`](motorsys_hal::PinAllocator)
//! on creation and give them back on removal, after the outputs are in
//! standby.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod dc;
pub mod stepper;

pub use dc::bank::{BankDc, DcBank};
pub use dc::simple::DcMotor;
pub use stepper::bank::{BankStepper, StepperBank};
pub use stepper::unipolar::UnipolarStepper;

#[cfg(test)]
pub(crate) mod testing;

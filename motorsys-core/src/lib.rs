//! Board-agnostic motor control logic
//!
//! This crate contains everything that does not depend on a specific board:
//!
//! - Phase pattern tables for two-phase and half-step sequencing
//! - Per-channel stepper state and the tick state machine
//! - The phase actuator, the deferred actuation slot and the shared bus
//! - The step scheduler tying a channel to its timer
//! - The polymorphic `MotorDevice` command surface
//! - Name-based channel registry for multi-channel drivers
//! - Configuration type definitions

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

// Must come first so the logging macros are visible to the other modules
#[macro_use]
mod fmt;

pub mod actuator;
pub mod bus;
pub mod channel;
pub mod config;
pub mod deferred;
pub mod device;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod table;

pub use actuator::PhaseActuator;
pub use bus::SharedBus;
pub use channel::{
    Bounds, ChannelState, PinSet, DEFAULT_PULSE_RATE, MAX_PULSE_RATE, MAX_TRAVEL, MIN_PULSE_RATE,
};
pub use config::{DcChannelConfig, DcPins, PwmBinding, StepperChannelConfig, DEFAULT_PWM_PERIOD_NS};
pub use deferred::DeferredActuation;
pub use device::{MotorDevice, MotorState, MotorType};
pub use error::MotorError;
pub use registry::{motor_name, ChannelRegistry, MotorName};
pub use scheduler::{StepChannel, TickOutcome, TickTimer};
pub use table::{Lead, PhasePattern, StepMode, StepTable};

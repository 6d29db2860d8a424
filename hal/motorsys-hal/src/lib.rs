//! motorsys Hardware Abstraction Layer
//!
//! The motor engine never touches GPIO or PWM registers itself. It consumes
//! two injected capabilities defined here, which board support code
//! implements (directly, or through the `embedded-hal` adapters in this
//! crate).
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  motorsys-core / motorsys-drivers       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  motorsys-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ embedded-hal  │       │  test fakes   │
//! │  pins / PWM   │       │               │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputBus`] - Digital output by pin number
//! - [`pwm::PwmBus`] - Duty-cycle configuration by PWM channel number

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod pwm;

// Re-export key traits at crate root for convenience
pub use gpio::{IoError, Level, OutputBus, PinAllocator, PinBank, PinError, PinId};
pub use pwm::{PwmBank, PwmBus, PwmId};

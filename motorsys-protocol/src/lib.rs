//! Motor attribute protocol
//!
//! The text surface motors are driven through. Each registered motor exposes
//! five attributes:
//!
//! ```text
//! attribute  access  value
//! ---------  ------  -------------------------------------------------
//! type       r       dc motor | stepper motor | servo motor | unknown
//! speed      rw      pulses/s (steppers) or duty percent (DC)
//! ctl        w       <forward|backward|init|mount|unmount|hold|standby> [<n>]
//! state      r       forward | backward | standby | mount | unmount | init | hold
//! pos        rw      signed step count
//! ```
//!
//! A console line names the motor first: `<motor> <attribute> [<value>]`.
//! The bare words `list`, `suspend` and `resume` act on the whole class.

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod attribute;
pub mod class;
pub mod command;

pub use attribute::{show, store, Attribute, AttributeError, Reply};
pub use class::MotorClass;
pub use command::{
    parse_control, parse_number, ConsoleLine, LineParser, ParseError, Request, MAX_LINE_LEN,
};

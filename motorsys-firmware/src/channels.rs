//! Statics shared between tasks
//!
//! One tick timer per stepper channel. The peripherals and channels
//! themselves live in `StaticCell`s set up by `main`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_core::{SharedBus, StepChannel};

use crate::bus::BoardBus;
use crate::timer::SignalTimer;

/// Raw mutex used for everything shared between tasks
pub type BoardMutex = CriticalSectionRawMutex;

/// Board peripherals behind their lock
pub type SharedBoard = Mutex<BoardMutex, RefCell<BoardBus>>;

/// A channel's handle onto the board peripherals
pub type BoardHandle = SharedBus<'static, BoardMutex, BoardBus>;

/// Every stepper channel on this board, single or banked
pub type StepperChannel = StepChannel<BoardMutex, BoardHandle, &'static SignalTimer>;

pub static STEPPER_TIMER: SignalTimer = SignalTimer::new();
pub static PAN_TIMER: SignalTimer = SignalTimer::new();
pub static TILT_TIMER: SignalTimer = SignalTimer::new();

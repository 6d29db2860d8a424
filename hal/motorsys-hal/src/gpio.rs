//! Digital output abstractions
//!
//! Motor channels address their coil and direction leads by pin number and
//! write them through an [`OutputBus`]. Writes are fallible: a failed write is
//! reported to the caller, who decides whether to carry on.

use embedded_hal::digital::{OutputPin, PinState};
use heapless::{FnvIndexSet, Vec};

/// GPIO pin number
pub type PinId = u8;

/// Highest pin number accepted by [`PinAllocator`]
pub const MAX_PIN_ID: PinId = 63;

/// Output level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0, lead de-energized
    #[default]
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Check if this is the high level
    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

/// Errors from pin or PWM output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// No pin with this number is attached to the bus
    UnknownPin(PinId),
    /// The pin driver reported a failure
    WriteFailed(PinId),
    /// No PWM channel with this number is attached
    UnknownPwm(u8),
    /// The PWM driver reported a failure
    PwmFailed(u8),
}

/// Digital output by pin number
///
/// This is the only way the motor engine changes pin levels. Implementations
/// must not block for longer than a register write.
pub trait OutputBus {
    /// Drive `pin` to `level`
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError>;
}

impl<T: OutputBus + ?Sized> OutputBus for &mut T {
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        (**self).set_pin(pin, level)
    }
}

/// A fixed set of `embedded-hal` output pins addressed by pin number
///
/// Lets any `embedded_hal::digital::OutputPin` (an `embassy_rp::gpio::Output`,
/// for example) back an [`OutputBus`].
pub struct PinBank<P, const N: usize> {
    pins: Vec<(PinId, P), N>,
}

impl<P: OutputPin, const N: usize> Default for PinBank<P, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin, const N: usize> PinBank<P, N> {
    /// Create an empty bank
    pub const fn new() -> Self {
        Self { pins: Vec::new() }
    }

    /// Attach a pin under its number
    ///
    /// Returns the pin back if the bank is full or the number is taken.
    pub fn attach(&mut self, id: PinId, pin: P) -> Result<(), P> {
        if self.pins.iter().any(|(existing, _)| *existing == id) {
            return Err(pin);
        }
        self.pins.push((id, pin)).map_err(|(_, pin)| pin)
    }

    /// Number of attached pins
    pub fn len(&self) -> usize {
        self.pins.len()
    }

    /// Check if no pins are attached
    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }
}

impl<P: OutputPin, const N: usize> OutputBus for PinBank<P, N> {
    fn set_pin(&mut self, pin: PinId, level: Level) -> Result<(), IoError> {
        let (_, out) = self
            .pins
            .iter_mut()
            .find(|(id, _)| *id == pin)
            .ok_or(IoError::UnknownPin(pin))?;
        out.set_state(level.into())
            .map_err(|_| IoError::WriteFailed(pin))
    }
}

/// Errors from pin claiming
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinError {
    /// Pin number out of range
    OutOfRange(PinId),
    /// Pin already claimed by another channel
    InUse(PinId),
    /// Allocator is full
    Exhausted,
}

/// Tracks which pins are owned by a motor channel
///
/// Channels claim their pins when they are created and release them only
/// after teardown has driven them low.
pub struct PinAllocator {
    /// Set of claimed pins
    claimed: FnvIndexSet<PinId, 64>,
}

impl Default for PinAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PinAllocator {
    /// Create a new allocator with no pins claimed
    pub fn new() -> Self {
        Self {
            claimed: FnvIndexSet::new(),
        }
    }

    /// Claim a single pin
    pub fn claim(&mut self, pin: PinId) -> Result<(), PinError> {
        if pin > MAX_PIN_ID {
            return Err(PinError::OutOfRange(pin));
        }
        if self.claimed.contains(&pin) {
            return Err(PinError::InUse(pin));
        }
        self.claimed.insert(pin).map_err(|_| PinError::Exhausted)?;
        Ok(())
    }

    /// Claim every pin in `pins`, or none of them
    pub fn claim_all(&mut self, pins: &[PinId]) -> Result<(), PinError> {
        for (i, &pin) in pins.iter().enumerate() {
            if let Err(e) = self.claim(pin) {
                for &taken in &pins[..i] {
                    self.release(taken);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Release a pin
    pub fn release(&mut self, pin: PinId) {
        self.claimed.remove(&pin);
    }

    /// Release every pin in `pins`
    pub fn release_all(&mut self, pins: &[PinId]) {
        for &pin in pins {
            self.release(pin);
        }
    }

    /// Check if a pin is claimed
    pub fn is_claimed(&self, pin: PinId) -> bool {
        self.claimed.contains(&pin)
    }

    /// Get the number of claimed pins
    pub fn claimed_count(&self) -> usize {
        self.claimed.len()
    }
}

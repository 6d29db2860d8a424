//! Phase pattern tables
//!
//! A stepper channel walks through a table of phase patterns, one entry per
//! tick. Each pattern is a bit set over the four coil leads:
//!
//! ```text
//! bit 0: A     bit 1: B     bit 2: /A     bit 3: /B
//! ```
//!
//! Two tables exist: the 4-entry two-phase (full step) table used for
//! unipolar 28BYJ-48 style motors, and the 8-entry half-step table used on
//! bipolar motors behind an L293D style driver.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coil lead of a four-wire stepper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lead {
    /// Coil A
    A,
    /// Coil B
    B,
    /// Coil A, reverse polarity
    ANot,
    /// Coil B, reverse polarity
    BNot,
}

impl Lead {
    /// All leads, in the order they are written
    pub const ALL: [Lead; 4] = [Lead::A, Lead::B, Lead::ANot, Lead::BNot];

    /// Bit of this lead within a [`PhasePattern`]
    pub const fn mask(self) -> u8 {
        match self {
            Lead::A => 0x01,
            Lead::B => 0x02,
            Lead::ANot => 0x04,
            Lead::BNot => 0x08,
        }
    }
}

/// Energized leads for one step position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhasePattern(u8);

impl PhasePattern {
    /// No lead energized
    pub const STANDBY: PhasePattern = PhasePattern(0);

    /// Create a pattern from its bit representation (upper bits ignored)
    pub const fn from_bits(bits: u8) -> Self {
        PhasePattern(bits & 0x0f)
    }

    /// Get the bit representation
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check if a lead is energized in this pattern
    pub const fn is_energized(self, lead: Lead) -> bool {
        self.0 & lead.mask() != 0
    }
}

/// Ordered table of phase patterns
#[derive(Debug, PartialEq, Eq)]
pub struct StepTable {
    patterns: &'static [PhasePattern],
}

/// Two-phase full-step sequence (two coils energized at all times)
pub static TWO_PHASE: StepTable = StepTable {
    patterns: &[
        PhasePattern::from_bits(0x03),
        PhasePattern::from_bits(0x06),
        PhasePattern::from_bits(0x0c),
        PhasePattern::from_bits(0x09),
    ],
};

/// One-two phase half-step sequence
pub static HALF_STEP: StepTable = StepTable {
    patterns: &[
        PhasePattern::from_bits(0x01),
        PhasePattern::from_bits(0x03),
        PhasePattern::from_bits(0x02),
        PhasePattern::from_bits(0x06),
        PhasePattern::from_bits(0x04),
        PhasePattern::from_bits(0x0c),
        PhasePattern::from_bits(0x08),
        PhasePattern::from_bits(0x09),
    ],
};

impl StepTable {
    /// Number of entries
    pub const fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Tables are never empty
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Look up the pattern for a sequence index
    ///
    /// Any index outside `[0, len)`, conventionally `-1`, means standby and
    /// yields `None`.
    pub fn get(&self, index: i32) -> Option<PhasePattern> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.patterns.get(i))
            .copied()
    }

    /// Index one step back in the table, wrapping
    pub const fn previous(&self, index: usize) -> usize {
        (index + self.len() - 1) % self.len()
    }

    /// Index one step forward in the table, wrapping
    pub const fn next(&self, index: usize) -> usize {
        (index + 1) % self.len()
    }
}

/// Stepping mode of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StepMode {
    /// 4-entry two-phase table
    #[default]
    TwoPhase,
    /// 8-entry half-step table
    HalfStep,
}

impl StepMode {
    /// Get the table for this mode
    pub fn table(self) -> &'static StepTable {
        match self {
            StepMode::TwoPhase => &TWO_PHASE,
            StepMode::HalfStep => &HALF_STEP,
        }
    }
}

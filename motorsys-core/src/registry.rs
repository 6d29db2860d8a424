//! Name-based channel registry
//!
//! Multi-channel drivers expose several logical motors over one driver IC.
//! Each motor device resolves its physical channel by name through this
//! registry.

use heapless::{String, Vec};

use crate::error::MotorError;

/// Maximum length of a motor name
pub const MAX_NAME_LEN: usize = 16;

/// Motor or channel name
pub type MotorName = String<MAX_NAME_LEN>;

/// Make a [`MotorName`], rejecting names that are empty or too long
pub fn motor_name(name: &str) -> Result<MotorName, MotorError> {
    if name.is_empty() {
        return Err(MotorError::InvalidArgument);
    }
    MotorName::try_from(name).map_err(|_| MotorError::InvalidArgument)
}

/// Fixed-capacity map from channel name to channel
pub struct ChannelRegistry<C, const N: usize> {
    entries: Vec<(MotorName, C), N>,
}

impl<C, const N: usize> Default for ChannelRegistry<C, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, const N: usize> ChannelRegistry<C, N> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a channel under a unique name
    pub fn register(&mut self, name: &str, channel: C) -> Result<(), MotorError> {
        let name = motor_name(name)?;
        if self.entries.iter().any(|(n, _)| *n == name) {
            return Err(MotorError::InvalidArgument);
        }
        self.entries
            .push((name, channel))
            .map_err(|_| MotorError::RegistryFull)
    }

    /// Resolve a channel by name
    pub fn lookup(&self, name: &str) -> Result<&C, MotorError> {
        self.get(name).ok_or_else(|| {
            warn!("no channel named {}", name);
            MotorError::ChannelNotFound
        })
    }

    pub fn get(&self, name: &str) -> Option<&C> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, c)| c)
    }

    /// Iterate over `(name, channel)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &C)> {
        self.entries.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

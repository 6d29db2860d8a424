//! Multi-channel stepper bank
//!
//! Bipolar steppers behind an L293D style dual H-bridge. Every channel is a
//! named [`StepChannel`] walking the half-step table on its own timer; all
//! channels share one set of GPIO through a [`SharedBus`]. Logical motor
//! devices ([`BankStepper`]) hold only a name and resolve their channel on
//! every call, so a removed or misnamed channel reports
//! [`MotorError::ChannelNotFound`] instead of touching pins.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_core::{
    motor_name, ChannelRegistry, ChannelState, MotorDevice, MotorError, MotorName, MotorState,
    MotorType, PinSet, SharedBus, StepChannel, StepperChannelConfig, TickTimer,
};
use motorsys_hal::{OutputBus, PinAllocator};

use super::{state_detail, StateText};

/// Channel type used inside a bank
pub type BankChannel<'a, M, B, T> = StepChannel<M, SharedBus<'a, M, B>, T>;

struct Entry<'a, M: RawMutex, B, T> {
    channel: BankChannel<'a, M, B, T>,
    pins: PinSet,
    suspend: bool,
}

/// Named stepper channels on shared GPIO
pub struct StepperBank<'a, M: RawMutex, B, T, const N: usize> {
    bus: &'a Mutex<M, RefCell<B>>,
    channels: ChannelRegistry<Entry<'a, M, B, T>, N>,
}

impl<'a, M: RawMutex, B: OutputBus, T: TickTimer, const N: usize> StepperBank<'a, M, B, T, N> {
    pub fn new(bus: &'a Mutex<M, RefCell<B>>) -> Self {
        Self {
            bus,
            channels: ChannelRegistry::new(),
        }
    }

    /// Add a channel, claiming its pins and putting them in standby
    pub fn add_channel(
        &mut self,
        config: &StepperChannelConfig,
        timer: T,
        pins: &mut PinAllocator,
    ) -> Result<(), MotorError> {
        config.validate()?;
        let mut state = ChannelState::new(config.pins, config.mode.table());
        if let Some(bounds) = config.bounds {
            state = state.with_bounds(bounds);
        }
        state.set_pulse_rate(config.pulse_rate)?;

        let name = config.name.as_str();
        if self.channels.get(name).is_some() {
            return Err(MotorError::InvalidArgument);
        }
        if self.channels.len() == N {
            return Err(MotorError::RegistryFull);
        }
        pins.claim_all(&config.pins.as_array())?;

        let channel = StepChannel::new(state, SharedBus::new(self.bus), timer);
        if let Err(e) = channel.actuate_now() {
            warn!("stepper {}: standby on create failed: {}", name, e);
        }
        let entry = Entry {
            channel,
            pins: config.pins,
            suspend: config.suspend,
        };
        if let Err(e) = self.channels.register(name, entry) {
            pins.release_all(&config.pins.as_array());
            return Err(e);
        }
        info!("stepper {} added to bank", name);
        Ok(())
    }

    /// Resolve a channel by name
    pub fn lookup(&self, name: &str) -> Result<&BankChannel<'a, M, B, T>, MotorError> {
        self.channels.lookup(name).map(|entry| &entry.channel)
    }

    /// Motor device for a named channel
    pub fn device(&self, name: &str) -> Result<BankStepper<'_, 'a, M, B, T, N>, MotorError> {
        self.channels.lookup(name)?;
        Ok(BankStepper {
            bank: self,
            name: motor_name(name)?,
        })
    }

    /// Iterate over `(name, channel)` pairs
    pub fn channels(&self) -> impl Iterator<Item = (&str, &BankChannel<'a, M, B, T>)> {
        self.channels.iter().map(|(name, entry)| (name, &entry.channel))
    }

    /// State with the remaining step count of a named channel
    pub fn state_detail(&self, name: &str) -> Result<StateText, MotorError> {
        Ok(state_detail(self.lookup(name)?.position()))
    }

    /// Tear down every channel and give the pins back
    ///
    /// Returns the first standby failure; every channel is torn down
    /// regardless.
    pub fn remove(&self, pins: &mut PinAllocator) -> Result<(), MotorError> {
        let mut result = Ok(());
        for (name, entry) in self.channels.iter() {
            if let Err(e) = entry.channel.teardown() {
                error!("stepper {}: teardown failed: {}", name, e);
                if result.is_ok() {
                    result = Err(e);
                }
            }
            pins.release_all(&entry.pins.as_array());
        }
        info!("stepper bank removed");
        result
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn live(&self, name: &str) -> Result<&Entry<'a, M, B, T>, MotorError> {
        let entry = self.channels.lookup(name)?;
        if entry.channel.is_retired() {
            return Err(MotorError::ChannelNotFound);
        }
        Ok(entry)
    }
}

/// A logical motor on one channel of a [`StepperBank`]
pub struct BankStepper<'b, 'a, M: RawMutex, B, T, const N: usize> {
    bank: &'b StepperBank<'a, M, B, T, N>,
    name: MotorName,
}

impl<M: RawMutex, B: OutputBus, T: TickTimer, const N: usize> MotorDevice
    for BankStepper<'_, '_, M, B, T, N>
{
    fn name(&self) -> &str {
        &self.name
    }

    fn motor_type(&self) -> MotorType {
        MotorType::Stepper
    }

    fn supports_suspend(&self) -> bool {
        self.bank
            .channels
            .get(&self.name)
            .is_some_and(|entry| entry.suspend)
    }

    fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError> {
        self.bank.lookup(&self.name)?.control(command, magnitude)
    }

    fn state(&self) -> Result<MotorState, MotorError> {
        Ok(self.bank.live(&self.name)?.channel.motor_state())
    }

    fn set_speed(&self, value: u32) -> Result<(), MotorError> {
        self.bank.lookup(&self.name)?.set_pulse_rate(value)
    }

    fn speed(&self) -> Result<u32, MotorError> {
        Ok(self.bank.live(&self.name)?.channel.pulse_rate())
    }

    fn set_position(&self, value: i32) -> Result<(), MotorError> {
        self.bank.lookup(&self.name)?.set_position(value)
    }

    fn position(&self) -> Result<i32, MotorError> {
        Ok(self.bank.live(&self.name)?.channel.position())
    }
}

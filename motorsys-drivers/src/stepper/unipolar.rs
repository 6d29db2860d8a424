//! Single-channel unipolar stepper
//!
//! A 28BYJ-48 style motor behind a ULN2003 darlington array: four coil
//! leads driven straight from GPIO, walked through the two-phase table.
//! There is no travel model, so position is not available.

use embassy_sync::blocking_mutex::raw::RawMutex;
use motorsys_core::{
    ChannelState, MotorDevice, MotorError, MotorName, MotorState, MotorType, PinSet, StepChannel,
    StepperChannelConfig, TickTimer,
};
use motorsys_hal::{OutputBus, PinAllocator};

use super::{state_detail, StateText};

/// One stepper on its own pins and timer
pub struct UnipolarStepper<M: RawMutex, B, T> {
    name: MotorName,
    pins: PinSet,
    suspend: bool,
    channel: StepChannel<M, B, T>,
}

impl<M: RawMutex, B: OutputBus, T: TickTimer> UnipolarStepper<M, B, T> {
    /// Claim the pins and put them in standby
    pub fn new(
        config: &StepperChannelConfig,
        bus: B,
        timer: T,
        pins: &mut PinAllocator,
    ) -> Result<Self, MotorError> {
        config.validate()?;
        let mut state = ChannelState::new(config.pins, config.mode.table());
        state.set_pulse_rate(config.pulse_rate)?;
        pins.claim_all(&config.pins.as_array())?;

        let channel = StepChannel::new(state, bus, timer);
        if let Err(e) = channel.actuate_now() {
            warn!("stepper {}: standby on create failed: {}", config.name.as_str(), e);
        }
        info!("stepper {} ready", config.name.as_str());
        Ok(Self {
            name: config.name.clone(),
            pins: config.pins,
            suspend: config.suspend,
            channel,
        })
    }

    /// The channel, for the board's timer and actuation tasks
    pub fn channel(&self) -> &StepChannel<M, B, T> {
        &self.channel
    }

    /// State with the remaining step count, e.g. `forward 120`
    pub fn state_detail(&self) -> StateText {
        state_detail(self.channel.position())
    }

    /// Force standby, stop the timer and give the pins back
    pub fn remove(&self, pins: &mut PinAllocator) -> Result<(), MotorError> {
        let result = self.channel.teardown();
        pins.release_all(&self.pins.as_array());
        info!("stepper {} removed", self.name.as_str());
        result
    }

    fn ensure_live(&self) -> Result<(), MotorError> {
        if self.channel.is_retired() {
            return Err(MotorError::ChannelNotFound);
        }
        Ok(())
    }
}

impl<M: RawMutex, B: OutputBus, T: TickTimer> MotorDevice for UnipolarStepper<M, B, T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn motor_type(&self) -> MotorType {
        MotorType::Stepper
    }

    fn supports_suspend(&self) -> bool {
        self.suspend
    }

    fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError> {
        self.channel.control(command, magnitude)
    }

    fn state(&self) -> Result<MotorState, MotorError> {
        self.ensure_live()?;
        Ok(self.channel.motor_state())
    }

    fn set_speed(&self, value: u32) -> Result<(), MotorError> {
        self.channel.set_pulse_rate(value)
    }

    fn speed(&self) -> Result<u32, MotorError> {
        self.ensure_live()?;
        Ok(self.channel.pulse_rate())
    }
}

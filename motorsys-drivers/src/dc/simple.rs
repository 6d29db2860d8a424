//! Simple DC motor
//!
//! One motor on two direction pins and an optional enable pin. Speed is a
//! duty value kept for an external PWM owner; this driver only stores it.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_core::{
    DcChannelConfig, DcPins, MotorDevice, MotorError, MotorName, MotorState, MotorType,
};
use motorsys_hal::{OutputBus, PinAllocator};
use portable_atomic::{AtomicBool, Ordering};

use super::{drive, Levels};

/// Lowest accepted duty (percent)
pub const MIN_DUTY: u32 = 1;

/// Highest accepted duty (percent)
pub const MAX_DUTY: u32 = 100;

/// A DC motor on its own pins
pub struct DcMotor<M: RawMutex, B> {
    name: MotorName,
    pins: DcPins,
    suspend: bool,
    bus: Mutex<M, RefCell<B>>,
    levels: Mutex<M, Cell<Levels>>,
    duty: Mutex<M, Cell<u8>>,
    retired: AtomicBool,
}

impl<M: RawMutex, B: OutputBus> DcMotor<M, B> {
    /// Claim the pins and drive them low
    pub fn new(config: &DcChannelConfig, bus: B, pins: &mut PinAllocator) -> Result<Self, MotorError> {
        config.validate()?;
        if u32::from(config.duty) < MIN_DUTY {
            return Err(MotorError::InvalidArgument);
        }
        pins.claim_all(&config.pins.as_vec())?;

        let motor = Self {
            name: config.name.clone(),
            pins: config.pins,
            suspend: config.suspend,
            bus: Mutex::new(RefCell::new(bus)),
            levels: Mutex::new(Cell::new(Levels::STANDBY)),
            duty: Mutex::new(Cell::new(config.duty)),
            retired: AtomicBool::new(false),
        };
        if let Err(e) = motor.with_bus(|bus| drive(bus, &motor.pins, Levels::STANDBY)) {
            warn!("dc {}: standby on create failed: {}", motor.name.as_str(), e);
        }
        info!("dc {} ready", motor.name.as_str());
        Ok(motor)
    }

    /// Drive standby and give the pins back
    pub fn remove(&self, pins: &mut PinAllocator) -> Result<(), MotorError> {
        let result = self.bus.lock(|bus| {
            self.retired.store(true, Ordering::Release);
            self.levels.lock(|l| l.set(Levels::STANDBY));
            drive(&mut *bus.borrow_mut(), &self.pins, Levels::STANDBY)
        });
        pins.release_all(&self.pins.as_vec());
        info!("dc {} removed", self.name.as_str());
        result.map_err(MotorError::from)
    }

    /// Run `f` with exclusive access to the output bus
    pub fn with_bus<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        self.bus.lock(|bus| f(&mut bus.borrow_mut()))
    }

    fn ensure_live(&self) -> Result<(), MotorError> {
        if self.retired.load(Ordering::Acquire) {
            return Err(MotorError::ChannelNotFound);
        }
        Ok(())
    }
}

impl<M: RawMutex, B: OutputBus> MotorDevice for DcMotor<M, B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn motor_type(&self) -> MotorType {
        MotorType::Dc
    }

    fn supports_suspend(&self) -> bool {
        self.suspend
    }

    fn control(&self, command: MotorState, _magnitude: u32) -> Result<(), MotorError> {
        let levels = Levels::for_command(command);
        self.bus.lock(|bus| {
            self.ensure_live()?;
            self.levels.lock(|l| l.set(levels));
            drive(&mut *bus.borrow_mut(), &self.pins, levels).map_err(MotorError::from)
        })
    }

    fn state(&self) -> Result<MotorState, MotorError> {
        self.ensure_live()?;
        Ok(self.levels.lock(|l| l.get()).state())
    }

    fn set_speed(&self, value: u32) -> Result<(), MotorError> {
        self.ensure_live()?;
        if !(MIN_DUTY..=MAX_DUTY).contains(&value) {
            return Err(MotorError::InvalidArgument);
        }
        self.duty.lock(|d| d.set(value as u8));
        Ok(())
    }

    fn speed(&self) -> Result<u32, MotorError> {
        self.ensure_live()?;
        Ok(u32::from(self.duty.lock(|d| d.get())))
    }
}

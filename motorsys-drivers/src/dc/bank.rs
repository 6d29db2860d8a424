//! Multi-channel DC bank
//!
//! DC motors behind an L293D style driver, each channel a named pair of
//! direction pins with an optional enable pin. Speed is a PWM duty cycle
//! applied synchronously. A channel either has a PWM channel of its own or
//! uses the bank's shared one.
//!
//! The PWM output is enabled while its channel is driven and disabled on
//! standby, unless another channel on the same PWM is still driven.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use motorsys_core::{
    motor_name, ChannelRegistry, DcChannelConfig, DcPins, MotorDevice, MotorError, MotorName,
    MotorState, MotorType, PwmBinding,
};
use motorsys_hal::{IoError, OutputBus, PinAllocator, PwmBus};
use portable_atomic::{AtomicBool, Ordering};

use super::{drive, Levels};

/// Highest accepted duty (percent); zero is allowed
pub const MAX_DUTY: u32 = 100;

struct DcChannel<M: RawMutex> {
    pins: DcPins,
    pwm: Option<PwmBinding>,
    suspend: bool,
    levels: Mutex<M, Cell<Levels>>,
    duty: Mutex<M, Cell<u8>>,
    retired: AtomicBool,
}

impl<M: RawMutex> DcChannel<M> {
    fn levels(&self) -> Levels {
        self.levels.lock(|l| l.get())
    }

    fn is_live(&self) -> bool {
        !self.retired.load(Ordering::Acquire)
    }
}

/// Named DC channels on shared GPIO and PWM
pub struct DcBank<'a, M: RawMutex, B, const N: usize> {
    bus: &'a Mutex<M, RefCell<B>>,
    shared_pwm: Option<PwmBinding>,
    channels: ChannelRegistry<DcChannel<M>, N>,
}

impl<'a, M: RawMutex, B: OutputBus + PwmBus, const N: usize> DcBank<'a, M, B, N> {
    /// Create a bank; `shared_pwm` serves channels without a PWM of their own
    pub fn new(bus: &'a Mutex<M, RefCell<B>>, shared_pwm: Option<PwmBinding>) -> Self {
        Self {
            bus,
            shared_pwm,
            channels: ChannelRegistry::new(),
        }
    }

    /// Add a channel, claiming its pins, driving them low and configuring
    /// its PWM with the initial duty
    pub fn add_channel(
        &mut self,
        config: &DcChannelConfig,
        pins: &mut PinAllocator,
    ) -> Result<(), MotorError> {
        config.validate()?;
        let name = config.name.as_str();
        if self.channels.get(name).is_some() {
            return Err(MotorError::InvalidArgument);
        }
        if self.channels.len() == N {
            return Err(MotorError::RegistryFull);
        }
        pins.claim_all(&config.pins.as_vec())?;

        let channel = DcChannel {
            pins: config.pins,
            pwm: config.pwm.or(self.shared_pwm),
            suspend: config.suspend,
            levels: Mutex::new(Cell::new(Levels::STANDBY)),
            duty: Mutex::new(Cell::new(config.duty)),
            retired: AtomicBool::new(false),
        };
        let setup = self.bus.lock(|bus| {
            let bus = &mut *bus.borrow_mut();
            let driven = drive(bus, &channel.pins, Levels::STANDBY);
            match channel.pwm {
                Some(pwm) => driven.and(bus.configure(pwm.channel, config.duty, pwm.period_ns)),
                None => driven,
            }
        });
        if let Err(e) = setup {
            warn!("dc {}: setup failed: {}", name, e);
        }
        if let Err(e) = self.channels.register(name, channel) {
            pins.release_all(&config.pins.as_vec());
            return Err(e);
        }
        info!("dc {} added to bank", name);
        Ok(())
    }

    /// Motor device for a named channel
    pub fn device(&self, name: &str) -> Result<BankDc<'_, 'a, M, B, N>, MotorError> {
        self.channels.lookup(name)?;
        Ok(BankDc {
            bank: self,
            name: motor_name(name)?,
        })
    }

    /// Drive every channel to standby, disable the PWMs and give the pins
    /// back
    pub fn remove(&self, pins: &mut PinAllocator) -> Result<(), MotorError> {
        let mut result = Ok(());
        self.bus.lock(|bus| {
            let bus = &mut *bus.borrow_mut();
            for (name, channel) in self.channels.iter() {
                channel.retired.store(true, Ordering::Release);
                channel.levels.lock(|l| l.set(Levels::STANDBY));
                let mut outcome = drive(bus, &channel.pins, Levels::STANDBY);
                if let Some(pwm) = channel.pwm {
                    outcome = outcome.and(bus.disable(pwm.channel));
                }
                if let Err(e) = outcome {
                    error!("dc {}: standby failed: {}", name, e);
                    if result.is_ok() {
                        result = Err(MotorError::from(e));
                    }
                }
            }
        });
        for (_, channel) in self.channels.iter() {
            pins.release_all(&channel.pins.as_vec());
        }
        info!("dc bank removed");
        result
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    fn live(&self, name: &str) -> Result<&DcChannel<M>, MotorError> {
        let channel = self.channels.lookup(name)?;
        if !channel.is_live() {
            return Err(MotorError::ChannelNotFound);
        }
        Ok(channel)
    }

    /// Drive a channel's pins for `command`
    ///
    /// Liveness is checked under the bus lock, where `remove` retires
    /// channels, so nothing is written once the pins are released.
    fn control(&self, name: &str, command: MotorState) -> Result<(), MotorError> {
        let levels = Levels::for_command(command);
        let channel = self.channels.lookup(name)?;
        self.bus.lock(|bus| {
            if !channel.is_live() {
                return Err(MotorError::ChannelNotFound);
            }
            let bus = &mut *bus.borrow_mut();
            channel.levels.lock(|l| l.set(levels));
            let driven = drive(bus, &channel.pins, levels);
            let pwm = match channel.pwm {
                Some(pwm) if levels.is_driven() => bus.enable(pwm.channel),
                Some(pwm) if !self.pwm_in_use(pwm.channel) => bus.disable(pwm.channel),
                _ => Ok(()),
            };
            if let Err(e) = pwm {
                warn!("dc {}: pwm {} failed: {}", name, pwm_id(channel), e);
            }
            driven.and(pwm).map_err(MotorError::from)
        })
    }

    fn set_duty(&self, name: &str, value: u32) -> Result<(), MotorError> {
        let channel = self.channels.lookup(name)?;
        if value > MAX_DUTY {
            return Err(MotorError::InvalidArgument);
        }
        let duty = value as u8;
        self.bus.lock(|bus| {
            if !channel.is_live() {
                return Err(MotorError::ChannelNotFound);
            }
            channel.duty.lock(|d| d.set(duty));
            let Some(pwm) = channel.pwm else {
                return Ok(());
            };
            bus.borrow_mut()
                .configure(pwm.channel, duty, pwm.period_ns)
                .map_err(|e: IoError| {
                    warn!("dc {}: pwm configure failed: {}", name, e);
                    MotorError::from(e)
                })
        })
    }

    /// Check if any live channel on `pwm` is driven
    fn pwm_in_use(&self, pwm: u8) -> bool {
        self.channels.iter().any(|(_, ch)| {
            ch.is_live() && ch.pwm.is_some_and(|p| p.channel == pwm) && ch.levels().is_driven()
        })
    }
}

fn pwm_id<M: RawMutex>(channel: &DcChannel<M>) -> u8 {
    channel.pwm.map_or(0, |p| p.channel)
}

/// A logical motor on one channel of a [`DcBank`]
pub struct BankDc<'b, 'a, M: RawMutex, B, const N: usize> {
    bank: &'b DcBank<'a, M, B, N>,
    name: MotorName,
}

impl<M: RawMutex, B: OutputBus + PwmBus, const N: usize> MotorDevice for BankDc<'_, '_, M, B, N> {
    fn name(&self) -> &str {
        &self.name
    }

    fn motor_type(&self) -> MotorType {
        MotorType::Dc
    }

    fn supports_suspend(&self) -> bool {
        self.bank
            .channels
            .get(&self.name)
            .is_some_and(|ch| ch.suspend)
    }

    fn control(&self, command: MotorState, _magnitude: u32) -> Result<(), MotorError> {
        self.bank.control(&self.name, command)
    }

    fn state(&self) -> Result<MotorState, MotorError> {
        Ok(self.bank.live(&self.name)?.levels().state())
    }

    fn set_speed(&self, value: u32) -> Result<(), MotorError> {
        self.bank.set_duty(&self.name, value)
    }

    fn speed(&self) -> Result<u32, MotorError> {
        let channel = self.bank.live(&self.name)?;
        Ok(u32::from(channel.duty.lock(|d| d.get())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeBus, Op, TestMutex};
    use motorsys_core::DEFAULT_PWM_PERIOD_NS;
    use motorsys_hal::Level;
    use std::vec::Vec;

    type Bus = Mutex<TestMutex, RefCell<FakeBus>>;

    fn bus() -> Bus {
        Mutex::new(RefCell::new(FakeBus::default()))
    }

    /// Right wheel on its own PWM 1, left wheel on the shared PWM 0
    fn wheels<'a>(bus: &'a Bus, alloc: &mut PinAllocator) -> DcBank<'a, TestMutex, FakeBus, 2> {
        let mut bank = DcBank::new(bus, Some(PwmBinding::new(0)));
        let right = DcChannelConfig::new("wheel-right", DcPins::new(9, 11))
            .unwrap()
            .with_pwm(PwmBinding::new(1))
            .with_duty(60);
        let left = DcChannelConfig::new("wheel-left", DcPins::new(27, 22).with_enable(10)).unwrap();
        bank.add_channel(&right, alloc).unwrap();
        bank.add_channel(&left, alloc).unwrap();
        bank
    }

    fn ops(bus: &Bus) -> Vec<Op> {
        bus.lock(|b| b.borrow().ops.clone())
    }

    fn clear(bus: &Bus) {
        bus.lock(|b| b.borrow_mut().ops.clear());
    }

    #[test]
    fn test_setup_configures_pwm() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let _bank = wheels(&shared, &mut alloc);
        assert_eq!(alloc.claimed_count(), 5);
        let ops = ops(&shared);
        assert!(ops.contains(&Op::Configure(1, 60, DEFAULT_PWM_PERIOD_NS)));
        assert!(ops.contains(&Op::Configure(0, 100, DEFAULT_PWM_PERIOD_NS)));
        assert!(ops.contains(&Op::Pin(10, Level::Low)));
    }

    #[test]
    fn test_motion_enables_pwm() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let bank = wheels(&shared, &mut alloc);
        let right = bank.device("wheel-right").unwrap();
        clear(&shared);

        right.control(MotorState::Forward, 0).unwrap();
        assert_eq!(
            ops(&shared),
            [Op::Pin(9, Level::High), Op::Pin(11, Level::Low), Op::Enable(1)]
        );
        assert_eq!(right.state(), Ok(MotorState::Forward));

        clear(&shared);
        right.control(MotorState::Standby, 0).unwrap();
        assert_eq!(
            ops(&shared),
            [Op::Pin(9, Level::Low), Op::Pin(11, Level::Low), Op::Disable(1)]
        );
        assert_eq!(right.state(), Ok(MotorState::Standby));
    }

    #[test]
    fn test_shared_pwm_stays_on_while_used() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let mut bank = wheels(&shared, &mut alloc);
        let arm = DcChannelConfig::new("arm", DcPins::new(2, 3)).unwrap();
        // bank holds two channels
        assert_eq!(bank.add_channel(&arm, &mut alloc), Err(MotorError::RegistryFull));

        let left = bank.device("wheel-left").unwrap();
        left.control(MotorState::Backward, 0).unwrap();
        assert_eq!(shared.lock(|b| b.borrow().level(10)), Some(Level::High));
        left.control(MotorState::Standby, 0).unwrap();
        assert_eq!(ops(&shared).last(), Some(&Op::Disable(0)));
        assert_eq!(shared.lock(|b| b.borrow().level(10)), Some(Level::Low));
    }

    #[test]
    fn test_duty_applied_immediately() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let bank = wheels(&shared, &mut alloc);
        let right = bank.device("wheel-right").unwrap();
        clear(&shared);

        right.set_speed(0).unwrap();
        assert_eq!(ops(&shared), [Op::Configure(1, 0, DEFAULT_PWM_PERIOD_NS)]);
        assert_eq!(right.set_speed(101), Err(MotorError::InvalidArgument));
        assert_eq!(right.speed(), Ok(0));
        assert_eq!(ops(&shared).len(), 1);
    }

    #[test]
    fn test_unknown_channel_writes_nothing() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let bank = wheels(&shared, &mut alloc);
        clear(&shared);
        assert!(matches!(bank.device("wheel-middle"), Err(MotorError::ChannelNotFound)));
        assert_eq!(
            bank.control("wheel-middle", MotorState::Forward),
            Err(MotorError::ChannelNotFound)
        );
        assert!(ops(&shared).is_empty());
    }

    #[test]
    fn test_remove_disables_all() {
        let shared = bus();
        let mut alloc = PinAllocator::new();
        let bank = wheels(&shared, &mut alloc);
        let right = bank.device("wheel-right").unwrap();
        right.control(MotorState::Forward, 0).unwrap();
        clear(&shared);

        bank.remove(&mut alloc).unwrap();
        assert_eq!(alloc.claimed_count(), 0);
        let ops = ops(&shared);
        assert!(ops.contains(&Op::Disable(0)));
        assert!(ops.contains(&Op::Disable(1)));
        assert_eq!(right.control(MotorState::Forward, 0), Err(MotorError::ChannelNotFound));
        assert_eq!(right.set_speed(50), Err(MotorError::ChannelNotFound));
    }

    #[test]
    fn test_remove_racing_commands_leaves_outputs_off() {
        for _ in 0..2_000 {
            let shared = bus();
            let mut alloc = PinAllocator::new();
            let bank = wheels(&shared, &mut alloc);
            let right = bank.device("wheel-right").unwrap();
            let left = bank.device("wheel-left").unwrap();
            std::thread::scope(|scope| {
                scope.spawn(|| {
                    let _ = right.set_speed(80);
                    let _ = right.control(MotorState::Forward, 0);
                    let _ = left.control(MotorState::Backward, 0);
                });
                scope.spawn(|| bank.remove(&mut alloc).unwrap());
            });
            assert_eq!(alloc.claimed_count(), 0);
            shared.lock(|b| {
                let b = b.borrow();
                for pin in [9, 11, 27, 22, 10] {
                    assert_eq!(b.level(pin), Some(Level::Low), "pin {}", pin);
                }
                for pwm in [0, 1] {
                    let last = b.ops.iter().rev().find(|op| match op {
                        Op::Configure(p, ..) | Op::Enable(p) | Op::Disable(p) => *p == pwm,
                        Op::Pin(..) => false,
                    });
                    assert_eq!(last, Some(&Op::Disable(pwm)), "pwm {}", pwm);
                }
            });
        }
    }
}

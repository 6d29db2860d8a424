//! Motor class
//!
//! The registry every motor device is published under. Attribute reads and
//! writes reach devices by name through it. Unregistering a device puts it
//! in standby first; suspending the class puts every suspend-capable device
//! in standby and resume leaves them there.

use heapless::Vec;
use motorsys_core::{MotorDevice, MotorError, MotorState};

use crate::attribute::{show, store, Attribute, AttributeError, Reply};
use crate::command::ConsoleLine;

struct Registered<'d> {
    device: &'d dyn MotorDevice,
    suspended: bool,
}

/// Registered motor devices, at most `N`
pub struct MotorClass<'d, const N: usize> {
    devices: Vec<Registered<'d>, N>,
}

impl<const N: usize> Default for MotorClass<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'d, const N: usize> MotorClass<'d, N> {
    pub const fn new() -> Self {
        Self {
            devices: Vec::new(),
        }
    }

    /// Publish a device under its name
    pub fn register(&mut self, device: &'d dyn MotorDevice) -> Result<(), AttributeError> {
        if self.find(device.name()).is_some() {
            return Err(MotorError::InvalidArgument.into());
        }
        self.devices
            .push(Registered {
                device,
                suspended: false,
            })
            .map_err(|_| AttributeError::Full)?;
        info!(
            "registered {} ({})",
            device.name(),
            device.motor_type().as_str()
        );
        Ok(())
    }

    /// Put a device in standby and withdraw it
    ///
    /// The device is withdrawn even if the standby command fails.
    pub fn unregister(&mut self, name: &str) -> Result<(), AttributeError> {
        let index = self.find(name).ok_or(AttributeError::NotFound)?;
        let entry = self.devices.remove(index);
        if let Err(e) = entry.device.control(MotorState::Standby, 0) {
            warn!("{}: standby on unregister failed: {}", name, e);
        }
        info!("unregistered {}", name);
        Ok(())
    }

    /// Resolve a device by name
    pub fn lookup(&self, name: &str) -> Result<&'d dyn MotorDevice, AttributeError> {
        self.find(name)
            .map(|i| self.devices[i].device)
            .ok_or(AttributeError::NotFound)
    }

    /// Put every suspend-capable device in standby
    ///
    /// Returns how many devices were suspended.
    pub fn suspend(&mut self) -> usize {
        let mut count = 0;
        for entry in self.devices.iter_mut() {
            if !entry.device.supports_suspend() || entry.suspended {
                continue;
            }
            if let Err(e) = entry.device.control(MotorState::Standby, 0) {
                warn!("{}: standby on suspend failed: {}", entry.device.name(), e);
            }
            entry.suspended = true;
            count += 1;
        }
        debug!("suspended {} motors", count);
        count
    }

    /// Clear the suspended marks; motion is not restored
    pub fn resume(&mut self) {
        for entry in self.devices.iter_mut() {
            entry.suspended = false;
        }
        debug!("motors resumed");
    }

    pub fn is_suspended(&self, name: &str) -> bool {
        self.find(name).is_some_and(|i| self.devices[i].suspended)
    }

    /// Names in registration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.devices.iter().map(|entry| entry.device.name())
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Read an attribute of a named device
    pub fn show(&self, name: &str, attribute: Attribute) -> Result<Reply, AttributeError> {
        show(self.lookup(name)?, attribute)
    }

    /// Write an attribute of a named device
    pub fn store(&self, name: &str, attribute: Attribute, text: &str) -> Result<(), AttributeError> {
        store(self.lookup(name)?, attribute, text)
    }

    /// Run a console request: a read returns the value, a write returns
    /// `None`
    pub fn dispatch(&self, line: &ConsoleLine) -> Result<Option<Reply>, AttributeError> {
        match &line.value {
            None => self.show(&line.motor, line.attribute).map(Some),
            Some(value) => self.store(&line.motor, line.attribute, value).map(|_| None),
        }
    }

    fn find(&self, name: &str) -> Option<usize> {
        self.devices.iter().position(|entry| entry.device.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use motorsys_core::MotorType;

    struct Lamp {
        name: &'static str,
        state: Cell<MotorState>,
        suspend: bool,
    }

    impl Lamp {
        fn new(name: &'static str, suspend: bool) -> Self {
            Self {
                name,
                state: Cell::new(MotorState::Standby),
                suspend,
            }
        }
    }

    impl MotorDevice for Lamp {
        fn name(&self) -> &str {
            self.name
        }

        fn motor_type(&self) -> MotorType {
            MotorType::Dc
        }

        fn supports_suspend(&self) -> bool {
            self.suspend
        }

        fn control(&self, command: MotorState, _magnitude: u32) -> Result<(), MotorError> {
            self.state.set(command);
            Ok(())
        }

        fn state(&self) -> Result<MotorState, MotorError> {
            Ok(self.state.get())
        }

        fn set_speed(&self, _value: u32) -> Result<(), MotorError> {
            Ok(())
        }

        fn speed(&self) -> Result<u32, MotorError> {
            Ok(100)
        }
    }

    #[test]
    fn test_register_lookup_unregister() {
        let a = Lamp::new("a", false);
        let b = Lamp::new("b", false);
        let c = Lamp::new("c", false);
        let mut class: MotorClass<'_, 2> = MotorClass::new();
        class.register(&a).unwrap();
        class.register(&b).unwrap();
        assert_eq!(class.register(&a).unwrap_err(), AttributeError::Motor(MotorError::InvalidArgument));
        assert_eq!(class.register(&c).unwrap_err(), AttributeError::Full);

        a.control(MotorState::Forward, 0).unwrap();
        class.unregister("a").unwrap();
        assert_eq!(a.state.get(), MotorState::Standby);
        assert!(class.lookup("a").is_err());
        assert_eq!(class.unregister("a"), Err(AttributeError::NotFound));
        assert_eq!(class.names().collect::<std::vec::Vec<_>>(), ["b"]);
    }

    #[test]
    fn test_suspend_only_capable_devices() {
        let keep = Lamp::new("keep", false);
        let stop = Lamp::new("stop", true);
        let mut class: MotorClass<'_, 4> = MotorClass::new();
        class.register(&keep).unwrap();
        class.register(&stop).unwrap();
        keep.control(MotorState::Forward, 0).unwrap();
        stop.control(MotorState::Backward, 0).unwrap();

        assert_eq!(class.suspend(), 1);
        assert_eq!(keep.state.get(), MotorState::Forward);
        assert_eq!(stop.state.get(), MotorState::Standby);
        assert!(class.is_suspended("stop"));

        class.resume();
        assert!(!class.is_suspended("stop"));
        assert_eq!(stop.state.get(), MotorState::Standby);
    }

    #[test]
    fn test_dispatch_console_lines() {
        let m = Lamp::new("m", false);
        let mut class: MotorClass<'_, 1> = MotorClass::new();
        class.register(&m).unwrap();

        let write = ConsoleLine::parse("m ctl hold").unwrap();
        assert_eq!(class.dispatch(&write), Ok(None));
        let read = ConsoleLine::parse("m state").unwrap();
        assert_eq!(class.dispatch(&read).unwrap().unwrap().as_str(), "hold");
        let missing = ConsoleLine::parse("n state").unwrap();
        assert_eq!(class.dispatch(&missing), Err(AttributeError::NotFound));
    }
}

//! Attribute show/store
//!
//! Maps the five text attributes onto [`MotorDevice`] calls.

use core::fmt::Write;

use heapless::String;
use motorsys_core::{MotorDevice, MotorError};

use crate::command::{parse_control, parse_number, ParseError};

/// Rendered attribute value
pub type Reply = String<32>;

/// A motor attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Attribute {
    /// Motor type, read only
    Type,
    /// Pulse rate or duty
    Speed,
    /// Control command, write only
    Ctl,
    /// Current state, read only
    State,
    /// Position target / remaining steps
    Pos,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::Type,
        Attribute::Speed,
        Attribute::Ctl,
        Attribute::State,
        Attribute::Pos,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Attribute::Type => "type",
            Attribute::Speed => "speed",
            Attribute::Ctl => "ctl",
            Attribute::State => "state",
            Attribute::Pos => "pos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn is_readable(self) -> bool {
        self != Attribute::Ctl
    }

    pub fn is_writable(self) -> bool {
        matches!(self, Attribute::Speed | Attribute::Ctl | Attribute::Pos)
    }
}

/// Errors from the attribute layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttributeError {
    /// The written text does not parse
    Parse(ParseError),
    /// Read of a write-only or write of a read-only attribute
    PermissionDenied,
    /// The motor rejected the operation
    Motor(MotorError),
    /// No motor with that name
    NotFound,
    /// The motor class is full
    Full,
    /// Rendered value does not fit the reply buffer
    BufferOverflow,
}

impl AttributeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeError::Parse(_) => "parse error",
            AttributeError::PermissionDenied => "permission denied",
            AttributeError::Motor(e) => e.as_str(),
            AttributeError::NotFound => "no such motor",
            AttributeError::Full => "too many motors",
            AttributeError::BufferOverflow => "reply too long",
        }
    }
}

impl From<ParseError> for AttributeError {
    fn from(e: ParseError) -> Self {
        AttributeError::Parse(e)
    }
}

impl From<MotorError> for AttributeError {
    fn from(e: MotorError) -> Self {
        AttributeError::Motor(e)
    }
}

impl core::fmt::Display for AttributeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read an attribute
pub fn show<D: MotorDevice + ?Sized>(device: &D, attribute: Attribute) -> Result<Reply, AttributeError> {
    let mut reply = Reply::new();
    match attribute {
        Attribute::Type => push(&mut reply, device.motor_type().as_str())?,
        Attribute::State => match device.state() {
            Ok(state) => push(&mut reply, state.as_str())?,
            Err(MotorError::Unsupported) => push(&mut reply, "unknown")?,
            Err(e) => return Err(e.into()),
        },
        Attribute::Speed => {
            write!(reply, "{}", device.speed()?).map_err(|_| AttributeError::BufferOverflow)?
        }
        Attribute::Pos => {
            write!(reply, "{}", device.position()?).map_err(|_| AttributeError::BufferOverflow)?
        }
        Attribute::Ctl => return Err(AttributeError::PermissionDenied),
    }
    Ok(reply)
}

/// Write an attribute
pub fn store<D: MotorDevice + ?Sized>(
    device: &D,
    attribute: Attribute,
    text: &str,
) -> Result<(), AttributeError> {
    let result = apply(device, attribute, text);
    if let Err(e) = result {
        warn!("{} {}: rejected: {}", device.name(), attribute.name(), e);
    }
    result
}

fn apply<D: MotorDevice + ?Sized>(
    device: &D,
    attribute: Attribute,
    text: &str,
) -> Result<(), AttributeError> {
    match attribute {
        Attribute::Ctl => {
            let (command, magnitude) = parse_control(text)?;
            device.control(command, magnitude)?;
        }
        Attribute::Speed => {
            let value = parse_number(text)?;
            let value = u32::try_from(value).map_err(|_| MotorError::InvalidArgument)?;
            device.set_speed(value)?;
        }
        Attribute::Pos => device.set_position(parse_number(text)?)?,
        Attribute::Type | Attribute::State => return Err(AttributeError::PermissionDenied),
    }
    Ok(())
}

fn push(reply: &mut Reply, text: &str) -> Result<(), AttributeError> {
    reply
        .push_str(text)
        .map_err(|_| AttributeError::BufferOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;
    use motorsys_core::{MotorState, MotorType};

    /// Stepper-like device that records its last command
    struct Probe {
        last: Cell<(MotorState, u32)>,
        speed: Cell<u32>,
        pos: Cell<i32>,
        with_position: bool,
    }

    impl Probe {
        fn new(with_position: bool) -> Self {
            Self {
                last: Cell::new((MotorState::Standby, 0)),
                speed: Cell::new(200),
                pos: Cell::new(0),
                with_position,
            }
        }
    }

    impl MotorDevice for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn motor_type(&self) -> MotorType {
            MotorType::Stepper
        }

        fn control(&self, command: MotorState, magnitude: u32) -> Result<(), MotorError> {
            self.last.set((command, magnitude));
            Ok(())
        }

        fn state(&self) -> Result<MotorState, MotorError> {
            Ok(self.last.get().0)
        }

        fn set_speed(&self, value: u32) -> Result<(), MotorError> {
            if !(1..=5000).contains(&value) {
                return Err(MotorError::InvalidArgument);
            }
            self.speed.set(value);
            Ok(())
        }

        fn speed(&self) -> Result<u32, MotorError> {
            Ok(self.speed.get())
        }

        fn set_position(&self, value: i32) -> Result<(), MotorError> {
            if !self.with_position {
                return Err(MotorError::Unsupported);
            }
            self.pos.set(value);
            Ok(())
        }

        fn position(&self) -> Result<i32, MotorError> {
            if !self.with_position {
                return Err(MotorError::Unsupported);
            }
            Ok(self.pos.get())
        }
    }

    #[test]
    fn test_attribute_names() {
        for attr in Attribute::ALL {
            assert_eq!(Attribute::from_name(attr.name()), Some(attr));
        }
        assert!(!Attribute::Ctl.is_readable());
        assert!(!Attribute::Type.is_writable());
        assert!(Attribute::Pos.is_writable() && Attribute::Pos.is_readable());
    }

    #[test]
    fn test_show() {
        let probe = Probe::new(true);
        assert_eq!(show(&probe, Attribute::Type).unwrap().as_str(), "stepper motor");
        assert_eq!(show(&probe, Attribute::Speed).unwrap().as_str(), "200");
        assert_eq!(show(&probe, Attribute::State).unwrap().as_str(), "standby");
        assert_eq!(show(&probe, Attribute::Ctl), Err(AttributeError::PermissionDenied));
    }

    #[test]
    fn test_store_control() {
        let probe = Probe::new(true);
        store(&probe, Attribute::Ctl, "backward -30\n").unwrap();
        assert_eq!(probe.last.get(), (MotorState::Backward, 30));
        assert_eq!(show(&probe, Attribute::State).unwrap().as_str(), "backward");
        assert_eq!(
            store(&probe, Attribute::Ctl, "spin 3"),
            Err(AttributeError::Parse(ParseError::UnknownKeyword))
        );
    }

    #[test]
    fn test_store_speed_keeps_previous_on_reject() {
        let probe = Probe::new(true);
        assert_eq!(
            store(&probe, Attribute::Speed, "0"),
            Err(AttributeError::Motor(MotorError::InvalidArgument))
        );
        assert_eq!(
            store(&probe, Attribute::Speed, "-4"),
            Err(AttributeError::Motor(MotorError::InvalidArgument))
        );
        store(&probe, Attribute::Speed, "750").unwrap();
        assert_eq!(show(&probe, Attribute::Speed).unwrap().as_str(), "750");
    }

    #[test]
    fn test_position_unsupported() {
        let probe = Probe::new(false);
        assert_eq!(
            store(&probe, Attribute::Pos, "10"),
            Err(AttributeError::Motor(MotorError::Unsupported))
        );
        assert_eq!(
            show(&probe, Attribute::Pos).map_err(|e| e.as_str()),
            Err("operation not available")
        );
        let with_pos = Probe::new(true);
        store(&with_pos, Attribute::Pos, "-120").unwrap();
        assert_eq!(show(&with_pos, Attribute::Pos).unwrap().as_str(), "-120");
    }

    #[test]
    fn test_read_only_attributes() {
        let probe = Probe::new(true);
        assert_eq!(
            store(&probe, Attribute::Type, "dc motor"),
            Err(AttributeError::PermissionDenied)
        );
        assert_eq!(
            store(&probe, Attribute::State, "forward"),
            Err(AttributeError::PermissionDenied)
        );
    }
}

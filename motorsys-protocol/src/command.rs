//! Text command parsing
//!
//! Control writes look like `forward 200` or `standby`. Magnitudes are taken
//! as absolute values, so `forward -5` is the same as `forward 5`. Console
//! input arrives a byte at a time and is split into lines by [`LineParser`].

use heapless::{String, Vec};
use motorsys_core::{motor_name, MotorName, MotorState};

use crate::attribute::Attribute;

/// Longest accepted console line, terminator excluded
pub const MAX_LINE_LEN: usize = 64;

/// Errors from parsing command text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Nothing but whitespace
    Empty,
    /// Unknown command keyword, attribute or motor name syntax
    UnknownKeyword,
    /// A number that does not parse
    InvalidNumber,
    /// Trailing tokens after a complete command
    UnexpectedToken,
    /// A required token is missing
    MissingArgument,
    /// Line longer than [`MAX_LINE_LEN`]
    TooLong,
    /// Line is not valid UTF-8
    Encoding,
}

/// Parse a control write into a command and a magnitude
///
/// The magnitude defaults to 0 and is ignored for `standby`.
pub fn parse_control(text: &str) -> Result<(MotorState, u32), ParseError> {
    let mut tokens = text.split_ascii_whitespace();
    let keyword = tokens.next().ok_or(ParseError::Empty)?;
    let command = MotorState::from_keyword(keyword).ok_or(ParseError::UnknownKeyword)?;
    let magnitude = match tokens.next() {
        Some(token) => token
            .parse::<i64>()
            .map_err(|_| ParseError::InvalidNumber)?
            .unsigned_abs()
            .min(u64::from(u32::MAX)) as u32,
        None => 0,
    };
    if tokens.next().is_some() {
        return Err(ParseError::UnexpectedToken);
    }
    let magnitude = if command == MotorState::Standby {
        0
    } else {
        magnitude
    };
    Ok((command, magnitude))
}

/// Parse a signed decimal value, surrounding whitespace allowed
pub fn parse_number(text: &str) -> Result<i32, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }
    text.parse::<i32>().map_err(|_| ParseError::InvalidNumber)
}

/// A console request: `<motor> <attribute> [<value>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleLine {
    /// Target motor
    pub motor: MotorName,
    /// Attribute to read or write
    pub attribute: Attribute,
    /// Value to write; `None` means read
    pub value: Option<String<MAX_LINE_LEN>>,
}

impl ConsoleLine {
    /// Split a line into motor, attribute and the rest as the value
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ParseError::Empty);
        }
        let (motor, rest) = split_token(line);
        let (attribute, rest) = split_token(rest);
        if attribute.is_empty() {
            return Err(ParseError::MissingArgument);
        }
        let motor = motor_name(motor).map_err(|_| ParseError::UnknownKeyword)?;
        let attribute = Attribute::from_name(attribute).ok_or(ParseError::UnknownKeyword)?;
        let value = if rest.is_empty() {
            None
        } else {
            Some(String::try_from(rest).map_err(|_| ParseError::TooLong)?)
        };
        Ok(Self {
            motor,
            attribute,
            value,
        })
    }
}

/// A complete console request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Read or write one attribute
    Attribute(ConsoleLine),
    /// List registered motors
    List,
    /// Put suspend-capable motors in standby
    Suspend,
    /// Clear the suspended marks
    Resume,
}

impl Request {
    /// Parse a console line; the bare words `list`, `suspend` and `resume`
    /// are class commands, anything else an attribute request
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        match line.trim() {
            "list" => Ok(Request::List),
            "suspend" => Ok(Request::Suspend),
            "resume" => Ok(Request::Resume),
            other => ConsoleLine::parse(other).map(Request::Attribute),
        }
    }
}

fn split_token(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(|c: char| c.is_ascii_whitespace()) {
        Some(end) => (&text[..end], text[end..].trim()),
        None => (text, ""),
    }
}

/// Accumulates console bytes into lines
#[derive(Debug, Clone)]
pub struct LineParser {
    buffer: Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LineParser {
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte
    ///
    /// Returns a parsed request when `\r` or `\n` ends a non-blank line. An
    /// over-long line is dropped and reported once its terminator arrives.
    pub fn push(&mut self, byte: u8) -> Option<Result<Request, ParseError>> {
        if byte != b'\r' && byte != b'\n' {
            if self.buffer.push(byte).is_err() {
                self.overflowed = true;
            }
            return None;
        }

        let overflowed = core::mem::replace(&mut self.overflowed, false);
        let result = if overflowed {
            Some(Err(ParseError::TooLong))
        } else {
            match core::str::from_utf8(&self.buffer) {
                Ok(text) if text.trim().is_empty() => None,
                Ok(text) => Some(Request::parse(text)),
                Err(_) => Some(Err(ParseError::Encoding)),
            }
        };
        self.buffer.clear();
        result
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.overflowed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_control() {
        assert_eq!(parse_control("forward 200"), Ok((MotorState::Forward, 200)));
        assert_eq!(parse_control("backward\n"), Ok((MotorState::Backward, 0)));
        assert_eq!(parse_control("  hold  7 "), Ok((MotorState::Hold, 7)));
        assert_eq!(parse_control("standby 40"), Ok((MotorState::Standby, 0)));
    }

    #[test]
    fn test_negative_magnitude_is_absolute() {
        assert_eq!(parse_control("forward -5"), parse_control("forward 5"));
        assert_eq!(
            parse_control("backward -99999999999"),
            Ok((MotorState::Backward, u32::MAX))
        );
    }

    #[test]
    fn test_parse_control_errors() {
        assert_eq!(parse_control(""), Err(ParseError::Empty));
        assert_eq!(parse_control("sideways 3"), Err(ParseError::UnknownKeyword));
        assert_eq!(parse_control("forward ten"), Err(ParseError::InvalidNumber));
        assert_eq!(parse_control("forward 1 2"), Err(ParseError::UnexpectedToken));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(" 500\n"), Ok(500));
        assert_eq!(parse_number("-12"), Ok(-12));
        assert_eq!(parse_number(""), Err(ParseError::Empty));
        assert_eq!(parse_number("5k"), Err(ParseError::InvalidNumber));
    }

    #[test]
    fn test_console_line() {
        let line = ConsoleLine::parse("stepper ctl forward 200").unwrap();
        assert_eq!(line.motor.as_str(), "stepper");
        assert_eq!(line.attribute, Attribute::Ctl);
        assert_eq!(line.value.as_deref(), Some("forward 200"));

        let read = ConsoleLine::parse("wheel-left state").unwrap();
        assert_eq!(read.value, None);

        assert_eq!(ConsoleLine::parse("stepper"), Err(ParseError::MissingArgument));
        assert_eq!(ConsoleLine::parse("stepper colour"), Err(ParseError::UnknownKeyword));
    }

    #[test]
    fn test_class_requests() {
        assert_eq!(Request::parse(" list "), Ok(Request::List));
        assert_eq!(Request::parse("suspend"), Ok(Request::Suspend));
        assert_eq!(Request::parse("resume"), Ok(Request::Resume));
        assert_eq!(Request::parse("list state").map(|r| matches!(r, Request::Attribute(_))), Ok(true));
    }

    #[test]
    fn test_line_parser_splits_lines() {
        let mut parser = LineParser::new();
        let mut lines = std::vec::Vec::new();
        for &b in b"\r\nstepper speed 300\r\nstepper state\n" {
            if let Some(result) = parser.push(b) {
                lines.push(result.unwrap());
            }
        }
        assert_eq!(lines.len(), 2);
        assert!(matches!(&lines[0], Request::Attribute(l) if l.attribute == Attribute::Speed));
        assert!(matches!(&lines[1], Request::Attribute(l) if l.attribute == Attribute::State));
    }

    #[test]
    fn test_line_parser_overflow_recovers() {
        let mut parser = LineParser::new();
        for _ in 0..(MAX_LINE_LEN + 10) {
            assert!(parser.push(b'x').is_none());
        }
        assert_eq!(parser.push(b'\n'), Some(Err(ParseError::TooLong)));
        let mut last = None;
        for &b in b"dc type\n" {
            last = parser.push(b);
        }
        assert!(matches!(last, Some(Ok(Request::Attribute(l))) if l.attribute == Attribute::Type));
    }

    proptest! {
        #[test]
        fn prop_control_magnitude_sign_ignored(n in -1_000_000i64..1_000_000, forward: bool) {
            let keyword = if forward { "forward" } else { "backward" };
            let text = std::format!("{} {}", keyword, n);
            let (_, magnitude) = parse_control(&text).unwrap();
            prop_assert_eq!(u64::from(magnitude), n.unsigned_abs());
        }

        #[test]
        fn prop_line_parser_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..300)) {
            let mut parser = LineParser::new();
            for b in bytes {
                let _ = parser.push(b);
            }
        }
    }
}

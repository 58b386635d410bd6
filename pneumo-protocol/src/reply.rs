//! Reply lines sent by the board
//!
//! Everything the board prints is a CRLF-terminated line: the echo of each
//! received payload, a value for getters, or an error message.

use core::fmt::{self, Write};

use heapless::Vec;

use crate::command::Command;
use crate::frame::Frame;

/// Maximum line length including the CRLF terminator
pub const MAX_LINE_LEN: usize = 64;

/// Line terminator
pub const LINE_END: &str = "\r\n";

/// One output line, raw bytes so echoes of non-UTF-8 payloads survive
pub type Line = Vec<u8, MAX_LINE_LEN>;

/// Errors that can occur while interpreting a reply line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReplyError {
    /// Command has no reply line
    NoReplyExpected,
    /// Line was empty
    Empty,
    /// Line did not parse as the expected value
    Malformed,
}

impl fmt::Display for ReplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReplyExpected => f.write_str("command has no reply"),
            Self::Empty => f.write_str("empty reply line"),
            Self::Malformed => f.write_str("malformed reply line"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ReplyError {}

/// Value returned by a getter command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Averaged pressure in kPa
    Pressure(f32),
    /// Valve open (`true`) or closed
    ValveState(bool),
    /// Pump setpoint in kPa
    Setpoint(i32),
    /// Pump on (`true`) or off
    PumpState(bool),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Pressure(kpa) => write!(f, "{:.2}", kpa),
            Self::ValveState(state) | Self::PumpState(state) => write!(f, "{}", u8::from(state)),
            Self::Setpoint(kpa) => write!(f, "{}", kpa),
        }
    }
}

impl Reply {
    /// Interpret a reply line for the command that produced it
    pub fn parse_for(command: &Command, line: &str) -> Result<Self, ReplyError> {
        let text = line.trim();
        if text.is_empty() {
            return Err(ReplyError::Empty);
        }

        match command {
            Command::GetPressure { .. } => text
                .parse::<f32>()
                .map(Self::Pressure)
                .map_err(|_| ReplyError::Malformed),
            Command::GetValveState { .. } => parse_flag(text).map(Self::ValveState),
            Command::GetPumpState { .. } => parse_flag(text).map(Self::PumpState),
            Command::GetSetpoint { .. } => text
                .parse::<i32>()
                .map(Self::Setpoint)
                .map_err(|_| ReplyError::Malformed),
            _ => Err(ReplyError::NoReplyExpected),
        }
    }
}

fn parse_flag(text: &str) -> Result<bool, ReplyError> {
    match text {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => Err(ReplyError::Malformed),
    }
}

struct LineWriter<'a>(&'a mut Line);

impl Write for LineWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Format a value as one CRLF-terminated line
pub fn to_line(item: &dyn fmt::Display) -> Result<Line, fmt::Error> {
    let mut line = Line::new();
    write!(LineWriter(&mut line), "{}{}", item, LINE_END)?;
    Ok(line)
}

/// Echo line for a received frame: the payload followed by CRLF
pub fn echo_line(frame: &Frame) -> Line {
    let mut line = Line::new();
    // Payload is at most 17 bytes, always fits with the terminator
    let _ = line.extend_from_slice(frame.as_bytes());
    let _ = line.extend_from_slice(LINE_END.as_bytes());
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Bank;
    use crate::frame::FrameReceiver;

    #[test]
    fn test_pressure_two_decimals() {
        assert_eq!(&to_line(&Reply::Pressure(12.345)).unwrap()[..], b"12.35\r\n");
        assert_eq!(&to_line(&Reply::Pressure(-125.0)).unwrap()[..], b"-125.00\r\n");
        assert_eq!(&to_line(&Reply::Pressure(0.0)).unwrap()[..], b"0.00\r\n");
    }

    #[test]
    fn test_flags_and_setpoints() {
        assert_eq!(&to_line(&Reply::ValveState(true)).unwrap()[..], b"1\r\n");
        assert_eq!(&to_line(&Reply::PumpState(false)).unwrap()[..], b"0\r\n");
        assert_eq!(&to_line(&Reply::Setpoint(-40)).unwrap()[..], b"-40\r\n");
    }

    #[test]
    fn test_echo_line() {
        let mut receiver = FrameReceiver::new();
        let frame = receiver.frames(b"<SI,1,1>").next().unwrap();
        assert_eq!(&echo_line(&frame)[..], b"SI,1,1\r\n");
    }

    #[test]
    fn test_line_overflow() {
        let long = core::str::from_utf8(&[b'x'; MAX_LINE_LEN]).unwrap();
        assert!(to_line(&long).is_err());
        let fits = core::str::from_utf8(&[b'x'; MAX_LINE_LEN - 2]).unwrap();
        assert_eq!(to_line(&fits).unwrap().len(), MAX_LINE_LEN);
    }

    #[test]
    fn test_parse_for() {
        let cmd = Command::GetPressure {
            bank: Bank::Input,
            index: 0,
        };
        assert_eq!(Reply::parse_for(&cmd, "  -3.20\r"), Ok(Reply::Pressure(-3.2)));
        assert_eq!(Reply::parse_for(&cmd, "abc"), Err(ReplyError::Malformed));
        assert_eq!(Reply::parse_for(&cmd, ""), Err(ReplyError::Empty));

        let cmd = Command::GetPumpState { pump: 1 };
        assert_eq!(Reply::parse_for(&cmd, "1"), Ok(Reply::PumpState(true)));
        assert_eq!(Reply::parse_for(&cmd, "2"), Err(ReplyError::Malformed));

        let cmd = Command::GetSetpoint { pump: 0 };
        assert_eq!(Reply::parse_for(&cmd, "-20"), Ok(Reply::Setpoint(-20)));

        let cmd = Command::SetPumpState { pump: 0, on: true };
        assert_eq!(Reply::parse_for(&cmd, "1"), Err(ReplyError::NoReplyExpected));
    }
}

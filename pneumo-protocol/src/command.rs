//! Command tokenizing, validation and encoding
//!
//! A payload is split on commas into a two-letter code, an index and a
//! value. The first letter selects what is addressed, the second letter
//! selects the bank or the direction:
//!
//! | Code      | Action                          | Reply        |
//! |-----------|---------------------------------|--------------|
//! | `SI`/`SO` | set one input/output valve      | -            |
//! | `AI`/`AO` | set every input/output valve    | -            |
//! | `GI`/`GO` | read averaged pressure (kPa)    | `12.34`      |
//! | `VI`/`VO` | read valve state                | `1`/`0`      |
//! | `RS`/`RG` | set/get pump setpoint (kPa)     | `-20`        |
//! | `PS`/`PG` | set/get pump state              | `1`/`0`      |

use core::fmt::{self, Write};

use heapless::String;

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_LEN};

/// Value sent in fields a command does not use
pub const FILLER: i32 = 99;

/// First letter of a command code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Prefix {
    /// `S`: set one valve
    SingleValve,
    /// `A`: set all valves of a bank
    AllValves,
    /// `G`: get pressure
    Pressure,
    /// `V`: get valve state
    ValveState,
    /// `R`: pump reference setpoint
    Setpoint,
    /// `P`: pump state
    PumpState,
}

impl Prefix {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'S' => Some(Self::SingleValve),
            b'A' => Some(Self::AllValves),
            b'G' => Some(Self::Pressure),
            b'V' => Some(Self::ValveState),
            b'R' => Some(Self::Setpoint),
            b'P' => Some(Self::PumpState),
            _ => None,
        }
    }
}

/// Second letter of a command code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Suffix {
    /// `I`: input bank
    Input,
    /// `O`: output bank
    Output,
    /// `S`: set
    Set,
    /// `G`: get
    Get,
}

impl Suffix {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'I' => Some(Self::Input),
            b'O' => Some(Self::Output),
            b'S' => Some(Self::Set),
            b'G' => Some(Self::Get),
            _ => None,
        }
    }
}

/// Valve and sensor bank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bank {
    /// Supply side: pump lines and vent
    Input,
    /// Device side: the eight output channels
    Output,
}

impl Bank {
    const fn letter(self) -> char {
        match self {
            Self::Input => 'I',
            Self::Output => 'O',
        }
    }
}

/// Errors from validating a command code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// First letter is not a known prefix
    InvalidPrefix {
        prefix: Option<u8>,
        suffix: Option<u8>,
    },
    /// Prefix is known but the second letter is not a known suffix
    InvalidSuffix {
        prefix: Option<u8>,
        suffix: Option<u8>,
    },
    /// Both letters are known but do not form a command
    Unsupported { prefix: Prefix, suffix: Suffix },
}

impl CommandError {
    /// Whether this error is reported back over the serial line
    ///
    /// Unsupported letter combinations are dropped without a reply.
    pub fn is_reported(&self) -> bool {
        !matches!(self, Self::Unsupported { .. })
    }
}

fn write_code(f: &mut fmt::Formatter<'_>, prefix: Option<u8>, suffix: Option<u8>) -> fmt::Result {
    for byte in [prefix, suffix].into_iter().flatten() {
        f.write_char(char::from(byte))?;
    }
    Ok(())
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::InvalidPrefix { prefix, suffix } => {
                f.write_str("Invalid serial command prefix! Received: ")?;
                write_code(f, prefix, suffix)
            }
            Self::InvalidSuffix { prefix, suffix } => {
                f.write_str("Invalid serial command suffix! Received: ")?;
                write_code(f, prefix, suffix)
            }
            Self::Unsupported { prefix, suffix } => {
                write!(f, "Unsupported serial command: {:?}/{:?}", prefix, suffix)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

/// Parse an integer the way C `atoi` does
///
/// Leading whitespace and one sign are accepted, digits are read up to the
/// first non-digit, and text without digits yields 0. Out-of-range values
/// saturate. Works on raw bytes, so line noise after the digits is ignored.
pub fn parse_int<T: AsRef<[u8]> + ?Sized>(text: &T) -> i32 {
    let bytes = text.as_ref();
    let mut pos = bytes
        .iter()
        .position(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c))
        .unwrap_or(bytes.len());

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut magnitude: i64 = 0;
    for &byte in &bytes[pos..] {
        if !byte.is_ascii_digit() {
            break;
        }
        // Cap just past i32 range so the negation below still saturates
        magnitude = (magnitude * 10 + i64::from(byte - b'0')).min(i64::from(i32::MAX) + 1);
    }

    let value = if negative { -magnitude } else { magnitude };
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Tokenized command fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fields<'a> {
    /// Command code, normally two letters
    pub code: &'a [u8],
    /// Channel or pump index, 0 when absent
    pub index: i32,
    /// Value to apply, 0 when absent
    pub value: i32,
}

impl<'a> Fields<'a> {
    /// Split a payload on commas
    ///
    /// Empty tokens are skipped, so `SI,,1,1` reads the same as `SI,1,1`.
    /// Non-UTF-8 bytes are carried through untouched.
    pub fn tokenize<T: AsRef<[u8]> + ?Sized>(payload: &'a T) -> Self {
        let mut tokens = payload
            .as_ref()
            .split(|&b| b == b',')
            .filter(|token| !token.is_empty());

        let code = tokens.next().unwrap_or(&[]);
        let index = tokens.next().map(parse_int).unwrap_or(0);
        let value = tokens.next().map(parse_int).unwrap_or(0);

        Self { code, index, value }
    }
}

/// A validated command
///
/// Indices are carried as received; range checks belong to the board
/// that knows its bank sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Open or close one valve
    SetValve { bank: Bank, index: i32, open: bool },
    /// Open or close every valve of a bank
    SetAllValves { bank: Bank, open: bool },
    /// Read the averaged pressure of one sensor
    GetPressure { bank: Bank, index: i32 },
    /// Read the state of one valve
    GetValveState { bank: Bank, index: i32 },
    /// Set a pump's reference pressure in kPa
    SetSetpoint { pump: i32, kpa: i32 },
    /// Read a pump's reference pressure
    GetSetpoint { pump: i32 },
    /// Switch a pump on or off
    SetPumpState { pump: i32, on: bool },
    /// Read whether a pump is on
    GetPumpState { pump: i32 },
}

impl Command {
    /// Tokenize and validate a payload, given as text or raw frame bytes
    pub fn parse<T: AsRef<[u8]> + ?Sized>(payload: &T) -> Result<Self, CommandError> {
        Self::from_fields(&Fields::tokenize(payload))
    }

    /// Validate tokenized fields
    ///
    /// Only the first two letters of the code are inspected.
    pub fn from_fields(fields: &Fields<'_>) -> Result<Self, CommandError> {
        let code = fields.code;
        let first = code.first().copied();
        let second = code.get(1).copied();

        let prefix = first
            .and_then(Prefix::from_byte)
            .ok_or(CommandError::InvalidPrefix {
                prefix: first,
                suffix: second,
            })?;
        let suffix = second
            .and_then(Suffix::from_byte)
            .ok_or(CommandError::InvalidSuffix {
                prefix: first,
                suffix: second,
            })?;

        let index = fields.index;
        let value = fields.value;

        let command = match (prefix, suffix) {
            (Prefix::SingleValve, Suffix::Input) => Self::SetValve {
                bank: Bank::Input,
                index,
                open: value != 0,
            },
            (Prefix::SingleValve, Suffix::Output) => Self::SetValve {
                bank: Bank::Output,
                index,
                open: value != 0,
            },
            (Prefix::AllValves, Suffix::Input) => Self::SetAllValves {
                bank: Bank::Input,
                open: value != 0,
            },
            (Prefix::AllValves, Suffix::Output) => Self::SetAllValves {
                bank: Bank::Output,
                open: value != 0,
            },
            (Prefix::Pressure, Suffix::Input) => Self::GetPressure {
                bank: Bank::Input,
                index,
            },
            (Prefix::Pressure, Suffix::Output) => Self::GetPressure {
                bank: Bank::Output,
                index,
            },
            (Prefix::ValveState, Suffix::Input) => Self::GetValveState {
                bank: Bank::Input,
                index,
            },
            (Prefix::ValveState, Suffix::Output) => Self::GetValveState {
                bank: Bank::Output,
                index,
            },
            (Prefix::Setpoint, Suffix::Set) => Self::SetSetpoint {
                pump: index,
                kpa: value,
            },
            (Prefix::Setpoint, Suffix::Get) => Self::GetSetpoint { pump: index },
            (Prefix::PumpState, Suffix::Set) => Self::SetPumpState {
                pump: index,
                on: value != 0,
            },
            (Prefix::PumpState, Suffix::Get) => Self::GetPumpState { pump: index },
            (prefix, suffix) => return Err(CommandError::Unsupported { prefix, suffix }),
        };

        Ok(command)
    }

    /// Two-letter code of this command
    pub fn code(&self) -> [u8; 2] {
        let (prefix, suffix) = match *self {
            Self::SetValve { bank, .. } => ('S', bank.letter()),
            Self::SetAllValves { bank, .. } => ('A', bank.letter()),
            Self::GetPressure { bank, .. } => ('G', bank.letter()),
            Self::GetValveState { bank, .. } => ('V', bank.letter()),
            Self::SetSetpoint { .. } => ('R', 'S'),
            Self::GetSetpoint { .. } => ('R', 'G'),
            Self::SetPumpState { .. } => ('P', 'S'),
            Self::GetPumpState { .. } => ('P', 'G'),
        };
        [prefix as u8, suffix as u8]
    }

    /// Index field as sent on the wire
    pub fn index(&self) -> i32 {
        match *self {
            Self::SetValve { index, .. }
            | Self::GetPressure { index, .. }
            | Self::GetValveState { index, .. } => index,
            Self::SetSetpoint { pump, .. }
            | Self::GetSetpoint { pump }
            | Self::SetPumpState { pump, .. }
            | Self::GetPumpState { pump } => pump,
            Self::SetAllValves { .. } => FILLER,
        }
    }

    /// Value field as sent on the wire
    pub fn value(&self) -> i32 {
        match *self {
            Self::SetValve { open, .. } | Self::SetAllValves { open, .. } => i32::from(open),
            Self::SetPumpState { on, .. } => i32::from(on),
            Self::SetSetpoint { kpa, .. } => kpa,
            Self::GetPressure { .. }
            | Self::GetValveState { .. }
            | Self::GetSetpoint { .. }
            | Self::GetPumpState { .. } => FILLER,
        }
    }

    /// Whether the board answers this command with a value line
    pub fn expects_reply(&self) -> bool {
        matches!(
            self,
            Self::GetPressure { .. }
                | Self::GetValveState { .. }
                | Self::GetSetpoint { .. }
                | Self::GetPumpState { .. }
        )
    }

    /// Payload text, e.g. `SI,1,1`
    pub fn payload(&self) -> Result<String<MAX_PAYLOAD_LEN>, FrameError> {
        let [prefix, suffix] = self.code();
        let mut text = String::new();
        write!(
            text,
            "{}{},{},{}",
            char::from(prefix),
            char::from(suffix),
            self.index(),
            self.value()
        )
        .map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(text)
    }

    /// Wrap this command in a frame ready for encoding
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        Frame::new(self.payload()?.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int_matches_atoi() {
        assert_eq!(parse_int("42"), 42);
        assert_eq!(parse_int("  -17"), -17);
        assert_eq!(parse_int("+5"), 5);
        assert_eq!(parse_int("12abc"), 12);
        assert_eq!(parse_int("abc"), 0);
        assert_eq!(parse_int(""), 0);
        assert_eq!(parse_int("-"), 0);
        assert_eq!(parse_int("99999999999"), i32::MAX);
        assert_eq!(parse_int("-99999999999"), i32::MIN);
        assert_eq!(parse_int("-2147483648"), i32::MIN);
    }

    #[test]
    fn test_tokenize() {
        let fields = Fields::tokenize("SI,1,1");
        assert_eq!(fields.code, b"SI");
        assert_eq!(fields.index, 1);
        assert_eq!(fields.value, 1);
    }

    #[test]
    fn test_tokenize_skips_empty_tokens() {
        assert_eq!(Fields::tokenize("RS,,1,,-20"), Fields::tokenize("RS,1,-20"));
        assert_eq!(Fields::tokenize(",,GI,0"), Fields::tokenize("GI,0"));
    }

    #[test]
    fn test_tokenize_missing_fields_default_to_zero() {
        let fields = Fields::tokenize("PG");
        assert_eq!(fields.code, b"PG");
        assert_eq!((fields.index, fields.value), (0, 0));

        let fields = Fields::tokenize("");
        assert!(fields.code.is_empty());
    }

    #[test]
    fn test_parse_int_stops_at_non_utf8_byte() {
        assert_eq!(parse_int(b"99\xB0"), 99);
        assert_eq!(parse_int(b"\xFF12"), 0);
    }

    #[test]
    fn test_line_noise_after_code_still_parses() {
        assert_eq!(
            Command::parse(b"GI,0,99\xB0"),
            Ok(Command::GetPressure {
                bank: Bank::Input,
                index: 0
            })
        );
        assert_eq!(
            Command::parse(b"SO,\xB03,1"),
            Ok(Command::SetValve {
                bank: Bank::Output,
                index: 0,
                open: true
            })
        );
    }

    #[test]
    fn test_non_ascii_code_bytes_rejected() {
        assert_eq!(
            Command::parse(b"\xB0I,0,1"),
            Err(CommandError::InvalidPrefix {
                prefix: Some(0xB0),
                suffix: Some(b'I')
            })
        );
        assert_eq!(
            Command::parse(b"G\xB0,0,1"),
            Err(CommandError::InvalidSuffix {
                prefix: Some(b'G'),
                suffix: Some(0xB0)
            })
        );
    }

    #[test]
    fn test_parse_valve_commands() {
        assert_eq!(
            Command::parse("SI,2,1"),
            Ok(Command::SetValve {
                bank: Bank::Input,
                index: 2,
                open: true
            })
        );
        assert_eq!(
            Command::parse("AO,99,0"),
            Ok(Command::SetAllValves {
                bank: Bank::Output,
                open: false
            })
        );
        assert_eq!(
            Command::parse("VO,7,99"),
            Ok(Command::GetValveState {
                bank: Bank::Output,
                index: 7
            })
        );
    }

    #[test]
    fn test_nonzero_value_means_open() {
        assert_eq!(
            Command::parse("SO,3,5"),
            Ok(Command::SetValve {
                bank: Bank::Output,
                index: 3,
                open: true
            })
        );
        assert_eq!(
            Command::parse("PS,0,-1"),
            Ok(Command::SetPumpState { pump: 0, on: true })
        );
    }

    #[test]
    fn test_parse_pump_commands() {
        assert_eq!(
            Command::parse("RS,0,-30"),
            Ok(Command::SetSetpoint { pump: 0, kpa: -30 })
        );
        assert_eq!(Command::parse("RG,1,99"), Ok(Command::GetSetpoint { pump: 1 }));
        assert_eq!(Command::parse("PG,1,99"), Ok(Command::GetPumpState { pump: 1 }));
    }

    #[test]
    fn test_extra_code_letters_ignored() {
        assert_eq!(
            Command::parse("GIX,1,99"),
            Ok(Command::GetPressure {
                bank: Bank::Input,
                index: 1
            })
        );
    }

    #[test]
    fn test_invalid_prefix() {
        let err = Command::parse("XI,1,1").unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidPrefix {
                prefix: Some(b'X'),
                suffix: Some(b'I')
            }
        );
        assert!(err.is_reported());

        let mut text: String<64> = String::new();
        write!(text, "{}", err).unwrap();
        assert_eq!(text.as_str(), "Invalid serial command prefix! Received: XI");
    }

    #[test]
    fn test_invalid_suffix() {
        let err = Command::parse("GX,1,1").unwrap_err();
        let mut text: String<64> = String::new();
        write!(text, "{}", err).unwrap();
        assert_eq!(text.as_str(), "Invalid serial command suffix! Received: GX");
    }

    #[test]
    fn test_invalid_prefix_wins_over_suffix() {
        assert!(matches!(
            Command::parse("ZZ,0,0"),
            Err(CommandError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_short_codes() {
        let mut text: String<64> = String::new();
        write!(text, "{}", Command::parse("").unwrap_err()).unwrap();
        assert_eq!(text.as_str(), "Invalid serial command prefix! Received: ");

        text.clear();
        write!(text, "{}", Command::parse("S,1,1").unwrap_err()).unwrap();
        assert_eq!(text.as_str(), "Invalid serial command suffix! Received: S");
    }

    #[test]
    fn test_unsupported_combination_is_silent() {
        for code in ["SS", "SG", "RI", "RO", "PI", "PO", "GS", "VG", "AS"] {
            let err = Command::parse(code).unwrap_err();
            assert!(matches!(err, CommandError::Unsupported { .. }), "{}", code);
            assert!(!err.is_reported());
        }
    }

    #[test]
    fn test_payload_uses_filler() {
        let cmd = Command::SetAllValves {
            bank: Bank::Input,
            open: true,
        };
        assert_eq!(cmd.payload().unwrap().as_str(), "AI,99,1");

        let cmd = Command::GetPressure {
            bank: Bank::Output,
            index: 4,
        };
        assert_eq!(cmd.payload().unwrap().as_str(), "GO,4,99");
        assert!(cmd.expects_reply());
    }

    #[test]
    fn test_to_frame() {
        let cmd = Command::SetSetpoint { pump: 1, kpa: 25 };
        let frame = cmd.to_frame().unwrap();
        assert_eq!(&frame.encode_to_vec().unwrap()[..], b"<RS,1,25>");
        assert!(!cmd.expects_reply());
    }

    #[test]
    fn test_oversized_payload_rejected() {
        let cmd = Command::SetValve {
            bank: Bank::Output,
            index: i32::MIN,
            open: true,
        };
        // "SO,-2147483648,1" is 16 bytes and still fits
        assert!(cmd.to_frame().is_ok());

        let cmd = Command::SetSetpoint {
            pump: i32::MIN,
            kpa: i32::MIN,
        };
        assert_eq!(cmd.to_frame(), Err(FrameError::PayloadTooLarge));
    }
}

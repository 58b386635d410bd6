//! Serial connection to the board
//!
//! Every request is written as `<payload>\n`. The board first echoes the
//! payload on its own line, then getters add one value line.

use std::io::{ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use log::{debug, info, trace, warn};
use pneumo_protocol::{
    Bank, Command, InputValve, Pump, Reply, END_MARKER, MAX_LINE_LEN, MAX_PAYLOAD_LEN,
    START_MARKER,
};
use serialport::SerialPort;

use crate::channels::ChannelMap;

/// Default link speed
pub const DEFAULT_BAUD: u32 = 19_200;

/// Lines read past a mismatched echo while looking for the real one
const MAX_STALE_LINES: usize = 4;

/// Time the vent valve stays open when switching input lines
pub const DEFAULT_SWITCH_DELAY: Duration = Duration::from_secs(5);

/// Outcome of a raw exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReport {
    /// Echo line returned by the board
    pub echo: String,
    /// Whether the echo matched what was sent
    pub echoed: bool,
    /// Extra line following the echo, if one arrived before the timeout
    pub reply: Option<String>,
}

/// Connection to one board
pub struct PneumaticConnection<T> {
    port: T,
    channels: ChannelMap,
}

impl PneumaticConnection<Box<dyn SerialPort>> {
    /// Open a serial device
    pub fn open(path: &str, baud: u32, timeout: Duration, channels: ChannelMap) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .with_context(|| format!("failed to open serial port {}", path))?;
        info!("Opened {} at {} baud", path, baud);
        Ok(Self::new(port, channels))
    }
}

impl<T: Read + Write> PneumaticConnection<T> {
    pub fn new(port: T, channels: ChannelMap) -> Self {
        Self { port, channels }
    }

    /// Give back the underlying port
    pub fn into_inner(self) -> T {
        self.port
    }

    /// Send a command and check its echo
    ///
    /// Returns `false` when the echo differs from the payload.
    pub fn send(&mut self, command: &Command) -> Result<bool> {
        let payload = command
            .payload()
            .with_context(|| format!("cannot encode {:?}", command))?;
        self.send_raw(&payload)
    }

    /// Send a raw payload and check its echo
    pub fn send_raw(&mut self, payload: &str) -> Result<bool> {
        let echo = self.exchange(payload)?;
        Ok(echo_matches(payload, &echo))
    }

    /// Read one line, without its CR/LF terminator
    ///
    /// A read timeout is an error.
    pub fn read_line(&mut self) -> Result<String> {
        match self.try_read_line()? {
            Some(line) => Ok(line),
            None => bail!("timed out waiting for a line from the board"),
        }
    }

    /// Open or close one valve by name
    pub fn set_single_valve(&mut self, name: &str, open: bool) -> Result<bool> {
        let target = self.channels.valve(name)?;
        self.send(&Command::SetValve {
            bank: target.bank,
            index: target.index,
            open,
        })
    }

    /// Open or close every valve of the input or output bank
    pub fn set_valve_group(&mut self, inputs: bool, open: bool) -> Result<bool> {
        let bank = if inputs { Bank::Input } else { Bank::Output };
        self.send(&Command::SetAllValves { bank, open })
    }

    pub fn get_valve_state(&mut self, name: &str) -> Result<bool> {
        let target = self.channels.valve(name)?;
        let command = Command::GetValveState {
            bank: target.bank,
            index: target.index,
        };
        match self.query(&command)? {
            Reply::ValveState(open) => Ok(open),
            other => bail!("unexpected reply {:?}", other),
        }
    }

    /// Averaged pressure in kPa of a named sensor
    pub fn get_pressure(&mut self, name: &str) -> Result<f32> {
        let target = self.channels.sensor(name)?;
        let command = Command::GetPressure {
            bank: target.bank,
            index: target.index,
        };
        match self.query(&command)? {
            Reply::Pressure(kpa) => Ok(kpa),
            other => bail!("unexpected reply {:?}", other),
        }
    }

    pub fn set_reference_setpoint(&mut self, pump: &str, kpa: i32) -> Result<bool> {
        let pump = self.channels.pump(pump)?;
        self.send(&Command::SetSetpoint {
            pump: wire_index(pump),
            kpa,
        })
    }

    pub fn get_reference_setpoint(&mut self, pump: &str) -> Result<i32> {
        let pump = self.channels.pump(pump)?;
        match self.query(&Command::GetSetpoint {
            pump: wire_index(pump),
        })? {
            Reply::Setpoint(kpa) => Ok(kpa),
            other => bail!("unexpected reply {:?}", other),
        }
    }

    pub fn set_pump_state(&mut self, pump: &str, on: bool) -> Result<bool> {
        let pump = self.channels.pump(pump)?;
        self.send(&Command::SetPumpState {
            pump: wire_index(pump),
            on,
        })
    }

    pub fn get_pump_state(&mut self, pump: &str) -> Result<bool> {
        let pump = self.channels.pump(pump)?;
        match self.query(&Command::GetPumpState {
            pump: wire_index(pump),
        })? {
            Reply::PumpState(on) => Ok(on),
            other => bail!("unexpected reply {:?}", other),
        }
    }

    /// Supply-line pressures as `(NEG, POS)`
    pub fn get_pump_pressures(&mut self) -> Result<(f32, f32)> {
        let neg = self.get_pressure(Pump::Negative.sensor().name())?;
        let pos = self.get_pressure(Pump::Positive.sensor().name())?;
        debug!("Pump pressures: NEG {:.2} kPa, POS {:.2} kPa", neg, pos);
        Ok((neg, pos))
    }

    /// Change which supply line feeds the outputs
    ///
    /// Closes every input valve, vents through `NEU` for `delay`, closes the
    /// vent and opens the requested input valve.
    pub fn switch_input_channel(&mut self, name: &str, delay: Duration) -> Result<()> {
        let valve = self.channels.input_valve(name)?;
        let neutral = InputValve::Neutral.name();

        info!("Switching input to {}", valve.name());
        self.set_valve_group(true, false)?;
        self.set_single_valve(neutral, true)?;

        thread::sleep(delay);

        self.set_single_valve(neutral, false)?;
        self.set_single_valve(valve.name(), true)?;
        Ok(())
    }

    /// Send arbitrary text and report the echo plus any reply line
    pub fn test_connection(&mut self, text: &str) -> Result<EchoReport> {
        let echo = self.exchange(text)?;
        let echoed = echo_matches(text, &echo);
        if !echoed {
            warn!("Serial link looks broken: sent {:?}, board echoed {:?}", text, echo);
        }

        let reply = self.try_read_line()?;
        Ok(EchoReport {
            echo,
            echoed,
            reply,
        })
    }

    /// Send a getter and parse its value line
    fn query(&mut self, command: &Command) -> Result<Reply> {
        self.send(command)?;
        let line = self.read_line()?;
        Reply::parse_for(command, &line)
            .with_context(|| format!("board answered {:?} with {:?}", command, line))
    }

    /// Write one framed payload and read back its echo line
    ///
    /// Setters never read past their echo, so an error line they caused is
    /// still queued when the next request goes out. Such lines are skipped
    /// until the echo turns up; if it never does, the first line is returned.
    fn exchange(&mut self, payload: &str) -> Result<String> {
        let mut request = Vec::with_capacity(payload.len() + 3);
        request.push(START_MARKER);
        request.extend_from_slice(payload.as_bytes());
        request.push(END_MARKER);
        request.push(b'\n');

        trace!("TX {:?}", String::from_utf8_lossy(&request));
        self.port
            .write_all(&request)
            .context("failed to write to the board")?;
        self.port.flush().context("failed to flush the serial port")?;

        let first = self.read_line().context("no echo from the board")?;
        if echo_matches(payload, &first) {
            return Ok(first);
        }

        for _ in 0..MAX_STALE_LINES {
            match self.try_read_line()? {
                Some(line) if echo_matches(payload, &line) => {
                    warn!("Board reported {:?} before echoing {:?}", first, payload);
                    return Ok(line);
                }
                Some(line) => debug!("Skipping stale line {:?}", line),
                None => break,
            }
        }

        warn!("Echo mismatch: sent {:?}, board returned {:?}", payload, first);
        Ok(first)
    }

    /// Read one line, `None` on timeout
    fn try_read_line(&mut self) -> Result<Option<String>> {
        let mut line = Vec::new();
        let mut byte = [0u8; 1];

        loop {
            match self.port.read(&mut byte) {
                Ok(0) => bail!("serial port closed"),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if !line.is_empty() {
                        warn!("Timed out with a partial line: {:?}", String::from_utf8_lossy(&line));
                    }
                    return Ok(None);
                }
                Err(e) => return Err(e).context("failed to read from the board"),
            }

            match byte[0] {
                b'\n' => break,
                b'\r' => {}
                b => {
                    if line.len() >= MAX_LINE_LEN {
                        bail!("line from the board exceeds {} bytes", MAX_LINE_LEN);
                    }
                    line.push(b);
                }
            }
        }

        let line = String::from_utf8_lossy(&line).trim().to_string();
        trace!("RX {:?}", line);
        Ok(Some(line))
    }
}

fn wire_index(pump: Pump) -> i32 {
    pump.index() as i32
}

/// The board keeps at most the first payload-sized bytes of a frame
fn echo_matches(sent: &str, echo: &str) -> bool {
    let sent = sent.as_bytes();
    let kept = &sent[..sent.len().min(MAX_PAYLOAD_LEN)];
    kept == echo.trim().as_bytes()
}

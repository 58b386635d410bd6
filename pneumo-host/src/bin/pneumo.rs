//! `pneumo` - command line client for the pneumatic control board

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;

use pneumo_host::{ChannelMap, PneumaticConnection, DEFAULT_BAUD, DEFAULT_SWITCH_DELAY};
use pneumo_protocol::{Pump, FILLER};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Serial device, e.g. /dev/ttyACM0 or COM7
    #[arg(short, long)]
    port: String,

    /// Link speed
    #[arg(short, long, default_value_t = DEFAULT_BAUD)]
    baud: u32,

    /// Read timeout per line
    #[arg(long, default_value_t = 1000)]
    timeout_ms: u64,

    /// Number of output channels wired on the rig
    #[arg(long, default_value_t = 8)]
    outputs: usize,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Send a raw command and print the echo and any reply
    Send {
        /// Two-letter command code, e.g. SI
        code: String,
        #[arg(allow_negative_numbers = true)]
        index: i32,
        #[arg(allow_negative_numbers = true)]
        value: i32,
    },
    /// Open or close one valve
    Valve { name: String, state: ValveState },
    /// Open or close a whole valve bank
    Valves { bank: ValveBank, state: ValveState },
    /// Print whether a valve is open
    ValveState { name: String },
    /// Print a sensor's averaged pressure
    Pressure { name: String },
    /// Print both supply-line pressures
    Pumps,
    /// Print or set a pump's reference pressure
    Setpoint {
        pump: String,
        #[arg(allow_negative_numbers = true)]
        value: Option<i32>,
    },
    /// Print or set a pump's on/off state
    Pump { pump: String, state: Option<PumpState> },
    /// Vent through NEU, then open the given input valve
    Switch {
        name: String,
        #[arg(long, default_value_t = DEFAULT_SWITCH_DELAY.as_secs_f64())]
        delay_s: f64,
    },
    /// Interactive loop reading `CODE INDEX VALUE` lines
    Repl,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ValveState {
    Open,
    Closed,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ValveBank {
    Inputs,
    Outputs,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PumpState {
    On,
    Off,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    debug!("{:?}", args);

    let mut board = PneumaticConnection::open(
        &args.port,
        args.baud,
        Duration::from_millis(args.timeout_ms),
        ChannelMap::with_outputs(args.outputs),
    )?;

    match args.command {
        Cmd::Send { code, index, value } => {
            print_exchange(&mut board, &format!("{},{},{}", code, index, value))?;
        }
        Cmd::Valve { name, state } => {
            let open = matches!(state, ValveState::Open);
            check_echo(board.set_single_valve(&name, open)?);
        }
        Cmd::Valves { bank, state } => {
            let inputs = matches!(bank, ValveBank::Inputs);
            let open = matches!(state, ValveState::Open);
            check_echo(board.set_valve_group(inputs, open)?);
        }
        Cmd::ValveState { name } => {
            let open = board.get_valve_state(&name)?;
            println!("{}: {}", name, if open { "open" } else { "closed" });
        }
        Cmd::Pressure { name } => {
            println!("{}: {:.2} kPa", name, board.get_pressure(&name)?);
        }
        Cmd::Pumps => {
            let (neg, pos) = board.get_pump_pressures()?;
            println!("{}: {:.2} kPa", Pump::Negative.name(), neg);
            println!("{}: {:.2} kPa", Pump::Positive.name(), pos);
        }
        Cmd::Setpoint { pump, value } => match value {
            Some(kpa) => check_echo(board.set_reference_setpoint(&pump, kpa)?),
            None => println!("{}: {} kPa", pump, board.get_reference_setpoint(&pump)?),
        },
        Cmd::Pump { pump, state } => match state {
            Some(state) => {
                let on = matches!(state, PumpState::On);
                check_echo(board.set_pump_state(&pump, on)?);
            }
            None => {
                let on = board.get_pump_state(&pump)?;
                println!("{}: {}", pump, if on { "on" } else { "off" });
            }
        },
        Cmd::Switch { name, delay_s } => {
            if !delay_s.is_finite() || delay_s < 0.0 {
                bail!("delay must be a non-negative number of seconds");
            }
            board.switch_input_channel(&name, Duration::from_secs_f64(delay_s))?;
            println!("Input switched to {}", name.to_ascii_uppercase());
        }
        Cmd::Repl => repl(&mut board)?,
    }

    Ok(())
}

fn check_echo(echoed: bool) {
    if !echoed {
        eprintln!("warning: board echo did not match the command");
    }
}

fn print_exchange<T: io::Read + io::Write>(
    board: &mut PneumaticConnection<T>,
    payload: &str,
) -> Result<()> {
    let report = board.test_connection(payload)?;
    println!("echo:  {} ({})", report.echo, if report.echoed { "ok" } else { "MISMATCH" });
    if let Some(reply) = report.reply {
        println!("reply: {}", reply);
    }
    Ok(())
}

/// Parse `CODE [INDEX [VALUE]]`, separated by spaces or commas
fn parse_repl_line(line: &str) -> Result<String> {
    let mut fields = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|f| !f.is_empty());

    let code = fields.next().context("missing command code")?;
    let mut number = |what: &str| -> Result<i32> {
        match fields.next() {
            Some(text) => text
                .parse()
                .with_context(|| format!("{} must be an integer, got {:?}", what, text)),
            None => Ok(FILLER),
        }
    };
    let index = number("index")?;
    let value = number("value")?;

    if fields.next().is_some() {
        bail!("expected at most CODE INDEX VALUE");
    }
    Ok(format!("{},{},{}", code, index, value))
}

fn repl<T: io::Read + io::Write>(board: &mut PneumaticConnection<T>) -> Result<()> {
    println!("Enter CODE INDEX VALUE (missing fields default to {}), 'quit' to exit", FILLER);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            return Ok(());
        };
        let line = line?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            return Ok(());
        }

        let result = parse_repl_line(line).and_then(|payload| print_exchange(board, &payload));
        if let Err(e) = result {
            eprintln!("error: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repl_line() {
        assert_eq!(parse_repl_line("SI 1 1").unwrap(), "SI,1,1");
        assert_eq!(parse_repl_line("RS,0,-40").unwrap(), "RS,0,-40");
        assert_eq!(parse_repl_line("PG 1").unwrap(), "PG,1,99");
        assert_eq!(parse_repl_line("AO").unwrap(), "AO,99,99");
        assert!(parse_repl_line("SI x 1").is_err());
        assert!(parse_repl_line("SI 1 1 1").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["pneumo", "--port", "/dev/ttyACM0", "setpoint", "NEG", "-45"])
            .unwrap();
        assert_eq!(args.baud, DEFAULT_BAUD);
        match args.command {
            Cmd::Setpoint { pump, value } => {
                assert_eq!(pump, "NEG");
                assert_eq!(value, Some(-45));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

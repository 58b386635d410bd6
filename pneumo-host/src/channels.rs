//! Channel names used by the host tooling
//!
//! Input-side channels have fixed names: `NEG`, `NEU` and `POS` for the
//! valves, `NEG` and `POS` for the sensors and pumps. Output channels are
//! called `OUT0`, `OUT1`, ... up to the number wired on the rig.

use anyhow::{bail, Result};
use pneumo_core::config::NUM_OUT_VALVES;
use pneumo_protocol::{Bank, InputSensor, InputValve, Pump};

/// Prefix of output channel names
pub const OUTPUT_PREFIX: &str = "OUT";

/// A named channel resolved to its bank and wire index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub bank: Bank,
    pub index: i32,
}

impl Target {
    const fn input(index: usize) -> Self {
        Self {
            bank: Bank::Input,
            index: index as i32,
        }
    }

    const fn output(index: usize) -> Self {
        Self {
            bank: Bank::Output,
            index: index as i32,
        }
    }
}

/// Name to index mapping for one rig
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelMap {
    outputs: usize,
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self::with_outputs(NUM_OUT_VALVES)
    }
}

impl ChannelMap {
    /// Map with `outputs` output channels, capped at the board's eight
    pub fn with_outputs(outputs: usize) -> Self {
        Self {
            outputs: outputs.min(NUM_OUT_VALVES),
        }
    }

    /// Number of named output channels
    pub fn outputs(&self) -> usize {
        self.outputs
    }

    /// Resolve a valve name
    pub fn valve(&self, name: &str) -> Result<Target> {
        let name = name.to_ascii_uppercase();
        if let Some(valve) = InputValve::from_name(&name) {
            return Ok(Target::input(valve.index()));
        }
        match self.output_index(&name) {
            Some(index) => Ok(Target::output(index)),
            None => bail!("unknown valve {:?}", name),
        }
    }

    /// Resolve a pressure sensor name
    pub fn sensor(&self, name: &str) -> Result<Target> {
        let name = name.to_ascii_uppercase();
        if let Some(sensor) = InputSensor::from_name(&name) {
            return Ok(Target::input(sensor.index()));
        }
        match self.output_index(&name) {
            Some(index) => Ok(Target::output(index)),
            None => bail!("unknown sensor {:?}", name),
        }
    }

    /// Resolve a pump name
    pub fn pump(&self, name: &str) -> Result<Pump> {
        match Pump::from_name(&name.to_ascii_uppercase()) {
            Some(pump) => Ok(pump),
            None => bail!("unknown pump {:?}, expected NEG or POS", name),
        }
    }

    /// Resolve an input valve name, rejecting output channels
    pub fn input_valve(&self, name: &str) -> Result<InputValve> {
        match InputValve::from_name(&name.to_ascii_uppercase()) {
            Some(valve) => Ok(valve),
            None => bail!("{:?} is not an input valve, expected NEG, NEU or POS", name),
        }
    }

    /// All output channel names
    pub fn output_names(&self) -> impl Iterator<Item = String> {
        (0..self.outputs).map(|i| format!("{}{}", OUTPUT_PREFIX, i))
    }

    fn output_index(&self, name: &str) -> Option<usize> {
        let digits = name.strip_prefix(OUTPUT_PREFIX)?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: usize = digits.parse().ok()?;
        (index < self.outputs).then_some(index)
    }
}

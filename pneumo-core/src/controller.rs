//! Board state and command dispatch
//!
//! The controller owns every actuator and every pressure channel. Serial
//! commands are executed against it, the sampler feeds it readings, and
//! each sampling tick runs one regulation step for the pumps.

use core::fmt;

use heapless::Vec;
use pneumo_protocol::{echo_line, to_line, Bank, Command, Frame, Line, Pump, Reply};

use crate::config::{
    BoardConfig, NUM_IN_SENSORS, NUM_IN_VALVES, NUM_OUT_SENSORS, NUM_OUT_VALVES, NUM_PUMPS,
};
use crate::regulation::PumpRegulator;
use crate::sensor::{LinearCalibration, PressureChannel};
use crate::traits::{ActuatorError, PumpOutput, ValveOutput};

/// Errors from executing a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Index is negative or past the end of the addressed bank
    IndexOutOfRange { code: [u8; 2], index: i32 },
    /// An actuator rejected the write
    Actuator { code: [u8; 2], error: ActuatorError },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::IndexOutOfRange { code, index } => write!(
                f,
                "Invalid index! Received: {}{},{}",
                char::from(code[0]),
                char::from(code[1]),
                index
            ),
            Self::Actuator { code, .. } => write!(
                f,
                "Actuator fault! Received: {}{}",
                char::from(code[0]),
                char::from(code[1])
            ),
        }
    }
}

/// Lines sent back for one frame: the echo, then at most one more
pub type FrameLines = Vec<Line, 2>;

/// Map a wire index onto a bank of `len` entries
fn slot(index: i32, len: usize) -> Option<usize> {
    usize::try_from(index).ok().filter(|&i| i < len)
}

/// Pneumatic board state machine
pub struct Controller<V, P> {
    config: BoardConfig,
    in_valves: [V; NUM_IN_VALVES],
    out_valves: [V; NUM_OUT_VALVES],
    pumps: [P; NUM_PUMPS],
    pump_on: [bool; NUM_PUMPS],
    setpoints_kpa: [i32; NUM_PUMPS],
    regulators: [PumpRegulator; NUM_PUMPS],
    in_sensors: [PressureChannel; NUM_IN_SENSORS],
    out_sensors: [PressureChannel; NUM_OUT_SENSORS],
}

impl<V: ValveOutput, P: PumpOutput> Controller<V, P> {
    /// Take ownership of the actuators and drive them to a safe state
    ///
    /// Every valve is closed and every pump stopped before returning.
    pub fn new(
        config: BoardConfig,
        in_valves: [V; NUM_IN_VALVES],
        out_valves: [V; NUM_OUT_VALVES],
        pumps: [P; NUM_PUMPS],
    ) -> Result<Self, ActuatorError> {
        let cal = &config.calibration;
        let alpha = config.sampling.filter_alpha;
        let hysteresis = config.regulation.hysteresis_kpa;

        let in_sensors = core::array::from_fn(|i| {
            PressureChannel::new(
                LinearCalibration::from_config(cal, cal.input_offsets_v[i]),
                alpha,
            )
        });
        let out_sensors = core::array::from_fn(|i| {
            PressureChannel::new(
                LinearCalibration::from_config(cal, cal.output_offsets_v[i]),
                alpha,
            )
        });
        let regulators = Pump::ALL.map(|pump| PumpRegulator::new(pump.into(), hysteresis));

        let mut controller = Self {
            config,
            in_valves,
            out_valves,
            pumps,
            pump_on: [false; NUM_PUMPS],
            setpoints_kpa: [0; NUM_PUMPS],
            regulators,
            in_sensors,
            out_sensors,
        };
        controller.reset_outputs()?;
        Ok(controller)
    }

    /// Close every valve and stop every pump
    pub fn reset_outputs(&mut self) -> Result<(), ActuatorError> {
        for valve in self.in_valves.iter_mut().chain(self.out_valves.iter_mut()) {
            valve.set_open(false)?;
        }
        for (i, pump) in self.pumps.iter_mut().enumerate() {
            pump.set_duty(0)?;
            self.pump_on[i] = false;
            self.regulators[i].reset();
        }
        Ok(())
    }

    /// Execute one command, returning the value to report for getters
    pub fn execute(&mut self, command: &Command) -> Result<Option<Reply>, DispatchError> {
        let code = command.code();
        let fault = |error| DispatchError::Actuator { code, error };
        let out_of_range = |index| DispatchError::IndexOutOfRange { code, index };

        match *command {
            Command::SetValve { bank, index, open } => {
                let valve = self.valve_mut(bank, index).ok_or(out_of_range(index))?;
                valve.set_open(open).map_err(fault)?;
                Ok(None)
            }
            Command::SetAllValves { bank, open } => {
                for valve in self.bank_mut(bank) {
                    valve.set_open(open).map_err(fault)?;
                }
                Ok(None)
            }
            Command::GetPressure { bank, index } => {
                let channel = self.pressure(bank, index).ok_or(out_of_range(index))?;
                Ok(Some(Reply::Pressure(channel.reported_kpa())))
            }
            Command::GetValveState { bank, index } => {
                let open = self.valve_open(bank, index).ok_or(out_of_range(index))?;
                Ok(Some(Reply::ValveState(open)))
            }
            Command::SetSetpoint { pump, kpa } => {
                let i = slot(pump, NUM_PUMPS).ok_or(out_of_range(pump))?;
                self.setpoints_kpa[i] = kpa;
                Ok(None)
            }
            Command::GetSetpoint { pump } => {
                let i = slot(pump, NUM_PUMPS).ok_or(out_of_range(pump))?;
                Ok(Some(Reply::Setpoint(self.setpoints_kpa[i])))
            }
            Command::SetPumpState { pump, on } => {
                let i = slot(pump, NUM_PUMPS).ok_or(out_of_range(pump))?;
                self.set_pump_state(i, on).map_err(fault)?;
                Ok(None)
            }
            Command::GetPumpState { pump } => {
                let i = slot(pump, NUM_PUMPS).ok_or(out_of_range(pump))?;
                Ok(Some(Reply::PumpState(self.pump_on[i])))
            }
        }
    }

    /// Answer one received frame
    ///
    /// The echo always comes first. Getters add their value, rejected codes
    /// and failed commands add an error line, and unsupported letter pairs
    /// stay silent.
    pub fn handle_frame(&mut self, frame: &Frame) -> FrameLines {
        let mut lines = FrameLines::new();
        // Capacity is two, the echo always fits
        let _ = lines.push(echo_line(frame));

        let line = match Command::parse(frame.as_bytes()) {
            Ok(command) => match self.execute(&command) {
                Ok(Some(reply)) => to_line(&reply),
                Ok(None) => return lines,
                Err(e) => to_line(&e),
            },
            Err(e) if e.is_reported() => to_line(&e),
            Err(_) => return lines,
        };

        if let Ok(line) = line {
            let _ = lines.push(line);
        }
        lines
    }

    /// Switch a pump on at the configured duty, or off
    fn set_pump_state(&mut self, i: usize, on: bool) -> Result<(), ActuatorError> {
        let duty = if on { self.config.regulation.duty } else { 0 };
        self.drive(i, duty)?;

        self.pump_on[i] = on;
        if on {
            self.regulators[i].engage();
        } else {
            self.regulators[i].reset();
        }
        Ok(())
    }

    /// Write a pump duty if it differs from the current one
    fn drive(&mut self, i: usize, duty: u8) -> Result<(), ActuatorError> {
        let pump = &mut self.pumps[i];
        if pump.duty() != duty {
            pump.set_duty(duty)?;
        }
        Ok(())
    }

    /// Feed one raw ADC reading into a sensor channel
    ///
    /// Returns the calibrated pressure, or `None` if the index is out of range.
    pub fn record_sample(&mut self, bank: Bank, index: usize, raw: u16) -> Option<f32> {
        let channel = match bank {
            Bank::Input => self.in_sensors.get_mut(index)?,
            Bank::Output => self.out_sensors.get_mut(index)?,
        };
        Some(channel.record(raw))
    }

    /// Run one regulation step for every pump that is switched on
    ///
    /// All pumps are visited even if one fails; the first error is returned.
    pub fn regulate(&mut self) -> Result<(), ActuatorError> {
        let mut result = Ok(());
        for pump in Pump::ALL {
            if let Err(e) = self.regulate_pump(pump) {
                result = result.and(Err(e));
            }
        }
        result
    }

    fn regulate_pump(&mut self, pump: Pump) -> Result<(), ActuatorError> {
        let i = pump.index();
        if !self.pump_on[i] {
            return Ok(());
        }

        let duty = self.config.regulation.duty;
        if !self.config.regulation.enabled {
            return self.drive(i, duty);
        }

        // Keep the duty set by the last command until the line has a reading
        let Some(measured) = self.in_sensors[pump.sensor().index()].average_kpa() else {
            return Ok(());
        };

        let driving = self.regulators[i].update(self.setpoints_kpa[i] as f32, measured);
        self.drive(i, if driving { duty } else { 0 })
    }

    fn bank_mut(&mut self, bank: Bank) -> &mut [V] {
        match bank {
            Bank::Input => &mut self.in_valves,
            Bank::Output => &mut self.out_valves,
        }
    }

    fn valve_mut(&mut self, bank: Bank, index: i32) -> Option<&mut V> {
        let valves = self.bank_mut(bank);
        let i = slot(index, valves.len())?;
        valves.get_mut(i)
    }

    /// State of one valve, `None` if the index is out of range
    pub fn valve_open(&self, bank: Bank, index: i32) -> Option<bool> {
        let valves: &[V] = match bank {
            Bank::Input => &self.in_valves,
            Bank::Output => &self.out_valves,
        };
        let i = slot(index, valves.len())?;
        Some(valves[i].is_open())
    }

    /// Pressure channel, `None` if the index is out of range
    pub fn pressure(&self, bank: Bank, index: i32) -> Option<&PressureChannel> {
        let channels: &[PressureChannel] = match bank {
            Bank::Input => &self.in_sensors,
            Bank::Output => &self.out_sensors,
        };
        let i = slot(index, channels.len())?;
        Some(&channels[i])
    }

    pub fn pump_on(&self, pump: Pump) -> bool {
        self.pump_on[pump.index()]
    }

    pub fn pump_duty(&self, pump: Pump) -> u8 {
        self.pumps[pump.index()].duty()
    }

    pub fn setpoint_kpa(&self, pump: Pump) -> i32 {
        self.setpoints_kpa[pump.index()]
    }
}

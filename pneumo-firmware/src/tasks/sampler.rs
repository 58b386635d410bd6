//! Pressure sampling and pump regulation task
//!
//! Every sampling period the task reads both supply-line sensors, sweeps
//! the output sensors through the multiplexer, records the readings and
//! runs one regulation step.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker, Timer};

use pneumo_core::config::{SamplingConfig, NUM_IN_SENSORS, NUM_OUT_SENSORS};
use pneumo_protocol::{Bank, Pump};

use crate::board::{SensorMux, SharedController};

/// Analog front-end owned by the sampler
pub struct SensorInputs {
    pub adc: Adc<'static, Async>,
    /// Supply-line sensors, indexed like [`pneumo_protocol::InputSensor`]
    pub inputs: [Channel<'static>; NUM_IN_SENSORS],
    /// ADC input wired to the multiplexer's common pin
    pub mux_common: Channel<'static>,
    pub mux: SensorMux,
}

/// Sampler task - reads all sensors and regulates the pumps
#[embassy_executor::task]
pub async fn sampler_task(
    mut sensors: SensorInputs,
    controller: &'static SharedController,
    config: SamplingConfig,
) {
    info!("Sampler task started ({} ms period)", config.period_ms);

    let settle = Duration::from_micros(u64::from(config.mux_settle_us));
    let mut ticker = Ticker::every(Duration::from_millis(u64::from(config.period_ms)));

    let mut in_raw = [None; NUM_IN_SENSORS];
    let mut out_raw = [None; NUM_OUT_SENSORS];

    loop {
        for (slot, channel) in in_raw.iter_mut().zip(sensors.inputs.iter_mut()) {
            *slot = read_channel(&mut sensors.adc, channel).await;
        }

        for (i, slot) in out_raw.iter_mut().enumerate() {
            *slot = match sensors.mux.select(i as u8) {
                Ok(()) => {
                    Timer::after(settle).await;
                    read_channel(&mut sensors.adc, &mut sensors.mux_common).await
                }
                Err(e) => {
                    warn!(
                        "Mux select {} failed: {:?} (selected {:?})",
                        i,
                        e,
                        sensors.mux.selected()
                    );
                    None
                }
            };
        }

        {
            let mut board = controller.lock().await;

            for (i, raw) in in_raw.iter().enumerate() {
                if let Some(raw) = *raw {
                    board.record_sample(Bank::Input, i, raw);
                }
            }
            for (i, raw) in out_raw.iter().enumerate() {
                if let Some(raw) = *raw {
                    board.record_sample(Bank::Output, i, raw);
                }
            }

            if let Err(e) = board.regulate() {
                warn!("Pump regulation write failed: {:?}", e);
            }

            for pump in Pump::ALL {
                let sensor = pump.sensor();
                if let Some(channel) = board.pressure(Bank::Input, sensor.index() as i32) {
                    trace!(
                        "{} line: raw {:?}, {:?} kPa, avg {} kPa | pump on={} duty={} sp={} kPa",
                        sensor.name(),
                        channel.raw(),
                        channel.current_kpa(),
                        channel.reported_kpa(),
                        board.pump_on(pump),
                        board.pump_duty(pump),
                        board.setpoint_kpa(pump)
                    );
                }
            }
        }

        ticker.next().await;
    }
}

/// Read one ADC channel, logging failures
async fn read_channel(adc: &mut Adc<'static, Async>, channel: &mut Channel<'static>) -> Option<u16> {
    match adc.read(channel).await {
        Ok(raw) => Some(raw),
        Err(e) => {
            warn!("ADC read error: {:?}", e);
            None
        }
    }
}

//! Pneumo - Pneumatic Control Board Firmware
//!
//! Firmware for an RP2040 board that drives the solenoid valves and the
//! vacuum/pressure pumps of a pneumatic actuator rig. The host sends
//! `<...>` framed commands over the serial link; the board echoes every
//! payload, executes it and answers queries with one line each.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig, InterruptHandler as AdcInterruptHandler};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_sync::mutex::Mutex;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use pneumo_core::controller::Controller;
use pneumo_drivers::pump::PwmPump;
use pneumo_drivers::sensor::AnalogMux;
use pneumo_drivers::valve::GpioValve;

use crate::board::{SharedController, PWM_TOP};

mod board;
mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    ADC_IRQ_FIFO => AdcInterruptHandler;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

static CONTROLLER: StaticCell<SharedController> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Pneumo firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = config::BOARD_CONFIG;
    info!(
        "Board config: {} baud, duty {}, hysteresis {} kPa, regulation {}",
        config.serial.baud,
        config.regulation.duty,
        config.regulation.hysteresis_kpa,
        config.regulation.enabled
    );

    // Valves start closed
    let in_valves = [
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_2, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_3, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_4, Level::Low))),
    ];
    let out_valves = [
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_6, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_7, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_8, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_9, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_10, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_11, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_12, Level::Low))),
        unwrap!(GpioValve::new_active_high(Output::new(p.PIN_13, Level::Low))),
    ];
    info!("Valves initialized");

    // Pump drives on PWM channel A, return legs on plain GPIO
    let mut pwm_config = PwmConfig::default();
    pwm_config.top = PWM_TOP;

    let (neg_drive, _) = Pwm::new_output_a(p.PWM_SLICE7, p.PIN_14, pwm_config.clone()).split();
    let (pos_drive, _) = Pwm::new_output_a(p.PWM_SLICE0, p.PIN_16, pwm_config).split();

    let pumps = [
        unwrap!(PwmPump::new(
            unwrap!(neg_drive),
            Output::new(p.PIN_15, Level::Low)
        )),
        unwrap!(PwmPump::new(
            unwrap!(pos_drive),
            Output::new(p.PIN_17, Level::Low)
        )),
    ];
    info!("Pumps initialized");

    let controller = unwrap!(Controller::new(config, in_valves, out_valves, pumps));
    let controller: &'static SharedController = CONTROLLER.init(Mutex::new(controller));

    // Output sensors share ADC2 through the multiplexer
    let mux = unwrap!(AnalogMux::new([
        Output::new(p.PIN_18, Level::Low),
        Output::new(p.PIN_19, Level::Low),
        Output::new(p.PIN_20, Level::Low),
    ]));

    let adc = Adc::new(p.ADC, Irqs, AdcConfig::default());
    let sensors = tasks::SensorInputs {
        adc,
        inputs: [
            Channel::new_pin(p.PIN_26, Pull::None),
            Channel::new_pin(p.PIN_27, Pull::None),
        ],
        mux_common: Channel::new_pin(p.PIN_28, Pull::None),
        mux,
    };
    info!("Sensors initialized");

    // Setup UART for the host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.serial.baud;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.serial.baud);

    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::serial_rx_task(rx, controller)).unwrap();
    spawner
        .spawn(tasks::sampler_task(sensors, controller, config.sampling))
        .unwrap();

    info!("All tasks spawned, ready for commands");
}

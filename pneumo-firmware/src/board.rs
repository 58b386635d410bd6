//! Board wiring and concrete driver types
//!
//! Pin assignments (RP2040):
//!
//! | Function                          | GPIO      |
//! |-----------------------------------|-----------|
//! | UART0 TX / RX (host link)         | 0 / 1     |
//! | Input valves NEG, NEU, POS        | 2, 3, 4   |
//! | Output valves OUT0..OUT7          | 6..13     |
//! | Pump NEG drive (PWM7 A) / return  | 14 / 15   |
//! | Pump POS drive (PWM0 A) / return  | 16 / 17   |
//! | Mux select S0, S1, S2             | 18, 19, 20|
//! | Sensor NEG (ADC0)                 | 26        |
//! | Sensor POS (ADC1)                 | 27        |
//! | Output sensor mux common (ADC2)   | 28        |

use embassy_rp::gpio::Output;
use embassy_rp::pwm::PwmOutput;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;

use pneumo_core::controller::Controller;
use pneumo_drivers::pump::PwmPump;
use pneumo_drivers::sensor::AnalogMux;
use pneumo_drivers::valve::GpioValve;

/// PWM counter wrap value: 125 MHz / 62_500 = 2 kHz pump drive
pub const PWM_TOP: u16 = 62_499;

/// Number of multiplexer select lines (8 output sensors)
pub const MUX_SELECT_LINES: usize = 3;

/// Solenoid valve on a push-pull GPIO
pub type Valve = GpioValve<Output<'static>>;

/// Pump on a PWM channel with a GPIO return leg
pub type Pump = PwmPump<PwmOutput<'static>, Output<'static>>;

/// Output sensor multiplexer
pub type SensorMux = AnalogMux<Output<'static>, MUX_SELECT_LINES>;

/// Board state machine with this board's drivers
pub type BoardController = Controller<Valve, Pump>;

/// Board state shared between the serial and sampler tasks
pub type SharedController = Mutex<CriticalSectionRawMutex, BoardController>;

//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels or the
//! shared board controller.

pub mod sampler;
pub mod serial_rx;
pub mod serial_tx;

pub use sampler::{sampler_task, SensorInputs};
pub use serial_rx::serial_rx_task;
pub use serial_tx::serial_tx_task;

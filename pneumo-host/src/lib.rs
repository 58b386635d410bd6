//! Host client for the Pneumo pneumatic control board
//!
//! [`PneumaticConnection`] speaks the framed text protocol over any
//! `Read + Write` port, normally a [`serialport::SerialPort`]. Channels are
//! addressed by name (`NEG`, `NEU`, `POS`, `OUT0`..) through a [`ChannelMap`].

#![deny(unsafe_code)]

pub mod channels;
pub mod connection;

pub use channels::{ChannelMap, Target};
pub use connection::{EchoReport, PneumaticConnection, DEFAULT_BAUD, DEFAULT_SWITCH_DELAY};

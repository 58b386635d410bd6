//! Pneumatic board serial protocol
//!
//! This crate defines the text protocol spoken between a host computer and
//! the pneumatic control board over a plain UART (19200 8N1 by default).
//!
//! # Protocol Overview
//!
//! Every command is a short comma-separated record between angle brackets:
//! ```text
//! ┌───────┬──────┬───┬───────┬───┬───────┬─────┐
//! │ START │ CODE │ , │ INDEX │ , │ VALUE │ END │
//! │ '<'   │ 2B   │   │ int   │   │ int   │ '>' │
//! └───────┴──────┴───┴───────┴───┴───────┴─────┘
//! ```
//!
//! The board echoes each received payload as a CRLF-terminated line, then
//! answers getters with one more line. Unused fields are sent as `99`.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

pub mod channels;
pub mod command;
pub mod frame;
pub mod reply;

pub use channels::{InputSensor, InputValve, Pump};
pub use command::{parse_int, Bank, Command, CommandError, Fields, Prefix, Suffix, FILLER};
pub use frame::{
    Frame, FrameError, FrameReceiver, END_MARKER, MAX_FRAME_LEN, MAX_INPUT_CHARS,
    MAX_PAYLOAD_LEN, START_MARKER,
};
pub use reply::{echo_line, to_line, Line, Reply, ReplyError, LINE_END, MAX_LINE_LEN};

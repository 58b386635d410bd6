//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use pneumo_protocol::Line;

/// Channel capacity for outgoing serial lines
const OUTBOX_SIZE: usize = 8;

/// Lines waiting to be written to the host (echoes, replies, errors)
pub static OUTBOX: Channel<CriticalSectionRawMutex, Line, OUTBOX_SIZE> = Channel::new();

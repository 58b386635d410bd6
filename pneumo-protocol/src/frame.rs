//! Marker-delimited frame reception and encoding.
//!
//! Frame format:
//! - START (1 byte): `<`
//! - PAYLOAD (0-17 bytes): printable command text, no markers
//! - END (1 byte): `>`
//!
//! Bytes outside a frame are line noise and are discarded. Bytes past the
//! payload limit are dropped, but the frame is still delivered when the end
//! marker arrives.

use heapless::Vec;

/// Frame start marker
pub const START_MARKER: u8 = b'<';

/// Frame end marker
pub const END_MARKER: u8 = b'>';

/// Receive buffer size, including the slot reserved for a terminator
pub const MAX_INPUT_CHARS: usize = 18;

/// Maximum payload bytes kept per frame
pub const MAX_PAYLOAD_LEN: usize = MAX_INPUT_CHARS - 1;

/// Maximum encoded frame size (START + PAYLOAD + END)
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + 2;

/// Errors that can occur while building or encoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Payload contains an end marker
    MarkerInPayload,
    /// Payload is not valid UTF-8
    InvalidUtf8,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::PayloadTooLarge => write!(f, "payload exceeds {} bytes", MAX_PAYLOAD_LEN),
            Self::MarkerInPayload => write!(f, "payload contains an end marker"),
            Self::InvalidUtf8 => write!(f, "payload is not valid UTF-8"),
            Self::BufferTooSmall => write!(f, "buffer too small for frame"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FrameError {}

/// A received or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    payload: Vec<u8, MAX_PAYLOAD_LEN>,
    /// Bytes discarded because the payload was already full
    dropped: usize,
}

impl Frame {
    /// Create a frame carrying the given payload
    pub fn new(payload: &[u8]) -> Result<Self, FrameError> {
        if payload.contains(&END_MARKER) {
            return Err(FrameError::MarkerInPayload);
        }

        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;

        Ok(Self {
            payload,
            dropped: 0,
        })
    }

    /// Payload bytes between the markers
    pub fn as_bytes(&self) -> &[u8] {
        &self.payload
    }

    /// Payload as text
    pub fn as_str(&self) -> Result<&str, FrameError> {
        core::str::from_utf8(&self.payload).map_err(|_| FrameError::InvalidUtf8)
    }

    /// Number of bytes dropped because the payload was full
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Whether any payload bytes were dropped
    pub fn is_truncated(&self) -> bool {
        self.dropped > 0
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let frame_len = self.payload.len() + 2;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = START_MARKER;
        buffer[1..1 + self.payload.len()].copy_from_slice(&self.payload);
        buffer[frame_len - 1] = END_MARKER;

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_LEN>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_LEN];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

/// State machine for receiving frames byte by byte
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: ReceiveState,
    buffer: Vec<u8, MAX_PAYLOAD_LEN>,
    dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveState {
    /// Waiting for START marker
    Idle,
    /// Collecting payload bytes until END marker
    Receiving,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameReceiver {
    /// Create a new receiver
    pub const fn new() -> Self {
        Self {
            state: ReceiveState::Idle,
            buffer: Vec::new(),
            dropped: 0,
        }
    }

    /// Reset the receiver state, discarding any partial frame
    pub fn reset(&mut self) {
        self.state = ReceiveState::Idle;
        self.buffer.clear();
        self.dropped = 0;
    }

    /// Whether a frame is currently being collected
    pub fn in_frame(&self) -> bool {
        self.state == ReceiveState::Receiving
    }

    /// Feed a single byte to the receiver
    ///
    /// Returns `Some(frame)` when the END marker completes a frame.
    pub fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.state {
            ReceiveState::Idle => {
                if byte == START_MARKER {
                    self.state = ReceiveState::Receiving;
                }
                None
            }
            ReceiveState::Receiving => {
                if byte == END_MARKER {
                    let frame = Frame {
                        payload: core::mem::take(&mut self.buffer),
                        dropped: self.dropped,
                    };
                    self.reset();
                    return Some(frame);
                }

                // A second START inside a frame is stored like any other byte
                if self.buffer.push(byte).is_err() {
                    self.dropped = self.dropped.saturating_add(1);
                }
                None
            }
        }
    }

    /// Iterate over every frame completed by `bytes`
    pub fn frames<'a>(&'a mut self, bytes: &'a [u8]) -> Frames<'a> {
        Frames {
            receiver: self,
            bytes: bytes.iter(),
        }
    }
}

/// Iterator returned by [`FrameReceiver::frames`]
pub struct Frames<'a> {
    receiver: &'a mut FrameReceiver,
    bytes: core::slice::Iter<'a, u8>,
}

impl Iterator for Frames<'_> {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        for &byte in self.bytes.by_ref() {
            if let Some(frame) = self.receiver.feed(byte) {
                return Some(frame);
            }
        }
        None
    }
}

//! Analog multiplexer for the output-side pressure sensors
//!
//! A CD4051-style 8:1 analog switch routes one of eight sensor outputs to a
//! single ADC input. The channel number is written in binary to the select
//! lines, S0 being the least significant bit.

use embedded_hal::digital::OutputPin;

/// Errors from driving the multiplexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError {
    /// Channel does not exist on this multiplexer
    InvalidChannel,
    /// Select line write failed
    Pin,
}

impl core::fmt::Display for MuxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidChannel => f.write_str("mux channel out of range"),
            Self::Pin => f.write_str("mux select line write failed"),
        }
    }
}

/// Analog multiplexer with `N` select lines (2^N channels)
pub struct AnalogMux<P, const N: usize> {
    select: [P; N],
    current: Option<u8>,
}

impl<P: OutputPin, const N: usize> AnalogMux<P, N> {
    /// Number of channels addressable with `N` select lines
    pub const CHANNELS: usize = 1 << N;

    /// Create a new multiplexer and select channel 0
    pub fn new(select: [P; N]) -> Result<Self, MuxError> {
        let mut mux = Self {
            select,
            current: None,
        };
        mux.select(0)?;
        Ok(mux)
    }

    /// Route `channel` to the common output
    ///
    /// Lines are only written when the channel changes.
    pub fn select(&mut self, channel: u8) -> Result<(), MuxError> {
        if usize::from(channel) >= Self::CHANNELS {
            return Err(MuxError::InvalidChannel);
        }
        if self.current == Some(channel) {
            return Ok(());
        }

        // Unknown until every line is written
        self.current = None;
        for (bit, line) in self.select.iter_mut().enumerate() {
            let result = if channel & (1 << bit) != 0 {
                line.set_high()
            } else {
                line.set_low()
            };
            result.map_err(|_| MuxError::Pin)?;
        }

        self.current = Some(channel);
        Ok(())
    }

    /// Currently selected channel, `None` after a failed write
    pub fn selected(&self) -> Option<u8> {
        self.current
    }
}

//! Byte-at-a-time line assembly for the controller side of the link.
//!
//! Lines end at CR. Line feeds, the form-feed control byte and any other
//! non-printable bytes are dropped. An overlong line is reported once and
//! the rest of it is discarded up to the next terminator.

use heapless::String;

use crate::markers::LINE_TERMINATOR;

/// Longest request line the controller accepts
pub const MAX_LINE_LEN: usize = 96;

/// A complete request line
pub type Line = String<MAX_LINE_LEN>;

/// Errors that can occur while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`] bytes
    TooLong,
}

impl core::fmt::Display for LineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LineError::TooLong => write!(f, "line longer than {} bytes", MAX_LINE_LEN),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AssemblerState {
    /// Collecting printable bytes
    Collecting,
    /// Dropping bytes until the next terminator
    Discarding,
}

/// State machine that turns a byte stream into request lines
#[derive(Debug, Clone)]
pub struct LineAssembler {
    state: AssemblerState,
    buffer: Line,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self {
            state: AssemblerState::Collecting,
            buffer: String::new(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.state = AssemblerState::Collecting;
        self.buffer.clear();
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a line (which may
    /// be empty), `Ok(None)` when more bytes are needed, or `Err` the first
    /// time a line overflows.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        if byte == LINE_TERMINATOR {
            let line = core::mem::take(&mut self.buffer);
            let discarded = self.state == AssemblerState::Discarding;
            self.state = AssemblerState::Collecting;
            return Ok(if discarded { None } else { Some(line) });
        }

        if self.state == AssemblerState::Discarding || !(0x20..0x7f).contains(&byte) {
            return Ok(None);
        }

        if self.buffer.push(byte as char).is_err() {
            self.buffer.clear();
            self.state = AssemblerState::Discarding;
            return Err(LineError::TooLong);
        }
        Ok(None)
    }
}

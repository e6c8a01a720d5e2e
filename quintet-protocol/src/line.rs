//! Byte-to-line framing for the command link.
//!
//! Bytes accumulate until a terminator (CR, LF or NUL). A line that reaches
//! [`LINE_CAPACITY`] bytes without a terminator is dropped together with
//! everything up to the next terminator, so the tail of an overlong line can
//! never be mistaken for a command.

use heapless::Vec;

/// Receive buffer size in bytes, terminator slot included
pub const LINE_CAPACITY: usize = 32;

/// A complete line without its terminator
pub type Line = Vec<u8, LINE_CAPACITY>;

/// Errors reported while framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Buffer filled before a terminator arrived; the line was discarded
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    /// Collecting bytes of the current line
    Accumulating,
    /// Dropping the rest of an overlong line
    Discarding,
}

/// Line framer state machine
#[derive(Debug, Clone)]
pub struct LineFramer {
    buffer: Line,
    state: FrameState,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

/// CR and LF both end a line; NUL is accepted as well
fn is_terminator(byte: u8) -> bool {
    matches!(byte, b'\r' | b'\n' | 0)
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: FrameState::Accumulating,
        }
    }

    /// True when no partial line is buffered
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True while the tail of an overlong line is being dropped
    pub fn is_discarding(&self) -> bool {
        self.state == FrameState::Discarding
    }

    /// Feed a single byte
    ///
    /// Returns `Ok(Some(line))` when a non-empty line is terminated,
    /// `Ok(None)` when more bytes are needed, and `Err(LineError::Overflow)`
    /// once, at the byte that overflowed the buffer.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match self.state {
            FrameState::Discarding => {
                if is_terminator(byte) {
                    self.state = FrameState::Accumulating;
                }
                Ok(None)
            }
            FrameState::Accumulating => {
                if is_terminator(byte) {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let line = self.buffer.clone();
                    self.buffer.clear();
                    return Ok(Some(line));
                }

                // The last slot is reserved for the terminator.
                if self.buffer.len() + 1 >= LINE_CAPACITY || self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.state = FrameState::Discarding;
                    return Err(LineError::Overflow);
                }
                Ok(None)
            }
        }
    }
}

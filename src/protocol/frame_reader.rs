//! Frame reader for accumulating inbound serial bytes.
//!
//! Uses `bytes::BytesMut` for buffer management.
//! Implements a small state machine driven only by the terminator:
//! - `Collecting`: appending bytes until CR LF is seen
//! - `Discarding`: an oversized frame was dropped, skipping to the next CR LF
//!
//! The reader never looks at opcodes or payloads.
//!
//! # Example
//!
//! ```
//! use serial_i2c_bridge::protocol::FrameReader;
//!
//! let mut reader = FrameReader::new();
//!
//! assert!(reader.feed(104).unwrap().is_none());
//! assert!(reader.feed(13).unwrap().is_none());
//! let frame = reader.feed(10).unwrap().unwrap();
//! assert_eq!(frame.body(), &[104]);
//! ```

use bytes::{BufMut, BytesMut};

use super::wire_format::{CR, DEFAULT_INPUT_BUFFER_CAPACITY, LF, TERMINATOR_LEN};
use super::Frame;
use crate::error::{BridgeError, Result};

/// State machine for frame delimiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Appending bytes to the current frame.
    Collecting,
    /// Dropping bytes until the next terminator.
    Discarding { pending_cr: bool },
}

/// Buffer for accumulating inbound bytes and extracting complete frames.
///
/// `capacity` bounds the frame body (bytes before the terminator). The
/// byte that pushes the body past it raises [`BridgeError::FrameOverflow`],
/// the partial frame is dropped, and the reader resynchronizes on the next
/// CR LF.
pub struct FrameReader {
    /// Bytes of the in-progress frame.
    buffer: BytesMut,
    /// Current delimiting state.
    state: State,
    /// Maximum frame body length.
    capacity: usize,
}

impl FrameReader {
    /// Create a reader with the default capacity (128 body bytes).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_INPUT_BUFFER_CAPACITY)
    }

    /// Create a reader with a custom body capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity + TERMINATOR_LEN),
            state: State::Collecting,
            capacity,
        }
    }

    /// Feed one byte.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` when this byte completed a frame
    /// - `Ok(None)` if more bytes are needed (or bytes are being discarded)
    /// - `Err(FrameOverflow)` when this byte overflowed the buffer
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>> {
        match self.state {
            State::Discarding { pending_cr } => {
                self.state = if pending_cr && byte == LF {
                    State::Collecting
                } else {
                    State::Discarding {
                        pending_cr: byte == CR,
                    }
                };
                Ok(None)
            }

            State::Collecting => {
                let completes = byte == LF && self.buffer.last() == Some(&CR);
                self.buffer.put_u8(byte);

                if completes {
                    let bytes = self.buffer.split().freeze();
                    return Ok(Frame::new(bytes));
                }

                if self.body_len() > self.capacity {
                    self.buffer.clear();
                    self.state = State::Discarding {
                        pending_cr: byte == CR,
                    };
                    return Err(BridgeError::FrameOverflow {
                        capacity: self.capacity,
                    });
                }

                Ok(None)
            }
        }
    }

    /// Feed a chunk of bytes, collecting every frame and overflow in order.
    pub fn push(&mut self, data: &[u8]) -> Vec<Result<Frame>> {
        data.iter()
            .filter_map(|&byte| self.feed(byte).transpose())
            .collect()
    }

    /// Change the body capacity.
    ///
    /// If the in-progress frame is already longer than the new capacity it
    /// is discarded (resynchronizing on the next terminator) and a
    /// `FrameOverflow` is returned.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        self.capacity = capacity;
        if self.body_len() > capacity {
            self.buffer.clear();
            self.state = State::Discarding { pending_cr: false };
            return Err(BridgeError::FrameOverflow { capacity });
        }
        let wanted = capacity + TERMINATOR_LEN;
        if self.buffer.capacity() < wanted {
            self.buffer.reserve(wanted - self.buffer.len());
        }
        Ok(())
    }

    /// Current body capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of buffered bytes of the in-progress frame.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if no partial frame is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Whether the reader is skipping input after an overflow.
    pub fn is_discarding(&self) -> bool {
        matches!(self.state, State::Discarding { .. })
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::Collecting;
    }

    /// Body bytes buffered so far. A trailing CR may still turn out to be
    /// the first terminator byte, so it is not counted.
    fn body_len(&self) -> usize {
        match self.buffer.last() {
            Some(&CR) => self.buffer.len() - 1,
            _ => self.buffer.len(),
        }
    }

    /// Get the current state for debugging.
    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match self.state {
            State::Collecting => "Collecting",
            State::Discarding { .. } => "Discarding",
        }
    }
}

impl Default for FrameReader {
    fn default() -> Self {
        Self::new()
    }
}

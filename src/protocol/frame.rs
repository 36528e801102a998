//! Frame struct with typed accessors.
//!
//! A frame owns its bytes including the trailing terminator.
//! Uses `bytes::Bytes` so completed frames can be handed around cheaply.
//!
//! # Example
//!
//! ```
//! use serial_i2c_bridge::protocol::{build_frame, Frame, Opcode};
//!
//! let frame = Frame::from_body(&[101, 23, 2]);
//! assert_eq!(frame.opcode(), Some(Opcode::Read));
//! assert_eq!(frame.body(), &[101, 23, 2]);
//! assert_eq!(frame.as_bytes(), &[101, 23, 2, 13, 10]);
//!
//! assert_eq!(build_frame(Opcode::Write, &[23, 0]), vec![100, 23, 0, 13, 10]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{Opcode, TERMINATOR, TERMINATOR_LEN};

/// A complete protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Frame bytes, terminator included.
    bytes: Bytes,
}

impl Frame {
    /// Wrap bytes that already end with the terminator.
    ///
    /// Returns `None` if the terminator is missing.
    pub fn new(bytes: Bytes) -> Option<Self> {
        if bytes.ends_with(&TERMINATOR) {
            Some(Self { bytes })
        } else {
            None
        }
    }

    /// Build a frame from its body, appending the terminator.
    pub fn from_body(body: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(body.len() + TERMINATOR_LEN);
        buf.put_slice(body);
        buf.put_slice(&TERMINATOR);
        Self {
            bytes: buf.freeze(),
        }
    }

    /// Frame bytes before the terminator.
    #[inline]
    pub fn body(&self) -> &[u8] {
        &self.bytes[..self.bytes.len() - TERMINATOR_LEN]
    }

    /// Full frame bytes, terminator included.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap clone of the full frame bytes.
    #[inline]
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    /// Total length including the terminator.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True when the frame is a bare terminator.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body().is_empty()
    }

    /// First body byte, raw.
    #[inline]
    pub fn opcode_byte(&self) -> Option<u8> {
        self.body().first().copied()
    }

    /// First body byte as a known opcode.
    pub fn opcode(&self) -> Option<Opcode> {
        self.opcode_byte().and_then(Opcode::from_u8)
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Build a complete frame (opcode + payload + terminator) as a byte vector.
pub fn build_frame(opcode: Opcode, payload: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(1 + payload.len() + TERMINATOR_LEN);
    buf.push(opcode.as_u8());
    buf.extend_from_slice(payload);
    buf.extend_from_slice(&TERMINATOR);
    buf
}

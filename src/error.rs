//! Error types for serial-i2c-bridge.

use thiserror::Error;

use crate::protocol::{Opcode, TransmitStatus};

/// Main error type for all bridge operations.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// I/O error on the serial transport.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Request frame was malformed or named no command.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Inbound frame grew past the configured input buffer capacity.
    #[error("Frame exceeds input buffer capacity of {capacity} bytes")]
    FrameOverflow { capacity: usize },

    /// Bus transaction could not complete.
    #[error("Bus fault: {0}")]
    Bus(#[from] BusFault),

    /// Write step of a write-read returned a non-zero status.
    #[error("Write step failed with status {0:?}")]
    WriteStepFailed(TransmitStatus),

    /// Transport closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,
}

/// Reasons a request frame is rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Frame carried no bytes before the terminator.
    #[error("Empty frame")]
    Empty,

    /// First byte does not name a request command.
    #[error("Unknown opcode {0}")]
    UnknownOpcode(u8),

    /// Frame is shorter than the opcode's minimum length.
    #[error("{opcode:?} needs at least {expected} bytes, got {actual}")]
    TooShort {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    /// Frame length differs from the opcode's fixed length.
    #[error("{opcode:?} needs exactly {expected} bytes, got {actual}")]
    WrongLength {
        opcode: Opcode,
        expected: usize,
        actual: usize,
    },

    /// An embedded length field claims more bytes than the frame holds.
    #[error("{opcode:?} declares {declared} data bytes but only {available} remain")]
    LengthOverrun {
        opcode: Opcode,
        declared: usize,
        available: usize,
    },

    /// Write-read frame lacks the read marker after its write data.
    #[error("Expected read marker after write data, found {0}")]
    MissingReadMarker(u8),

    /// Slave address does not fit in 7 bits.
    #[error("Invalid 7-bit address {0:#04x}")]
    InvalidAddress(u8),

    /// Configuration parameter is out of range.
    #[error("Invalid parameter for {opcode:?}: {value}")]
    InvalidParameter { opcode: Opcode, value: u32 },
}

impl DecodeError {
    /// Whether the client should see `NoCommand` rather than `MessageError`.
    pub fn is_unknown_command(&self) -> bool {
        matches!(self, DecodeError::UnknownOpcode(_))
    }
}

/// Hardware faults that prevent a transaction from reporting a status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusFault {
    /// The bus did not complete within the driver's timeout.
    #[error("Bus timeout")]
    Timeout,

    /// Another master won arbitration.
    #[error("Bus arbitration lost")]
    ArbitrationLost,

    /// The reset pin could not be driven.
    #[error("Reset pin {pin} unavailable")]
    ResetPin { pin: u8 },

    /// Driver-specific failure.
    #[error("Bus error: {0}")]
    Other(String),
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;

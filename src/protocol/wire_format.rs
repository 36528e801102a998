//! Wire format constants and opcode table.
//!
//! Every frame on the serial link has the same shape:
//! ```text
//! ┌────────┬──────────────────────┬──────┬──────┐
//! │ Opcode │ Payload              │  CR  │  LF  │
//! │ 1 byte │ 0..N bytes           │ 0x0D │ 0x0A │
//! └────────┴──────────────────────┴──────┴──────┘
//! ```
//!
//! Payload lengths are carried by count bytes inside the payload, never by
//! the terminator. Multi-byte parameters are little-endian.

use serde::{Deserialize, Serialize};

/// Carriage return, first byte of the terminator.
pub const CR: u8 = 0x0D;

/// Line feed, second byte of the terminator.
pub const LF: u8 = 0x0A;

/// Two-byte frame terminator.
pub const TERMINATOR: [u8; 2] = [CR, LF];

/// Terminator length in bytes.
pub const TERMINATOR_LEN: usize = 2;

/// Default input buffer capacity (frame body bytes).
pub const DEFAULT_INPUT_BUFFER_CAPACITY: usize = 128;

/// Smallest input buffer that still accepts every configuration frame.
pub const MIN_INPUT_BUFFER_CAPACITY: usize = 3;

/// Protocol version reported by `Info`.
pub const PROTOCOL_VERSION: u8 = 1;

/// Highest 7-bit slave address.
pub const MAX_ADDRESS: u8 = 0x7F;

/// First address probed by a bus scan.
pub const SCAN_ADDR_START: u8 = 1;

/// Last address probed by a bus scan.
pub const SCAN_ADDR_END: u8 = 126;

/// Opcode table. Values are wire-stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    Write = 100,
    Read = 101,
    WriteRead = 102,
    CheckDevice = 103,
    DeviceList = 104,
    ResetDevices = 105,
    Error = 106,
    MessageError = 107,
    NoCommand = 108,
    Info = 109,
    ResetI2CFreq = 110,
    Set400kHz = 111,
    SetWriteReadDelay = 112,
    SetResetPin = 113,
    SetResetTime = 114,
    SetResetSettleTime = 115,
    SetInputBufferSize = 116,
}

impl Opcode {
    /// All opcodes in wire order.
    pub const ALL: [Opcode; 17] = [
        Opcode::Write,
        Opcode::Read,
        Opcode::WriteRead,
        Opcode::CheckDevice,
        Opcode::DeviceList,
        Opcode::ResetDevices,
        Opcode::Error,
        Opcode::MessageError,
        Opcode::NoCommand,
        Opcode::Info,
        Opcode::ResetI2CFreq,
        Opcode::Set400kHz,
        Opcode::SetWriteReadDelay,
        Opcode::SetResetPin,
        Opcode::SetResetTime,
        Opcode::SetResetSettleTime,
        Opcode::SetInputBufferSize,
    ];

    /// Raw wire value.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Look up an opcode by its wire value.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.as_u8() == value)
    }

    /// Opcodes the bridge emits but never accepts as requests.
    #[inline]
    pub fn is_emit_only(self) -> bool {
        matches!(
            self,
            Opcode::Error | Opcode::MessageError | Opcode::NoCommand
        )
    }
}

impl From<Opcode> for u8 {
    fn from(op: Opcode) -> Self {
        op.as_u8()
    }
}

impl TryFrom<u8> for Opcode {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        Opcode::from_u8(value).ok_or(value)
    }
}

/// Outcome of a bus transmit (write or probe).
///
/// Numeric values follow the classic `endTransmission` taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransmitStatus {
    /// 0: success.
    Success = 0,
    /// 1: data too long to fit in the transmit buffer.
    DataTooLong = 1,
    /// 2: NACK on transmit of the address.
    AddressNack = 2,
    /// 3: NACK on transmit of data.
    DataNack = 3,
    /// 4: other error.
    Other = 4,
}

impl TransmitStatus {
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == TransmitStatus::Success
    }
}

impl From<TransmitStatus> for u8 {
    fn from(status: TransmitStatus) -> Self {
        status.as_u8()
    }
}

impl TryFrom<u8> for TransmitStatus {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0 => Ok(TransmitStatus::Success),
            1 => Ok(TransmitStatus::DataTooLong),
            2 => Ok(TransmitStatus::AddressNack),
            3 => Ok(TransmitStatus::DataNack),
            4 => Ok(TransmitStatus::Other),
            other => Err(other),
        }
    }
}

/// Decode a little-endian u16 from two bytes.
#[inline]
pub fn read_u16_le(lo: u8, hi: u8) -> u16 {
    u16::from_le_bytes([lo, hi])
}

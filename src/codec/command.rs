//! Command decoder.
//!
//! Turns a complete frame into a typed [`Command`]. Decoding is total and
//! has no side effects: every malformed frame yields a [`DecodeError`].
//!
//! Request layouts (body offsets, terminator excluded):
//! ```text
//! Write        op addr n data[n]
//! Read         op addr n                      (exactly 3 bytes)
//! WriteRead    op addr n data[n] 101 m        (at least 5 bytes)
//! CheckDevice  op addr                        (exactly 2 bytes)
//! DeviceList / ResetDevices / Info / ResetI2CFreq / Set400kHz   op
//! SetResetPin  op pin
//! SetWriteReadDelay / SetResetTime / SetResetSettleTime   op lo hi  (ms)
//! SetInputBufferSize                                      op lo hi  (bytes)
//! ```

use bytes::Bytes;

use crate::error::DecodeError;
use crate::protocol::{read_u16_le, Frame, Opcode, MAX_ADDRESS, MIN_INPUT_BUFFER_CAPACITY};

/// A decoded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Write {
        address: u8,
        data: Bytes,
    },
    Read {
        address: u8,
        count: u8,
    },
    WriteRead {
        address: u8,
        write_data: Bytes,
        read_count: u8,
    },
    CheckDevice {
        address: u8,
    },
    DeviceList,
    ResetDevices,
    Info,
    ResetI2CFreq,
    Set400kHz,
    SetWriteReadDelay(u16),
    SetResetPin(u8),
    SetResetTime(u16),
    SetResetSettleTime(u16),
    SetInputBufferSize(u16),
}

impl Command {
    /// Opcode this command was decoded from; responses echo it.
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::Write { .. } => Opcode::Write,
            Command::Read { .. } => Opcode::Read,
            Command::WriteRead { .. } => Opcode::WriteRead,
            Command::CheckDevice { .. } => Opcode::CheckDevice,
            Command::DeviceList => Opcode::DeviceList,
            Command::ResetDevices => Opcode::ResetDevices,
            Command::Info => Opcode::Info,
            Command::ResetI2CFreq => Opcode::ResetI2CFreq,
            Command::Set400kHz => Opcode::Set400kHz,
            Command::SetWriteReadDelay(_) => Opcode::SetWriteReadDelay,
            Command::SetResetPin(_) => Opcode::SetResetPin,
            Command::SetResetTime(_) => Opcode::SetResetTime,
            Command::SetResetSettleTime(_) => Opcode::SetResetSettleTime,
            Command::SetInputBufferSize(_) => Opcode::SetInputBufferSize,
        }
    }

    /// Whether executing this command only touches the configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Command::ResetI2CFreq
                | Command::Set400kHz
                | Command::SetWriteReadDelay(_)
                | Command::SetResetPin(_)
                | Command::SetResetTime(_)
                | Command::SetResetSettleTime(_)
                | Command::SetInputBufferSize(_)
        )
    }
}

/// Decode a complete frame.
pub fn decode(frame: &Frame) -> Result<Command, DecodeError> {
    decode_body(frame.body())
}

/// Decode a frame body (bytes before the terminator).
pub fn decode_body(body: &[u8]) -> Result<Command, DecodeError> {
    let (&raw, _) = body.split_first().ok_or(DecodeError::Empty)?;
    let opcode = Opcode::from_u8(raw)
        .filter(|op| !op.is_emit_only())
        .ok_or(DecodeError::UnknownOpcode(raw))?;

    match opcode {
        Opcode::Write => {
            require_min(opcode, body, 3)?;
            let address = address(body[1])?;
            let data = counted(opcode, body, 2)?;
            Ok(Command::Write {
                address,
                data: Bytes::copy_from_slice(data),
            })
        }

        Opcode::Read => {
            require_exact(opcode, body, 3)?;
            Ok(Command::Read {
                address: address(body[1])?,
                count: body[2],
            })
        }

        Opcode::WriteRead => {
            require_min(opcode, body, 5)?;
            let address = address(body[1])?;
            let write_data = counted(opcode, body, 2)?;
            // Marker and read count follow the write data.
            let tail = 3 + write_data.len();
            require_min(opcode, body, tail + 2)?;
            let marker = body[tail];
            if marker != Opcode::Read.as_u8() {
                return Err(DecodeError::MissingReadMarker(marker));
            }
            Ok(Command::WriteRead {
                address,
                write_data: Bytes::copy_from_slice(write_data),
                read_count: body[tail + 1],
            })
        }

        Opcode::CheckDevice => {
            require_exact(opcode, body, 2)?;
            Ok(Command::CheckDevice {
                address: address(body[1])?,
            })
        }

        Opcode::DeviceList => Ok(Command::DeviceList),
        Opcode::ResetDevices => Ok(Command::ResetDevices),
        Opcode::Info => Ok(Command::Info),
        Opcode::ResetI2CFreq => Ok(Command::ResetI2CFreq),
        Opcode::Set400kHz => Ok(Command::Set400kHz),

        Opcode::SetResetPin => {
            require_min(opcode, body, 2)?;
            Ok(Command::SetResetPin(body[1]))
        }

        Opcode::SetWriteReadDelay => Ok(Command::SetWriteReadDelay(param_u16(opcode, body)?)),
        Opcode::SetResetTime => Ok(Command::SetResetTime(param_u16(opcode, body)?)),
        Opcode::SetResetSettleTime => Ok(Command::SetResetSettleTime(param_u16(opcode, body)?)),

        Opcode::SetInputBufferSize => {
            let size = param_u16(opcode, body)?;
            if usize::from(size) < MIN_INPUT_BUFFER_CAPACITY {
                return Err(DecodeError::InvalidParameter {
                    opcode,
                    value: size.into(),
                });
            }
            Ok(Command::SetInputBufferSize(size))
        }

        Opcode::Error | Opcode::MessageError | Opcode::NoCommand => {
            Err(DecodeError::UnknownOpcode(raw))
        }
    }
}

fn require_min(opcode: Opcode, body: &[u8], expected: usize) -> Result<(), DecodeError> {
    if body.len() < expected {
        return Err(DecodeError::TooShort {
            opcode,
            expected,
            actual: body.len(),
        });
    }
    Ok(())
}

fn require_exact(opcode: Opcode, body: &[u8], expected: usize) -> Result<(), DecodeError> {
    if body.len() != expected {
        return Err(DecodeError::WrongLength {
            opcode,
            expected,
            actual: body.len(),
        });
    }
    Ok(())
}

fn address(raw: u8) -> Result<u8, DecodeError> {
    if raw > MAX_ADDRESS {
        return Err(DecodeError::InvalidAddress(raw));
    }
    Ok(raw)
}

/// Slice of `body[at]` data bytes starting right after the count byte.
fn counted(opcode: Opcode, body: &[u8], at: usize) -> Result<&[u8], DecodeError> {
    let declared = usize::from(body[at]);
    let rest = &body[at + 1..];
    rest.get(..declared).ok_or(DecodeError::LengthOverrun {
        opcode,
        declared,
        available: rest.len(),
    })
}

fn param_u16(opcode: Opcode, body: &[u8]) -> Result<u16, DecodeError> {
    require_min(opcode, body, 3)?;
    Ok(read_u16_le(body[1], body[2]))
}

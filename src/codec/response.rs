//! Response encoder.
//!
//! Response layouts (terminator appended to each):
//! ```text
//! Write / CheckDevice      op addr status
//! Read / WriteRead         op addr count data[count]
//! DeviceList               op count addr[count]
//! ResetDevices / Set*      op
//! Info                     op version freq delay(2) pin pulse(2) settle(2) buffer(2)
//! i2c_error                106 [status]
//! i2c_messageError         107
//! i2c_noCommand            108
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::config::Configuration;
use crate::error::BridgeError;
use crate::protocol::{Frame, Opcode, TransmitStatus, PROTOCOL_VERSION};

/// Outcome of executing one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionResult {
    /// Transmit status for `Write` and `CheckDevice`.
    Status { address: u8, status: TransmitStatus },
    /// Bytes actually received for `Read` and `WriteRead`.
    ReadPayload { address: u8, data: Bytes },
    /// Addresses that acknowledged a probe, ascending.
    DeviceList(Vec<u8>),
    /// Configuration snapshot for `Info`.
    Info(Configuration),
    /// Completed with nothing to report.
    Ack,
}

/// Encode a result as a response frame echoing `opcode`.
pub fn encode(opcode: Opcode, result: &TransactionResult) -> Frame {
    let mut buf = BytesMut::with_capacity(16);
    buf.put_u8(opcode.as_u8());

    match result {
        TransactionResult::Status { address, status } => {
            buf.put_u8(*address);
            buf.put_u8(status.as_u8());
        }
        TransactionResult::ReadPayload { address, data } => {
            // Count byte caps the payload.
            let data = &data[..data.len().min(u8::MAX as usize)];
            buf.put_u8(*address);
            buf.put_u8(data.len() as u8);
            buf.put_slice(data);
        }
        TransactionResult::DeviceList(addresses) => {
            let addresses = &addresses[..addresses.len().min(u8::MAX as usize)];
            buf.put_u8(addresses.len() as u8);
            buf.put_slice(addresses);
        }
        TransactionResult::Info(config) => {
            buf.put_u8(PROTOCOL_VERSION);
            buf.put_u8(config.bus_frequency.as_u8());
            buf.put_u16_le(config.write_read_delay_ms);
            buf.put_u8(config.reset_pin);
            buf.put_u16_le(config.reset_pulse_ms);
            buf.put_u16_le(config.reset_settle_ms);
            buf.put_u16_le(config.input_buffer_capacity);
        }
        TransactionResult::Ack => {}
    }

    Frame::from_body(&buf)
}

/// Encode the protocol-level error frame for a failure.
///
/// Returns `None` for transport failures, which have no wire answer.
pub fn encode_error(err: &BridgeError) -> Option<Frame> {
    let opcode = match err {
        BridgeError::Decode(decode) if decode.is_unknown_command() => Opcode::NoCommand,
        BridgeError::Decode(_) | BridgeError::FrameOverflow { .. } => Opcode::MessageError,
        BridgeError::Bus(_) => Opcode::Error,
        BridgeError::WriteStepFailed(status) => {
            return Some(Frame::from_body(&[Opcode::Error.as_u8(), status.as_u8()]));
        }
        BridgeError::Io(_) | BridgeError::ConnectionClosed => return None,
    };
    Some(Frame::from_body(&[opcode.as_u8()]))
}

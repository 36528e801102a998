//! Codec module - request decoding and response encoding.
//!
//! - [`decode`] turns a request [`Frame`](crate::protocol::Frame) into a [`Command`]
//! - [`encode`] turns a [`TransactionResult`] into a response frame
//! - [`encode_error`] produces the `i2c_error` / `i2c_messageError` /
//!   `i2c_noCommand` frames
//!
//! # Example
//!
//! ```
//! use serial_i2c_bridge::codec::{decode_body, encode, Command, TransactionResult};
//! use serial_i2c_bridge::protocol::TransmitStatus;
//!
//! let cmd = decode_body(&[103, 0x50]).unwrap();
//! assert_eq!(cmd, Command::CheckDevice { address: 0x50 });
//!
//! let result = TransactionResult::Status { address: 0x50, status: TransmitStatus::Success };
//! assert_eq!(encode(cmd.opcode(), &result).as_bytes(), &[103, 0x50, 0, 13, 10]);
//! ```

mod command;
mod response;

pub use command::{decode, decode_body, Command};
pub use response::{encode, encode_error, TransactionResult};

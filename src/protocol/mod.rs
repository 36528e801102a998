//! Protocol module - wire format, framing, and frame types.
//!
//! This module implements the byte-level layer of the serial link:
//! - opcode table and status taxonomy
//! - frame reader that delimits CR LF terminated frames
//! - Frame struct with typed accessors

mod frame;
mod frame_reader;
mod wire_format;

pub use frame::{build_frame, Frame};
pub use frame_reader::FrameReader;
pub use wire_format::{
    read_u16_le, Opcode, TransmitStatus, CR, DEFAULT_INPUT_BUFFER_CAPACITY, LF, MAX_ADDRESS,
    MIN_INPUT_BUFFER_CAPACITY, PROTOCOL_VERSION, SCAN_ADDR_END, SCAN_ADDR_START, TERMINATOR,
    TERMINATOR_LEN,
};

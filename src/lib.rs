//! # serial-i2c-bridge
//!
//! Protocol engine for a serial-to-I2C bridge.
//!
//! A host sends CR LF terminated command frames over a byte stream. The
//! bridge executes each one as an I2C transaction (or a configuration
//! change) and answers with exactly one response frame.
//!
//! ## Architecture
//!
//! - **Protocol**: opcode table and the terminator-driven frame reader
//! - **Codec**: request decoding and response encoding
//! - **Executor**: runs commands against the [`hal::I2cBus`] and [`hal::ResetLine`] seams
//! - **Bridge**: sequential read → decode → execute → respond loop
//!
//! ## Example
//!
//! ```
//! use serial_i2c_bridge::hal::sim::{RecordingResetLine, SimulatedBus, SimulatedDevice};
//! use serial_i2c_bridge::Bridge;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> serial_i2c_bridge::Result<()> {
//! let bus = SimulatedBus::new().with_device(0x17, SimulatedDevice::new());
//! let mut bridge = Bridge::builder().build(bus, RecordingResetLine::new())?;
//!
//! let responses = bridge.push(&[100, 0x17, 1, 0x41, 13, 10]).await;
//! assert_eq!(responses[0].as_bytes(), &[100, 0x17, 0, 13, 10]);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod codec;
pub mod config;
pub mod error;
pub mod executor;
pub mod hal;
pub mod protocol;

pub use bridge::{Bridge, BridgeBuilder};
pub use config::{BusFrequency, Configuration};
pub use error::{BridgeError, BusFault, DecodeError, Result};
pub use executor::Executor;

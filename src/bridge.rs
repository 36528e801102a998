//! Bridge builder and command loop.
//!
//! The [`BridgeBuilder`] collects the startup configuration. The
//! [`Bridge`] owns the frame reader, the configuration store and the
//! executor, and runs every frame through decode → execute → encode
//! before looking at the next input byte.
//!
//! # Example
//!
//! ```ignore
//! use serial_i2c_bridge::Bridge;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut bridge = Bridge::builder()
//!         .write_read_delay_ms(5)
//!         .input_buffer_capacity(64)
//!         .build(my_bus, my_reset_pin)?;
//!
//!     let (rx, tx) = tokio::io::split(serial_port);
//!     bridge.run(rx, tx).await?;
//!     Ok(())
//! }
//! ```

use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{decode, encode, encode_error, Command};
use crate::config::{BusFrequency, Configuration};
use crate::error::{BridgeError, Result};
use crate::executor::Executor;
use crate::hal::{I2cBus, ResetLine};
use crate::protocol::{Frame, FrameReader, Opcode, MIN_INPUT_BUFFER_CAPACITY};

/// Default transport read buffer size.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 256;

/// Builder for configuring and creating a bridge.
pub struct BridgeBuilder {
    config: Configuration,
    read_chunk_size: usize,
}

impl BridgeBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: Configuration::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    /// Replace the whole startup configuration.
    pub fn configuration(mut self, config: Configuration) -> Self {
        self.config = config;
        self
    }

    /// Set the initial bus clock mode.
    ///
    /// Default: standard (100 kHz)
    pub fn bus_frequency(mut self, frequency: BusFrequency) -> Self {
        self.config.bus_frequency = frequency;
        self
    }

    /// Set the settle delay between write and read of a write-read.
    ///
    /// Default: 10 ms
    pub fn write_read_delay_ms(mut self, ms: u16) -> Self {
        self.config.write_read_delay_ms = ms;
        self
    }

    /// Set the pin pulsed by `ResetDevices`.
    ///
    /// Default: 2
    pub fn reset_pin(mut self, pin: u8) -> Self {
        self.config.reset_pin = pin;
        self
    }

    /// Set how long the reset pin is held low.
    ///
    /// Default: 10 ms
    pub fn reset_pulse_ms(mut self, ms: u16) -> Self {
        self.config.reset_pulse_ms = ms;
        self
    }

    /// Set the settle time after the reset pin is released.
    ///
    /// Default: 50 ms
    pub fn reset_settle_ms(mut self, ms: u16) -> Self {
        self.config.reset_settle_ms = ms;
        self
    }

    /// Set the maximum frame body length.
    ///
    /// Values below 3 are raised to 3. Default: 128
    pub fn input_buffer_capacity(mut self, capacity: u16) -> Self {
        self.config.input_buffer_capacity = capacity;
        self
    }

    /// Set the transport read buffer size.
    ///
    /// Default: 256
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    /// Build the bridge, applying the initial clock mode to the bus.
    pub fn build<B: I2cBus, R: ResetLine>(self, mut bus: B, reset_line: R) -> Result<Bridge<B, R>> {
        let mut config = self.config;
        if usize::from(config.input_buffer_capacity) < MIN_INPUT_BUFFER_CAPACITY {
            tracing::warn!(
                "Input buffer capacity {} too small, using {}",
                config.input_buffer_capacity,
                MIN_INPUT_BUFFER_CAPACITY
            );
            config.input_buffer_capacity = MIN_INPUT_BUFFER_CAPACITY as u16;
        }

        bus.set_frequency(config.bus_frequency)?;

        Ok(Bridge {
            reader: FrameReader::with_capacity(config.input_buffer_capacity.into()),
            executor: Executor::new(bus, reset_line),
            config,
            read_chunk_size: self.read_chunk_size,
        })
    }
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A serial-to-I2C bridge.
///
/// Strictly sequential: a frame's response is produced before the next
/// input byte is consumed, so bus transactions, the write-read delay and
/// the reset sequence all stall the loop.
pub struct Bridge<B, R> {
    reader: FrameReader,
    executor: Executor<B, R>,
    config: Configuration,
    read_chunk_size: usize,
}

impl Bridge<(), ()> {
    /// Create a new bridge builder.
    ///
    /// The bus and reset line types are fixed later by
    /// [`BridgeBuilder::build`].
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }
}

impl<B: I2cBus, R: ResetLine> Bridge<B, R> {
    /// Current runtime configuration.
    pub fn configuration(&self) -> &Configuration {
        &self.config
    }

    pub fn frame_reader(&self) -> &FrameReader {
        &self.reader
    }

    pub fn bus(&self) -> &B {
        self.executor.bus()
    }

    pub fn bus_mut(&mut self) -> &mut B {
        self.executor.bus_mut()
    }

    pub fn reset_line(&self) -> &R {
        self.executor.reset_line()
    }

    /// Give back the bus and reset line.
    pub fn into_parts(self) -> (B, R) {
        self.executor.into_parts()
    }

    /// Serve the transport until it reaches EOF.
    ///
    /// Only transport I/O errors end the loop; every protocol or bus
    /// failure is answered on the wire and the loop continues.
    pub async fn run<Rd, W>(&mut self, mut reader: Rd, mut writer: W) -> Result<()>
    where
        Rd: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = vec![0u8; self.read_chunk_size];

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => {
                    tracing::debug!("Transport closed");
                    return Ok(());
                }
                Ok(n) => n,
                Err(e) => return Err(BridgeError::Io(e)),
            };

            for &byte in &buf[..n] {
                if let Some(response) = self.feed(byte).await {
                    send(&mut writer, &response).await?;
                }
            }
        }
    }

    /// Feed bytes and collect the responses they produce, in order.
    pub async fn push(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut responses = Vec::new();
        for &byte in data {
            if let Some(response) = self.feed(byte).await {
                responses.push(response);
            }
        }
        responses
    }

    /// Feed one byte, returning a response if it completed (or overflowed)
    /// a frame.
    pub async fn feed(&mut self, byte: u8) -> Option<Frame> {
        match self.reader.feed(byte) {
            Ok(None) => None,
            Ok(Some(frame)) => Some(self.handle_frame(&frame).await),
            Err(e) => {
                tracing::warn!("Dropping frame: {}", e);
                Some(error_frame(&e))
            }
        }
    }

    /// Decode, execute and encode one request frame.
    pub async fn handle_frame(&mut self, frame: &Frame) -> Frame {
        let command = match decode(frame) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!("Rejected frame {:?}: {}", frame.body(), e);
                return error_frame(&BridgeError::from(e));
            }
        };

        let opcode = command.opcode();
        match self.executor.execute(&command, &mut self.config).await {
            Ok(result) => {
                if command.is_configuration() {
                    tracing::debug!("Configuration now {:?}", self.config);
                    if let Command::SetInputBufferSize(_) = command {
                        self.apply_input_buffer_capacity();
                    }
                }
                encode(opcode, &result)
            }
            Err(e) => {
                tracing::error!("{:?} failed: {}", opcode, e);
                error_frame(&e)
            }
        }
    }

    fn apply_input_buffer_capacity(&mut self) {
        let capacity = usize::from(self.config.input_buffer_capacity);
        if let Err(e) = self.reader.set_capacity(capacity) {
            tracing::warn!("Discarded partial frame on resize: {}", e);
        }
    }
}

fn error_frame(err: &BridgeError) -> Frame {
    encode_error(err).unwrap_or_else(|| Frame::from_body(&[Opcode::Error.as_u8()]))
}

async fn send<W: AsyncWrite + Unpin>(writer: &mut W, frame: &Frame) -> Result<()> {
    let result = async {
        writer.write_all(frame.as_bytes()).await?;
        writer.flush().await
    }
    .await;

    result.map_err(|e| match e.kind() {
        ErrorKind::BrokenPipe | ErrorKind::ConnectionReset | ErrorKind::WriteZero => {
            BridgeError::ConnectionClosed
        }
        _ => BridgeError::Io(e),
    })
}

//! Hardware seams - the bus and reset pin the executor drives.
//!
//! The electrical side of I2C (clock stretching, arbitration, ACK/NACK
//! sampling) lives behind [`I2cBus`]. Implementations report a
//! [`TransmitStatus`] for every transmit that completed, and a
//! [`BusFault`] only when no status could be produced at all.
//!
//! [`sim`] provides in-memory doubles that timestamp every operation.

pub mod sim;

use bytes::Bytes;

use crate::config::BusFrequency;
use crate::error::BusFault;
use crate::protocol::TransmitStatus;

/// I2C bus master.
pub trait I2cBus {
    /// Send `data` to `address` as one transaction.
    fn write(&mut self, address: u8, data: &[u8]) -> Result<TransmitStatus, BusFault>;

    /// Request `count` bytes from `address`.
    ///
    /// May return fewer bytes than requested, never more.
    fn read(&mut self, address: u8, count: u8) -> Result<Bytes, BusFault>;

    /// Address-only presence probe.
    fn probe(&mut self, address: u8) -> Result<TransmitStatus, BusFault> {
        self.write(address, &[])
    }

    /// Switch clock mode.
    fn set_frequency(&mut self, frequency: BusFrequency) -> Result<(), BusFault>;
}

/// Logic level on the reset pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

/// Output pin wired to the slaves' reset inputs.
pub trait ResetLine {
    /// Drive `pin` to `level`.
    fn drive(&mut self, pin: u8, level: PinLevel) -> Result<(), BusFault>;
}

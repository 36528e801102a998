//! Simulated bus and reset line.
//!
//! Both doubles log every operation with a [`tokio::time::Instant`], so
//! tests running on a paused clock can check delays exactly.
//!
//! # Example
//!
//! ```
//! use serial_i2c_bridge::hal::sim::{SimulatedBus, SimulatedDevice};
//! use serial_i2c_bridge::hal::I2cBus;
//! use serial_i2c_bridge::protocol::TransmitStatus;
//!
//! let mut bus = SimulatedBus::new()
//!     .with_device(0x23, SimulatedDevice::with_response(vec![0xAAu8, 0xBB]));
//!
//! assert_eq!(bus.write(0x23, &[1]).unwrap(), TransmitStatus::Success);
//! assert_eq!(bus.write(0x24, &[1]).unwrap(), TransmitStatus::AddressNack);
//! assert_eq!(&bus.read(0x23, 1).unwrap()[..], &[0xAA]);
//! ```

use std::collections::BTreeMap;

use bytes::Bytes;
use tokio::time::Instant;

use super::{I2cBus, PinLevel, ResetLine};
use crate::config::BusFrequency;
use crate::error::BusFault;
use crate::protocol::TransmitStatus;

/// Transmit buffer size of a typical microcontroller I2C peripheral.
pub const DEFAULT_TRANSMIT_BUFFER: usize = 32;

/// A slave on the simulated bus.
#[derive(Debug, Clone, Default)]
pub struct SimulatedDevice {
    /// Bytes returned on reads, truncated to the requested count.
    response: Bytes,
    /// Payloads of completed writes.
    received: Vec<Bytes>,
    /// NACK every data byte.
    nack_data: bool,
}

impl SimulatedDevice {
    /// Device that answers reads with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device that answers reads with `response`.
    pub fn with_response(response: impl Into<Bytes>) -> Self {
        Self {
            response: response.into(),
            ..Self::default()
        }
    }

    /// Acknowledge the address but NACK data bytes.
    pub fn nack_data(mut self) -> Self {
        self.nack_data = true;
        self
    }

    /// Replace the read response.
    pub fn set_response(&mut self, response: impl Into<Bytes>) {
        self.response = response.into();
    }

    /// Payloads of completed writes, oldest first.
    pub fn received(&self) -> &[Bytes] {
        &self.received
    }
}

/// What a logged bus operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusEventKind {
    Write {
        address: u8,
        data: Bytes,
        status: TransmitStatus,
    },
    Read {
        address: u8,
        requested: u8,
        returned: usize,
    },
    Frequency(BusFrequency),
}

/// A logged bus operation.
#[derive(Debug, Clone)]
pub struct BusEvent {
    pub at: Instant,
    pub kind: BusEventKind,
}

/// In-memory I2C bus.
#[derive(Debug)]
pub struct SimulatedBus {
    devices: BTreeMap<u8, SimulatedDevice>,
    events: Vec<BusEvent>,
    frequency: BusFrequency,
    transmit_buffer: usize,
    /// Fault returned by the next transaction.
    pending_fault: Option<BusFault>,
    /// Fault returned by every frequency change.
    frequency_fault: Option<BusFault>,
}

impl SimulatedBus {
    /// Empty bus in standard mode.
    pub fn new() -> Self {
        Self {
            devices: BTreeMap::new(),
            events: Vec::new(),
            frequency: BusFrequency::Standard,
            transmit_buffer: DEFAULT_TRANSMIT_BUFFER,
            pending_fault: None,
            frequency_fault: None,
        }
    }

    /// Attach a device (builder style).
    pub fn with_device(mut self, address: u8, device: SimulatedDevice) -> Self {
        self.devices.insert(address, device);
        self
    }

    /// Set the transmit buffer size (builder style).
    pub fn with_transmit_buffer(mut self, size: usize) -> Self {
        self.transmit_buffer = size;
        self
    }

    /// Attach a device.
    pub fn add_device(&mut self, address: u8, device: SimulatedDevice) {
        self.devices.insert(address, device);
    }

    /// Detach a device.
    pub fn remove_device(&mut self, address: u8) -> Option<SimulatedDevice> {
        self.devices.remove(&address)
    }

    pub fn device(&self, address: u8) -> Option<&SimulatedDevice> {
        self.devices.get(&address)
    }

    pub fn device_mut(&mut self, address: u8) -> Option<&mut SimulatedDevice> {
        self.devices.get_mut(&address)
    }

    /// Make the next write, probe or read fail with `fault`.
    pub fn fail_next(&mut self, fault: BusFault) {
        self.pending_fault = Some(fault);
    }

    /// Make every frequency change fail with `fault`.
    pub fn fail_frequency_changes(&mut self, fault: BusFault) {
        self.frequency_fault = Some(fault);
    }

    /// Current clock mode.
    pub fn frequency(&self) -> BusFrequency {
        self.frequency
    }

    /// Every logged operation, oldest first.
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget logged operations.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn log(&mut self, kind: BusEventKind) {
        self.events.push(BusEvent {
            at: Instant::now(),
            kind,
        });
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl I2cBus for SimulatedBus {
    fn write(&mut self, address: u8, data: &[u8]) -> Result<TransmitStatus, BusFault> {
        if let Some(fault) = self.pending_fault.take() {
            return Err(fault);
        }

        let status = if data.len() > self.transmit_buffer {
            TransmitStatus::DataTooLong
        } else {
            match self.devices.get_mut(&address) {
                None => TransmitStatus::AddressNack,
                Some(device) if device.nack_data && !data.is_empty() => TransmitStatus::DataNack,
                Some(device) => {
                    if !data.is_empty() {
                        device.received.push(Bytes::copy_from_slice(data));
                    }
                    TransmitStatus::Success
                }
            }
        };

        self.log(BusEventKind::Write {
            address,
            data: Bytes::copy_from_slice(data),
            status,
        });
        Ok(status)
    }

    fn read(&mut self, address: u8, count: u8) -> Result<Bytes, BusFault> {
        if let Some(fault) = self.pending_fault.take() {
            return Err(fault);
        }

        let data = match self.devices.get(&address) {
            Some(device) => {
                let n = device.response.len().min(count as usize);
                device.response.slice(..n)
            }
            None => Bytes::new(),
        };

        self.log(BusEventKind::Read {
            address,
            requested: count,
            returned: data.len(),
        });
        Ok(data)
    }

    fn set_frequency(&mut self, frequency: BusFrequency) -> Result<(), BusFault> {
        if let Some(fault) = self.frequency_fault.clone() {
            return Err(fault);
        }
        self.frequency = frequency;
        self.log(BusEventKind::Frequency(frequency));
        Ok(())
    }
}

/// A logged pin transition.
#[derive(Debug, Clone, Copy)]
pub struct PinEvent {
    pub at: Instant,
    pub pin: u8,
    pub level: PinLevel,
}

/// Reset line that only records transitions.
#[derive(Debug, Default)]
pub struct RecordingResetLine {
    events: Vec<PinEvent>,
    unavailable: Vec<u8>,
    refuse_release: bool,
}

impl RecordingResetLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to drive `pin` (builder style).
    pub fn with_unavailable_pin(mut self, pin: u8) -> Self {
        self.unavailable.push(pin);
        self
    }

    /// Refuse the next drive to `High` (builder style).
    pub fn fail_next_release(mut self) -> Self {
        self.refuse_release = true;
        self
    }

    /// Every transition, oldest first.
    pub fn events(&self) -> &[PinEvent] {
        &self.events
    }
}

impl ResetLine for RecordingResetLine {
    fn drive(&mut self, pin: u8, level: PinLevel) -> Result<(), BusFault> {
        if self.unavailable.contains(&pin) {
            return Err(BusFault::ResetPin { pin });
        }
        if level == PinLevel::High && self.refuse_release {
            self.refuse_release = false;
            return Err(BusFault::ResetPin { pin });
        }
        self.events.push(PinEvent {
            at: Instant::now(),
            pin,
            level,
        });
        Ok(())
    }
}

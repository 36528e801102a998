//! I2C transaction executor.
//!
//! Maps each [`Command`] onto bus operations. The two intentional stalls,
//! the write-read settle delay and the reset pulse/settle sequence, are
//! `tokio::time::sleep` calls, so a paused test clock controls them.
//! Nothing else is serviced while they run.

use tokio::time::sleep;

use crate::codec::{Command, TransactionResult};
use crate::config::{BusFrequency, Configuration};
use crate::error::{BridgeError, Result};
use crate::hal::{I2cBus, PinLevel, ResetLine};
use crate::protocol::{SCAN_ADDR_END, SCAN_ADDR_START};

/// Runs decoded commands against a bus and a reset line.
pub struct Executor<B, R> {
    bus: B,
    reset_line: R,
}

impl<B: I2cBus, R: ResetLine> Executor<B, R> {
    pub fn new(bus: B, reset_line: R) -> Self {
        Self { bus, reset_line }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn reset_line(&self) -> &R {
        &self.reset_line
    }

    /// Give back the bus and reset line.
    pub fn into_parts(self) -> (B, R) {
        (self.bus, self.reset_line)
    }

    /// Execute one command.
    ///
    /// Non-zero transmit statuses are results, not errors. Errors are
    /// bus faults and a failed write step inside a write-read.
    pub async fn execute(
        &mut self,
        command: &Command,
        config: &mut Configuration,
    ) -> Result<TransactionResult> {
        match command {
            Command::Write { address, data } => {
                let status = self.bus.write(*address, data)?;
                if !status.is_success() {
                    tracing::debug!("Write to {:#04x} returned {:?}", address, status);
                }
                Ok(TransactionResult::Status {
                    address: *address,
                    status,
                })
            }

            Command::Read { address, count } => {
                let data = self.read(*address, *count)?;
                Ok(TransactionResult::ReadPayload {
                    address: *address,
                    data,
                })
            }

            Command::WriteRead {
                address,
                write_data,
                read_count,
            } => {
                let status = self.bus.write(*address, write_data)?;
                if !status.is_success() {
                    return Err(BridgeError::WriteStepFailed(status));
                }

                sleep(config.write_read_delay()).await;

                let data = self.read(*address, *read_count)?;
                Ok(TransactionResult::ReadPayload {
                    address: *address,
                    data,
                })
            }

            Command::CheckDevice { address } => {
                let status = self.bus.probe(*address)?;
                Ok(TransactionResult::Status {
                    address: *address,
                    status,
                })
            }

            Command::DeviceList => Ok(TransactionResult::DeviceList(self.scan())),

            Command::ResetDevices => {
                self.reset_devices(config).await?;
                Ok(TransactionResult::Ack)
            }

            Command::Info => Ok(TransactionResult::Info(config.clone())),

            Command::ResetI2CFreq => {
                self.set_frequency(BusFrequency::Standard, config)?;
                Ok(TransactionResult::Ack)
            }

            Command::Set400kHz => {
                self.set_frequency(BusFrequency::Fast400k, config)?;
                Ok(TransactionResult::Ack)
            }

            Command::SetWriteReadDelay(ms) => {
                tracing::debug!("Write-read delay set to {} ms", ms);
                config.write_read_delay_ms = *ms;
                Ok(TransactionResult::Ack)
            }

            Command::SetResetPin(pin) => {
                tracing::debug!("Reset pin set to {}", pin);
                config.reset_pin = *pin;
                Ok(TransactionResult::Ack)
            }

            Command::SetResetTime(ms) => {
                tracing::debug!("Reset pulse set to {} ms", ms);
                config.reset_pulse_ms = *ms;
                Ok(TransactionResult::Ack)
            }

            Command::SetResetSettleTime(ms) => {
                tracing::debug!("Reset settle time set to {} ms", ms);
                config.reset_settle_ms = *ms;
                Ok(TransactionResult::Ack)
            }

            Command::SetInputBufferSize(size) => {
                tracing::debug!("Input buffer capacity set to {} bytes", size);
                config.input_buffer_capacity = *size;
                Ok(TransactionResult::Ack)
            }
        }
    }

    fn read(&mut self, address: u8, count: u8) -> Result<bytes::Bytes> {
        let mut data = self.bus.read(address, count)?;
        if data.len() > usize::from(count) {
            tracing::warn!(
                "Bus returned {} bytes for a {} byte read from {:#04x}",
                data.len(),
                count,
                address
            );
            data.truncate(usize::from(count));
        }
        Ok(data)
    }

    /// Probe every scan address in ascending order.
    ///
    /// Addresses whose probe faults are logged and left out.
    fn scan(&mut self) -> Vec<u8> {
        let mut found = Vec::new();
        for address in SCAN_ADDR_START..=SCAN_ADDR_END {
            match self.bus.probe(address) {
                Ok(status) if status.is_success() => {
                    tracing::debug!("Found device at {:#04x}", address);
                    found.push(address);
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Probe of {:#04x} faulted: {}", address, e);
                }
            }
        }
        found
    }

    /// Pull the reset pin low for the pulse time, release it, then wait
    /// out the settle time.
    async fn reset_devices(&mut self, config: &Configuration) -> Result<()> {
        let pin = config.reset_pin;
        tracing::debug!(
            "Resetting devices on pin {} ({} ms low, {} ms settle)",
            pin,
            config.reset_pulse_ms,
            config.reset_settle_ms
        );

        self.reset_line.drive(pin, PinLevel::Low)?;
        sleep(config.reset_pulse()).await;

        // A failed release would leave the slaves held in reset, so retry
        // once before reporting the first fault.
        if let Err(fault) = self.reset_line.drive(pin, PinLevel::High) {
            tracing::error!("Releasing reset pin {} failed: {}", pin, fault);
            if let Err(retry) = self.reset_line.drive(pin, PinLevel::High) {
                tracing::error!("Reset pin {} still held low: {}", pin, retry);
            }
            return Err(fault.into());
        }

        sleep(config.reset_settle()).await;
        Ok(())
    }

    /// Apply a clock mode to the bus, then record it.
    fn set_frequency(&mut self, frequency: BusFrequency, config: &mut Configuration) -> Result<()> {
        self.bus.set_frequency(frequency)?;
        tracing::debug!("Bus frequency set to {} Hz", frequency.hz());
        config.bus_frequency = frequency;
        Ok(())
    }
}

//! Runtime configuration store.
//!
//! One [`Configuration`] value is owned by the bridge and passed by
//! `&mut` to the executor. It changes only through the `Set*` commands,
//! always between two commands.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::DEFAULT_INPUT_BUFFER_CAPACITY;

/// Default delay between the write and read halves of a write-read.
pub const DEFAULT_WRITE_READ_DELAY_MS: u16 = 10;

/// Default reset pin.
pub const DEFAULT_RESET_PIN: u8 = 2;

/// Default duration the reset pin is held low.
pub const DEFAULT_RESET_PULSE_MS: u16 = 10;

/// Default settle time after the reset pin is released.
pub const DEFAULT_RESET_SETTLE_MS: u16 = 50;

/// I2C clock mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusFrequency {
    /// 100 kHz standard mode.
    #[default]
    Standard,
    /// 400 kHz fast mode.
    Fast400k,
}

impl BusFrequency {
    /// Clock frequency in Hz.
    pub fn hz(self) -> u32 {
        match self {
            BusFrequency::Standard => 100_000,
            BusFrequency::Fast400k => 400_000,
        }
    }

    /// Wire value reported by `Info`.
    pub fn as_u8(self) -> u8 {
        match self {
            BusFrequency::Standard => 0,
            BusFrequency::Fast400k => 1,
        }
    }
}

/// Mutable operational parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub bus_frequency: BusFrequency,
    pub write_read_delay_ms: u16,
    pub reset_pin: u8,
    pub reset_pulse_ms: u16,
    pub reset_settle_ms: u16,
    pub input_buffer_capacity: u16,
}

impl Configuration {
    #[inline]
    pub fn write_read_delay(&self) -> Duration {
        Duration::from_millis(self.write_read_delay_ms.into())
    }

    #[inline]
    pub fn reset_pulse(&self) -> Duration {
        Duration::from_millis(self.reset_pulse_ms.into())
    }

    #[inline]
    pub fn reset_settle(&self) -> Duration {
        Duration::from_millis(self.reset_settle_ms.into())
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            bus_frequency: BusFrequency::Standard,
            write_read_delay_ms: DEFAULT_WRITE_READ_DELAY_MS,
            reset_pin: DEFAULT_RESET_PIN,
            reset_pulse_ms: DEFAULT_RESET_PULSE_MS,
            reset_settle_ms: DEFAULT_RESET_SETTLE_MS,
            input_buffer_capacity: DEFAULT_INPUT_BUFFER_CAPACITY as u16,
        }
    }
}

//! Decoder configuration types
//!
//! All tunables of the decoder live here. Every field has a default matching
//! the reference sniffer firmware, so an empty TOML table is a valid config.

use crate::types::{DecoderError, Result};
use serde::{Deserialize, Serialize};

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Number of transaction slots in the circular buffer
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,

    /// Maximum bytes recorded per transaction (address byte included)
    #[serde(default = "default_max_transaction_bytes")]
    pub max_transaction_bytes: usize,

    /// Closed transactions to collect before handing a capture to the reporter
    #[serde(default = "default_capture_threshold")]
    pub capture_threshold: usize,

    /// Where to stretch the clock; `None` disables stretching
    #[serde(default = "default_stretch")]
    pub stretch: Option<StretchTrigger>,

    /// Polls between heartbeat toggles
    #[serde(default = "default_heartbeat_period")]
    pub heartbeat_period: u32,
}

fn default_buffer_capacity() -> usize {
    32
}

fn default_max_transaction_bytes() -> usize {
    128
}

fn default_capture_threshold() -> usize {
    10
}

fn default_stretch() -> Option<StretchTrigger> {
    Some(StretchTrigger::default())
}

fn default_heartbeat_period() -> u32 {
    16
}

/// Position inside a transaction at which the clock gets held low
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchTrigger {
    /// Byte index within the transaction (0 = address byte)
    #[serde(default = "default_stretch_byte")]
    pub byte: usize,
    /// Bit counter value within that byte (0..=8)
    #[serde(default = "default_stretch_bit")]
    pub bit: u8,
    /// How long to hold the clock low, in microseconds
    #[serde(default = "default_stretch_duration")]
    pub duration_us: u32,
}

fn default_stretch_byte() -> usize {
    1
}

fn default_stretch_bit() -> u8 {
    6
}

fn default_stretch_duration() -> u32 {
    100
}

impl Default for StretchTrigger {
    fn default() -> Self {
        Self {
            byte: default_stretch_byte(),
            bit: default_stretch_bit(),
            duration_us: default_stretch_duration(),
        }
    }
}

impl StretchTrigger {
    pub fn new(byte: usize, bit: u8, duration_us: u32) -> Self {
        Self {
            byte,
            bit,
            duration_us,
        }
    }

    /// Check whether the decoder position matches this trigger
    pub fn matches(&self, byte_count: usize, bit_count: u8) -> bool {
        self.byte == byte_count && self.bit == bit_count
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            max_transaction_bytes: default_max_transaction_bytes(),
            capture_threshold: default_capture_threshold(),
            stretch: default_stretch(),
            heartbeat_period: default_heartbeat_period(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the number of transaction slots
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Builder method: set the per-transaction byte limit
    pub fn with_max_transaction_bytes(mut self, max_bytes: usize) -> Self {
        self.max_transaction_bytes = max_bytes;
        self
    }

    /// Builder method: set the capture threshold
    pub fn with_capture_threshold(mut self, threshold: usize) -> Self {
        self.capture_threshold = threshold;
        self
    }

    /// Builder method: set or clear the clock-stretch trigger
    pub fn with_stretch(mut self, stretch: Option<StretchTrigger>) -> Self {
        self.stretch = stretch;
        self
    }

    /// Builder method: set the heartbeat period in polls
    pub fn with_heartbeat_period(mut self, period: u32) -> Self {
        self.heartbeat_period = period;
        self
    }

    /// Bytes of slot storage this configuration allocates
    pub fn memory_footprint(&self) -> usize {
        self.buffer_capacity * self.max_transaction_bytes * std::mem::size_of::<crate::DataAck>()
    }

    /// Reject configurations that would let the writer overrun the buffer.
    ///
    /// A stop at `cursor == capture_threshold` advances the cursor to
    /// `capture_threshold + 1`, which must still name a valid slot.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity < 2 {
            return Err(DecoderError::InvalidConfig(format!(
                "buffer_capacity must be at least 2 (got {})",
                self.buffer_capacity
            )));
        }
        if self.max_transaction_bytes == 0 {
            return Err(DecoderError::InvalidConfig(
                "max_transaction_bytes must be at least 1".to_string(),
            ));
        }
        if self.capture_threshold == 0 {
            return Err(DecoderError::InvalidConfig(
                "capture_threshold must be at least 1".to_string(),
            ));
        }
        if self.capture_threshold + 1 >= self.buffer_capacity {
            return Err(DecoderError::InvalidConfig(format!(
                "capture_threshold ({}) must be below buffer_capacity - 1 ({})",
                self.capture_threshold,
                self.buffer_capacity - 1
            )));
        }
        if let Some(stretch) = &self.stretch {
            if stretch.bit > 8 {
                return Err(DecoderError::InvalidConfig(format!(
                    "stretch bit must be in 0..=8 (got {})",
                    stretch.bit
                )));
            }
        }
        if self.heartbeat_period == 0 {
            return Err(DecoderError::InvalidConfig(
                "heartbeat_period must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_firmware() {
        let config = DecoderConfig::new();
        assert_eq!(config.buffer_capacity, 32);
        assert_eq!(config.max_transaction_bytes, 128);
        assert_eq!(config.capture_threshold, 10);
        assert_eq!(config.stretch, Some(StretchTrigger::new(1, 6, 100)));
        assert_eq!(config.heartbeat_period, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decoder_config_builder() {
        let config = DecoderConfig::new()
            .with_buffer_capacity(8)
            .with_max_transaction_bytes(4)
            .with_capture_threshold(3)
            .with_stretch(None)
            .with_heartbeat_period(2);

        assert_eq!(config.buffer_capacity, 8);
        assert_eq!(config.max_transaction_bytes, 4);
        assert_eq!(config.capture_threshold, 3);
        assert!(config.stretch.is_none());
        assert_eq!(config.heartbeat_period, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_threshold_must_leave_room_for_cursor() {
        let config = DecoderConfig::new()
            .with_buffer_capacity(12)
            .with_capture_threshold(11);
        assert!(matches!(config.validate(), Err(DecoderError::InvalidConfig(_))));

        // threshold + 1 == capacity - 1 is the largest safe value
        let config = DecoderConfig::new()
            .with_buffer_capacity(12)
            .with_capture_threshold(10);
        assert!(config.validate().is_ok());

        let config = DecoderConfig::new()
            .with_buffer_capacity(12)
            .with_capture_threshold(12);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_values() {
        assert!(DecoderConfig::new().with_capture_threshold(0).validate().is_err());
        assert!(DecoderConfig::new().with_max_transaction_bytes(0).validate().is_err());
        assert!(DecoderConfig::new().with_heartbeat_period(0).validate().is_err());
        assert!(DecoderConfig::new()
            .with_stretch(Some(StretchTrigger::new(1, 9, 100)))
            .validate()
            .is_err());
    }

    #[test]
    fn test_stretch_trigger_matches_only_its_position() {
        let trigger = StretchTrigger::default();
        assert!(trigger.matches(1, 6));
        assert!(!trigger.matches(1, 5));
        assert!(!trigger.matches(0, 6));
        assert!(!trigger.matches(2, 6));
    }

    #[test]
    fn test_memory_footprint() {
        // 32 slots * 128 bytes * 2 bytes per DataAck
        assert_eq!(DecoderConfig::new().memory_footprint(), 8192);
    }
}

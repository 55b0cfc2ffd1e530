//! Core types for the I2C sniffer decoder library
//!
//! This module defines the values that flow through the decoder: raw line
//! samples, classified transitions, decoded byte slots and transactions, and
//! the capture snapshots handed to a reporter.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// One poll of the two bus lines.
///
/// There is no timestamp: the order in which samples are fed to the decoder
/// is the only temporal signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineSample {
    /// Data line (SDA) level, `true` = released high
    pub data: bool,
    /// Clock line (SCL) level, `true` = released high
    pub clock: bool,
}

impl LineSample {
    /// Both lines released, the state of an idle bus
    pub const IDLE: LineSample = LineSample {
        data: true,
        clock: true,
    };

    pub fn new(data: bool, clock: bool) -> Self {
        Self { data, clock }
    }
}

impl Default for LineSample {
    fn default() -> Self {
        Self::IDLE
    }
}

impl fmt::Display for LineSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.data as u8, self.clock as u8)
    }
}

/// Result of comparing two consecutive samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionEvent {
    /// Nothing of interest changed
    None,
    /// Data changed while the clock stayed high: a start (`false`) or
    /// stop (`true`) condition. Carries the new data level.
    DataEdgeWhileClockHigh(bool),
    /// Clock went low to high; the data line is sampled here
    ClockRose,
    /// Clock went high to low
    ClockFell,
}

/// One decoded byte slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAck {
    /// Byte value, assembled MSB first
    pub data: u8,
    /// Level of the 9th clock: `true` = not acknowledged (NACK)
    pub ack: bool,
}

impl DataAck {
    pub fn new(data: u8, nack: bool) -> Self {
        Self { data, ack: nack }
    }

    /// True when the receiver pulled the 9th bit low
    pub fn is_acked(&self) -> bool {
        !self.ack
    }
}

/// One bus exchange from a start condition to a stop or repeated start.
///
/// Slots inside the transaction buffer keep `max_transaction_bytes` entries
/// allocated up front; only the first `length` are valid. Snapshots handed
/// to a reporter are trimmed to `length`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Byte slots; `bytes[0]` is the address byte with the R/W flag in bit 0
    pub bytes: Vec<DataAck>,
    /// Number of complete (acknowledged or not) bytes
    pub length: usize,
    /// Began with a repeated start rather than a fresh start
    pub repeated_start: bool,
    /// Closed by a stop condition
    pub stop: bool,
    /// More bytes arrived than the slot can hold; the excess was dropped
    #[serde(default)]
    pub overflowed: bool,
}

impl Transaction {
    /// Create an empty transaction with room for `max_bytes` byte slots
    pub fn with_capacity(max_bytes: usize) -> Self {
        Self {
            bytes: vec![DataAck::default(); max_bytes],
            length: 0,
            repeated_start: false,
            stop: false,
            overflowed: false,
        }
    }

    /// The valid byte slots
    pub fn data_bytes(&self) -> &[DataAck] {
        &self.bytes[..self.length.min(self.bytes.len())]
    }

    /// The address byte, if one was received
    pub fn address_byte(&self) -> Option<DataAck> {
        self.data_bytes().first().copied()
    }

    /// 7-bit target address (address byte without the R/W flag)
    pub fn address(&self) -> Option<u8> {
        self.address_byte().map(|b| b.data >> 1)
    }

    /// True when bit 0 of the address byte requests a read
    pub fn is_read(&self) -> Option<bool> {
        self.address_byte().map(|b| b.data & 0x01 != 0)
    }

    /// Owned copy of this transaction trimmed to its valid bytes
    pub fn snapshot(&self) -> Transaction {
        Transaction {
            bytes: self.data_bytes().to_vec(),
            length: self.length,
            repeated_start: self.repeated_start,
            stop: self.stop,
            overflowed: self.overflowed,
        }
    }

    /// Prepare this slot for a new transaction
    pub(crate) fn reset(&mut self, repeated_start: bool) {
        self.length = 0;
        self.repeated_start = repeated_start;
        self.stop = false;
        self.overflowed = false;
    }
}

/// A batch of closed transactions handed off to a reporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capture {
    /// Running capture-session counter, starting at 0
    pub session: u32,
    /// Owned snapshots in buffer order
    pub transactions: Vec<Transaction>,
    /// Closed slots that were dropped because they lay past the threshold
    pub discarded: usize,
}

impl Capture {
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Errors that can occur while configuring or running the decoder
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse trace at line {line}: {message}")]
    TraceParse { line: usize, message: String },

    #[error("Bus line error: {0}")]
    Line(String),

    #[error("Reporter error: {0}")]
    Report(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

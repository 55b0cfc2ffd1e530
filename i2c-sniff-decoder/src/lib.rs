//! I2C Sniffer Decoder Library
//!
//! A passive decoder for two-wire (I2C) bus traffic. It reconstructs
//! transactions (start, address and data bytes with their acknowledge bits,
//! repeated starts, stop) from polled line samples and keeps them in a
//! fixed-size circular buffer until a capture is handed to a reporter.
//!
//! # Architecture
//!
//! - Samples come from a [`BusLines`] implementation, one per poll
//! - The classifier turns consecutive samples into transition events
//! - The [`Decoder`] state machine assembles bits into transactions and can
//!   stretch the clock at one configured bit position
//! - Closed transactions are handed off as owned [`Capture`] snapshots
//!
//! The library does NOT:
//! - Debounce or filter the lines
//! - Timestamp samples
//! - Arbitrate between masters
//!
//! # Example Usage
//!
//! ```
//! use i2c_sniff_decoder::{Capture, Decoder, DecoderConfig, ReplayLines, Sniffer, TraceBuilder};
//! use std::sync::atomic::AtomicBool;
//!
//! let samples = TraceBuilder::new()
//!     .start()
//!     .byte(0xA4, false)
//!     .byte(0x3C, true)
//!     .stop()
//!     .build();
//!
//! let decoder = Decoder::new(DecoderConfig::new()).unwrap();
//! let mut sniffer = Sniffer::new(ReplayLines::new(samples), decoder, Vec::<Capture>::new());
//! sniffer.run(&AtomicBool::new(false)).unwrap();
//!
//! let captures = sniffer.reporter();
//! assert_eq!(captures[0].transactions[0].length, 2);
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod lines;
pub mod report;
pub mod trace;
pub mod types;

// Internal modules
mod buffer;
mod classifier;
mod sniffer;
mod stretch;

// Re-export main types for convenience
pub use buffer::TransactionBuffer;
pub use classifier::classify;
pub use config::{DecoderConfig, StretchTrigger};
pub use decoder::{DecodeNotice, Decoder, DecoderContext, Phase};
pub use lines::{BusLines, LineAction, ReplayLines};
pub use report::{Reporter, TransactionLine};
pub use sniffer::{Poll, Sniffer, SnifferStats};
pub use stretch::ClockStretcher;
pub use trace::{demo_trace, parse_trace, render_trace, TraceBuilder};
pub use types::{
    Capture, DataAck, DecoderError, LineSample, Result, Transaction, TransitionEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Transaction state machine
//!
//! [`Decoder::step`] is the single entry point: each polled sample is
//! classified against the previous one and the resulting event drives the
//! start/stop/bit handling below. All decode progress lives in an explicit
//! [`DecoderContext`], and the transaction slots live in a
//! [`TransactionBuffer`] owned by the decoder.

use crate::buffer::TransactionBuffer;
use crate::classifier::classify;
use crate::config::DecoderConfig;
use crate::lines::BusLines;
use crate::stretch::ClockStretcher;
use crate::types::{Capture, DataAck, LineSample, Result, Transaction, TransitionEvent};

/// Decoder phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InTransaction,
}

/// Decode progress carried between events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderContext {
    pub phase: Phase,
    /// Clock pulses seen in the current byte, 0..=8 (8 = acknowledge bit)
    pub bit_count: u8,
    /// Complete bytes in the active transaction
    pub byte_count: usize,
    /// Buffer slot being filled
    pub active: usize,
}

impl Default for DecoderContext {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            bit_count: 0,
            byte_count: 0,
            active: 0,
        }
    }
}

/// Something observable happened while handling a sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeNotice {
    /// A transaction was opened in `slot`
    Start { slot: usize, repeated: bool },
    /// The transaction in `slot` was closed by a stop condition
    Stop { slot: usize },
    /// A stop pushed the cursor past the capture threshold
    Capture(Capture),
    /// The transaction in `slot` ran out of byte slots
    Overflow { slot: usize },
    /// The clock was held low at this position
    Stretched { byte: usize, bit: u8 },
}

/// The main decoder struct
pub struct Decoder {
    config: DecoderConfig,
    context: DecoderContext,
    buffer: TransactionBuffer,
    stretcher: ClockStretcher,
    prev: LineSample,
    session: u32,
}

impl Decoder {
    /// Create a decoder, rejecting invalid configurations before any sample
    /// is processed
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;

        log::info!(
            "Decoder ready: {} slots x {} bytes, capture threshold {}",
            config.buffer_capacity,
            config.max_transaction_bytes,
            config.capture_threshold
        );
        if let Some(stretch) = &config.stretch {
            log::info!(
                "Clock stretch armed at byte {} bit {} ({}us)",
                stretch.byte,
                stretch.bit,
                stretch.duration_us
            );
        }

        Ok(Self {
            buffer: TransactionBuffer::new(config.buffer_capacity, config.max_transaction_bytes),
            stretcher: ClockStretcher::new(config.stretch),
            context: DecoderContext::default(),
            prev: LineSample::IDLE,
            session: 0,
            config,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn context(&self) -> &DecoderContext {
        &self.context
    }

    pub fn phase(&self) -> Phase {
        self.context.phase
    }

    /// Index of the slot being (or about to be) filled
    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    /// Number of captures handed off so far
    pub fn session(&self) -> u32 {
        self.session
    }

    /// Read-only view of a buffer slot
    pub fn transaction(&self, index: usize) -> Option<&Transaction> {
        self.buffer.get(index)
    }

    /// Feed one polled sample
    pub fn step<L: BusLines>(&mut self, sample: LineSample, lines: &mut L) -> Result<Option<DecodeNotice>> {
        let event = classify(self.prev, sample);
        self.prev = sample;
        self.handle_event(event, sample.data, lines)
    }

    /// Apply an already classified event; `data` is the current data level
    pub fn handle_event<L: BusLines>(
        &mut self,
        event: TransitionEvent,
        data: bool,
        lines: &mut L,
    ) -> Result<Option<DecodeNotice>> {
        match event {
            TransitionEvent::DataEdgeWhileClockHigh(true) => Ok(self.on_stop()),
            TransitionEvent::DataEdgeWhileClockHigh(false) => Ok(Some(self.on_start())),
            TransitionEvent::ClockRose => Ok(self.on_clock_rose(data)),
            TransitionEvent::ClockFell => self.on_clock_fell(lines),
            TransitionEvent::None => Ok(None),
        }
    }

    fn on_start(&mut self) -> DecodeNotice {
        let repeated = self.context.phase != Phase::Idle;
        if repeated {
            self.buffer.advance();
        }

        let slot = self.buffer.cursor();
        self.buffer.current_mut().reset(repeated);
        self.context = DecoderContext {
            phase: Phase::InTransaction,
            bit_count: 0,
            byte_count: 0,
            active: slot,
        };

        log::debug!(
            "{} in slot {}",
            if repeated { "Repeated start" } else { "Start" },
            slot
        );
        DecodeNotice::Start { slot, repeated }
    }

    fn on_stop(&mut self) -> Option<DecodeNotice> {
        if self.context.phase == Phase::Idle {
            log::debug!("Stop condition while idle, ignored");
            return None;
        }

        let slot = self.buffer.cursor();
        self.buffer.current_mut().stop = true;
        self.context.phase = Phase::Idle;
        log::debug!("Stop in slot {}", slot);

        let threshold = self.config.capture_threshold;
        if slot > threshold {
            let capture = Capture {
                session: self.session,
                transactions: self.buffer.snapshot_prefix(threshold),
                discarded: slot + 1 - threshold,
            };
            log::debug!(
                "Capture {} drops {} closed transaction(s) past the threshold",
                self.session,
                capture.discarded
            );
            self.buffer.rewind();
            self.session += 1;
            log::info!("[{}] capturing {} transactions", self.session, threshold);
            Some(DecodeNotice::Capture(capture))
        } else {
            self.buffer.advance();
            Some(DecodeNotice::Stop { slot })
        }
    }

    fn on_clock_rose(&mut self, data: bool) -> Option<DecodeNotice> {
        if self.context.phase != Phase::InTransaction {
            return None;
        }

        let ctx = &mut self.context;
        let bit_count = ctx.bit_count;
        ctx.bit_count = (bit_count + 1) % 9;

        let slot = ctx.active;
        let transaction = self.buffer.at_mut(slot);
        let bit = data as u8;

        if ctx.byte_count >= self.config.max_transaction_bytes {
            // the excess byte counts as dropped once its acknowledge clock arrives
            if bit_count == 8 && !transaction.overflowed {
                transaction.overflowed = true;
                log::warn!(
                    "Transaction in slot {} exceeds {} bytes, truncating",
                    slot,
                    self.config.max_transaction_bytes
                );
                return Some(DecodeNotice::Overflow { slot });
            }
            return None;
        }

        let byte = &mut transaction.bytes[ctx.byte_count];
        match bit_count {
            8 => {
                byte.ack |= data;
                log::trace!(
                    "Byte {} = 0x{:02X} [{}]",
                    ctx.byte_count,
                    byte.data,
                    if byte.ack { 'N' } else { 'A' }
                );
                ctx.byte_count += 1;
                transaction.length = ctx.byte_count;
            }
            0 => {
                *byte = DataAck {
                    data: bit << 7,
                    ack: false,
                };
            }
            n => {
                byte.data |= bit << (7 - n);
            }
        }
        None
    }

    fn on_clock_fell<L: BusLines>(&mut self, lines: &mut L) -> Result<Option<DecodeNotice>> {
        if self.context.phase != Phase::InTransaction {
            return Ok(None);
        }

        let (byte, bit) = (self.context.byte_count, self.context.bit_count);
        if self.stretcher.maybe_stretch(byte, bit, lines)? {
            Ok(Some(DecodeNotice::Stretched { byte, bit }))
        } else {
            Ok(None)
        }
    }

    /// Hand off every closed transaction before the cursor and rewind.
    ///
    /// Mid-transaction the closed slots before the active one are handed
    /// off and the open transaction moves to slot 0, where it keeps filling.
    pub fn flush(&mut self) -> Option<Capture> {
        let count = match self.context.phase {
            Phase::Idle => self.buffer.cursor(),
            Phase::InTransaction => self.context.active,
        };
        if count == 0 {
            return None;
        }

        let capture = Capture {
            session: self.session,
            transactions: self.buffer.snapshot_prefix(count),
            discarded: 0,
        };
        match self.context.phase {
            Phase::Idle => self.buffer.rewind(),
            Phase::InTransaction => {
                self.buffer.move_to_front(self.context.active);
                self.context.active = 0;
            }
        }
        self.session += 1;
        log::info!("Flushed {} transactions", count);
        Some(capture)
    }
}

//! Host polling loop
//!
//! Ties a [`BusLines`] source, a [`Decoder`] and a [`Reporter`] together.
//! Each poll takes one sample; nothing else runs in between, so the loop
//! rate bounds the bus speed that can be followed.

use crate::decoder::{DecodeNotice, Decoder, Phase};
use crate::lines::BusLines;
use crate::report::Reporter;
use crate::stretch::line_error;
use crate::types::{Capture, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

/// Counters kept by the polling loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SnifferStats {
    pub polls: u64,
    pub starts: u64,
    pub repeated_starts: u64,
    pub stops: u64,
    pub captures: u64,
    pub transactions_reported: u64,
    pub overflows: u64,
    pub stretches: u64,
    pub report_failures: u64,
}

/// Outcome of a single poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Poll {
    /// The sample source has no more samples
    Exhausted,
    /// A sample was decoded
    Sampled(Option<DecodeNotice>),
}

pub struct Sniffer<L, R> {
    lines: L,
    decoder: Decoder,
    reporter: R,
    stats: SnifferStats,
    heartbeat: bool,
    last_phase: Phase,
}

impl<L: BusLines, R: Reporter> Sniffer<L, R> {
    pub fn new(lines: L, decoder: Decoder, reporter: R) -> Self {
        Self {
            lines,
            decoder,
            reporter,
            stats: SnifferStats::default(),
            heartbeat: false,
            last_phase: Phase::Idle,
        }
    }

    pub fn decoder(&self) -> &Decoder {
        &self.decoder
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn stats(&self) -> SnifferStats {
        self.stats
    }

    pub fn into_parts(self) -> (L, Decoder, R) {
        (self.lines, self.decoder, self.reporter)
    }

    /// Take and decode one sample
    pub fn poll(&mut self) -> Result<Poll> {
        let sample = match self.lines.sample().map_err(line_error)? {
            Some(sample) => sample,
            None => return Ok(Poll::Exhausted),
        };

        let notice = self.decoder.step(sample, &mut self.lines)?;
        if let Some(notice) = &notice {
            self.record(notice);
        }

        let phase = self.decoder.phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            self.lines
                .set_activity(phase == Phase::InTransaction)
                .map_err(line_error)?;
        }

        if self.stats.polls % u64::from(self.decoder.config().heartbeat_period) == 0 {
            self.heartbeat = !self.heartbeat;
            self.lines.set_heartbeat(self.heartbeat).map_err(line_error)?;
        }
        self.stats.polls += 1;

        Ok(Poll::Sampled(notice))
    }

    fn record(&mut self, notice: &DecodeNotice) {
        match notice {
            DecodeNotice::Start { repeated: false, .. } => self.stats.starts += 1,
            DecodeNotice::Start { repeated: true, .. } => self.stats.repeated_starts += 1,
            DecodeNotice::Stop { .. } => self.stats.stops += 1,
            DecodeNotice::Capture(capture) => {
                self.stats.stops += 1;
                self.deliver(capture);
            }
            DecodeNotice::Overflow { .. } => self.stats.overflows += 1,
            DecodeNotice::Stretched { .. } => self.stats.stretches += 1,
        }
    }

    fn deliver(&mut self, capture: &Capture) {
        self.stats.captures += 1;
        self.stats.transactions_reported += capture.len() as u64;
        if let Err(e) = self.reporter.report(capture) {
            self.stats.report_failures += 1;
            log::warn!("Failed to report capture {}: {}", capture.session, e);
        }
    }

    /// Hand off whatever closed transactions are still buffered
    pub fn finish(&mut self) {
        if let Some(capture) = self.decoder.flush() {
            self.deliver(&capture);
        }
    }

    /// Poll until the source runs dry or `shutdown` is set, then flush and
    /// release the clock line
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<SnifferStats> {
        let outcome = loop {
            if shutdown.load(Ordering::Relaxed) {
                log::info!("Shutdown requested after {} polls", self.stats.polls);
                break Ok(());
            }
            match self.poll() {
                Ok(Poll::Exhausted) => {
                    log::debug!("Sample source exhausted after {} polls", self.stats.polls);
                    break Ok(());
                }
                Ok(Poll::Sampled(_)) => {}
                Err(e) => break Err(e),
            }
        };

        if outcome.is_ok() {
            self.finish();
        }
        self.lines.release_clock_line().map_err(line_error)?;
        outcome.map(|_| self.stats)
    }
}

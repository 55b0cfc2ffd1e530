//! Line-sample traces
//!
//! A trace is plain text, one sample per line: the data level then the clock
//! level, each `0` or `1`, optionally separated by whitespace. Blank lines
//! and `#` comments are ignored.
//!
//! ```text
//! # idle, start, first bit
//! 11
//! 01
//! 00
//! 1 0
//! 1 1
//! ```
//!
//! [`TraceBuilder`] synthesises well-formed bus activity, which is how the
//! demo trace and the tests produce their input.

use crate::types::{DecoderError, LineSample, Result};

/// Parse a text trace into samples
pub fn parse_trace(text: &str) -> Result<Vec<LineSample>> {
    let mut samples = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        let levels: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
        if levels.is_empty() {
            continue;
        }

        let sample = match levels.as_slice() {
            [data, clock] => LineSample::new(parse_level(*data, index)?, parse_level(*clock, index)?),
            _ => {
                return Err(DecoderError::TraceParse {
                    line: index + 1,
                    message: format!("expected two levels (data, clock), got {:?}", line.trim()),
                })
            }
        };
        samples.push(sample);
    }

    log::debug!("Parsed {} samples from trace", samples.len());
    Ok(samples)
}

fn parse_level(c: char, index: usize) -> Result<bool> {
    match c {
        '0' => Ok(false),
        '1' => Ok(true),
        other => Err(DecoderError::TraceParse {
            line: index + 1,
            message: format!("invalid line level {:?}", other),
        }),
    }
}

/// Render samples in the text trace format
pub fn render_trace(samples: &[LineSample]) -> String {
    let mut out = String::with_capacity(samples.len() * 3);
    for sample in samples {
        out.push_str(&sample.to_string());
        out.push('\n');
    }
    out
}

/// Builds sample sequences for start/byte/stop activity.
///
/// Every clock edge gets its own sample, and data only changes while the
/// clock is low except for start and stop conditions.
#[derive(Debug, Clone)]
pub struct TraceBuilder {
    samples: Vec<LineSample>,
    state: LineSample,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    /// Begin with one idle sample (both lines high)
    pub fn new() -> Self {
        Self {
            samples: vec![LineSample::IDLE],
            state: LineSample::IDLE,
        }
    }

    fn push(&mut self, data: bool, clock: bool) {
        self.state = LineSample::new(data, clock);
        self.samples.push(self.state);
    }

    /// Start condition. Without a preceding `stop()` this is a repeated start.
    pub fn start(mut self) -> Self {
        if !self.state.clock {
            if !self.state.data {
                self.push(true, false);
            }
            self.push(true, true);
        } else if !self.state.data {
            self.push(false, false);
            self.push(true, false);
            self.push(true, true);
        }
        self.push(false, true);
        self.push(false, false);
        self
    }

    /// One clock pulse with the data line at `level`
    pub fn bit(mut self, level: bool) -> Self {
        if self.state.clock {
            self.push(self.state.data, false);
        }
        self.push(level, false);
        self.push(level, true);
        self.push(level, false);
        self
    }

    /// Eight data bits MSB first, then the acknowledge bit (`nack = true`
    /// leaves the line high)
    pub fn byte(mut self, value: u8, nack: bool) -> Self {
        for shift in (0..8).rev() {
            self = self.bit((value >> shift) & 0x01 != 0);
        }
        self.bit(nack)
    }

    /// Address byte followed by data bytes, all acknowledged
    pub fn write(mut self, address: u8, data: &[u8]) -> Self {
        self = self.byte(address << 1, false);
        for value in data {
            self = self.byte(*value, false);
        }
        self
    }

    /// Stop condition
    pub fn stop(mut self) -> Self {
        if self.state.clock {
            self.push(self.state.data, false);
        }
        self.push(false, false);
        self.push(false, true);
        self.push(true, true);
        self
    }

    /// Repeat the current line state `count` times
    pub fn idle(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.push(self.state.data, self.state.clock);
        }
        self
    }

    pub fn build(self) -> Vec<LineSample> {
        self.samples
    }
}

/// A short session: register write, then a register read through a
/// repeated start
pub fn demo_trace() -> Vec<LineSample> {
    TraceBuilder::new()
        .start()
        .write(0x50, &[0x00, 0x10])
        .stop()
        .idle(4)
        .start()
        .write(0x50, &[0x10])
        .start()
        .byte((0x50 << 1) | 0x01, false)
        .byte(0xDE, false)
        .byte(0xAD, true)
        .stop()
        .idle(4)
        .build()
}

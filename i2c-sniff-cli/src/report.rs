//! Report generation
//!
//! Text output prints one line per transaction in the classic sniffer
//! format; JSON output writes one object per transaction.

use i2c_sniff_decoder::{Capture, DecoderError, Reporter, Transaction, TransactionLine};
use serde::Serialize;
use std::io::Write;

fn write_error(e: impl std::fmt::Display) -> DecoderError {
    DecoderError::Report(e.to_string())
}

/// Human-readable transaction lines with a running sequence number
pub struct TextReporter<W: Write> {
    out: W,
    seq: u32,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, seq: 0 }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for TextReporter<W> {
    fn report(&mut self, capture: &Capture) -> i2c_sniff_decoder::Result<()> {
        for transaction in &capture.transactions {
            writeln!(self.out, "{}", TransactionLine::new(self.seq, transaction))?;
            self.seq = self.seq.wrapping_add(1);
        }
        self.out.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    seq: u32,
    session: u32,
    #[serde(flatten)]
    transaction: &'a Transaction,
}

/// One JSON object per line for each transaction
pub struct JsonReporter<W: Write> {
    out: W,
    seq: u32,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out, seq: 0 }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn report(&mut self, capture: &Capture) -> i2c_sniff_decoder::Result<()> {
        for transaction in &capture.transactions {
            let record = JsonRecord {
                seq: self.seq,
                session: capture.session,
                transaction,
            };
            serde_json::to_writer(&mut self.out, &record).map_err(write_error)?;
            writeln!(self.out)?;
            self.seq = self.seq.wrapping_add(1);
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Either reporter behind one type, chosen at startup
pub enum AnyReporter<W: Write> {
    Text(TextReporter<W>),
    Json(JsonReporter<W>),
}

impl<W: Write> Reporter for AnyReporter<W> {
    fn report(&mut self, capture: &Capture) -> i2c_sniff_decoder::Result<()> {
        match self {
            AnyReporter::Text(r) => r.report(capture),
            AnyReporter::Json(r) => r.report(capture),
        }
    }
}

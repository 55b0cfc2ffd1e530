//! Capture reporting
//!
//! The decoder hands finished captures to a [`Reporter`]. Captures are owned
//! snapshots, so a reporter never observes a slot that is still being filled.

use crate::types::{Capture, Result, Transaction};
use std::fmt;

/// Consumer of captured transactions
pub trait Reporter {
    fn report(&mut self, capture: &Capture) -> Result<()>;
}

/// Collects captures in memory
impl Reporter for Vec<Capture> {
    fn report(&mut self, capture: &Capture) -> Result<()> {
        self.push(capture.clone());
        Ok(())
    }
}

/// One transaction rendered as a report line:
///
/// ```text
/// #00000 ( 1) : [S] 0xA4-W[A] 0x3C[N] [P]
/// ```
///
/// `[S]`/`[R]` mark a fresh or repeated start, `R`/`W` comes from bit 0 of
/// the address byte, `[A]`/`[N]` is the acknowledge of each byte, `[OVF]`
/// marks a truncated transaction and `[P]` a closing stop.
pub struct TransactionLine<'a> {
    pub seq: u32,
    pub transaction: &'a Transaction,
}

impl<'a> TransactionLine<'a> {
    pub fn new(seq: u32, transaction: &'a Transaction) -> Self {
        Self { seq, transaction }
    }
}

fn ack_mark(nack: bool) -> char {
    if nack {
        'N'
    } else {
        'A'
    }
}

impl fmt::Display for TransactionLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = self.transaction;
        write!(
            f,
            "#{:05} ({:2}) : [{}]",
            self.seq,
            t.length as i64 - 1,
            if t.repeated_start { 'R' } else { 'S' }
        )?;

        let mut bytes = t.data_bytes().iter();
        if let Some(addr) = bytes.next() {
            write!(
                f,
                " 0x{:02X}-{}[{}]",
                addr.data & !0x01,
                if addr.data & 0x01 != 0 { 'R' } else { 'W' },
                ack_mark(addr.ack)
            )?;
        }
        for byte in bytes {
            write!(f, " 0x{:02X}[{}]", byte.data, ack_mark(byte.ack))?;
        }

        if t.overflowed {
            write!(f, " [OVF]")?;
        }
        if t.stop {
            write!(f, " [P]")?;
        }
        Ok(())
    }
}

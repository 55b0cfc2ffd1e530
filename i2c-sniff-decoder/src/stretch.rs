//! Clock stretch injection
//!
//! Holds the clock low for a fixed time at one configured bit position. The
//! hold is a synchronous wait: nothing is sampled while it lasts, so any
//! edge the other devices produce in that window is not observed.

use crate::config::StretchTrigger;
use crate::lines::BusLines;
use crate::types::{DecoderError, Result};

pub struct ClockStretcher {
    trigger: Option<StretchTrigger>,
}

impl ClockStretcher {
    pub fn new(trigger: Option<StretchTrigger>) -> Self {
        Self { trigger }
    }

    pub fn trigger(&self) -> Option<&StretchTrigger> {
        self.trigger.as_ref()
    }

    /// Stretch the clock if `(byte_count, bit_count)` is the trigger position.
    ///
    /// Returns whether a stretch was performed.
    pub fn maybe_stretch<L: BusLines>(
        &self,
        byte_count: usize,
        bit_count: u8,
        lines: &mut L,
    ) -> Result<bool> {
        let trigger = match &self.trigger {
            Some(trigger) if trigger.matches(byte_count, bit_count) => trigger,
            _ => return Ok(false),
        };

        log::trace!(
            "Stretching clock at byte {} bit {} for {}us",
            byte_count,
            bit_count,
            trigger.duration_us
        );

        lines.drive_clock_low().map_err(line_error)?;
        let held = lines.wait_micros(trigger.duration_us).map_err(line_error);
        // the pin goes back to input even if the wait failed
        lines.release_clock_line().map_err(line_error)?;
        held?;

        Ok(true)
    }
}

pub(crate) fn line_error<E: std::fmt::Display>(e: E) -> DecoderError {
    DecoderError::Line(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lines::{LineAction, ReplayLines};

    #[test]
    fn test_fires_only_at_trigger() {
        let stretcher = ClockStretcher::new(Some(StretchTrigger::default()));
        let mut lines = ReplayLines::default();

        for byte in 0..3 {
            for bit in 0..9u8 {
                let fired = stretcher.maybe_stretch(byte, bit, &mut lines).unwrap();
                assert_eq!(fired, byte == 1 && bit == 6, "byte {} bit {}", byte, bit);
            }
        }

        assert_eq!(
            lines.actions(),
            &[
                LineAction::DriveClockLow,
                LineAction::Wait(100),
                LineAction::ReleaseClock
            ]
        );
        assert!(!lines.is_clock_driven_low());
    }

    #[test]
    fn test_disabled_never_fires() {
        let stretcher = ClockStretcher::new(None);
        let mut lines = ReplayLines::default();
        assert!(!stretcher.maybe_stretch(1, 6, &mut lines).unwrap());
        assert!(lines.actions().is_empty());
    }

    #[test]
    fn test_custom_duration() {
        let stretcher = ClockStretcher::new(Some(StretchTrigger::new(0, 2, 250)));
        let mut lines = ReplayLines::default();
        assert!(stretcher.maybe_stretch(0, 2, &mut lines).unwrap());
        assert_eq!(lines.actions()[1], LineAction::Wait(250));
    }
}

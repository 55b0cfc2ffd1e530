//! Bus line abstractions
//!
//! The decoder never touches pins directly. A host supplies an implementation
//! of [`BusLines`] for its hardware; [`ReplayLines`] replays a recorded trace
//! and records every output action, which is what the tests and the CLI use.

use crate::types::LineSample;
use std::convert::Infallible;
use std::fmt;

/// Minimal capability set needed to sniff an open-drain two-wire bus
pub trait BusLines {
    /// Error type for line operations
    type Error: fmt::Display;

    /// Read the current data line (SDA) level
    fn read_data_line(&mut self) -> Result<bool, Self::Error>;

    /// Read the current clock line (SCL) level
    fn read_clock_line(&mut self) -> Result<bool, Self::Error>;

    /// Switch the clock pin to output and drive it low
    fn drive_clock_low(&mut self) -> Result<(), Self::Error>;

    /// Return the clock pin to high-impedance input
    fn release_clock_line(&mut self) -> Result<(), Self::Error>;

    /// Busy-wait for the given number of microseconds
    fn wait_micros(&mut self, micros: u32) -> Result<(), Self::Error>;

    /// Take one sample of both lines.
    ///
    /// `None` means the source is exhausted; live hardware never is.
    fn sample(&mut self) -> Result<Option<LineSample>, Self::Error> {
        let data = self.read_data_line()?;
        let clock = self.read_clock_line()?;
        Ok(Some(LineSample { data, clock }))
    }

    /// Drive the liveness output
    fn set_heartbeat(&mut self, _level: bool) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Drive the activity indicator (high while inside a transaction)
    fn set_activity(&mut self, _active: bool) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Output actions recorded by [`ReplayLines`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    DriveClockLow,
    ReleaseClock,
    Wait(u32),
    Heartbeat(bool),
    Activity(bool),
}

/// Replays a recorded sample sequence
#[derive(Debug, Clone, Default)]
pub struct ReplayLines {
    samples: Vec<LineSample>,
    position: usize,
    current: LineSample,
    clock_driven_low: bool,
    actions: Vec<LineAction>,
}

impl ReplayLines {
    pub fn new(samples: Vec<LineSample>) -> Self {
        Self {
            samples,
            ..Self::default()
        }
    }

    /// Samples not yet replayed
    pub fn remaining(&self) -> usize {
        self.samples.len() - self.position
    }

    /// Every output action so far, in order
    pub fn actions(&self) -> &[LineAction] {
        &self.actions
    }

    /// Number of completed drive-low / release pairs
    pub fn stretch_count(&self) -> usize {
        self.actions
            .windows(3)
            .filter(|w| {
                matches!(
                    w,
                    [LineAction::DriveClockLow, LineAction::Wait(_), LineAction::ReleaseClock]
                )
            })
            .count()
    }

    pub fn is_clock_driven_low(&self) -> bool {
        self.clock_driven_low
    }
}

impl BusLines for ReplayLines {
    type Error = Infallible;

    fn read_data_line(&mut self) -> Result<bool, Self::Error> {
        Ok(self.current.data)
    }

    fn read_clock_line(&mut self) -> Result<bool, Self::Error> {
        Ok(self.current.clock && !self.clock_driven_low)
    }

    fn drive_clock_low(&mut self) -> Result<(), Self::Error> {
        self.clock_driven_low = true;
        self.actions.push(LineAction::DriveClockLow);
        Ok(())
    }

    fn release_clock_line(&mut self) -> Result<(), Self::Error> {
        self.clock_driven_low = false;
        self.actions.push(LineAction::ReleaseClock);
        Ok(())
    }

    fn wait_micros(&mut self, micros: u32) -> Result<(), Self::Error> {
        self.actions.push(LineAction::Wait(micros));
        Ok(())
    }

    fn sample(&mut self) -> Result<Option<LineSample>, Self::Error> {
        match self.samples.get(self.position) {
            Some(sample) => {
                self.position += 1;
                self.current = *sample;
                Ok(Some(LineSample {
                    data: self.read_data_line()?,
                    clock: self.read_clock_line()?,
                }))
            }
            None => Ok(None),
        }
    }

    fn set_heartbeat(&mut self, level: bool) -> Result<(), Self::Error> {
        self.actions.push(LineAction::Heartbeat(level));
        Ok(())
    }

    fn set_activity(&mut self, active: bool) -> Result<(), Self::Error> {
        self.actions.push(LineAction::Activity(active));
        Ok(())
    }
}

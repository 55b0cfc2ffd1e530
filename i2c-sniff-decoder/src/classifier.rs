//! Transition classification
//!
//! Compares two consecutive line samples. Only one event is reported per
//! sample pair, so two edges landing between polls collapse into one.

use crate::types::{LineSample, TransitionEvent};

/// Classify the change from `prev` to `cur`.
///
/// Rules are checked in priority order; a data edge with the clock held high
/// wins over any clock edge.
pub fn classify(prev: LineSample, cur: LineSample) -> TransitionEvent {
    if cur.data != prev.data && prev.clock && cur.clock {
        TransitionEvent::DataEdgeWhileClockHigh(cur.data)
    } else if !prev.clock && cur.clock {
        TransitionEvent::ClockRose
    } else if prev.clock && !cur.clock {
        TransitionEvent::ClockFell
    } else {
        TransitionEvent::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(data: u8, clock: u8) -> LineSample {
        LineSample::new(data != 0, clock != 0)
    }

    #[test]
    fn test_start_and_stop_conditions() {
        assert_eq!(
            classify(s(1, 1), s(0, 1)),
            TransitionEvent::DataEdgeWhileClockHigh(false)
        );
        assert_eq!(
            classify(s(0, 1), s(1, 1)),
            TransitionEvent::DataEdgeWhileClockHigh(true)
        );
    }

    #[test]
    fn test_clock_edges() {
        assert_eq!(classify(s(0, 0), s(0, 1)), TransitionEvent::ClockRose);
        assert_eq!(classify(s(1, 0), s(1, 1)), TransitionEvent::ClockRose);
        assert_eq!(classify(s(1, 1), s(1, 0)), TransitionEvent::ClockFell);
    }

    #[test]
    fn test_data_change_with_clock_low_is_not_an_event() {
        assert_eq!(classify(s(0, 0), s(1, 0)), TransitionEvent::None);
        assert_eq!(classify(s(1, 0), s(0, 0)), TransitionEvent::None);
    }

    #[test]
    fn test_simultaneous_edges_follow_clock() {
        // data changed but the clock did not stay high for both samples
        assert_eq!(classify(s(1, 0), s(0, 1)), TransitionEvent::ClockRose);
        assert_eq!(classify(s(0, 1), s(1, 0)), TransitionEvent::ClockFell);
    }

    #[test]
    fn test_steady_lines() {
        for data in 0..2 {
            for clock in 0..2 {
                assert_eq!(
                    classify(s(data, clock), s(data, clock)),
                    TransitionEvent::None
                );
            }
        }
    }
}

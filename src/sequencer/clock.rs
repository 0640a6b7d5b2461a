// Tempo -> device time arithmetic. Everything here is pure; the transport
// feeds it its counters and gets absolute device timestamps back.

use std::time::Duration;

use crate::error::{Result, SequencerError};
use crate::shared::{
    DEFAULT_LOOKAHEAD_SECS, DEFAULT_SCHEDULE_INTERVAL_MS, MAX_TEMPO, MIN_TEMPO, STEPS_PER_PATTERN,
};

/// Seconds per sixteenth note: `60 / tempo / 4`.
pub fn sixteenth_note_duration(tempo: f64) -> f64 {
    60.0 / tempo / 4.0
}

/// Seconds per 16-step loop (4 beats): `240 / tempo`.
pub fn loop_duration(tempo: f64) -> f64 {
    240.0 / tempo
}

/// Absolute device time of the step at `current_index`.
///
/// `old_index` is the step the current session was started (or re-anchored)
/// on and `num_loops` counts how many times the index has wrapped since then,
/// so `num_loops * 16 + current_index - old_index` is the number of steps
/// played since `start_time`.
pub fn next_note_time(
    start_time: f64,
    tempo: f64,
    current_index: usize,
    old_index: usize,
    num_loops: u64,
) -> f64 {
    let loop_offset = num_loops as f64 * loop_duration(tempo);
    let index_offset = (current_index as f64 - old_index as f64) * sixteenth_note_duration(tempo);
    start_time + loop_offset + index_offset
}

// rejects anything outside the open interval before it can reach the transport
pub fn validate_tempo(tempo: f64) -> Result<f64> {
    if tempo.is_finite() && tempo > MIN_TEMPO && tempo < MAX_TEMPO {
        Ok(tempo)
    } else {
        Err(SequencerError::InvalidTempo(tempo))
    }
}

pub fn validate_step(index: usize) -> Result<usize> {
    if index < STEPS_PER_PATTERN {
        Ok(index)
    } else {
        Err(SequencerError::StepOutOfRange(index))
    }
}

/// The two fixed knobs of the lookahead loop.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    lookahead_secs: f64,
    schedule_interval: Duration,
}

impl Timing {
    // the wake period has to fit inside the lookahead window, otherwise a late
    // wake leaves a gap nobody scheduled
    pub fn new(lookahead_secs: f64, schedule_interval_ms: u64) -> Result<Self> {
        let interval_secs = schedule_interval_ms as f64 / 1000.0;
        if schedule_interval_ms == 0 || !lookahead_secs.is_finite() || interval_secs >= lookahead_secs {
            return Err(SequencerError::InvalidTiming {
                interval_ms: schedule_interval_ms,
                lookahead_secs,
            });
        }
        Ok(Self {
            lookahead_secs,
            schedule_interval: Duration::from_millis(schedule_interval_ms),
        })
    }

    pub fn lookahead_secs(&self) -> f64 {
        self.lookahead_secs
    }

    pub fn schedule_interval(&self) -> Duration {
        self.schedule_interval
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            lookahead_secs: DEFAULT_LOOKAHEAD_SECS,
            schedule_interval: Duration::from_millis(DEFAULT_SCHEDULE_INTERVAL_MS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sixteenth_is_fifteen_over_tempo() {
        for tempo in [0.5, 1.0, 60.0, 90.0, 120.0, 174.0, 333.3, 999.9] {
            assert_relative_eq!(sixteenth_note_duration(tempo), 15.0 / tempo, max_relative = 1e-12);
        }
        assert_relative_eq!(sixteenth_note_duration(120.0), 0.125);
    }

    #[test]
    fn loop_is_sixteen_sixteenths() {
        for tempo in [60.0, 120.0, 137.5] {
            assert_relative_eq!(
                loop_duration(tempo),
                16.0 * sixteenth_note_duration(tempo),
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn next_note_time_matches_formula() {
        // 2 loops at 120 = 4 s, plus 3 steps = 0.375 s
        assert_relative_eq!(next_note_time(10.0, 120.0, 7, 4, 2), 14.375);
        assert_relative_eq!(next_note_time(0.0, 120.0, 0, 0, 0), 0.0);
        assert_relative_eq!(next_note_time(0.0, 60.0, 1, 0, 0), 0.25);
    }

    #[test]
    fn next_note_time_grows_with_index() {
        for old in 0..STEPS_PER_PATTERN {
            for loops in 0..3 {
                let mut prev = f64::NEG_INFINITY;
                for current in 0..STEPS_PER_PATTERN {
                    let t = next_note_time(2.5, 97.0, current, old, loops);
                    assert!(t >= prev, "{t} < {prev} at current={current} old={old}");
                    prev = t;
                }
            }
        }
    }

    #[test]
    fn wrapped_index_counts_as_a_full_loop() {
        // started on step 5, played 11 steps so the index wrapped to 0 once
        let t = next_note_time(0.0, 120.0, 0, 5, 1);
        assert_relative_eq!(t, 11.0 * 0.125);
    }

    #[test]
    fn tempo_bounds_are_exclusive() {
        assert_eq!(validate_tempo(0.0), Err(SequencerError::InvalidTempo(0.0)));
        assert_eq!(validate_tempo(-10.0), Err(SequencerError::InvalidTempo(-10.0)));
        assert_eq!(validate_tempo(1000.0), Err(SequencerError::InvalidTempo(1000.0)));
        assert!(validate_tempo(f64::NAN).is_err());
        assert!(validate_tempo(f64::INFINITY).is_err());
        assert_eq!(validate_tempo(0.001), Ok(0.001));
        assert_eq!(validate_tempo(999.0), Ok(999.0));
    }

    #[test]
    fn step_bounds() {
        assert_eq!(validate_step(15), Ok(15));
        assert_eq!(validate_step(16), Err(SequencerError::StepOutOfRange(16)));
    }

    #[test]
    fn timing_rejects_interval_at_or_over_lookahead() {
        assert!(Timing::new(0.1, 30).is_ok());
        assert!(Timing::new(0.1, 100).is_err());
        assert!(Timing::new(0.1, 250).is_err());
        assert!(Timing::new(0.1, 0).is_err());
        assert_eq!(Timing::default(), Timing::new(0.1, 30).unwrap());
    }
}

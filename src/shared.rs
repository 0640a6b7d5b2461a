// Constants and small types shared between the sequencer, the audio engine
// and the binary glue.
//
// Timeline vocabulary used across the crate:
//   step      one sixteenth note, 16 of them per loop
//   loop      one bar of 16 steps (4 beats)
//   device    seconds on the audio output clock (what the sink schedules against)
//   wall      std::time::Instant, only used to decide when the scheduler wakes

pub const STEPS_PER_PATTERN: usize = 16;

// tempo is exclusive on both ends: 0 < bpm < 1000
pub const MIN_TEMPO: f64 = 0.0;
pub const MAX_TEMPO: f64 = 1000.0;
pub const DEFAULT_TEMPO: f64 = 120.0;

// how far ahead of the device clock events get pre-scheduled
pub const DEFAULT_LOOKAHEAD_SECS: f64 = 0.1;
// how often the scheduler wakes up; has to stay well under the lookahead
pub const DEFAULT_SCHEDULE_INTERVAL_MS: u64 = 30;

// what a silent step looks like in a display pattern
pub const SILENT_STEP_CHAR: char = '-';

// visual index before anything has sounded
pub const NO_VISUAL_STEP: i32 = -1;

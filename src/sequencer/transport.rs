//! Transport state and the lookahead scheduling pass.
//!
//! The transport never looks at the wall clock. Each pass is handed the
//! device time "now", schedules every step whose device time falls before
//! `now + lookahead`, and reports back how far in the future each of those
//! steps will sound so the caller can line up the visual highlight with it.

use std::sync::Arc;

use super::clock::{self, Timing};
use super::pattern::Pattern;
use crate::audio_api::PlaybackSink;
use crate::error::Result;
use crate::shared::{DEFAULT_TEMPO, NO_VISUAL_STEP, STEPS_PER_PATTERN};

/// One step handed to the sink during a pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduledStep {
    pub index: usize,
    /// Device time the step sounds at.
    pub time: f64,
    /// Seconds between the pass and the step sounding; the visual update waits this long.
    pub delay_secs: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Stopped,
    Playing,
}

#[derive(Debug)]
pub struct Transport {
    tempo: f64,
    state: TransportState,
    start_time: f64, // device time of step `old_index` for the running session
    current_index: usize,
    old_index: usize,
    visual_index: i32,
    loop_counter: usize,
    num_loops: u64,
    timing: Timing,
    bootstrap_pending: bool,
}

impl Transport {
    pub fn new(timing: Timing) -> Self {
        Self {
            tempo: DEFAULT_TEMPO,
            state: TransportState::Stopped,
            start_time: 0.0,
            current_index: 0,
            old_index: 0,
            visual_index: NO_VISUAL_STEP,
            loop_counter: 0,
            num_loops: 0,
            timing,
            bootstrap_pending: false,
        }
    }

    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn old_index(&self) -> usize {
        self.old_index
    }

    pub fn visual_index(&self) -> i32 {
        self.visual_index
    }

    pub fn loop_counter(&self) -> usize {
        self.loop_counter
    }

    pub fn num_loops(&self) -> u64 {
        self.num_loops
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Device time of the next step to be scheduled.
    pub fn next_note_time(&self) -> f64 {
        clock::next_note_time(
            self.start_time,
            self.tempo,
            self.current_index,
            self.old_index,
            self.num_loops,
        )
    }

    /// Begin a session anchored at `now` on the device clock. Returns false and
    /// changes nothing if already playing.
    pub fn start(&mut self, now: f64) -> bool {
        if self.is_playing() {
            return false;
        }
        self.state = TransportState::Playing;
        self.start_time = now;
        self.old_index = self.current_index;
        self.num_loops = 0;
        // loops are counted from step 0, so a session resumed mid-bar is
        // already that many steps into its first loop
        self.loop_counter = self.current_index;
        self.bootstrap_pending = true;
        true
    }

    /// Stop and freeze the resume anchor. Calling it again changes nothing.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.num_loops = 0;
        self.loop_counter = 0;
        self.old_index = self.current_index;
        self.bootstrap_pending = false;
    }

    /// Change tempo. While playing the session is re-anchored on the next
    /// unscheduled step so its device time does not move; only the spacing of
    /// the steps after it changes.
    pub fn set_tempo(&mut self, tempo: f64) -> Result<()> {
        let tempo = clock::validate_tempo(tempo)?;
        if self.is_playing() {
            self.start_time = self.next_note_time();
            self.old_index = self.current_index;
            self.num_loops = 0;
            self.loop_counter = self.current_index;
        }
        self.tempo = tempo;
        Ok(())
    }

    /// Deferred visual update: the step scheduled earliest has become audible.
    pub fn advance_visual(&mut self) {
        self.visual_index = (self.visual_index + 1).rem_euclid(STEPS_PER_PATTERN as i32);
    }

    /// One scheduler wake. Plays every step due before `now + lookahead` and
    /// returns them in order. A stopped transport only refreshes its anchor.
    pub fn schedule(
        &mut self,
        now: f64,
        tracks: &[Arc<Pattern>],
        sink: &dyn PlaybackSink,
    ) -> Vec<ScheduledStep> {
        let mut scheduled = Vec::new();
        if !self.is_playing() {
            self.old_index = self.current_index;
            return scheduled;
        }

        let horizon = now + self.timing.lookahead_secs();
        let mut sixteenth = clock::sixteenth_note_duration(self.tempo);
        let mut next_note_time = self.next_note_time();

        while next_note_time < horizon {
            let index = self.current_index;

            let mut sounded = false;
            for pattern in tracks {
                sounded |= pattern.trigger_at(next_note_time, index, sink).is_some();
            }
            if self.bootstrap_pending {
                // the very first step of a fresh session always reaches the sink
                if index == 0 && self.num_loops == 0 && !sounded {
                    bootstrap(next_note_time, tracks, sink);
                }
                self.bootstrap_pending = false;
            }

            self.current_index = (self.current_index + 1) % STEPS_PER_PATTERN;

            scheduled.push(ScheduledStep {
                index,
                time: next_note_time,
                delay_secs: (next_note_time - now).max(0.0),
            });

            self.loop_counter += 1;
            if self.loop_counter == STEPS_PER_PATTERN {
                self.num_loops += 1;
                self.loop_counter = 0;
            }

            sixteenth = clock::sixteenth_note_duration(self.tempo);
            next_note_time += sixteenth;
        }

        log::trace!(
            "scheduled {} step(s), next at {:.4}s ({:.4}s per step)",
            scheduled.len(),
            next_note_time,
            sixteenth
        );
        scheduled
    }
}

// zero-gain play of the first loaded sample we can find
fn bootstrap(time: f64, tracks: &[Arc<Pattern>], sink: &dyn PlaybackSink) {
    match tracks.iter().find_map(|p| p.sample().buffer()) {
        Some(buffer) => {
            sink.play(time, buffer, 0.0);
        }
        None => log::debug!("no sample loaded yet, skipping bootstrap trigger"),
    }
}

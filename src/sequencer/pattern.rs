use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use atomic_float::AtomicF32;

use super::clock::validate_step;
use super::sample::Sample;
use crate::audio::TriggerId;
use crate::audio_api::PlaybackSink;
use crate::error::Result;
use crate::shared::{SILENT_STEP_CHAR, STEPS_PER_PATTERN};

/// One track's 16-step on/off sequence, its gain and the sample it triggers.
///
/// Steps and gain are atomics so the front-end can edit a pattern while the
/// scheduler is reading it; every step evaluation sees one whole value.
#[derive(Debug)]
pub struct Pattern {
    steps: [AtomicBool; STEPS_PER_PATTERN],
    gain: AtomicF32,
    sample: Arc<Sample>,
}

impl Pattern {
    pub fn new(sample: Arc<Sample>) -> Self {
        Self {
            steps: std::array::from_fn(|_| AtomicBool::new(false)),
            gain: AtomicF32::new(1.0),
            sample,
        }
    }

    // convenience for presets: which steps start active
    pub fn with_steps(sample: Arc<Sample>, active: &[usize]) -> Result<Self> {
        let pattern = Self::new(sample);
        for &index in active {
            pattern.set_step(index, true)?;
        }
        Ok(pattern)
    }

    pub fn sample(&self) -> &Arc<Sample> {
        &self.sample
    }

    pub fn gain(&self) -> f32 {
        self.gain.load(Ordering::Acquire)
    }

    pub fn set_gain(&self, gain: f32) {
        let gain = if gain.is_nan() { 0.0 } else { gain.clamp(0.0, 1.0) };
        self.gain.store(gain, Ordering::Release);
    }

    pub fn is_active(&self, index: usize) -> Result<bool> {
        let index = validate_step(index)?;
        Ok(self.steps[index].load(Ordering::Acquire))
    }

    pub fn set_step(&self, index: usize, active: bool) -> Result<()> {
        let index = validate_step(index)?;
        self.steps[index].store(active, Ordering::Release);
        Ok(())
    }

    /// Flip a step between silent and active. Returns the new state.
    pub fn toggle_step(&self, index: usize) -> Result<bool> {
        let index = validate_step(index)?;
        Ok(!self.steps[index].fetch_xor(true, Ordering::AcqRel))
    }

    pub fn steps(&self) -> [bool; STEPS_PER_PATTERN] {
        std::array::from_fn(|i| self.steps[i].load(Ordering::Acquire))
    }

    pub fn clear(&self) {
        for step in &self.steps {
            step.store(false, Ordering::Release);
        }
    }

    /// Play this pattern's sample at `time` if step `index` is active and the
    /// sample has been loaded. Returns the trigger if one was issued.
    pub fn step(&self, time: f64, index: usize, sink: &dyn PlaybackSink) -> Result<Option<TriggerId>> {
        let index = validate_step(index)?;
        Ok(self.trigger_at(time, index, sink))
    }

    // scheduler path; index already wrapped
    pub(crate) fn trigger_at(&self, time: f64, index: usize, sink: &dyn PlaybackSink) -> Option<TriggerId> {
        if !self.steps[index % STEPS_PER_PATTERN].load(Ordering::Acquire) {
            return None;
        }
        let buffer = self.sample.buffer()?;
        Some(sink.play(time, buffer, self.gain()))
    }

    /// Steps as text: the sample's character for active steps, `-` otherwise.
    pub fn display_pattern(&self) -> String {
        self.steps()
            .iter()
            .map(|&on| if on { self.sample.display_char() } else { SILENT_STEP_CHAR })
            .collect()
    }
}
